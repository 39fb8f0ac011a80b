// SPDX-FileCopyrightText: 2026 Booth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the booth photo-kiosk service.
//!
//! A single background connection thread serializes all access, which is
//! what lets guarded UPDATE statements act as compare-and-swap operations
//! for lease checkout and verification code submission.

pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod store;

pub use database::Database;
pub use queries::kiosks::CheckoutOutcome;
pub use queries::sessions::SubmissionResult;
pub use store::{DeliveryLog, KioskLeasePool, SessionStore};
