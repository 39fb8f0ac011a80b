// SPDX-FileCopyrightText: 2026 Booth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the booth photo-kiosk service.
//!
//! This crate provides the error taxonomy, domain types, and timestamp
//! helpers used throughout the booth workspace. Every other crate builds
//! on the types defined here.

pub mod error;
pub mod time;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::BoothError;
pub use types::{
    CumulativeStats, DeliveryChannel, DeliveryOutcome, DeliveryRecord, KioskDisplay, KioskLease,
    LeaseStatus, NewSession, Session, SessionState, VerifyOutcome,
};
