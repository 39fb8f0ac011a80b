// SPDX-FileCopyrightText: 2026 Booth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the booth photo-kiosk service.
//!
//! Three clients talk to this surface: the guest's phone (register,
//! verify, review), the kiosk (poll + photo upload), and the operator
//! (admin endpoints).

pub mod error;
pub mod handlers;
pub mod server;
pub mod validate;

pub use handlers::AppState;
pub use server::{router, start_server};
