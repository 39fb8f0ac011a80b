// SPDX-FileCopyrightText: 2026 Booth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session lifecycle orchestration for the booth photo-kiosk service.

pub mod machine;
pub mod verification;

pub use machine::{AdminStats, PhotoStatus, SessionStateMachine};
pub use verification::{VerificationEngine, VerifyResult};
