// SPDX-FileCopyrightText: 2026 Booth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the booth photo-kiosk service.

use thiserror::Error;

/// The primary error type used across all booth crates.
///
/// Verification outcomes (invalid code, expired code, attempt exhaustion)
/// are not errors -- they are modeled by [`crate::types::VerifyOutcome`]
/// because the guest-facing flow treats them as ordinary results.
#[derive(Debug, Error)]
pub enum BoothError {
    /// Malformed input rejected at the boundary (bad phone format, missing
    /// consent, non-numeric code). Never reaches the state machine.
    #[error("validation error: {field}: {reason}")]
    Validation { field: String, reason: String },

    /// The kiosk is checked out and its lease has not yet expired.
    /// Recoverable: the caller may wait or pick another kiosk.
    #[error("kiosk {kiosk_id} is in use for another {remaining_secs}s")]
    LeaseDenied { kiosk_id: u16, remaining_secs: i64 },

    /// Kiosk id outside the configured pool range.
    #[error("invalid kiosk id: {0}")]
    InvalidKioskId(u16),

    /// The referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Update against an unknown or terminal session -- a stale client
    /// reference. Surfaced as-is, never retried.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Storage backend errors (database connection, query failure).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Delivery transport errors (provider API failure, SMTP failure).
    /// These never escape the dispatcher boundary during a keep decision;
    /// the variant exists for adapter construction and internal reporting.
    #[error("delivery error: {message}")]
    Delivery {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration errors (invalid TOML, missing credentials).
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
