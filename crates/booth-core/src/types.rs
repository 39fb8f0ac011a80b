// SPDX-FileCopyrightText: 2026 Booth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the booth workspace.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Maximum verification attempts before a session is force-expired.
pub const MAX_VERIFY_ATTEMPTS: u32 = 5;

/// Verification code validity window in seconds.
pub const DEFAULT_CODE_TTL_SECS: u64 = 120;

/// Kiosk lease validity window in seconds (30 minutes).
pub const DEFAULT_LEASE_TIMEOUT_SECS: u64 = 1800;

/// Upper bound of the kiosk id domain.
pub const MAX_KIOSK_ID: u16 = 50;

/// Lifecycle state of a guest session.
///
/// `Completed`, `Discarded`, and `Expired` are terminal: no transition may
/// leave them, and guarded updates against them fail with `Conflict`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Registered,
    AwaitingVerification,
    PhotoPending,
    ReviewPending,
    Completed,
    Discarded,
    Expired,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionState::Completed | SessionState::Discarded | SessionState::Expired
        )
    }
}

/// Result of a guest code submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VerifyOutcome {
    Verified,
    Invalid,
    Expired,
    TooManyAttempts,
}

/// The delivery channel selected once at deployment.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DeliveryChannel {
    Sms,
    Email,
    Local,
}

/// Outcome of a single delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Sent,
    Failed,
}

/// Lease status of a numbered kiosk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeaseStatus {
    Available,
    InUse,
}

/// A guest session spanning registration through photo delivery or discard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Server-generated session token, also stored on the kiosk lease.
    pub id: String,
    pub kiosk_id: u16,
    pub guest_name: String,
    pub guest_phone: String,
    pub guest_email: Option<String>,
    pub consent: bool,
    pub state: SessionState,
    /// Present only while state is `AwaitingVerification`.
    pub verification_code: Option<String>,
    pub code_expires_at: Option<String>,
    pub verification_attempts: u32,
    /// Captured image bytes; set on upload, cleared on discard/retake.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<Vec<u8>>,
    pub created_at: String,
    pub updated_at: String,
}

/// Registration fields supplied by the phone UI, pre-validated at the
/// gateway boundary.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub kiosk_id: u16,
    pub guest_name: String,
    /// Normalized 11-digit US number (leading country code).
    pub guest_phone: String,
    pub guest_email: Option<String>,
    pub consent: bool,
}

/// The time-boxed binding of a kiosk to a single session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KioskLease {
    pub kiosk_id: u16,
    pub status: LeaseStatus,
    pub session_id: Option<String>,
    pub leased_at: Option<String>,
    pub location: String,
}

/// Immutable record of one photo delivery attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub session_id: String,
    pub channel: DeliveryChannel,
    pub attempted_at: String,
    pub outcome: DeliveryOutcome,
    /// Provider message id (Twilio SID, SMTP response code, or local filename).
    pub provider_reference: Option<String>,
}

/// Monotonic counters that survive individual session deletion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CumulativeStats {
    pub total_created: u64,
    pub total_verified: u64,
    pub total_photos_taken: u64,
}

/// What the kiosk display should show, derived purely from the session
/// bound to it. The kiosk holds no authoritative state of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "display", rename_all = "snake_case")]
pub enum KioskDisplay {
    /// No live session: show the welcome screen.
    Idle,
    /// Guest registered: show the one-time code for them to enter.
    VerificationCode {
        session_id: String,
        guest_name: String,
        code: String,
    },
    /// Guest verified: trigger the capture UI.
    Capture {
        session_id: String,
        guest_name: String,
    },
    /// Photo uploaded: the guest is reviewing on their phone.
    Review {
        session_id: String,
        guest_name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kiosk_display_serializes_with_tag() {
        let display = KioskDisplay::VerificationCode {
            session_id: "tok-1".into(),
            guest_name: "Ana".into(),
            code: "123456".into(),
        };
        let json = serde_json::to_string(&display).unwrap();
        assert!(json.contains("\"display\":\"verification_code\""));
        assert!(json.contains("\"code\":\"123456\""));
    }

    #[test]
    fn verify_outcome_snake_case() {
        let json = serde_json::to_string(&VerifyOutcome::TooManyAttempts).unwrap();
        assert_eq!(json, "\"too_many_attempts\"");
    }

    #[test]
    fn lease_status_parses() {
        use std::str::FromStr;
        assert_eq!(LeaseStatus::from_str("in_use").unwrap(), LeaseStatus::InUse);
        assert_eq!(
            LeaseStatus::from_str("available").unwrap(),
            LeaseStatus::Available
        );
    }
}
