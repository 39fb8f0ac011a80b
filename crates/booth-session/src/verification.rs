// SPDX-FileCopyrightText: 2026 Booth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Verification code issuance and submission policy.
//!
//! Codes are six uniformly random decimal digits drawn from the OS RNG.
//! The window and attempt budget come from `[verification]` config; the
//! actual compare-and-swap lives in storage so concurrent submissions
//! serialize there.

use booth_core::types::VerifyOutcome;
use booth_core::BoothError;
use booth_storage::{SessionStore, SubmissionResult};
use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::Rng;

/// Outcome of a code submission plus what's left of the attempt budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyResult {
    pub outcome: VerifyOutcome,
    /// Present only after a failed match with budget remaining.
    pub attempts_remaining: Option<u32>,
}

#[derive(Debug, Clone, Copy)]
pub struct VerificationEngine {
    code_ttl_secs: u64,
    max_attempts: u32,
}

impl VerificationEngine {
    pub fn new(code_ttl_secs: u64, max_attempts: u32) -> Self {
        Self {
            code_ttl_secs,
            max_attempts,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Draw a fresh six-digit code. Leading zeros are legal.
    pub fn generate_code(&self) -> String {
        let n: u32 = OsRng.gen_range(0..1_000_000);
        format!("{n:06}")
    }

    /// When a code issued at `now` stops being accepted.
    pub fn expires_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::seconds(self.code_ttl_secs as i64)
    }

    /// Submit a candidate code for the session at instant `now`.
    ///
    /// The candidate is assumed format-checked at the boundary; this layer
    /// decides the outcome against the stored code, window, and budget.
    pub async fn submit_at(
        &self,
        store: &SessionStore,
        session_id: &str,
        candidate: &str,
        now: DateTime<Utc>,
    ) -> Result<VerifyResult, BoothError> {
        let result = store
            .apply_code_submission(session_id, candidate, now, self.max_attempts)
            .await?;

        match result {
            SubmissionResult::Verified => Ok(VerifyResult {
                outcome: VerifyOutcome::Verified,
                attempts_remaining: None,
            }),
            SubmissionResult::Invalid { attempts_remaining } => Ok(VerifyResult {
                outcome: VerifyOutcome::Invalid,
                attempts_remaining: Some(attempts_remaining),
            }),
            SubmissionResult::Expired => Ok(VerifyResult {
                outcome: VerifyOutcome::Expired,
                attempts_remaining: None,
            }),
            SubmissionResult::TooManyAttempts => Ok(VerifyResult {
                outcome: VerifyOutcome::TooManyAttempts,
                attempts_remaining: None,
            }),
            SubmissionResult::NotFound => {
                Err(BoothError::NotFound(format!("session {session_id}")))
            }
            SubmissionResult::WrongState(state) => Err(BoothError::Conflict(format!(
                "session {session_id} is {state}, not awaiting verification"
            ))),
        }
    }
}
