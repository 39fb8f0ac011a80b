// SPDX-FileCopyrightText: 2026 Booth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed facades over the query modules.
//!
//! The session machine talks to these rather than raw query functions so
//! that pool sizing and lease timing live in one place. All facades are
//! cheap clones sharing the one background connection.

use std::collections::BTreeMap;

use booth_core::time::format_ts;
use booth_core::types::{
    CumulativeStats, DeliveryRecord, KioskLease, Session, SessionState,
};
use booth_core::BoothError;
use chrono::{DateTime, Duration, Utc};

use crate::database::Database;
use crate::queries::kiosks::CheckoutOutcome;
use crate::queries::sessions::SubmissionResult;
use crate::queries::{deliveries, kiosks, sessions, stats};

/// Session persistence facade.
#[derive(Clone)]
pub struct SessionStore {
    db: Database,
}

impl SessionStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn insert(&self, session: &Session) -> Result<(), BoothError> {
        sessions::insert_session(&self.db, session).await
    }

    pub async fn get(&self, id: &str) -> Result<Option<Session>, BoothError> {
        sessions::get_session(&self.db, id).await
    }

    pub async fn find_by_code(&self, code: &str) -> Result<Option<Session>, BoothError> {
        self.find_by_code_at(code, Utc::now()).await
    }

    pub async fn find_by_code_at(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, BoothError> {
        sessions::find_by_code(&self.db, code, &format_ts(now)).await
    }

    pub async fn find_live_by_kiosk(&self, kiosk_id: u16) -> Result<Option<Session>, BoothError> {
        sessions::find_live_by_kiosk(&self.db, kiosk_id).await
    }

    pub async fn issue_code(
        &self,
        id: &str,
        code: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool, BoothError> {
        sessions::issue_code(&self.db, id, code, &format_ts(expires_at), &format_ts(now)).await
    }

    pub async fn discard_photo(&self, id: &str, now: DateTime<Utc>) -> Result<bool, BoothError> {
        sessions::discard_photo(&self.db, id, &format_ts(now)).await
    }

    pub async fn transition(
        &self,
        id: &str,
        from: SessionState,
        to: SessionState,
        now: DateTime<Utc>,
    ) -> Result<bool, BoothError> {
        sessions::transition_state(&self.db, id, from, to, &format_ts(now)).await
    }

    pub async fn attach_photo(
        &self,
        id: &str,
        photo: Vec<u8>,
        now: DateTime<Utc>,
    ) -> Result<bool, BoothError> {
        sessions::attach_photo(&self.db, id, photo, &format_ts(now)).await
    }

    pub async fn clear_photo_for_retake(
        &self,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, BoothError> {
        sessions::clear_photo_for_retake(&self.db, id, &format_ts(now)).await
    }

    pub async fn apply_code_submission(
        &self,
        id: &str,
        submitted: &str,
        now: DateTime<Utc>,
        max_attempts: u32,
    ) -> Result<SubmissionResult, BoothError> {
        sessions::apply_code_submission(&self.db, id, submitted, &format_ts(now), max_attempts)
            .await
    }

    pub async fn force_expire(&self, id: &str, now: DateTime<Utc>) -> Result<(), BoothError> {
        sessions::force_expire(&self.db, id, &format_ts(now)).await
    }

    pub async fn expire_lapsed_codes(&self, now: DateTime<Utc>) -> Result<usize, BoothError> {
        sessions::expire_lapsed_codes(&self.db, &format_ts(now)).await
    }

    pub async fn purge_terminal_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<usize, BoothError> {
        sessions::purge_terminal_before(&self.db, &format_ts(cutoff)).await
    }

    pub async fn recent(&self, limit: u32) -> Result<Vec<Session>, BoothError> {
        sessions::recent_sessions(&self.db, limit).await
    }

    pub async fn count_live(&self) -> Result<u64, BoothError> {
        sessions::count_live(&self.db).await
    }

    pub async fn delete_all(&self) -> Result<usize, BoothError> {
        sessions::delete_all(&self.db).await
    }

    pub async fn stats(&self) -> Result<CumulativeStats, BoothError> {
        stats::get_stats(&self.db).await
    }

    pub async fn reset_counters(&self) -> Result<(), BoothError> {
        stats::reset_counters(&self.db).await
    }
}

/// Kiosk lease pool facade. Carries the pool size and lease window so
/// callers only supply instants.
#[derive(Clone)]
pub struct KioskLeasePool {
    db: Database,
    kiosk_count: u16,
    lease_timeout_secs: u64,
}

impl KioskLeasePool {
    /// Build the pool facade and seed missing pool rows.
    pub async fn open(
        db: Database,
        kiosk_count: u16,
        lease_timeout_secs: u64,
        locations: &BTreeMap<String, String>,
    ) -> Result<Self, BoothError> {
        kiosks::ensure_pool(&db, kiosk_count, locations).await?;
        Ok(Self {
            db,
            kiosk_count,
            lease_timeout_secs,
        })
    }

    pub fn kiosk_count(&self) -> u16 {
        self.kiosk_count
    }

    pub fn lease_timeout_secs(&self) -> u64 {
        self.lease_timeout_secs
    }

    /// True when `kiosk_id` is inside the configured pool.
    pub fn contains(&self, kiosk_id: u16) -> bool {
        (1..=self.kiosk_count).contains(&kiosk_id)
    }

    /// Lease a kiosk for a session at instant `now`.
    pub async fn checkout_at(
        &self,
        kiosk_id: u16,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<CheckoutOutcome, BoothError> {
        let stale_before = now - Duration::seconds(self.lease_timeout_secs as i64);
        kiosks::checkout(
            &self.db,
            kiosk_id,
            session_id,
            &format_ts(now),
            &format_ts(stale_before),
            self.lease_timeout_secs,
        )
        .await
    }

    pub async fn release(&self, kiosk_id: u16, session_id: &str) -> Result<bool, BoothError> {
        kiosks::release(&self.db, kiosk_id, session_id).await
    }

    pub async fn get(&self, kiosk_id: u16) -> Result<Option<KioskLease>, BoothError> {
        kiosks::get_lease(&self.db, kiosk_id).await
    }

    pub async fn list(&self) -> Result<Vec<KioskLease>, BoothError> {
        kiosks::list_leases(&self.db).await
    }

    pub async fn count_in_use(&self) -> Result<u64, BoothError> {
        kiosks::count_in_use(&self.db).await
    }

    pub async fn release_all(&self) -> Result<(), BoothError> {
        kiosks::release_all(&self.db).await
    }
}

/// Delivery record facade.
#[derive(Clone)]
pub struct DeliveryLog {
    db: Database,
}

impl DeliveryLog {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn append(&self, record: &DeliveryRecord) -> Result<(), BoothError> {
        deliveries::insert_record(&self.db, record).await
    }

    pub async fn for_session(&self, session_id: &str) -> Result<Vec<DeliveryRecord>, BoothError> {
        deliveries::records_for_session(&self.db, session_id).await
    }

    pub async fn count_sent(&self) -> Result<u64, BoothError> {
        deliveries::count_by_outcome(&self.db, "sent").await
    }

    pub async fn count_failed(&self) -> Result<u64, BoothError> {
        deliveries::count_by_outcome(&self.db, "failed").await
    }

    pub async fn delete_all(&self) -> Result<usize, BoothError> {
        deliveries::delete_all(&self.db).await
    }
}
