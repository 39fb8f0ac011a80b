// SPDX-FileCopyrightText: 2026 Booth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The session state machine.
//!
//! Orchestrates the guest journey across the lease pool, session store,
//! verification engine, and delivery dispatcher:
//!
//! ```text
//! registered -> awaiting_verification -> photo_pending -> review_pending
//!                                                          |-> completed
//!                                                          `-> discarded
//! ```
//!
//! `expired` is terminal and reachable from the pre-photo states. Expiry
//! and purging are checked lazily on the read paths; there is no
//! background scheduler.

use booth_core::time::format_ts;
use booth_core::types::{
    CumulativeStats, DeliveryRecord, KioskDisplay, KioskLease, NewSession, Session, SessionState,
};
use booth_core::BoothError;
use booth_delivery::{DeliveryJob, Dispatcher};
use booth_storage::{CheckoutOutcome, DeliveryLog, KioskLeasePool, SessionStore};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::verification::{VerificationEngine, VerifyResult};

/// Phone-poll view of the captured photo.
#[derive(Debug, Clone, Serialize)]
pub struct PhotoStatus {
    pub ready: bool,
    pub state: SessionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<Vec<u8>>,
}

/// Operational snapshot for the admin dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct AdminStats {
    #[serde(flatten)]
    pub cumulative: CumulativeStats,
    pub live_sessions: u64,
    pub kiosks_in_use: u64,
    pub kiosk_count: u16,
    pub deliveries_sent: u64,
    pub deliveries_failed: u64,
}

pub struct SessionStateMachine {
    store: SessionStore,
    pool: KioskLeasePool,
    log: DeliveryLog,
    dispatcher: Dispatcher,
    engine: VerificationEngine,
    /// Terminal rows older than this are purged by the lazy sweep.
    purge_after_secs: u64,
}

impl SessionStateMachine {
    pub fn new(
        store: SessionStore,
        pool: KioskLeasePool,
        log: DeliveryLog,
        dispatcher: Dispatcher,
        engine: VerificationEngine,
    ) -> Self {
        let purge_after_secs = pool.lease_timeout_secs();
        Self {
            store,
            pool,
            log,
            dispatcher,
            engine,
            purge_after_secs,
        }
    }

    /// Register a guest at a kiosk: lease first, then session, then code.
    ///
    /// A denied lease means no session row is created at all.
    pub async fn register(&self, reg: NewSession) -> Result<Session, BoothError> {
        self.register_at(reg, Utc::now()).await
    }

    pub async fn register_at(
        &self,
        reg: NewSession,
        now: DateTime<Utc>,
    ) -> Result<Session, BoothError> {
        if !self.pool.contains(reg.kiosk_id) {
            return Err(BoothError::InvalidKioskId(reg.kiosk_id));
        }
        if !reg.consent {
            return Err(BoothError::Validation {
                field: "consent".to_string(),
                reason: "photo consent is required to register".to_string(),
            });
        }

        self.sweep(now).await?;

        let id = Uuid::new_v4().to_string();
        match self.pool.checkout_at(reg.kiosk_id, &id, now).await? {
            CheckoutOutcome::Leased => {}
            CheckoutOutcome::Reclaimed { evicted_session_id } => {
                info!(
                    kiosk_id = reg.kiosk_id,
                    evicted = %evicted_session_id,
                    "reclaimed abandoned kiosk lease"
                );
            }
            CheckoutOutcome::Busy { remaining_secs } => {
                return Err(BoothError::LeaseDenied {
                    kiosk_id: reg.kiosk_id,
                    remaining_secs,
                });
            }
            CheckoutOutcome::UnknownKiosk => {
                return Err(BoothError::InvalidKioskId(reg.kiosk_id));
            }
        }

        let ts = format_ts(now);
        let session = Session {
            id: id.clone(),
            kiosk_id: reg.kiosk_id,
            guest_name: reg.guest_name,
            guest_phone: reg.guest_phone,
            guest_email: reg.guest_email,
            consent: reg.consent,
            state: SessionState::Registered,
            verification_code: None,
            code_expires_at: None,
            verification_attempts: 0,
            photo: None,
            created_at: ts.clone(),
            updated_at: ts,
        };
        if let Err(e) = self.store.insert(&session).await {
            // Give the lease back rather than waiting for the stale reclaim.
            let _ = self.pool.release(reg.kiosk_id, &id).await;
            return Err(e);
        }

        let code = self.engine.generate_code();
        let expires_at = self.engine.expires_at(now);
        if !self.store.issue_code(&id, &code, expires_at, now).await? {
            return Err(BoothError::Internal(format!(
                "freshly created session {id} refused code issuance"
            )));
        }

        info!(session_id = %id, kiosk_id = reg.kiosk_id, "guest registered");
        self.store
            .get(&id)
            .await?
            .ok_or_else(|| BoothError::Internal(format!("session {id} vanished after insert")))
    }

    /// Authoritative kiosk display state, for the kiosk's poll loop.
    pub async fn kiosk_state(&self, kiosk_id: u16) -> Result<KioskDisplay, BoothError> {
        self.kiosk_state_at(kiosk_id, Utc::now()).await
    }

    pub async fn kiosk_state_at(
        &self,
        kiosk_id: u16,
        now: DateTime<Utc>,
    ) -> Result<KioskDisplay, BoothError> {
        if !self.pool.contains(kiosk_id) {
            return Err(BoothError::InvalidKioskId(kiosk_id));
        }
        self.sweep(now).await?;

        let session = self.store.find_live_by_kiosk(kiosk_id).await?;
        Ok(match session {
            Some(s) => match s.state {
                SessionState::AwaitingVerification => KioskDisplay::VerificationCode {
                    session_id: s.id,
                    guest_name: s.guest_name,
                    code: s.verification_code.unwrap_or_default(),
                },
                SessionState::PhotoPending => KioskDisplay::Capture {
                    session_id: s.id,
                    guest_name: s.guest_name,
                },
                SessionState::ReviewPending => KioskDisplay::Review {
                    session_id: s.id,
                    guest_name: s.guest_name,
                },
                // Registered is a moment between insert and code issuance.
                _ => KioskDisplay::Idle,
            },
            None => KioskDisplay::Idle,
        })
    }

    /// Submit a verification code for the session.
    pub async fn verify(&self, session_id: &str, candidate: &str) -> Result<VerifyResult, BoothError> {
        self.verify_at(session_id, candidate, Utc::now()).await
    }

    pub async fn verify_at(
        &self,
        session_id: &str,
        candidate: &str,
        now: DateTime<Utc>,
    ) -> Result<VerifyResult, BoothError> {
        self.engine
            .submit_at(&self.store, session_id, candidate, now)
            .await
    }

    /// Store the captured photo: `photo_pending` -> `review_pending`.
    pub async fn upload_photo(&self, session_id: &str, photo: Vec<u8>) -> Result<(), BoothError> {
        self.upload_photo_at(session_id, photo, Utc::now()).await
    }

    pub async fn upload_photo_at(
        &self,
        session_id: &str,
        photo: Vec<u8>,
        now: DateTime<Utc>,
    ) -> Result<(), BoothError> {
        if self.store.attach_photo(session_id, photo, now).await? {
            debug!(%session_id, "photo attached, awaiting review");
            Ok(())
        } else {
            Err(self.cas_failure(session_id, "photo_pending").await)
        }
    }

    /// Reject the capture and go again: `review_pending` -> `photo_pending`.
    pub async fn retake(&self, session_id: &str) -> Result<(), BoothError> {
        self.retake_at(session_id, Utc::now()).await
    }

    pub async fn retake_at(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), BoothError> {
        if self.store.clear_photo_for_retake(session_id, now).await? {
            debug!(%session_id, "photo cleared for retake");
            Ok(())
        } else {
            Err(self.cas_failure(session_id, "review_pending").await)
        }
    }

    /// Phone poll: is the capture ready for review, and the bytes if so.
    pub async fn check_photo(&self, session_id: &str) -> Result<PhotoStatus, BoothError> {
        let session = self
            .store
            .get(session_id)
            .await?
            .ok_or_else(|| BoothError::NotFound(format!("session {session_id}")))?;
        let ready = session.state == SessionState::ReviewPending && session.photo.is_some();
        Ok(PhotoStatus {
            ready,
            state: session.state,
            photo: if ready { session.photo } else { None },
        })
    }

    /// Keep the photo: complete the session, free the kiosk, then attempt
    /// delivery.
    ///
    /// Delivery runs after the completed transition commits and its failure
    /// never rolls the session back; the returned record is the audit of the
    /// single attempt.
    pub async fn keep_photo(&self, session_id: &str) -> Result<DeliveryRecord, BoothError> {
        self.keep_photo_at(session_id, Utc::now()).await
    }

    pub async fn keep_photo_at(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<DeliveryRecord, BoothError> {
        let session = self
            .store
            .get(session_id)
            .await?
            .ok_or_else(|| BoothError::NotFound(format!("session {session_id}")))?;
        if session.state != SessionState::ReviewPending {
            return Err(BoothError::Conflict(format!(
                "session {session_id} is {}, expected review_pending",
                session.state
            )));
        }
        let photo = session.photo.clone().ok_or_else(|| {
            BoothError::Internal(format!("session {session_id} in review without a photo"))
        })?;

        if !self
            .store
            .transition(
                session_id,
                SessionState::ReviewPending,
                SessionState::Completed,
                now,
            )
            .await?
        {
            return Err(self.cas_failure(session_id, "review_pending").await);
        }
        self.pool.release(session.kiosk_id, session_id).await?;
        info!(%session_id, kiosk_id = session.kiosk_id, "session completed");

        let job = DeliveryJob {
            session_id: session.id,
            guest_name: session.guest_name,
            guest_phone: session.guest_phone,
            guest_email: session.guest_email,
            photo,
        };
        let record = self.dispatcher.dispatch_at(&job, now).await;
        self.log.append(&record).await?;
        Ok(record)
    }

    /// Discard the photo: terminal, no delivery attempt, kiosk freed.
    pub async fn discard_photo(&self, session_id: &str) -> Result<(), BoothError> {
        self.discard_photo_at(session_id, Utc::now()).await
    }

    pub async fn discard_photo_at(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), BoothError> {
        let session = self
            .store
            .get(session_id)
            .await?
            .ok_or_else(|| BoothError::NotFound(format!("session {session_id}")))?;
        if !self.store.discard_photo(session_id, now).await? {
            return Err(self.cas_failure(session_id, "review_pending").await);
        }
        self.pool.release(session.kiosk_id, session_id).await?;
        info!(%session_id, kiosk_id = session.kiosk_id, "session discarded");
        Ok(())
    }

    /// Lazy sweep: expire lapsed verification windows and purge old
    /// terminal rows. Returns (expired, purged).
    pub async fn expire_stale(&self) -> Result<(usize, usize), BoothError> {
        self.expire_stale_at(Utc::now()).await
    }

    pub async fn expire_stale_at(
        &self,
        now: DateTime<Utc>,
    ) -> Result<(usize, usize), BoothError> {
        let expired = self.store.expire_lapsed_codes(now).await?;
        let cutoff = now - Duration::seconds(self.purge_after_secs as i64);
        let purged = self.store.purge_terminal_before(cutoff).await?;
        if expired > 0 || purged > 0 {
            debug!(expired, purged, "stale session sweep");
        }
        Ok((expired, purged))
    }

    /// Session detail, for the phone's status view.
    pub async fn session(&self, session_id: &str) -> Result<Session, BoothError> {
        self.store
            .get(session_id)
            .await?
            .ok_or_else(|| BoothError::NotFound(format!("session {session_id}")))
    }

    pub async fn lease_statuses(&self) -> Result<Vec<KioskLease>, BoothError> {
        self.pool.list().await
    }

    pub async fn delivery_records(
        &self,
        session_id: &str,
    ) -> Result<Vec<DeliveryRecord>, BoothError> {
        self.log.for_session(session_id).await
    }

    pub async fn stats(&self) -> Result<AdminStats, BoothError> {
        Ok(AdminStats {
            cumulative: self.store.stats().await?,
            live_sessions: self.store.count_live().await?,
            kiosks_in_use: self.pool.count_in_use().await?,
            kiosk_count: self.pool.kiosk_count(),
            deliveries_sent: self.log.count_sent().await?,
            deliveries_failed: self.log.count_failed().await?,
        })
    }

    pub async fn recent_sessions(&self, limit: u32) -> Result<Vec<Session>, BoothError> {
        self.store.recent(limit).await
    }

    /// Full operational reset: every lease freed, all sessions and delivery
    /// records dropped, counters zeroed.
    pub async fn reset_all(&self) -> Result<(), BoothError> {
        self.pool.release_all().await?;
        let sessions = self.store.delete_all().await?;
        let deliveries = self.log.delete_all().await?;
        self.store.reset_counters().await?;
        info!(sessions, deliveries, "operational reset");
        Ok(())
    }

    /// Health probe: storage reachable.
    pub async fn ping_storage(&self) -> Result<(), BoothError> {
        self.store.stats().await.map(|_| ())
    }

    async fn sweep(&self, now: DateTime<Utc>) -> Result<(), BoothError> {
        self.expire_stale_at(now).await.map(|_| ())
    }

    /// Classify a failed guarded update into NotFound or Conflict.
    async fn cas_failure(&self, session_id: &str, expected: &str) -> BoothError {
        match self.store.get(session_id).await {
            Ok(None) => BoothError::NotFound(format!("session {session_id}")),
            Ok(Some(s)) => BoothError::Conflict(format!(
                "session {session_id} is {}, expected {expected}",
                s.state
            )),
            Err(e) => e,
        }
    }
}
