// SPDX-FileCopyrightText: 2026 Booth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Kiosk lease pool operations.
//!
//! Checkout decides availability and writes the lease in one transaction.
//! A lease older than the configured timeout is treated as abandoned and
//! may be reclaimed by the next guest; the evicted session is expired in
//! the same transaction so no window exists where both sessions hold the
//! kiosk.

use std::collections::BTreeMap;

use booth_core::types::KioskLease;
use booth_core::BoothError;
use rusqlite::params;

use crate::database::Database;
use crate::models::{lease_from_row, LEASE_COLUMNS};

/// Outcome of a lease checkout attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// The kiosk was free and is now leased to the session.
    Leased,
    /// A stale lease was evicted; its session was force-expired.
    Reclaimed { evicted_session_id: String },
    /// Another session holds a live lease.
    Busy { remaining_secs: i64 },
    /// No such kiosk row in the pool.
    UnknownKiosk,
}

/// Make sure a pool row exists for every kiosk id in `1..=count`,
/// applying configured location labels. Existing lease state is preserved.
pub async fn ensure_pool(
    db: &Database,
    count: u16,
    locations: &BTreeMap<String, String>,
) -> Result<(), BoothError> {
    let locations = locations.clone();
    db.call(move |conn| {
        let tx = conn.transaction()?;
        for kiosk_id in 1..=count {
            let location = locations
                .get(&kiosk_id.to_string())
                .cloned()
                .unwrap_or_default();
            tx.execute(
                "INSERT INTO kiosks (kiosk_id, status, location)
                 VALUES (?1, 'available', ?2)
                 ON CONFLICT(kiosk_id) DO UPDATE SET location = ?2",
                params![kiosk_id, location],
            )?;
        }
        tx.commit()?;
        Ok(())
    })
    .await
}

/// Attempt to lease `kiosk_id` for `session_id` at instant `now`.
///
/// `stale_before` is `now - lease_timeout`; a lease taken at or before that
/// instant is abandoned and eligible for reclaim.
pub async fn checkout(
    db: &Database,
    kiosk_id: u16,
    session_id: &str,
    now: &str,
    stale_before: &str,
    lease_timeout_secs: u64,
) -> Result<CheckoutOutcome, BoothError> {
    let session_id = session_id.to_string();
    let now = now.to_string();
    let stale_before = stale_before.to_string();
    db.call(move |conn| {
        let tx = conn.transaction()?;

        let row: Option<(String, Option<String>, Option<String>)> = {
            let mut stmt = tx.prepare(
                "SELECT status, session_id, leased_at FROM kiosks WHERE kiosk_id = ?1",
            )?;
            match stmt.query_row(params![kiosk_id], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            }) {
                Ok(r) => Some(r),
                Err(rusqlite::Error::QueryReturnedNoRows) => None,
                Err(e) => return Err(e),
            }
        };

        let Some((status, holder, leased_at)) = row else {
            return Ok(CheckoutOutcome::UnknownKiosk);
        };

        if status == "in_use" {
            let stale = leased_at.as_deref().is_none_or(|at| at <= stale_before.as_str());
            if !stale {
                let remaining_secs = remaining_secs(leased_at.as_deref(), &now, lease_timeout_secs);
                return Ok(CheckoutOutcome::Busy { remaining_secs });
            }

            // Abandoned lease: expire the evicted session before re-leasing.
            if let Some(evicted) = &holder {
                tx.execute(
                    "UPDATE sessions SET state = 'expired', verification_code = NULL,
                            code_expires_at = NULL, updated_at = ?1
                     WHERE id = ?2 AND state NOT IN ('completed', 'discarded', 'expired')",
                    params![now, evicted],
                )?;
            }
            tx.execute(
                "UPDATE kiosks SET status = 'in_use', session_id = ?1, leased_at = ?2
                 WHERE kiosk_id = ?3",
                params![session_id, now, kiosk_id],
            )?;
            tx.commit()?;
            return Ok(CheckoutOutcome::Reclaimed {
                evicted_session_id: holder.unwrap_or_default(),
            });
        }

        tx.execute(
            "UPDATE kiosks SET status = 'in_use', session_id = ?1, leased_at = ?2
             WHERE kiosk_id = ?3",
            params![session_id, now, kiosk_id],
        )?;
        tx.commit()?;
        Ok(CheckoutOutcome::Leased)
    })
    .await
}

/// Seconds left on a live lease, never negative.
fn remaining_secs(leased_at: Option<&str>, now: &str, lease_timeout_secs: u64) -> i64 {
    let Some(leased_at) = leased_at.and_then(booth_core::time::parse_ts) else {
        return 0;
    };
    let Some(now) = booth_core::time::parse_ts(now) else {
        return 0;
    };
    let elapsed = (now - leased_at).num_seconds();
    (lease_timeout_secs as i64 - elapsed).max(0)
}

/// Release `kiosk_id` if and only if `session_id` still holds it.
///
/// Idempotent: releasing a kiosk the session no longer holds returns
/// `false` without touching the row.
pub async fn release(db: &Database, kiosk_id: u16, session_id: &str) -> Result<bool, BoothError> {
    let session_id = session_id.to_string();
    db.call(move |conn| {
        let n = conn.execute(
            "UPDATE kiosks SET status = 'available', session_id = NULL, leased_at = NULL
             WHERE kiosk_id = ?1 AND session_id = ?2",
            params![kiosk_id, session_id],
        )?;
        Ok(n > 0)
    })
    .await
}

/// Fetch one lease row.
pub async fn get_lease(db: &Database, kiosk_id: u16) -> Result<Option<KioskLease>, BoothError> {
    db.call(move |conn| {
        let mut stmt = conn.prepare(&format!(
            "SELECT {LEASE_COLUMNS} FROM kiosks WHERE kiosk_id = ?1"
        ))?;
        match stmt.query_row(params![kiosk_id], lease_from_row) {
            Ok(lease) => Ok(Some(lease)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    })
    .await
}

/// All lease rows ordered by kiosk id.
pub async fn list_leases(db: &Database) -> Result<Vec<KioskLease>, BoothError> {
    db.call(|conn| {
        let mut stmt = conn.prepare(&format!(
            "SELECT {LEASE_COLUMNS} FROM kiosks ORDER BY kiosk_id"
        ))?;
        let rows = stmt.query_map([], lease_from_row)?;
        rows.collect::<Result<_, _>>()
    })
    .await
}

/// Count kiosks currently holding a lease.
pub async fn count_in_use(db: &Database) -> Result<u64, BoothError> {
    db.call(|conn| {
        conn.query_row(
            "SELECT COUNT(*) FROM kiosks WHERE status = 'in_use'",
            [],
            |row| row.get(0),
        )
    })
    .await
}

/// Free every lease. Used by the admin reset.
pub async fn release_all(db: &Database) -> Result<(), BoothError> {
    db.call(|conn| {
        conn.execute(
            "UPDATE kiosks SET status = 'available', session_id = NULL, leased_at = NULL",
            [],
        )?;
        Ok(())
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use booth_core::types::LeaseStatus;

    async fn setup_pool() -> Database {
        let db = Database::open_in_memory().await.unwrap();
        ensure_pool(&db, 3, &BTreeMap::new()).await.unwrap();
        db
    }

    #[tokio::test]
    async fn pool_seeds_available_rows() {
        let db = setup_pool().await;
        let leases = list_leases(&db).await.unwrap();
        assert_eq!(leases.len(), 3);
        assert!(leases.iter().all(|l| l.status == LeaseStatus::Available));
    }

    #[tokio::test]
    async fn pool_seeding_preserves_existing_leases() {
        let db = setup_pool().await;
        checkout(
            &db,
            1,
            "s-1",
            "2026-01-01T00:00:00.000Z",
            "2025-12-31T23:30:00.000Z",
            1800,
        )
        .await
        .unwrap();

        ensure_pool(&db, 3, &BTreeMap::new()).await.unwrap();
        let lease = get_lease(&db, 1).await.unwrap().unwrap();
        assert_eq!(lease.session_id.as_deref(), Some("s-1"));
    }

    #[tokio::test]
    async fn location_labels_applied() {
        let db = Database::open_in_memory().await.unwrap();
        let mut locations = BTreeMap::new();
        locations.insert("2".to_string(), "lobby".to_string());
        ensure_pool(&db, 2, &locations).await.unwrap();

        let lease = get_lease(&db, 2).await.unwrap().unwrap();
        assert_eq!(lease.location, "lobby");
    }

    #[tokio::test]
    async fn checkout_then_busy() {
        let db = setup_pool().await;
        let first = checkout(
            &db,
            1,
            "s-1",
            "2026-01-01T00:00:00.000Z",
            "2025-12-31T23:30:00.000Z",
            1800,
        )
        .await
        .unwrap();
        assert_eq!(first, CheckoutOutcome::Leased);

        let second = checkout(
            &db,
            1,
            "s-2",
            "2026-01-01T00:10:00.000Z",
            "2025-12-31T23:40:00.000Z",
            1800,
        )
        .await
        .unwrap();
        assert!(matches!(second, CheckoutOutcome::Busy { remaining_secs } if remaining_secs == 1200));
    }

    #[tokio::test]
    async fn stale_lease_is_reclaimed() {
        let db = setup_pool().await;
        checkout(
            &db,
            1,
            "s-1",
            "2026-01-01T00:00:00.000Z",
            "2025-12-31T23:30:00.000Z",
            1800,
        )
        .await
        .unwrap();

        // 31 minutes later the lease is past its window.
        let outcome = checkout(
            &db,
            1,
            "s-2",
            "2026-01-01T00:31:00.000Z",
            "2026-01-01T00:01:00.000Z",
            1800,
        )
        .await
        .unwrap();
        assert_eq!(
            outcome,
            CheckoutOutcome::Reclaimed {
                evicted_session_id: "s-1".to_string()
            }
        );

        let lease = get_lease(&db, 1).await.unwrap().unwrap();
        assert_eq!(lease.session_id.as_deref(), Some("s-2"));
    }

    #[tokio::test]
    async fn unknown_kiosk_reported() {
        let db = setup_pool().await;
        let outcome = checkout(
            &db,
            9,
            "s-1",
            "2026-01-01T00:00:00.000Z",
            "2025-12-31T23:30:00.000Z",
            1800,
        )
        .await
        .unwrap();
        assert_eq!(outcome, CheckoutOutcome::UnknownKiosk);
    }

    #[tokio::test]
    async fn release_is_idempotent_and_holder_scoped() {
        let db = setup_pool().await;
        checkout(
            &db,
            1,
            "s-1",
            "2026-01-01T00:00:00.000Z",
            "2025-12-31T23:30:00.000Z",
            1800,
        )
        .await
        .unwrap();

        assert!(release(&db, 1, "s-1").await.unwrap());
        // Second release finds nothing to do.
        assert!(!release(&db, 1, "s-1").await.unwrap());
        // A non-holder cannot release someone else's lease.
        checkout(
            &db,
            1,
            "s-2",
            "2026-01-01T00:01:00.000Z",
            "2025-12-31T23:31:00.000Z",
            1800,
        )
        .await
        .unwrap();
        assert!(!release(&db, 1, "s-1").await.unwrap());
        let lease = get_lease(&db, 1).await.unwrap().unwrap();
        assert_eq!(lease.session_id.as_deref(), Some("s-2"));
    }
}
