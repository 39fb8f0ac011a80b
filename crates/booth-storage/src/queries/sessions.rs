// SPDX-FileCopyrightText: 2026 Booth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session CRUD and guarded state transitions.
//!
//! Every state-changing statement carries a `WHERE ... AND state = ?` guard
//! so that a transition observed-then-applied cannot race another writer.
//! Combined with the single background connection thread this gives
//! compare-and-swap semantics without row locks.

use booth_core::types::{Session, SessionState};
use booth_core::BoothError;
use rusqlite::params;

use crate::database::Database;
use crate::models::{session_from_row, SESSION_COLUMNS};

/// SQL fragment listing the terminal states.
const TERMINAL_STATES: &str = "('completed', 'discarded', 'expired')";

/// Outcome of a verification code submission, decided inside one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionResult {
    /// Code matched; session advanced to `photo_pending`.
    Verified,
    /// Code mismatched; the session remains awaiting with attempts recorded.
    Invalid { attempts_remaining: u32 },
    /// The code window had already closed; session force-expired.
    Expired,
    /// The attempt budget is spent; session force-expired.
    TooManyAttempts,
    /// No such session.
    NotFound,
    /// The session exists but is not awaiting a code.
    WrongState(SessionState),
}

/// Insert a freshly registered session and bump the created counter.
pub async fn insert_session(db: &Database, session: &Session) -> Result<(), BoothError> {
    let session = session.clone();
    db.call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO sessions (id, kiosk_id, guest_name, guest_phone, guest_email, consent,
                                   state, verification_code, code_expires_at,
                                   verification_attempts, photo, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                session.id,
                session.kiosk_id,
                session.guest_name,
                session.guest_phone,
                session.guest_email,
                session.consent,
                session.state.to_string(),
                session.verification_code,
                session.code_expires_at,
                session.verification_attempts,
                session.photo,
                session.created_at,
                session.updated_at,
            ],
        )?;
        tx.execute(
            "UPDATE counters SET value = value + 1 WHERE name = 'total_created'",
            [],
        )?;
        tx.commit()?;
        Ok(())
    })
    .await
}

/// Get a session by id.
pub async fn get_session(db: &Database, id: &str) -> Result<Option<Session>, BoothError> {
    let id = id.to_string();
    db.call(move |conn| {
        let mut stmt = conn.prepare(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"
        ))?;
        let result = stmt.query_row(params![id], session_from_row);
        match result {
            Ok(session) => Ok(Some(session)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    })
    .await
}

/// Find the session currently awaiting the given verification code.
///
/// Only matches sessions whose code is still live at `now`; a code at its
/// exact expiry instant is already dead, so the guard is strictly greater.
pub async fn find_by_code(
    db: &Database,
    code: &str,
    now: &str,
) -> Result<Option<Session>, BoothError> {
    let code = code.to_string();
    let now = now.to_string();
    db.call(move |conn| {
        let mut stmt = conn.prepare(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions
             WHERE verification_code = ?1
               AND state = 'awaiting_verification'
               AND code_expires_at > ?2"
        ))?;
        let result = stmt.query_row(params![code, now], session_from_row);
        match result {
            Ok(session) => Ok(Some(session)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    })
    .await
}

/// Find the live (non-terminal) session bound to a kiosk, if any.
pub async fn find_live_by_kiosk(
    db: &Database,
    kiosk_id: u16,
) -> Result<Option<Session>, BoothError> {
    db.call(move |conn| {
        let mut stmt = conn.prepare(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions
             WHERE kiosk_id = ?1 AND state NOT IN {TERMINAL_STATES}
             ORDER BY created_at DESC LIMIT 1"
        ))?;
        let result = stmt.query_row(params![kiosk_id], session_from_row);
        match result {
            Ok(session) => Ok(Some(session)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    })
    .await
}

/// Issue a verification code: `registered` -> `awaiting_verification`.
///
/// Returns `false` when the session has already left `registered`.
pub async fn issue_code(
    db: &Database,
    id: &str,
    code: &str,
    expires_at: &str,
    now: &str,
) -> Result<bool, BoothError> {
    let id = id.to_string();
    let code = code.to_string();
    let expires_at = expires_at.to_string();
    let now = now.to_string();
    db.call(move |conn| {
        let n = conn.execute(
            "UPDATE sessions SET state = 'awaiting_verification', verification_code = ?1,
                    code_expires_at = ?2, verification_attempts = 0, updated_at = ?3
             WHERE id = ?4 AND state = 'registered'",
            params![code, expires_at, now, id],
        )?;
        Ok(n > 0)
    })
    .await
}

/// Discard the reviewed photo: `review_pending` -> `discarded`, blob cleared.
pub async fn discard_photo(db: &Database, id: &str, now: &str) -> Result<bool, BoothError> {
    let id = id.to_string();
    let now = now.to_string();
    db.call(move |conn| {
        let n = conn.execute(
            "UPDATE sessions SET photo = NULL, state = 'discarded', updated_at = ?1
             WHERE id = ?2 AND state = 'review_pending'",
            params![now, id],
        )?;
        Ok(n > 0)
    })
    .await
}

/// Guarded state transition: move `id` from `from` to `to`.
///
/// Returns `false` when the session was not in `from` (lost the race or
/// never existed); the row is untouched in that case.
pub async fn transition_state(
    db: &Database,
    id: &str,
    from: SessionState,
    to: SessionState,
    now: &str,
) -> Result<bool, BoothError> {
    let id = id.to_string();
    let now = now.to_string();
    db.call(move |conn| {
        let n = conn.execute(
            "UPDATE sessions SET state = ?1, updated_at = ?2 WHERE id = ?3 AND state = ?4",
            params![to.to_string(), now, id, from.to_string()],
        )?;
        Ok(n > 0)
    })
    .await
}

/// Attach the captured photo and advance `photo_pending` -> `review_pending`.
///
/// Bumps the photo counter only when the guard passes.
pub async fn attach_photo(
    db: &Database,
    id: &str,
    photo: Vec<u8>,
    now: &str,
) -> Result<bool, BoothError> {
    let id = id.to_string();
    let now = now.to_string();
    db.call(move |conn| {
        let tx = conn.transaction()?;
        let n = tx.execute(
            "UPDATE sessions SET photo = ?1, state = 'review_pending', updated_at = ?2
             WHERE id = ?3 AND state = 'photo_pending'",
            params![photo, now, id],
        )?;
        if n > 0 {
            tx.execute(
                "UPDATE counters SET value = value + 1 WHERE name = 'total_photos_taken'",
                [],
            )?;
        }
        tx.commit()?;
        Ok(n > 0)
    })
    .await
}

/// Drop the photo and return to `photo_pending` for another capture.
pub async fn clear_photo_for_retake(
    db: &Database,
    id: &str,
    now: &str,
) -> Result<bool, BoothError> {
    let id = id.to_string();
    let now = now.to_string();
    db.call(move |conn| {
        let n = conn.execute(
            "UPDATE sessions SET photo = NULL, state = 'photo_pending', updated_at = ?1
             WHERE id = ?2 AND state = 'review_pending'",
            params![now, id],
        )?;
        Ok(n > 0)
    })
    .await
}

/// Decide and apply a verification code submission in one transaction.
///
/// The decision (window check, attempt budget, code comparison) and the
/// resulting writes commit atomically, so two concurrent submissions of
/// the same code cannot both observe `Verified`. A force-expiry also
/// releases the kiosk lease held by the session.
pub async fn apply_code_submission(
    db: &Database,
    id: &str,
    submitted: &str,
    now: &str,
    max_attempts: u32,
) -> Result<SubmissionResult, BoothError> {
    let id = id.to_string();
    let submitted = submitted.to_string();
    let now = now.to_string();
    db.call(move |conn| {
        let tx = conn.transaction()?;

        let row: Option<(String, Option<String>, Option<String>, u32)> = {
            let mut stmt = tx.prepare(
                "SELECT state, verification_code, code_expires_at, verification_attempts
                 FROM sessions WHERE id = ?1",
            )?;
            match stmt.query_row(params![id], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            }) {
                Ok(r) => Some(r),
                Err(rusqlite::Error::QueryReturnedNoRows) => None,
                Err(e) => return Err(e),
            }
        };

        let Some((state, code, expires_at, attempts)) = row else {
            return Ok(SubmissionResult::NotFound);
        };

        if state != SessionState::AwaitingVerification.to_string() {
            // Stored states always parse; treat corruption as internal.
            let parsed = state
                .parse::<SessionState>()
                .unwrap_or(SessionState::Expired);
            return Ok(SubmissionResult::WrongState(parsed));
        }

        // The boundary instant belongs to the expired side of the window.
        let window_closed = expires_at.as_deref().is_none_or(|exp| now.as_str() >= exp);
        if window_closed {
            force_expire_in_tx(&tx, &id, &now)?;
            tx.commit()?;
            return Ok(SubmissionResult::Expired);
        }

        let attempts = attempts + 1;

        if code.as_deref() == Some(submitted.as_str()) {
            tx.execute(
                "UPDATE sessions SET state = 'photo_pending', verification_code = NULL,
                        code_expires_at = NULL, verification_attempts = ?1, updated_at = ?2
                 WHERE id = ?3 AND state = 'awaiting_verification'",
                params![attempts, now, id],
            )?;
            tx.execute(
                "UPDATE counters SET value = value + 1 WHERE name = 'total_verified'",
                [],
            )?;
            tx.commit()?;
            return Ok(SubmissionResult::Verified);
        }

        if attempts >= max_attempts {
            force_expire_in_tx(&tx, &id, &now)?;
            tx.commit()?;
            return Ok(SubmissionResult::TooManyAttempts);
        }

        tx.execute(
            "UPDATE sessions SET verification_attempts = ?1, updated_at = ?2
             WHERE id = ?3 AND state = 'awaiting_verification'",
            params![attempts, now, id],
        )?;
        tx.commit()?;
        Ok(SubmissionResult::Invalid {
            attempts_remaining: max_attempts - attempts,
        })
    })
    .await
}

/// Expire a session and free its kiosk within an open transaction.
fn force_expire_in_tx(
    tx: &rusqlite::Transaction<'_>,
    id: &str,
    now: &str,
) -> Result<(), rusqlite::Error> {
    tx.execute(
        "UPDATE sessions SET state = 'expired', verification_code = NULL,
                code_expires_at = NULL, updated_at = ?1
         WHERE id = ?2",
        params![now, id],
    )?;
    tx.execute(
        "UPDATE kiosks SET status = 'available', session_id = NULL, leased_at = NULL
         WHERE session_id = ?1",
        params![id],
    )?;
    Ok(())
}

/// Expire a single session by id and release its kiosk.
///
/// Used by the lazy sweep when a read observes a session past its window.
pub async fn force_expire(db: &Database, id: &str, now: &str) -> Result<(), BoothError> {
    let id = id.to_string();
    let now = now.to_string();
    db.call(move |conn| {
        let tx = conn.transaction()?;
        force_expire_in_tx(&tx, &id, &now)?;
        tx.commit()?;
        Ok(())
    })
    .await
}

/// Expire every awaiting session whose code window closed at or before `now`,
/// releasing their kiosks. Returns how many sessions were expired.
pub async fn expire_lapsed_codes(db: &Database, now: &str) -> Result<usize, BoothError> {
    let now = now.to_string();
    db.call(move |conn| {
        let tx = conn.transaction()?;
        let ids: Vec<String> = {
            let mut stmt = tx.prepare(
                "SELECT id FROM sessions
                 WHERE state = 'awaiting_verification' AND code_expires_at <= ?1",
            )?;
            let rows = stmt.query_map(params![now], |row| row.get(0))?;
            rows.collect::<Result<_, _>>()?
        };
        for id in &ids {
            force_expire_in_tx(&tx, id, &now)?;
        }
        tx.commit()?;
        Ok(ids.len())
    })
    .await
}

/// Delete terminal sessions last touched before `cutoff`.
///
/// Terminal rows are kept around long enough for the guest's final status
/// read, then purged to bound table growth. Counters are unaffected.
pub async fn purge_terminal_before(db: &Database, cutoff: &str) -> Result<usize, BoothError> {
    let cutoff = cutoff.to_string();
    db.call(move |conn| {
        let n = conn.execute(
            &format!(
                "DELETE FROM sessions WHERE state IN {TERMINAL_STATES} AND updated_at < ?1"
            ),
            params![cutoff],
        )?;
        Ok(n)
    })
    .await
}

/// Most recently created sessions, newest first.
pub async fn recent_sessions(db: &Database, limit: u32) -> Result<Vec<Session>, BoothError> {
    db.call(move |conn| {
        let mut stmt = conn.prepare(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions ORDER BY created_at DESC LIMIT ?1"
        ))?;
        let rows = stmt.query_map(params![limit], session_from_row)?;
        rows.collect::<Result<_, _>>()
    })
    .await
}

/// Count live (non-terminal) sessions.
pub async fn count_live(db: &Database) -> Result<u64, BoothError> {
    db.call(move |conn| {
        conn.query_row(
            &format!("SELECT COUNT(*) FROM sessions WHERE state NOT IN {TERMINAL_STATES}"),
            [],
            |row| row.get(0),
        )
    })
    .await
}

/// Delete all sessions. Counters and leases are reset by the caller.
pub async fn delete_all(db: &Database) -> Result<usize, BoothError> {
    db.call(|conn| conn.execute("DELETE FROM sessions", [])).await
}
