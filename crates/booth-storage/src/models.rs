// SPDX-FileCopyrightText: 2026 Booth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row mapping helpers for the domain types stored in SQLite.

use std::str::FromStr;

use booth_core::types::{
    DeliveryChannel, DeliveryOutcome, DeliveryRecord, KioskLease, LeaseStatus, Session,
    SessionState,
};
use rusqlite::types::Type;
use rusqlite::Row;

/// Parse a stored enum text column, surfacing corruption as a conversion error.
fn parse_enum<T: FromStr>(value: String, idx: usize) -> Result<T, rusqlite::Error>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    T::from_str(&value)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Map a full `sessions` row. Column order must match [`SESSION_COLUMNS`].
pub fn session_from_row(row: &Row<'_>) -> Result<Session, rusqlite::Error> {
    Ok(Session {
        id: row.get(0)?,
        kiosk_id: row.get(1)?,
        guest_name: row.get(2)?,
        guest_phone: row.get(3)?,
        guest_email: row.get(4)?,
        consent: row.get(5)?,
        state: parse_enum::<SessionState>(row.get(6)?, 6)?,
        verification_code: row.get(7)?,
        code_expires_at: row.get(8)?,
        verification_attempts: row.get(9)?,
        photo: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

/// The canonical select list for `sessions` rows.
pub const SESSION_COLUMNS: &str = "id, kiosk_id, guest_name, guest_phone, guest_email, consent, \
     state, verification_code, code_expires_at, verification_attempts, photo, \
     created_at, updated_at";

/// Map a full `kiosks` row.
pub fn lease_from_row(row: &Row<'_>) -> Result<KioskLease, rusqlite::Error> {
    Ok(KioskLease {
        kiosk_id: row.get(0)?,
        status: parse_enum::<LeaseStatus>(row.get(1)?, 1)?,
        session_id: row.get(2)?,
        leased_at: row.get(3)?,
        location: row.get(4)?,
    })
}

/// The canonical select list for `kiosks` rows.
pub const LEASE_COLUMNS: &str = "kiosk_id, status, session_id, leased_at, location";

/// Map a `deliveries` row (sans the synthetic primary key).
pub fn delivery_from_row(row: &Row<'_>) -> Result<DeliveryRecord, rusqlite::Error> {
    Ok(DeliveryRecord {
        session_id: row.get(0)?,
        channel: parse_enum::<DeliveryChannel>(row.get(1)?, 1)?,
        attempted_at: row.get(2)?,
        outcome: parse_enum::<DeliveryOutcome>(row.get(3)?, 3)?,
        provider_reference: row.get(4)?,
    })
}

/// The canonical select list for `deliveries` rows.
pub const DELIVERY_COLUMNS: &str = "session_id, channel, attempted_at, outcome, provider_reference";
