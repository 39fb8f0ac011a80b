// SPDX-FileCopyrightText: 2026 Booth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery attempt records.

use booth_core::types::DeliveryRecord;
use booth_core::BoothError;
use rusqlite::params;

use crate::database::Database;
use crate::models::{delivery_from_row, DELIVERY_COLUMNS};

/// Append one delivery attempt record.
pub async fn insert_record(db: &Database, record: &DeliveryRecord) -> Result<(), BoothError> {
    let record = record.clone();
    db.call(move |conn| {
        conn.execute(
            "INSERT INTO deliveries (session_id, channel, attempted_at, outcome, provider_reference)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.session_id,
                record.channel.to_string(),
                record.attempted_at,
                record.outcome.to_string(),
                record.provider_reference,
            ],
        )?;
        Ok(())
    })
    .await
}

/// All attempts recorded for a session, oldest first.
pub async fn records_for_session(
    db: &Database,
    session_id: &str,
) -> Result<Vec<DeliveryRecord>, BoothError> {
    let session_id = session_id.to_string();
    db.call(move |conn| {
        let mut stmt = conn.prepare(&format!(
            "SELECT {DELIVERY_COLUMNS} FROM deliveries WHERE session_id = ?1 ORDER BY id"
        ))?;
        let rows = stmt.query_map(params![session_id], delivery_from_row)?;
        rows.collect::<Result<_, _>>()
    })
    .await
}

/// Count of attempts by outcome, for admin stats.
pub async fn count_by_outcome(db: &Database, outcome: &str) -> Result<u64, BoothError> {
    let outcome = outcome.to_string();
    db.call(move |conn| {
        conn.query_row(
            "SELECT COUNT(*) FROM deliveries WHERE outcome = ?1",
            params![outcome],
            |row| row.get(0),
        )
    })
    .await
}

/// Delete all delivery records. Used by the admin reset.
pub async fn delete_all(db: &Database) -> Result<usize, BoothError> {
    db.call(|conn| conn.execute("DELETE FROM deliveries", [])).await
}
