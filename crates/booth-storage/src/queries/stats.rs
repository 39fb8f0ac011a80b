// SPDX-FileCopyrightText: 2026 Booth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cumulative counters.
//!
//! Counters only ever move forward; session deletion and the periodic
//! purge never decrement them. The admin reset is the one sanctioned
//! way to zero them.

use booth_core::types::CumulativeStats;
use booth_core::BoothError;

use crate::database::Database;

/// Read the three lifetime counters.
pub async fn get_stats(db: &Database) -> Result<CumulativeStats, BoothError> {
    db.call(|conn| {
        let mut stats = CumulativeStats::default();
        let mut stmt = conn.prepare("SELECT name, value FROM counters")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?))
        })?;
        for row in rows {
            let (name, value) = row?;
            match name.as_str() {
                "total_created" => stats.total_created = value,
                "total_verified" => stats.total_verified = value,
                "total_photos_taken" => stats.total_photos_taken = value,
                _ => {}
            }
        }
        Ok(stats)
    })
    .await
}

/// Zero all counters. Admin reset only.
pub async fn reset_counters(db: &Database) -> Result<(), BoothError> {
    db.call(|conn| {
        conn.execute("UPDATE counters SET value = 0", [])?;
        Ok(())
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fresh_database_reports_zero() {
        let db = Database::open_in_memory().await.unwrap();
        let stats = get_stats(&db).await.unwrap();
        assert_eq!(stats, CumulativeStats::default());
    }

    #[tokio::test]
    async fn reset_zeroes_counters() {
        let db = Database::open_in_memory().await.unwrap();
        db.call(|conn| {
            conn.execute(
                "UPDATE counters SET value = 7 WHERE name = 'total_created'",
                [],
            )?;
            Ok(())
        })
        .await
        .unwrap();

        assert_eq!(get_stats(&db).await.unwrap().total_created, 7);
        reset_counters(&db).await.unwrap();
        assert_eq!(get_stats(&db).await.unwrap().total_created, 0);
    }
}
