// SPDX-FileCopyrightText: 2026 Booth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite connection management.
//!
//! All database access flows through a single `tokio_rusqlite::Connection`,
//! which owns one background thread executing closures in submission order.
//! That single-writer discipline is what makes guarded compare-and-swap
//! updates sufficient for lease checkout and code submission: two concurrent
//! callers are linearized before either transaction begins.

use booth_core::BoothError;

use crate::migrations;

/// Handle to the booth database. Cheap to clone; all clones share the
/// same background connection thread.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database at `path`, apply pragmas, and run
    /// pending migrations.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, BoothError> {
        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(storage_err)?;
        init_connection(&conn, wal_mode).await?;
        tracing::debug!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// Open an in-memory database. Used in tests.
    pub async fn open_in_memory() -> Result<Self, BoothError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(storage_err)?;
        init_connection(&conn, false).await?;
        Ok(Self { conn })
    }

    /// Run a closure against the underlying connection on its thread.
    ///
    /// The closure works in plain `rusqlite` terms; errors are wrapped into
    /// `BoothError::Storage` here so query modules never see the bridge type.
    pub async fn call<F, R>(&self, f: F) -> Result<R, BoothError>
    where
        F: FnOnce(&mut rusqlite::Connection) -> Result<R, rusqlite::Error> + Send + 'static,
        R: Send + 'static,
    {
        self.conn.call(f).await.map_err(map_tr_err)
    }

    /// Close the connection, flushing WAL.
    pub async fn close(self) -> Result<(), BoothError> {
        self.conn.close().await.map_err(map_tr_err)
    }
}

/// Apply pragmas and run migrations on a fresh connection.
///
/// Pragma and migration failures have different concrete types, so the
/// closure lifts both into `BoothError` before crossing the bridge.
async fn init_connection(
    conn: &tokio_rusqlite::Connection,
    wal_mode: bool,
) -> Result<(), BoothError> {
    conn.call(move |c| -> Result<(), BoothError> {
        if wal_mode {
            c.pragma_update(None, "journal_mode", "WAL")
                .map_err(storage_err)?;
        }
        c.pragma_update(None, "synchronous", "NORMAL")
            .map_err(storage_err)?;
        c.pragma_update(None, "foreign_keys", "ON")
            .map_err(storage_err)?;
        c.pragma_update(None, "busy_timeout", 5000)
            .map_err(storage_err)?;
        migrations::run_migrations(c).map_err(storage_err)?;
        Ok(())
    })
    .await
    .map_err(|e| match e {
        tokio_rusqlite::Error::Error(inner) => inner,
        other => BoothError::Storage {
            source: other.to_string().into(),
        },
    })
}

/// Wrap any concrete error into the workspace storage error.
pub(crate) fn storage_err<E>(e: E) -> BoothError
where
    E: std::error::Error + Send + Sync + 'static,
{
    BoothError::Storage {
        source: Box::new(e),
    }
}

/// Wrap a bridge error into the workspace storage error.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> BoothError {
    match e {
        tokio_rusqlite::Error::Error(inner) => storage_err(inner),
        other => BoothError::Storage {
            source: other.to_string().into(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_schema() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let db = Database::open(path.to_str().unwrap(), true).await.unwrap();

        let count: i64 = db
            .call(|conn| {
                conn.query_row("SELECT COUNT(*) FROM counters", [], |row| row.get(0))
            })
            .await
            .unwrap();
        assert_eq!(count, 3);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn reopen_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let db = Database::open(path.to_str().unwrap(), true).await.unwrap();
        db.close().await.unwrap();

        // Migrations already applied; second open must not fail.
        let db = Database::open(path.to_str().unwrap(), true).await.unwrap();
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn call_errors_surface_as_storage() {
        let db = Database::open_in_memory().await.unwrap();
        let err = db
            .call(|conn| {
                conn.query_row("SELECT value FROM no_such_table", [], |row| {
                    row.get::<_, i64>(0)
                })
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BoothError::Storage { .. }));
    }
}
