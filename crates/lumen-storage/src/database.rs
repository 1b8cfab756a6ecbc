// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite connection management: PRAGMA setup, WAL mode and migrations.
//!
//! All access is serialized through tokio-rusqlite's single background
//! thread. Do not open extra connections for writes.

use std::path::Path;

use lumen_core::LumenError;
use tracing::debug;

/// Handle to the Lumen SQLite database.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Opens (creating if needed) the database at `path` and migrates it.
    pub async fn open(path: &str) -> Result<Self, LumenError> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(LumenError::storage)?;
            }
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(LumenError::storage)?;
        let db = Self { conn };
        db.prepare().await?;
        debug!(path, "database opened");
        Ok(db)
    }

    /// Opens a private in-memory database (tests, ephemeral runs).
    pub async fn open_in_memory() -> Result<Self, LumenError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(LumenError::storage)?;
        let db = Self { conn };
        db.prepare().await?;
        Ok(db)
    }

    async fn prepare(&self) -> Result<(), LumenError> {
        self.conn
            .call(|conn| -> Result<(), LumenError> {
                conn.execute_batch(
                    "PRAGMA journal_mode = WAL;
                     PRAGMA synchronous = NORMAL;
                     PRAGMA busy_timeout = 5000;",
                )
                .map_err(LumenError::storage)?;
                crate::migrations::run_migrations(conn)
            })
            .await
            .map_err(map_call_err)
    }

    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Flushes the WAL into the main database file.
    pub async fn checkpoint(&self) -> Result<(), LumenError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}

/// Maps a tokio-rusqlite failure around a plain rusqlite error.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> LumenError {
    LumenError::storage(e)
}

/// Unwraps a closure that already produced a [`LumenError`].
fn map_call_err(e: tokio_rusqlite::Error<LumenError>) -> LumenError {
    match e {
        tokio_rusqlite::Error::Error(inner) => inner,
        other => LumenError::Storage {
            source: other.to_string().into(),
        },
    }
}
