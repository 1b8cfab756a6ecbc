// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`KeyValueBackend`] implementations: SQLite on disk and an in-memory map.

use std::collections::HashMap;

use async_trait::async_trait;
use lumen_core::types::now_iso8601;
use lumen_core::{AdapterType, HealthStatus, KeyValueBackend, LumenError, PluginAdapter};
use rusqlite::{OptionalExtension, params};
use tokio::sync::RwLock;
use tracing::debug;

use crate::database::{Database, map_tr_err};

/// Key-value entries stored in the `kv_entries` table.
pub struct SqliteBackend {
    db: Database,
}

impl SqliteBackend {
    pub async fn open(path: &str) -> Result<Self, LumenError> {
        Ok(Self {
            db: Database::open(path).await?,
        })
    }

    pub async fn open_in_memory() -> Result<Self, LumenError> {
        Ok(Self {
            db: Database::open_in_memory().await?,
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteBackend {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, LumenError> {
        self.db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), LumenError> {
        self.db.checkpoint().await?;
        debug!("shutdown: WAL checkpoint complete");
        Ok(())
    }
}

#[async_trait]
impl KeyValueBackend for SqliteBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, LumenError> {
        let key = key.to_string();
        self.db
            .connection()
            .call(move |conn| -> Result<Option<String>, rusqlite::Error> {
                conn.query_row(
                    "SELECT value FROM kv_entries WHERE key = ?1",
                    params![key],
                    |row| row.get(0),
                )
                .optional()
            })
            .await
            .map_err(map_tr_err)
    }

    async fn put_many(&self, entries: Vec<(String, String)>) -> Result<(), LumenError> {
        let now = now_iso8601();
        self.db
            .connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                let tx = conn.transaction()?;
                {
                    let mut stmt = tx.prepare(
                        "INSERT INTO kv_entries (key, value, updated_at) VALUES (?1, ?2, ?3)
                         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                    )?;
                    for (key, value) in &entries {
                        stmt.execute(params![key, value, now])?;
                    }
                }
                tx.commit()
            })
            .await
            .map_err(map_tr_err)
    }

    async fn delete_many(&self, keys: Vec<String>) -> Result<(), LumenError> {
        self.db
            .connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                let tx = conn.transaction()?;
                for key in &keys {
                    tx.execute("DELETE FROM kv_entries WHERE key = ?1", params![key])?;
                }
                tx.commit()
            })
            .await
            .map_err(map_tr_err)
    }
}

/// Process-local backend; contents vanish with the process.
#[derive(Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PluginAdapter for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, LumenError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), LumenError> {
        Ok(())
    }
}

#[async_trait]
impl KeyValueBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, LumenError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put_many(&self, entries: Vec<(String, String)>) -> Result<(), LumenError> {
        let mut map = self.entries.write().await;
        map.extend(entries);
        Ok(())
    }

    async fn delete_many(&self, keys: Vec<String>) -> Result<(), LumenError> {
        let mut map = self.entries.write().await;
        for key in keys {
            map.remove(&key);
        }
        Ok(())
    }
}
