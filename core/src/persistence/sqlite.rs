//! Key-value storage layer with `SQLite` implementation.

#![allow(clippy::significant_drop_tightening)] // Lock guards held across DB operations

use super::KeyValueStore;
use crate::{AttentionError, Result};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// SQL schema for the key-value table.
const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL
);
";

/// SQLite-backed key-value storage.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish()
    }
}

impl SqliteStore {
    /// Opens or creates the database at [`super::default_state_path`].
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the database
    /// cannot be opened or initialized.
    pub fn open_default() -> Result<Self> {
        Self::open(&super::default_state_path())
    }

    /// Opens or creates the database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrency
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| AttentionError::Persistence(format!("Failed to set WAL mode: {e}")))?;

        conn.execute_batch(SCHEMA)?;

        info!("Attention database opened at {:?}", path);

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens an in-memory database for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let value = conn
                .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                    row.get::<_, String>(0)
                })
                .optional()?;
            Ok::<_, AttentionError>(value)
        })
        .await
        .map_err(|e| AttentionError::Persistence(format!("Task join error: {e}")))?
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let key = key.to_string();
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            conn.execute(
                "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET
                     value = excluded.value,
                     updated_at = excluded.updated_at",
                params![key, value, Utc::now().timestamp()],
            )?;
            debug!("Stored key {}", key);
            Ok::<_, AttentionError>(())
        })
        .await
        .map_err(|e| AttentionError::Persistence(format!("Task join error: {e}")))?
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let key = key.to_string();
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let deleted = conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
            if deleted > 0 {
                debug!("Deleted key {}", key);
            }
            Ok::<_, AttentionError>(())
        })
        .await
        .map_err(|e| AttentionError::Persistence(format!("Task join error: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let store = SqliteStore::open_memory().expect("open memory db");
        assert_eq!(store.get("k").await.unwrap(), None);

        store.set("k", "one".to_string()).await.unwrap();
        store.set("k", "two".to_string()).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("two"));

        store.delete("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("attention.db");

        {
            let store = SqliteStore::open(&path).expect("open");
            store.set("focus", "{}".to_string()).await.unwrap();
        }

        let reopened = SqliteStore::open(&path).expect("reopen");
        assert_eq!(reopened.get("focus").await.unwrap().as_deref(), Some("{}"));
    }
}
