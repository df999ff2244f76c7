//! Persistence: key-value storage collaborator and versioned snapshots
//!
//! The engine treats durable storage as an opaque key-value store holding
//! JSON documents. In-memory state is the source of truth during a session;
//! the store only backs it across process restarts. Adapters:
//!
//! - [`MemoryStore`]: process-local map, for tests and ephemeral sessions
//! - [`JsonFileStore`]: one JSON document on disk, replaced atomically
//! - [`SqliteStore`]: `SQLite` table in WAL mode

mod file;
mod sqlite;

pub use file::JsonFileStore;
pub use sqlite::SqliteStore;

use crate::{AttentionError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use schema::AttentionBundle;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Key under which the bundle snapshot is stored.
pub const SNAPSHOT_KEY: &str = "attention.snapshot";

/// Key under which focus-mode settings are stored.
pub const FOCUS_KEY: &str = "attention.focus";

/// Trait for the external key-value storage collaborator.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one.
    async fn set(&self, key: &str, value: String) -> Result<()>;

    /// Remove a value. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Full attention state written to storage
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttentionSnapshot {
    /// Format version
    pub version: u32,
    /// When this snapshot was produced
    pub timestamp: DateTime<Utc>,
    /// Every tracked bundle, dismissed ones included
    pub bundles: Vec<AttentionBundle>,
}

impl AttentionSnapshot {
    /// Create a snapshot of the given bundles
    #[must_use]
    pub fn new(bundles: Vec<AttentionBundle>, timestamp: DateTime<Utc>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            timestamp,
            bundles,
        }
    }

    /// Serialize to JSON.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse and validate a stored snapshot.
    ///
    /// Returns `Err` for parse errors or an unsupported version so callers
    /// can recover by ignoring the snapshot and starting clean.
    pub fn decode(raw: &str) -> Result<Self> {
        let snap: Self = serde_json::from_str(raw)?;
        if snap.version != SNAPSHOT_VERSION {
            return Err(AttentionError::Serialization(format!(
                "Unsupported snapshot version {} (expected {})",
                snap.version, SNAPSHOT_VERSION
            )));
        }
        Ok(snap)
    }
}

/// Return a default state path.
///
/// Order:
/// - `BEACON_STATE_FILE` env var if provided
/// - `$HOME/.beacon/attention.db` if HOME exists
/// - `./beacon_attention.db` otherwise
pub fn default_state_path() -> PathBuf {
    if let Ok(p) = std::env::var("BEACON_STATE_FILE") {
        return PathBuf::from(p);
    }
    if let Some(home) = dirs_next::home_dir() {
        return home.join(".beacon").join("attention.db");
    }
    PathBuf::from("beacon_attention.db")
}

/// In-memory key-value store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        self.values.lock().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.values.lock().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.values.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.values.lock().await.remove(key);
        Ok(())
    }
}

#[async_trait]
impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        (**self).set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key).await
    }
}
