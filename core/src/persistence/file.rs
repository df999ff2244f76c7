//! JSON file store with atomic writes
//!
//! All keys live in one JSON object on disk. Writes are crash-safe via
//! write-to-temp + fsync + rename; a missing file reads as empty.

use super::KeyValueStore;
use crate::{AttentionError, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Key-value store backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl JsonFileStore {
    /// Uses the file at `path`; it is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn update<F>(&self, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>) + Send + 'static,
    {
        let _guard = self.lock.lock().await;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let mut values = read_values(&path)?;
            mutate(&mut values);
            write_values_atomic(&path, &values)
        })
        .await
        .map_err(|e| AttentionError::Persistence(format!("Task join error: {e}")))?
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().await;
        let path = self.path.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || {
            let mut values = read_values(&path)?;
            Ok::<_, AttentionError>(values.remove(&key))
        })
        .await
        .map_err(|e| AttentionError::Persistence(format!("Task join error: {e}")))?
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let key = key.to_string();
        self.update(move |values| {
            values.insert(key, value);
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let key = key.to_string();
        self.update(move |values| {
            values.remove(&key);
        })
        .await
    }
}

fn read_values(path: &Path) -> Result<BTreeMap<String, String>> {
    match fs::read_to_string(path) {
        Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
            AttentionError::Serialization(format!(
                "Failed to parse store {}: {}",
                path.display(),
                e
            ))
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
        Err(e) => Err(AttentionError::Persistence(format!(
            "Failed to read store {}: {}",
            path.display(),
            e
        ))),
    }
}

/// Atomically replace the store file.
///
/// Steps:
/// - Ensure parent directory exists
/// - Write JSON to a temp file in the same directory
/// - `flush` + `sync_all` on the temp file
/// - `rename` temp file over the destination
/// - Best-effort fsync of the directory to persist rename
fn write_values_atomic(path: &Path, values: &BTreeMap<String, String>) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            AttentionError::Persistence(format!(
                "Failed to create store dir {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    let tmp_path = path.with_extension("json.tmp");
    let json = serde_json::to_vec_pretty(values)?;

    {
        let mut f = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)
            .map_err(|e| {
                AttentionError::Persistence(format!(
                    "Failed to open temp store {}: {}",
                    tmp_path.display(),
                    e
                ))
            })?;
        f.write_all(&json).map_err(|e| {
            AttentionError::Persistence(format!(
                "Failed to write temp store {}: {}",
                tmp_path.display(),
                e
            ))
        })?;
        f.flush().ok();
        let _ = f.sync_all();
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        AttentionError::Persistence(format!(
            "Failed to replace store {} with {}: {}",
            path.display(),
            tmp_path.display(),
            e
        ))
    })?;

    if let Some(parent) = path.parent() {
        if let Ok(dir) = File::open(parent) {
            let _ = dir.sync_all();
        }
    }

    debug!("Wrote {} keys to {}", values.len(), path.display());
    Ok(())
}
