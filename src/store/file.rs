//! JSON file backed storage
//!
//! The whole key space lives in one JSON object. Every committed write rewrites
//! the file through a temp file in the same directory followed by a rename, so
//! a crash leaves either the old or the new contents on disk.

use super::backend::{MemoryBackend, RawChange, StorageBackend};
use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::{broadcast, Mutex};

pub struct FileBackend {
    path: PathBuf,
    entries: MemoryBackend,
    // Serializes commit + persist + publish so the file and the
    // notification stream agree on the order of writes
    write_lock: Mutex<()>,
}

impl FileBackend {
    /// Open (or lazily create) the store file at `path`
    pub async fn open(path: impl Into<PathBuf>) -> SyncResult<Self> {
        let path = path.into();
        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => HashMap::new(),
            Ok(bytes) => serde_json::from_slice::<HashMap<String, Value>>(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::info!("Opened store {:?} ({} keys)", path, entries.len());

        Ok(Self {
            path,
            entries: MemoryBackend::with_entries(entries),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(path: &Path, data: &[u8]) -> SyncResult<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| SyncError::Io(e.error))?;
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for FileBackend {
    async fn get(&self, key: &str) -> SyncResult<Option<Value>> {
        self.entries.get(key).await
    }

    async fn set(&self, key: &str, value: Value) -> SyncResult<()> {
        let _guard = self.write_lock.lock().await;

        let mut staged = self.entries.snapshot();
        if staged.get(key) == Some(&value) {
            return Ok(());
        }
        staged.insert(key.to_string(), value.clone());

        // Memory only takes the value once it is on disk
        let data = serde_json::to_vec_pretty(&staged)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || Self::persist(&path, &data))
            .await
            .map_err(|e| SyncError::Storage(format!("persist task failed: {}", e)))??;

        let Some(change) = self.entries.commit(key, value) else {
            return Ok(());
        };
        tracing::debug!("Persisted {} to {:?}", change.key, self.path);
        self.entries.publish(change);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<RawChange> {
        self.entries.subscribe()
    }
}
