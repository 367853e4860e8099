//! Storage backend trait and the in-memory implementation

use crate::error::SyncResult;
use async_trait::async_trait;
use parking_lot::Mutex as ParkingMutex;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::broadcast;

/// Buffered notifications per subscriber before it starts lagging
const CHANGE_CAPACITY: usize = 256;

/// A committed change to one full (board-scoped) key
#[derive(Debug, Clone, PartialEq)]
pub struct RawChange {
    pub key: String,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
}

/// Key/value storage shared by the page and panel contexts
///
/// Every committed change is broadcast to all subscribers, the writer included.
/// Writing a value equal to the stored one commits nothing.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Last value set under `key`, if any
    async fn get(&self, key: &str) -> SyncResult<Option<Value>>;

    /// Store `value` under `key`
    async fn set(&self, key: &str, value: Value) -> SyncResult<()>;

    /// Receive every change committed after this call
    fn subscribe(&self) -> broadcast::Receiver<RawChange>;
}

pub struct MemoryBackend {
    entries: ParkingMutex<HashMap<String, Value>>,
    changes: broadcast::Sender<RawChange>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::with_entries(HashMap::new())
    }

    pub(crate) fn with_entries(entries: HashMap<String, Value>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            entries: ParkingMutex::new(entries),
            changes,
        }
    }

    /// Insert and return the change, or `None` if the value was already stored
    pub(crate) fn commit(&self, key: &str, value: Value) -> Option<RawChange> {
        let mut entries = self.entries.lock();
        let old_value = entries.insert(key.to_string(), value.clone());
        if old_value.as_ref() == Some(&value) {
            return None;
        }
        Some(RawChange {
            key: key.to_string(),
            old_value,
            new_value: Some(value),
        })
    }

    pub(crate) fn snapshot(&self) -> HashMap<String, Value> {
        self.entries.lock().clone()
    }

    pub(crate) fn publish(&self, change: RawChange) {
        // No subscribers is not an error
        let _ = self.changes.send(change);
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn get(&self, key: &str) -> SyncResult<Option<Value>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> SyncResult<()> {
        // Publish under the entries lock so notifications keep commit order
        let mut entries = self.entries.lock();
        let old_value = entries.insert(key.to_string(), value.clone());
        if old_value.as_ref() != Some(&value) {
            let _ = self.changes.send(RawChange {
                key: key.to_string(),
                old_value,
                new_value: Some(value),
            });
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<RawChange> {
        self.changes.subscribe()
    }
}
