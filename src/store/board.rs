use super::backend::{RawChange, StorageBackend};
use super::key::{BoardId, StoreKey};
use crate::error::SyncResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;

/// A committed change to one key of this board
#[derive(Debug, Clone, PartialEq)]
pub struct StoreChange {
    pub key: StoreKey,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
}

impl StoreChange {
    /// Decode the new value; absent or undecodable values yield `None`
    pub fn new_as<T: DeserializeOwned>(&self) -> Option<T> {
        decode(self.key, self.new_value.clone())
    }

    pub fn old_as<T: DeserializeOwned>(&self) -> Option<T> {
        decode(self.key, self.old_value.clone())
    }
}

fn decode<T: DeserializeOwned>(key: StoreKey, value: Option<Value>) -> Option<T> {
    let value = value?;
    match serde_json::from_value(value) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            tracing::warn!("Ignoring undecodable value under {}: {}", key, e);
            None
        }
    }
}

/// Storage view scoped to one board
#[derive(Clone)]
pub struct BoardStore {
    backend: Arc<dyn StorageBackend>,
    board: BoardId,
}

impl BoardStore {
    pub fn new(backend: Arc<dyn StorageBackend>, board: BoardId) -> Self {
        Self { backend, board }
    }

    pub fn board(&self) -> &BoardId {
        &self.board
    }

    pub async fn get<T: DeserializeOwned>(&self, key: StoreKey) -> SyncResult<Option<T>> {
        match self.backend.get(&self.board.scoped(key)).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub async fn set<T: Serialize>(&self, key: StoreKey, value: &T) -> SyncResult<()> {
        let value = serde_json::to_value(value)?;
        self.backend.set(&self.board.scoped(key), value).await
    }

    /// Changes to this board's keys committed after this call
    pub fn subscribe(&self) -> BoardSubscription {
        BoardSubscription {
            board: self.board.clone(),
            rx: self.backend.subscribe(),
        }
    }
}

pub struct BoardSubscription {
    board: BoardId,
    rx: broadcast::Receiver<RawChange>,
}

impl BoardSubscription {
    /// Next change for this board, or `None` once the backend is gone
    ///
    /// Cancel-safe. A lagging subscriber skips the dropped notifications and
    /// continues with the next retained one.
    pub async fn recv(&mut self) -> Option<StoreChange> {
        loop {
            match self.rx.recv().await {
                Ok(raw) => {
                    if let Some(change) = self.scope(raw) {
                        return Some(change);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        "Store subscriber for {} lagged, skipped {} changes",
                        self.board,
                        skipped
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    fn scope(&self, raw: RawChange) -> Option<StoreChange> {
        let key = self.board.unscope(&raw.key)?;
        Some(StoreChange {
            key,
            old_value: raw.old_value,
            new_value: raw.new_value,
        })
    }
}
