//! Board-scoped durable key/value store
//!
//! Both contexts talk to the same [`StorageBackend`]. Every key is namespaced
//! by the board it belongs to (`boardStorage_<board>#<key>`) so settings never
//! leak between boards, and every committed change is broadcast to every
//! subscriber, the writer included.

pub mod backend;
pub mod board;
pub mod file;
pub mod key;

pub use backend::{MemoryBackend, RawChange, StorageBackend};
pub use board::{BoardStore, BoardSubscription, StoreChange};
pub use file::FileBackend;
pub use key::{BoardId, StoreKey};

use crate::config::SyncConfig;
use crate::error::SyncResult;
use std::sync::Arc;

/// Backend selected by the configuration: the JSON file at `store_path` when
/// set, otherwise an in-memory store
pub async fn open_backend(config: &SyncConfig) -> SyncResult<Arc<dyn StorageBackend>> {
    match &config.store_path {
        Some(path) => Ok(Arc::new(FileBackend::open(path.clone()).await?)),
        None => {
            tracing::info!("No store path configured, keeping state in memory");
            Ok(Arc::new(MemoryBackend::new()))
        }
    }
}
