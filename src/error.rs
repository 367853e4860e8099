//! Error types shared by the page and panel contexts

use thiserror::Error;

/// Errors that can occur while synchronizing cursor state
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Channel closed")]
    ChannelClosed,

    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    #[error("Unknown frame type: {0}")]
    UnknownFrame(String),

    #[error("Invalid board URL: {0}")]
    InvalidBoardUrl(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type for synchronization operations
pub type SyncResult<T> = Result<T, SyncError>;
