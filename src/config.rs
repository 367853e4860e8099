//! Runtime configuration
//!
//! Every field has a default so a partial (or missing) config file is fine.

use crate::error::{SyncError, SyncResult};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Interval between liveness pings sent to the panel
pub const DEFAULT_PING_INTERVAL_MS: u64 = 5_000;

/// Pages outside this prefix never activate the panel
pub const DEFAULT_BOARD_URL_PREFIX: &str = "https://app.conceptboard.com/board/";

/// Schema tag stored under `version`; a mismatch resets the global defaults
pub const SCHEMA_VERSION: &str = "1.1.4";

/// Name the panel uses when opening its link to the page
pub const DEFAULT_PORT_NAME: &str = "edit_cursors";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncConfig {
    pub ping_interval_ms: u64,
    pub board_url_prefix: String,
    pub schema_version: String,
    pub port_name: String,
    /// Backing file for the durable store. `None` keeps everything in memory.
    pub store_path: Option<PathBuf>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            ping_interval_ms: DEFAULT_PING_INTERVAL_MS,
            board_url_prefix: DEFAULT_BOARD_URL_PREFIX.to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            port_name: DEFAULT_PORT_NAME.to_string(),
            store_path: None,
        }
    }
}

impl SyncConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: SyncConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        config.validate()?;

        tracing::info!(
            "Loaded config from {} (ping_interval={}ms, schema={})",
            path.display(),
            config.ping_interval_ms,
            config.schema_version
        );
        Ok(config)
    }

    pub fn validate(&self) -> SyncResult<()> {
        if self.ping_interval_ms == 0 {
            return Err(SyncError::Configuration(
                "pingIntervalMs must be greater than zero".to_string(),
            ));
        }
        if self.port_name.is_empty() {
            return Err(SyncError::Configuration("portName must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"pingIntervalMs": 250}}"#).unwrap();

        let config = SyncConfig::load(file.path()).unwrap();
        assert_eq!(config.ping_interval(), Duration::from_millis(250));
        assert_eq!(config.board_url_prefix, DEFAULT_BOARD_URL_PREFIX);
        assert_eq!(config.schema_version, SCHEMA_VERSION);
        assert_eq!(config.port_name, DEFAULT_PORT_NAME);
        assert!(config.store_path.is_none());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"pingIntervalMs": 0}}"#).unwrap();

        assert!(SyncConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_empty_port_name_rejected() {
        let config = SyncConfig {
            port_name: String::new(),
            ..SyncConfig::default()
        };
        assert!(matches!(config.validate(), Err(SyncError::Configuration(_))));
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(SyncConfig::load(&dir.path().join("nope.json")).is_err());
    }
}
