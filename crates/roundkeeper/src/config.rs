//! Host-level configuration, loaded from a JSON file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use roundkeeper_round::RegistryConfig;
use roundkeeper_tick::TickConfig;
use serde::{Deserialize, Serialize};

use crate::RoundkeeperError;

/// Everything a [`RoundHost`](crate::RoundHost) needs to know up front.
///
/// Every field has a default, so a config file only lists what it changes:
///
/// ```json
/// { "namespace": "minigames", "registry": { "immediate_writes": false } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Scopes stored documents and notifications.
    pub namespace: String,
    /// Parent directory of the namespace's document directory.
    pub data_dir: PathBuf,
    /// Milliseconds between ticks. Phase limits count ticks, so anything
    /// other than 1000 speeds up or slows down every round.
    pub tick_interval_ms: u64,
    pub registry: RegistryConfig,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            data_dir: PathBuf::from("data"),
            tick_interval_ms: 1_000,
            registry: RegistryConfig::default(),
        }
    }
}

impl HostConfig {
    /// Reads a config file. Missing fields fall back to their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RoundkeeperError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| RoundkeeperError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| RoundkeeperError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Directory holding this namespace's documents.
    pub fn store_dir(&self) -> PathBuf {
        self.data_dir.join(&self.namespace)
    }

    pub fn tick_config(&self) -> TickConfig {
        TickConfig::with_interval(Duration::from_millis(self.tick_interval_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_tick_once_per_second() {
        let config = HostConfig::default();
        assert_eq!(config.tick_config().interval, Duration::from_secs(1));
        assert_eq!(config.store_dir(), PathBuf::from("data").join("default"));
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config: HostConfig =
            serde_json::from_str(r#"{"namespace":"minigames","registry":{"immediate_writes":false}}"#)
                .unwrap();
        assert_eq!(config.namespace, "minigames");
        assert_eq!(config.tick_interval_ms, 1_000);
        assert!(!config.registry.immediate_writes);
        assert_eq!(config.registry.default_round, Default::default());
    }
}
