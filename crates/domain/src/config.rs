//! Configuration structures
//!
//! Loaded by `certprep-infra::config` from the environment or a JSON/TOML
//! file. Every section has serde defaults, so a file only needs the keys it
//! wants to override; `storage.data_dir` is the one value deployments are
//! expected to set.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BASE_RETRY_DELAY_MS, DEFAULT_DATA_DIR, DEFAULT_LOG_LEVEL, DEFAULT_MAX_QUEUE_SIZE,
    DEFAULT_MAX_RETRIES, DEFAULT_MAX_RETRY_DELAY_MS, DEFAULT_QUEUE_STORAGE_KEY,
};

/// Top-level application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub queue: QueueSettings,
    pub storage: StorageSettings,
    pub logging: LoggingSettings,
}

/// Offline queue settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueSettings {
    pub storage_key: String,
    pub max_queue_size: usize,
    pub max_retries: u32,
    pub auto_process: bool,
    pub expose_to_dev_tools: bool,
    pub base_retry_delay_ms: u64,
    pub max_retry_delay_ms: u64,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_QUEUE_STORAGE_KEY.to_string(),
            max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
            auto_process: true,
            expose_to_dev_tools: true,
            base_retry_delay_ms: DEFAULT_BASE_RETRY_DELAY_MS,
            max_retry_delay_ms: DEFAULT_MAX_RETRY_DELAY_MS,
        }
    }
}

/// Local key-value storage settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory holding one file per storage key
    pub data_dir: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self { data_dir: DEFAULT_DATA_DIR.to_string() }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive, e.g. `info` or `certprep_common=debug`
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self { level: DEFAULT_LOG_LEVEL.to_string(), json: false }
    }
}
