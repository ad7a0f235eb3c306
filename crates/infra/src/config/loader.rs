//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `CERTPREP_DATA_DIR` is not set, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `CERTPREP_DATA_DIR`: Directory for locally persisted state (required)
//! - `CERTPREP_QUEUE_STORAGE_KEY`: Key the offline queue is stored under
//! - `CERTPREP_QUEUE_MAX_SIZE`: Maximum number of queued operations
//! - `CERTPREP_QUEUE_MAX_RETRIES`: Attempts allowed per operation
//! - `CERTPREP_QUEUE_AUTO_PROCESS`: Replay on enqueue and reconnect
//!   (true/false)
//! - `CERTPREP_QUEUE_DEVTOOLS`: Expose the queue to the debug hook
//!   (true/false)
//! - `CERTPREP_QUEUE_BASE_DELAY_MS`: Initial retry backoff in milliseconds
//! - `CERTPREP_QUEUE_MAX_DELAY_MS`: Backoff ceiling in milliseconds
//! - `CERTPREP_LOG_LEVEL`: `EnvFilter` directive
//! - `CERTPREP_LOG_JSON`: Emit JSON log lines (true/false)
//!
//! Optional variables fall back to the defaults in
//! [`certprep_domain::constants`].
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./certprep.json` or `./certprep.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. `../../config.json` or `../../config.toml` (grandparent directory)
//! 5. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use certprep_common::sync::QueueConfig;
use certprep_domain::{
    Config, LoggingSettings, QueueSettings, Result, StorageSettings, StudyError,
};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the required
/// variable is missing or a value is invalid, falls back to loading from a
/// config file.
///
/// # Errors
/// Returns `StudyError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// `CERTPREP_DATA_DIR` must be present; every other variable is optional.
///
/// # Errors
/// Returns `StudyError::Config` if the data directory is missing or a
/// numeric variable cannot be parsed.
pub fn load_from_env() -> Result<Config> {
    let data_dir = env_var("CERTPREP_DATA_DIR")?;
    let defaults = QueueSettings::default();

    let queue = QueueSettings {
        storage_key: std::env::var("CERTPREP_QUEUE_STORAGE_KEY")
            .unwrap_or(defaults.storage_key),
        max_queue_size: env_parse("CERTPREP_QUEUE_MAX_SIZE", defaults.max_queue_size)?,
        max_retries: env_parse("CERTPREP_QUEUE_MAX_RETRIES", defaults.max_retries)?,
        auto_process: env_bool("CERTPREP_QUEUE_AUTO_PROCESS", defaults.auto_process),
        expose_to_dev_tools: env_bool("CERTPREP_QUEUE_DEVTOOLS", defaults.expose_to_dev_tools),
        base_retry_delay_ms: env_parse(
            "CERTPREP_QUEUE_BASE_DELAY_MS",
            defaults.base_retry_delay_ms,
        )?,
        max_retry_delay_ms: env_parse("CERTPREP_QUEUE_MAX_DELAY_MS", defaults.max_retry_delay_ms)?,
    };

    let log_defaults = LoggingSettings::default();
    let logging = LoggingSettings {
        level: std::env::var("CERTPREP_LOG_LEVEL").unwrap_or(log_defaults.level),
        json: env_bool("CERTPREP_LOG_JSON", log_defaults.json),
    };

    Ok(Config { queue, storage: StorageSettings { data_dir }, logging })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `StudyError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(StudyError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            StudyError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| StudyError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| StudyError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| StudyError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(StudyError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches the current working directory (and up to two parents), then
/// the executable's directory.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidates_in(&cwd));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidates_in(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn candidates_in(dir: &Path) -> Vec<PathBuf> {
    vec![
        dir.join("config.json"),
        dir.join("config.toml"),
        dir.join("certprep.json"),
        dir.join("certprep.toml"),
        dir.join("../config.json"),
        dir.join("../config.toml"),
        dir.join("../../config.json"),
        dir.join("../../config.toml"),
    ]
}

/// Queue runtime configuration for the loaded settings
///
/// # Errors
/// Returns `StudyError::Config` when the resulting configuration fails
/// [`QueueConfig::validate`].
pub fn queue_config(settings: &QueueSettings) -> Result<QueueConfig> {
    let config = QueueConfig {
        storage_key: settings.storage_key.clone(),
        max_queue_size: settings.max_queue_size,
        max_retries: settings.max_retries,
        expose_to_dev_tools: settings.expose_to_dev_tools,
        auto_process: settings.auto_process,
        base_retry_delay: Duration::from_millis(settings.base_retry_delay_ms),
        max_retry_delay: Duration::from_millis(settings.max_retry_delay_ms),
    };
    config.validate().map_err(StudyError::Config)?;
    Ok(config)
}

/// Get required environment variable
///
/// # Errors
/// Returns `StudyError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        StudyError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Parse an optional numeric environment variable
fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| StudyError::Config(format!("Invalid value for {}: {}", key, e))),
        Err(_) => Ok(default),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
