//! Tracing subscriber bootstrap
//!
//! `RUST_LOG` wins over the configured level when it is set, so a single
//! run can be made verbose without editing the config file.

use certprep_domain::{LoggingSettings, Result, StudyError};
use tracing_subscriber::EnvFilter;

/// Build the event filter for `settings`
///
/// # Errors
/// Returns `StudyError::Config` if neither `RUST_LOG` nor the configured
/// level is a valid filter directive.
pub fn env_filter(settings: &LoggingSettings) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&settings.level).map_err(|e| {
        StudyError::Config(format!("Invalid log level '{}': {}", settings.level, e))
    })
}

/// Install the global fmt subscriber
///
/// Returns `Ok(false)` when a global subscriber was already installed; the
/// existing one is left in place.
///
/// # Errors
/// Returns `StudyError::Config` for an invalid filter directive.
pub fn init_tracing(settings: &LoggingSettings) -> Result<bool> {
    let filter = env_filter(settings)?;

    let installed = if settings.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).with_target(true).try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).with_target(true).try_init()
    };

    match installed {
        Ok(()) => {
            tracing::debug!(level = %settings.level, json = settings.json, "logging.initialized");
            Ok(true)
        }
        Err(_) => Ok(false),
    }
}
