//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for CertPrep
///
/// Returned by the remote study store and by the offline adapter wrapped
/// around it. `Network` is the only variant the adapter treats as "the
/// device is offline"; everything else is surfaced to the caller as is.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum StudyError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    /// The offline queue refused or lost the write
    #[error("Offline queue error: {0}")]
    Queue(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for CertPrep operations
pub type Result<T> = std::result::Result<T, StudyError>;
