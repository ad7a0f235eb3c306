//! Error vocabulary shared by the offline write pipeline
//!
//! [`CommonError`] covers the failures that show up in more than one place:
//! poisoned queue state, JSON encoding of the persisted queue, key-value
//! store writes, and the remote study store refusing or missing a replay.
//! Module errors such as `QueueError` wrap it instead of repeating it.
//!
//! Whether a failure is worth another attempt is a property of the error
//! ([`ErrorClassification::is_retryable`]); the offline queue builds its
//! retry condition from it, so a replay the store rejected stops at once
//! while lost connectivity keeps backing off.
//!
//! ```rust,ignore
//! #[derive(Debug, Clone, Error)]
//! pub enum QueueError {
//!     #[error(transparent)]
//!     Common(#[from] CommonError),
//!
//!     #[error("Offline queue is full ({0} operations)")]
//!     CapacityExceeded(usize),
//! }
//!
//! impl_error_conversion!(QueueError, Common);
//! impl_error_classification!(QueueError, Common,
//!     Self::CapacityExceeded(_) => true,
//! );
//! ```

use std::time::Duration;

use thiserror::Error;

/// Standard result type using CommonError
pub type CommonResult<T> = Result<T, CommonError>;

/// Failures shared across the queue, its storage and the store adapter
///
/// The `Display` text is what ends up in a queued operation's `lastError`,
/// so the formats below are part of the persisted data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommonError {
    /// Invalid queue, retry or storage settings
    #[error("Configuration error{}: {message}", scope(" in field ", .field.as_deref()))]
    Config { message: String, field: Option<String> },

    /// Poisoned queue state or a contended writer
    #[error("Lock error: {message}")]
    Lock { message: String },

    /// The persisted queue could not be encoded or decoded
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// The key-value store refused a read or write (quota, disabled storage)
    #[error("Persistence error{}: {message}", scope(" during ", .operation.as_deref()))]
    Persistence { message: String, operation: Option<String> },

    #[error("Operation '{operation}' timed out after {duration:?}")]
    Timeout { operation: String, duration: Duration },

    /// The remote study store failed a call; `is_retryable` is set by
    /// whoever saw the original failure
    #[error("Backend error from '{service}': {message}")]
    Backend { service: String, message: String, is_retryable: bool },

    #[error("Validation error for field '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("{resource_type} not found{}", scope(": ", .identifier.as_deref()))]
    NotFound { resource_type: String, identifier: Option<String> },

    /// Broken queue invariant
    #[error("Internal error: {message}")]
    Internal { message: String },
}

fn scope(prefix: &str, value: Option<&str>) -> String {
    value.map(|v| format!("{prefix}'{v}'")).unwrap_or_default()
}

impl CommonError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), field: None }
    }

    /// Configuration error naming the offending setting
    pub fn config_field<S: Into<String>, F: Into<String>>(field: F, message: S) -> Self {
        Self::Config { message: message.into(), field: Some(field.into()) }
    }

    pub fn lock<S: Into<String>>(message: S) -> Self {
        Self::Lock { message: message.into() }
    }

    pub fn serialization<S: Into<String>>(message: S) -> Self {
        Self::Serialization { message: message.into() }
    }

    pub fn persistence<S: Into<String>>(message: S) -> Self {
        Self::Persistence { message: message.into(), operation: None }
    }

    /// Persistence error for one store call (`get`, `set`, `remove`, ...)
    pub fn persistence_op<S: Into<String>, O: Into<String>>(operation: O, message: S) -> Self {
        Self::Persistence { message: message.into(), operation: Some(operation.into()) }
    }

    pub fn timeout<S: Into<String>>(operation: S, duration: Duration) -> Self {
        Self::Timeout { operation: operation.into(), duration }
    }

    /// Remote store failure; pass `is_retryable = true` only for failures
    /// a later attempt can fix
    pub fn backend<S: Into<String>, M: Into<String>>(
        service: S,
        message: M,
        is_retryable: bool,
    ) -> Self {
        Self::Backend { service: service.into(), message: message.into(), is_retryable }
    }

    pub fn validation<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::Validation { field: field.into(), message: message.into() }
    }

    pub fn not_found<T: Into<String>>(resource_type: T) -> Self {
        Self::NotFound { resource_type: resource_type.into(), identifier: None }
    }

    pub fn not_found_with_id<T: Into<String>, I: Into<String>>(
        resource_type: T,
        identifier: I,
    ) -> Self {
        Self::NotFound { resource_type: resource_type.into(), identifier: Some(identifier.into()) }
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal { message: message.into() }
    }
}

/// Whether an error is worth another attempt
///
/// Read by the retry executor through
/// `RetryPolicies::classified_condition`.
pub trait ErrorClassification {
    /// Transient failures: lost connectivity, timeouts, lock contention
    fn is_retryable(&self) -> bool;
}

impl ErrorClassification for CommonError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Lock { .. } => true,
            Self::Backend { is_retryable, .. } => *is_retryable,
            Self::Config { .. }
            | Self::Serialization { .. }
            | Self::Persistence { .. }
            | Self::Validation { .. }
            | Self::NotFound { .. }
            | Self::Internal { .. } => false,
        }
    }
}

impl From<serde_json::Error> for CommonError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("invalid JSON: {err}"))
    }
}

impl From<std::io::Error> for CommonError {
    fn from(err: std::io::Error) -> Self {
        Self::persistence(err.to_string())
    }
}

/// Route `serde_json` and `std::io` errors into a module error through its
/// `CommonError` variant
///
/// ```rust,ignore
/// impl_error_conversion!(QueueError, Common);
/// ```
#[macro_export]
macro_rules! impl_error_conversion {
    ($error_type:ty, $variant:ident) => {
        impl From<serde_json::Error> for $error_type {
            fn from(err: serde_json::Error) -> Self {
                Self::$variant($crate::error::CommonError::from(err))
            }
        }

        impl From<std::io::Error> for $error_type {
            fn from(err: std::io::Error) -> Self {
                Self::$variant($crate::error::CommonError::from(err))
            }
        }
    };
}

/// Implement [`ErrorClassification`] for a module error: the wrapped
/// `CommonError` variant delegates, every other variant is listed with its
/// own answer.
///
/// ```rust,ignore
/// impl_error_classification!(QueueError, Common,
///     Self::CapacityExceeded(_) => true,
///     Self::InvalidState(_) => false,
/// );
/// ```
#[macro_export]
macro_rules! impl_error_classification {
    (
        $error_type:ty,
        $common_variant:ident
        $(, $variant:pat => $retryable:expr)*
        $(,)?
    ) => {
        impl $crate::error::ErrorClassification for $error_type {
            fn is_retryable(&self) -> bool {
                match self {
                    Self::$common_variant(e) => $crate::error::ErrorClassification::is_retryable(e),
                    $(
                        $variant => $retryable,
                    )*
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Validates `CommonError` display behavior for the optional scope
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms a named field, store call or identifier is quoted.
    /// - Confirms the plain form is used when none is given.
    #[test]
    fn test_scoped_display() {
        assert_eq!(
            CommonError::config_field("max_retries", "must be at least 1").to_string(),
            "Configuration error in field 'max_retries': must be at least 1"
        );
        assert_eq!(CommonError::config("no data dir").to_string(), "Configuration error: no data dir");
        assert_eq!(
            CommonError::persistence_op("set", "quota exceeded").to_string(),
            "Persistence error during 'set': quota exceeded"
        );
        assert_eq!(CommonError::persistence("disk full").to_string(), "Persistence error: disk full");
        assert_eq!(
            CommonError::not_found_with_id("queued_operation", "abc").to_string(),
            "queued_operation not found: 'abc'"
        );
        assert_eq!(CommonError::not_found("quiz").to_string(), "quiz not found");
    }

    /// Validates `ErrorClassification::is_retryable` behavior for the
    /// replay failure scenario.
    ///
    /// Assertions:
    /// - Confirms the backend flag decides for store failures.
    /// - Confirms lock and timeout failures retry.
    /// - Ensures storage and validation failures do not.
    #[test]
    fn test_retryable_classification() {
        assert!(CommonError::backend("study_store", "Failed to fetch", true).is_retryable());
        assert!(!CommonError::backend("study_store", "Permission denied", false).is_retryable());
        assert!(CommonError::lock("queue state poisoned").is_retryable());
        assert!(CommonError::timeout("create_quiz", Duration::from_secs(3)).is_retryable());
        assert!(!CommonError::persistence_op("set", "quota exceeded").is_retryable());
        assert!(!CommonError::validation("title", "must not be empty").is_retryable());
        assert!(!CommonError::internal("duplicate id").is_retryable());
    }

    #[test]
    fn test_from_serde_json_error() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json")
            .expect_err("input is malformed");
        let err = CommonError::from(parse_err);
        assert!(err.to_string().starts_with("Serialization error: invalid JSON:"));
    }
}
