use std::sync::Arc;
use std::time::Duration;

use super::constants::CONNECTIVITY_MARKERS;
use super::{RetryCondition, RetryStrategy};
use crate::error::{CommonError, CommonResult, ErrorClassification};

/// Common retry policies for offline write replay
pub struct RetryPolicies;

impl RetryPolicies {
    /// Replay policy for queued writes: only connectivity failures are
    /// retried, everything else is returned on the first attempt.
    pub fn connectivity_policy() -> CommonResult<RetryStrategy> {
        Ok(RetryStrategy::new()
            .with_max_attempts(5)?
            .with_base_delay(Duration::from_secs(1))?
            .with_max_delay(Duration::from_secs(30))?
            .with_jitter_factor(0.3)
            .with_retry_condition(Self::connectivity_condition()))
    }

    /// Retry condition accepting only connectivity-class errors
    pub fn connectivity_condition() -> RetryCondition {
        RetryCondition::Custom(Arc::new(Self::is_connectivity_error))
    }

    /// Retry condition used by the offline queue
    ///
    /// A [`CommonError`] is retried only when it classifies as retryable,
    /// so a replay the store rejected outright stops after one attempt.
    pub fn classified_condition() -> RetryCondition {
        RetryCondition::Custom(Arc::new(Self::is_classified_retryable))
    }

    /// [`ErrorClassification::is_retryable`] for `CommonError`; any other
    /// error falls back to [`Self::is_connectivity_error`].
    pub fn is_classified_retryable(err: &(dyn std::error::Error + 'static)) -> bool {
        err.downcast_ref::<CommonError>()
            .map_or_else(|| Self::is_connectivity_error(err), ErrorClassification::is_retryable)
    }

    /// Check whether an error reads as a transient network/offline failure.
    ///
    /// The message of the error and of every error in its `source()` chain
    /// is matched case-insensitively against [`CONNECTIVITY_MARKERS`].
    /// Anything else (validation, permission, not-found) is terminal.
    pub fn is_connectivity_error(err: &(dyn std::error::Error + 'static)) -> bool {
        let mut current: Option<&dyn std::error::Error> = Some(err);
        while let Some(e) = current {
            if Self::message_is_connectivity(&e.to_string()) {
                return true;
            }
            current = e.source();
        }
        false
    }

    /// Same classification over a bare message
    pub fn message_is_connectivity(message: &str) -> bool {
        let lowered = message.to_lowercase();
        CONNECTIVITY_MARKERS.iter().any(|marker| lowered.contains(marker))
    }
}
