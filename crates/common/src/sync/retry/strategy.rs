// Retry strategy with exponential backoff and jitter
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;
use tracing::{debug, error, warn};

use crate::error::{CommonError, CommonResult};
use crate::sync::retry::constants::{
    DEFAULT_BASE_DELAY, DEFAULT_JITTER_FACTOR, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY,
    MAX_BACKOFF_EXPONENT, MAX_MAX_ATTEMPTS, MIN_MAX_ATTEMPTS,
};

/// Type alias for error predicate function to reduce complexity
type ErrorPredicate = Arc<dyn Fn(&(dyn std::error::Error + 'static)) -> bool + Send + Sync>;

/// Retry strategy with configurable exponential backoff and jitter
///
/// `max_attempts` counts every invocation, the first one included. On
/// exhaustion the executor hands back the last error the operation produced
/// rather than wrapping it, so callers see the same failure they would have
/// seen without retries.
#[derive(Debug, Clone)]
pub struct RetryStrategy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    jitter_factor: f64,
    timeout: Option<Duration>,
    retry_on: RetryCondition,
}

/// Condition for determining if an error is retryable
pub enum RetryCondition {
    /// Retry all errors
    Always,
    /// Retry only errors accepted by the predicate
    Custom(ErrorPredicate),
}

impl Clone for RetryCondition {
    fn clone(&self) -> Self {
        match self {
            Self::Always => Self::Always,
            Self::Custom(f) => Self::Custom(Arc::clone(f)),
        }
    }
}

impl std::fmt::Debug for RetryCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Always => write!(f, "Always"),
            Self::Custom(_) => write!(f, "Custom(<function>)"),
        }
    }
}

impl Default for RetryCondition {
    fn default() -> Self {
        Self::Always
    }
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            jitter_factor: DEFAULT_JITTER_FACTOR,
            timeout: None,
            retry_on: RetryCondition::default(),
        }
    }
}

impl RetryStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a custom retry strategy with validation
    pub fn custom(
        max_attempts: u32,
        base_delay: Duration,
        max_delay: Duration,
    ) -> CommonResult<Self> {
        Self::validate_attempts(max_attempts)?;

        if base_delay > max_delay {
            return Err(CommonError::config_field(
                "base_delay",
                format!(
                    "base_delay ({:?}) cannot be greater than max_delay ({:?})",
                    base_delay, max_delay
                ),
            ));
        }

        Ok(Self { max_attempts, base_delay, max_delay, ..Self::default() })
    }

    /// Give up retrying once this much time has passed since the first
    /// attempt
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set custom retry condition
    pub fn with_retry_condition(mut self, condition: RetryCondition) -> Self {
        self.retry_on = condition;
        self
    }

    /// Set the maximum number of attempts with validation
    pub fn with_max_attempts(mut self, attempts: u32) -> CommonResult<Self> {
        Self::validate_attempts(attempts)?;
        self.max_attempts = attempts;
        Ok(self)
    }

    /// Set the base delay for exponential backoff
    pub fn with_base_delay(mut self, delay: Duration) -> CommonResult<Self> {
        if delay > self.max_delay {
            return Err(CommonError::config_field(
                "base_delay",
                format!(
                    "base_delay ({:?}) cannot be greater than max_delay ({:?})",
                    delay, self.max_delay
                ),
            ));
        }
        self.base_delay = delay;
        Ok(self)
    }

    /// Set the maximum delay cap
    pub fn with_max_delay(mut self, delay: Duration) -> CommonResult<Self> {
        if delay < self.base_delay {
            return Err(CommonError::config_field(
                "max_delay",
                format!(
                    "max_delay ({:?}) cannot be less than base_delay ({:?})",
                    delay, self.base_delay
                ),
            ));
        }
        self.max_delay = delay;
        Ok(self)
    }

    /// Set the jitter factor (0.0 = no jitter, 1.0 = full jitter)
    pub fn with_jitter_factor(mut self, factor: f64) -> Self {
        self.jitter_factor = factor.clamp(0.0, 1.0);
        self
    }

    fn validate_attempts(attempts: u32) -> CommonResult<()> {
        if (MIN_MAX_ATTEMPTS..=MAX_MAX_ATTEMPTS).contains(&attempts) {
            Ok(())
        } else {
            Err(CommonError::config_field(
                "max_attempts",
                format!(
                    "max_attempts must be between {} and {}, got {}",
                    MIN_MAX_ATTEMPTS, MAX_MAX_ATTEMPTS, attempts
                ),
            ))
        }
    }

    /// Delay before the retry that follows the zero-based `attempt`
    pub fn get_delay(&self, attempt: u32) -> Duration {
        let exponential_delay = self.calculate_exponential_delay(attempt);
        self.apply_jitter(exponential_delay)
    }

    /// Calculate exponential delay without jitter
    fn calculate_exponential_delay(&self, attempt: u32) -> Duration {
        let base_millis = self.base_delay.as_millis() as u64;
        let max_millis = self.max_delay.as_millis() as u64;

        let exponent = attempt.min(MAX_BACKOFF_EXPONENT);
        let multiplier = 2_u64.saturating_pow(exponent);

        let delay_millis = base_millis.saturating_mul(multiplier).min(max_millis);

        Duration::from_millis(delay_millis)
    }

    /// Apply jitter to prevent thundering herd
    fn apply_jitter(&self, delay: Duration) -> Duration {
        if self.jitter_factor == 0.0 || delay.is_zero() {
            return delay;
        }

        let mut rng = rand::thread_rng();
        let delay_millis = delay.as_millis() as f64;
        let jitter_range = delay_millis * self.jitter_factor;

        // -jitter_range/2 to +jitter_range/2
        let jitter = rng.gen_range(-jitter_range / 2.0..=jitter_range / 2.0);
        let final_millis = (delay_millis + jitter).max(0.0) as u64;

        Duration::from_millis(final_millis)
    }

    /// Get the maximum number of attempts
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Whether the configured condition accepts this error for another try
    pub fn is_retryable(&self, err: &(dyn std::error::Error + 'static)) -> bool {
        match &self.retry_on {
            RetryCondition::Always => true,
            RetryCondition::Custom(predicate) => predicate(err),
        }
    }

    /// Execute an operation with retry logic
    pub async fn execute<F, Fut, T, E>(&self, operation_name: &str, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::error::Error + Send + Sync + 'static,
    {
        self.execute_with_retry(operation_name, operation, |_: &E, _, _| {}).await
    }

    /// Execute an operation with retry logic, reporting every scheduled retry
    ///
    /// `on_retry(error, attempt, delay)` runs before the backoff sleep, where
    /// `attempt` is the 1-based number of the attempt that just failed. It is
    /// never called for the final failure.
    pub async fn execute_with_retry<F, Fut, T, E, R>(
        &self,
        operation_name: &str,
        mut operation: F,
        mut on_retry: R,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::error::Error + Send + Sync + 'static,
        R: FnMut(&E, u32, Duration),
    {
        let started = Instant::now();
        let deadline = self.timeout.map(|t| started + t);
        let mut attempt: u32 = 0;

        debug!(
            operation = operation_name,
            max_attempts = self.max_attempts,
            timeout = ?self.timeout,
            "Starting retry operation"
        );

        loop {
            attempt += 1;

            let err = match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(
                            operation = operation_name,
                            attempts = attempt,
                            elapsed = ?started.elapsed(),
                            "Retry operation succeeded"
                        );
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            if !self.is_retryable(&err) {
                debug!(operation = operation_name, error = %err, "Error is not retryable");
                return Err(err);
            }

            if attempt >= self.max_attempts {
                error!(
                    operation = operation_name,
                    attempts = attempt,
                    elapsed = ?started.elapsed(),
                    error = %err,
                    "All retry attempts failed"
                );
                return Err(err);
            }

            let delay = self.get_delay(attempt - 1);

            if let Some(deadline) = deadline {
                if delay > deadline.saturating_duration_since(Instant::now()) {
                    warn!(
                        operation = operation_name,
                        attempts = attempt,
                        "Next retry would exceed timeout, aborting"
                    );
                    return Err(err);
                }
            }

            warn!(
                operation = operation_name,
                attempt,
                max_attempts = self.max_attempts,
                delay = ?delay,
                error = %err,
                "Retry attempt failed, backing off"
            );

            on_retry(&err, attempt, delay);
            tokio::time::sleep(delay).await;
        }
    }
}
