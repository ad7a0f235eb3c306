// Constants for retry module
use std::time::Duration;

/// Default maximum number of attempts (initial call included)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default base delay for exponential backoff
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Default maximum delay cap
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Default jitter factor (0.0 = no jitter, 1.0 = full jitter)
pub const DEFAULT_JITTER_FACTOR: f64 = 0.3;

/// Maximum exponent for exponential backoff calculation to prevent overflow
pub const MAX_BACKOFF_EXPONENT: u32 = 30;

/// Minimum allowed max_attempts value
pub const MIN_MAX_ATTEMPTS: u32 = 1;

/// Maximum allowed max_attempts value
pub const MAX_MAX_ATTEMPTS: u32 = 100;

/// Lowercase fragments that mark an error message as a connectivity failure
pub const CONNECTIVITY_MARKERS: &[&str] = &[
    "offline",
    "network",
    "fetch",
    "connection",
    "unavailable",
    "timed out",
    "timeout",
    "dns",
];
