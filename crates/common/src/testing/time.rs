//! Wall-clock abstraction for testability
//!
//! Queue records carry epoch-millisecond timestamps (`queuedAt`,
//! `lastAttemptAt`). Production code reads them from [`SystemClock`]; tests
//! inject a [`MockClock`] so the stamps are predictable.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! use certprep_common::testing::{Clock, MockClock};
//!
//! let clock = MockClock::at(1_000);
//! clock.advance(Duration::from_secs(5));
//! assert_eq!(clock.millis_since_epoch(), 6_000);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Source of wall-clock time
pub trait Clock: Send + Sync {
    /// Milliseconds since the UNIX epoch
    fn millis_since_epoch(&self) -> u64;
}

/// Real system clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn millis_since_epoch(&self) -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
    }
}

/// Manually driven clock. Clones share the same time.
#[derive(Debug, Clone)]
pub struct MockClock {
    millis: Arc<AtomicU64>,
}

impl MockClock {
    /// Fixed start used by [`MockClock::new`]: 2024-01-01T00:00:00Z
    pub const DEFAULT_EPOCH_MILLIS: u64 = 1_704_067_200_000;

    pub fn new() -> Self {
        Self::at(Self::DEFAULT_EPOCH_MILLIS)
    }

    /// Clock frozen at `millis` since the epoch
    pub fn at(millis: u64) -> Self {
        Self { millis: Arc::new(AtomicU64::new(millis)) }
    }

    /// Move time forward
    pub fn advance(&self, by: Duration) {
        self.millis.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }

    /// Jump to an absolute time
    pub fn set(&self, millis: u64) {
        self.millis.store(millis, Ordering::SeqCst);
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn millis_since_epoch(&self) -> u64 {
        self.millis.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for testing::time.
    use super::*;

    /// Validates `MockClock` behavior for the shared clone scenario.
    ///
    /// Assertions:
    /// - Confirms advancing one clone is visible through another.
    #[test]
    fn test_mock_clock_shared() {
        let clock = MockClock::new();
        let other = clock.clone();
        clock.advance(Duration::from_millis(250));
        assert_eq!(other.millis_since_epoch(), MockClock::DEFAULT_EPOCH_MILLIS + 250);

        other.set(7);
        assert_eq!(clock.millis_since_epoch(), 7);
    }

    /// Validates `SystemClock` behavior for the sanity scenario.
    ///
    /// Assertions:
    /// - Ensures the system clock reads after 2024.
    #[test]
    fn test_system_clock_is_recent() {
        assert!(SystemClock.millis_since_epoch() > MockClock::DEFAULT_EPOCH_MILLIS);
    }
}
