//! Numeric id generation for locally fabricated records
//!
//! Optimistic results returned while offline need an id before the remote
//! store has assigned one. These ids are 32-bit, never zero (zero reads as
//! "unset" in most clients) and only repeat after the full `u32` range has
//! been consumed.

use std::sync::atomic::{AtomicU32, Ordering};

use once_cell::sync::Lazy;
use rand::Rng;

static GLOBAL_GENERATOR: Lazy<NumericIdGenerator> = Lazy::new(NumericIdGenerator::new);

/// Draw the next id from the process-wide generator.
pub fn generate_safe_numeric_id() -> u32 {
    GLOBAL_GENERATOR.next_id()
}

/// Monotonic 32-bit id source that wraps past `u32::MAX` and skips zero.
#[derive(Debug)]
pub struct NumericIdGenerator {
    counter: AtomicU32,
}

impl NumericIdGenerator {
    /// Create a generator starting at a random non-zero offset
    pub fn new() -> Self {
        let seed = rand::thread_rng().gen_range(1..=u32::MAX);
        Self::starting_at(seed)
    }

    /// Create a generator whose first id is `seed` (or 1 when `seed` is 0)
    pub fn starting_at(seed: u32) -> Self {
        Self { counter: AtomicU32::new(seed) }
    }

    /// Next id in sequence.
    pub fn next_id(&self) -> u32 {
        loop {
            // fetch_add wraps on overflow
            let candidate = self.counter.fetch_add(1, Ordering::Relaxed);
            if candidate != 0 {
                return candidate;
            }
        }
    }
}

impl Default for NumericIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for utils::ids.
    use std::collections::HashSet;

    use super::*;

    /// Validates `NumericIdGenerator::next_id` behavior for the sequential
    /// uniqueness scenario.
    ///
    /// Assertions:
    /// - Ensures 10,000 sequential ids contain no zero and no duplicate.
    #[test]
    fn test_ids_unique_and_non_zero() {
        let generator = NumericIdGenerator::new();
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            let id = generator.next_id();
            assert_ne!(id, 0);
            assert!(seen.insert(id), "id {id} repeated");
        }
    }

    /// Validates `NumericIdGenerator::starting_at` behavior for the 32-bit
    /// wrap scenario.
    ///
    /// Assertions:
    /// - Confirms the sequence runs `MAX - 1, MAX, 1, 2` without emitting 0.
    #[test]
    fn test_wraps_at_u32_boundary() {
        let generator = NumericIdGenerator::starting_at(u32::MAX - 1);
        let ids: Vec<u32> = (0..4).map(|_| generator.next_id()).collect();
        assert_eq!(ids, vec![u32::MAX - 1, u32::MAX, 1, 2]);
    }

    /// Validates `NumericIdGenerator::starting_at` behavior for the zero
    /// seed scenario.
    ///
    /// Assertions:
    /// - Confirms a zero seed yields 1 first.
    #[test]
    fn test_zero_seed_skipped() {
        let generator = NumericIdGenerator::starting_at(0);
        assert_eq!(generator.next_id(), 1);
    }

    /// Validates `generate_safe_numeric_id` behavior for the global source
    /// scenario.
    ///
    /// Assertions:
    /// - Ensures consecutive global ids differ and are non-zero.
    #[test]
    fn test_global_generator() {
        let first = generate_safe_numeric_id();
        let second = generate_safe_numeric_id();
        assert_ne!(first, 0);
        assert_ne!(second, 0);
        assert_ne!(first, second);
    }
}
