//! Mock implementations of common traits
//!
//! Provides mock objects for testing purposes.

// Test mocks panic on poisoned locks; a poisoned mock means the test already
// failed.
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{CommonError, CommonResult};
use crate::sync::queue::KeyValueStore;

type StorageData = Arc<Mutex<HashMap<String, String>>>;

/// In-memory [`KeyValueStore`] with failure injection
///
/// Clones share the same data, so a test can keep one handle for
/// inspection while the queue owns another. Writes can be made to fail
/// (simulating a full or disabled local storage) and successful writes are
/// counted.
///
/// # Examples
///
/// ```
/// use certprep_common::sync::queue::KeyValueStore;
/// use certprep_common::testing::MockStorage;
///
/// let storage = MockStorage::new();
/// storage.set("key1", "value1").unwrap();
/// assert_eq!(storage.get("key1").unwrap(), Some("value1".to_string()));
///
/// storage.fail_writes(true);
/// assert!(storage.set("key1", "value2").is_err());
/// assert_eq!(storage.write_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockStorage {
    data: StorageData,
    fail_writes: Arc<AtomicBool>,
    fail_reads: Arc<AtomicBool>,
    writes: Arc<AtomicUsize>,
}

impl MockStorage {
    /// Create a new mock storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `set`/`remove` fail with a persistence error
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `get` fail with a persistence error
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Number of successful `set` calls
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Store a value directly, bypassing failure injection and the write
    /// counter. Used to seed corrupt or legacy data.
    pub fn set_raw(&self, key: &str, value: &str) {
        self.data.lock().unwrap().insert(key.to_string(), value.to_string());
    }

    /// Stored value, bypassing failure injection
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.data.lock().unwrap().get(key).cloned()
    }

    /// Get all keys
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.data.lock().unwrap().keys().cloned().collect()
    }
}

impl KeyValueStore for MockStorage {
    fn get(&self, key: &str) -> CommonResult<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(CommonError::persistence_op("get", "simulated read failure"));
        }
        Ok(self.data.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> CommonResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CommonError::persistence_op("set", "simulated quota exceeded"));
        }
        self.data.lock().unwrap().insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn remove(&self, key: &str) -> CommonResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CommonError::persistence_op("remove", "simulated storage failure"));
        }
        self.data.lock().unwrap().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for testing::mocks.
    use super::*;

    /// Validates `MockStorage` behavior for the failure injection scenario.
    ///
    /// Assertions:
    /// - Confirms failing writes leave data untouched and are not counted.
    /// - Confirms failing reads surface a persistence error.
    #[test]
    fn test_failure_injection() {
        let storage = MockStorage::new();
        storage.set("k", "v1").unwrap();

        storage.fail_writes(true);
        assert!(matches!(storage.set("k", "v2"), Err(CommonError::Persistence { .. })));
        assert_eq!(storage.raw("k").as_deref(), Some("v1"));
        assert_eq!(storage.write_count(), 1);

        storage.fail_reads(true);
        assert!(storage.get("k").is_err());
    }

    /// Validates `MockStorage::clone` behavior for the shared handle
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms data written through one clone is visible through the
    ///   other.
    #[test]
    fn test_clones_share_data() {
        let storage = MockStorage::new();
        let other = storage.clone();
        storage.set_raw("queue", "[]");
        assert_eq!(other.keys(), vec!["queue".to_string()]);
        other.remove("queue").unwrap();
        assert!(storage.raw("queue").is_none());
    }
}
