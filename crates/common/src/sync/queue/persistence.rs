use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::error::CommonResult;
use crate::sync::queue::errors::QueueResult;
use crate::sync::queue::types::{
    OperationStatus, OperationType, QueuePayload, QueuedOperationRecord,
};

/// Synchronous string key-value storage the queue persists into
///
/// Mirrors a browser-style local storage: whole values are read and
/// replaced atomically per key. Implementations report quota or I/O
/// failures as `CommonError::Persistence`.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> CommonResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> CommonResult<()>;

    fn remove(&self, key: &str) -> CommonResult<()>;
}

/// Result of reading the persisted queue
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedQueue<P> {
    /// Surviving records in persisted order
    pub records: Vec<QueuedOperationRecord<P>>,
    /// Malformed or duplicated elements that were skipped
    pub discarded: usize,
    /// Completed entries dropped on load
    pub completed_dropped: usize,
}

impl<P> LoadedQueue<P> {
    fn empty() -> Self {
        Self { records: Vec::new(), discarded: 0, completed_dropped: 0 }
    }
}

/// Durable queue storage: one JSON array under a single key
#[derive(Clone)]
pub struct QueueStore {
    backend: Arc<dyn KeyValueStore>,
    key: String,
}

impl std::fmt::Debug for QueueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueStore").field("key", &self.key).finish_non_exhaustive()
    }
}

impl QueueStore {
    pub fn new(backend: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self { backend, key: key.into() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the persisted queue
    ///
    /// Never fails. An absent key, a read error, unparseable JSON or a root
    /// that is not an array all yield an empty queue. Elements lacking a
    /// string `id`, a known `type` or a string `collection` are skipped, as
    /// are repeated ids. Completed entries are dropped and entries saved
    /// mid-attempt come back as pending.
    #[instrument(skip(self), fields(key = %self.key))]
    pub fn load<P: QueuePayload>(&self) -> LoadedQueue<P> {
        let raw = match self.backend.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("No persisted offline queue");
                return LoadedQueue::empty();
            }
            Err(e) => {
                warn!(error = %e, "Failed to read persisted offline queue, starting empty");
                return LoadedQueue::empty();
            }
        };

        let root: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Persisted offline queue is not valid JSON, starting empty");
                return LoadedQueue::empty();
            }
        };

        let Value::Array(elements) = root else {
            warn!("Persisted offline queue is not an array, starting empty");
            return LoadedQueue::empty();
        };

        let mut loaded = LoadedQueue::empty();
        let mut seen = HashSet::new();

        for (index, element) in elements.into_iter().enumerate() {
            let Some(mut record) = Self::parse_element::<P>(index, element) else {
                loaded.discarded += 1;
                continue;
            };

            if !seen.insert(record.id.clone()) {
                warn!(index, operation_id = %record.id, "Discarding duplicate queued operation");
                loaded.discarded += 1;
                continue;
            }

            match record.status {
                OperationStatus::Completed => {
                    loaded.completed_dropped += 1;
                    continue;
                }
                OperationStatus::Processing => record.status = OperationStatus::Pending,
                OperationStatus::Pending | OperationStatus::Failed => {}
            }

            loaded.records.push(record);
        }

        debug!(
            restored = loaded.records.len(),
            discarded = loaded.discarded,
            completed_dropped = loaded.completed_dropped,
            "Loaded persisted offline queue"
        );

        loaded
    }

    fn parse_element<P: QueuePayload>(
        index: usize,
        element: Value,
    ) -> Option<QueuedOperationRecord<P>> {
        let Value::Object(mut fields) = element else {
            warn!(index, "Discarding queued operation that is not an object");
            return None;
        };

        if !matches!(fields.get("id"), Some(Value::String(id)) if !id.is_empty()) {
            warn!(index, "Discarding queued operation without a string id");
            return None;
        }

        let kind_ok = fields
            .get("type")
            .is_some_and(|kind| serde_json::from_value::<OperationType>(kind.clone()).is_ok());
        if !kind_ok {
            warn!(index, "Discarding queued operation with an unknown type");
            return None;
        }

        if !matches!(fields.get("collection"), Some(Value::String(_))) {
            warn!(index, "Discarding queued operation without a string collection");
            return None;
        }

        fields.entry("data").or_insert(Value::Null);

        match serde_json::from_value(Value::Object(fields)) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(index, error = %e, "Discarding queued operation that failed to decode");
                None
            }
        }
    }

    /// Replace the persisted queue with `records`
    #[instrument(skip(self, records), fields(key = %self.key, count = records.len()))]
    pub fn save<P: QueuePayload>(&self, records: &[QueuedOperationRecord<P>]) -> QueueResult<()> {
        let encoded = serde_json::to_string(records)?;
        self.backend.set(&self.key, &encoded)?;
        debug!(bytes = encoded.len(), "Persisted offline queue");
        Ok(())
    }

    /// Remove the persisted queue entirely
    pub fn clear(&self) -> QueueResult<()> {
        self.backend.remove(&self.key)?;
        Ok(())
    }
}
