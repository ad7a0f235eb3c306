use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CommonError;
use crate::impl_status_conversions;

/// Diagnostic recorded when an operation has used up its retry budget
pub const MAX_RETRIES_EXCEEDED: &str = "max retries exceeded";

/// Diagnostic recorded when an operation restored from storage has no
/// executable attached
pub const OPERATION_UNAVAILABLE: &str = "operation function not available";

/// Diagnostic recorded when an operation panicked mid-replay; its closure
/// is dropped so it is never invoked again
pub const OPERATION_PANICKED: &str = "operation panicked during replay";

/// Bounds every queue payload has to meet: persisted as JSON, cloned into
/// snapshots and shared with background processing.
pub trait QueuePayload:
    Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static
{
}

impl<T> QueuePayload for T where
    T: Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static
{
}

/// Coarse classification of a queued write. Informational only, processing
/// treats every kind the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Create,
    Update,
    Delete,
    Batch,
}

impl_status_conversions!(OperationType {
    Create => "create",
    Update => "update",
    Delete => "delete",
    Batch => "batch",
});

/// Lifecycle of a queued operation
///
/// `pending -> processing -> completed | failed`, and `failed -> processing`
/// again on a later pass while retries remain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl_status_conversions!(OperationStatus {
    Pending => "pending",
    Processing => "processing",
    Completed => "completed",
    Failed => "failed",
});

impl OperationStatus {
    /// Whether a processing pass picks this status up
    pub fn is_eligible(self) -> bool {
        matches!(self, Self::Pending | Self::Failed)
    }
}

/// Serializable part of a queued operation; this is exactly what is
/// persisted and what snapshots expose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedOperationRecord<P = serde_json::Value> {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: OperationType,
    pub collection: String,
    pub data: P,
    #[serde(default)]
    pub status: OperationStatus,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default)]
    pub queued_at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_attempt_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl<P> QueuedOperationRecord<P> {
    /// Create a pending record with a fresh UUID
    pub fn new(kind: OperationType, collection: impl Into<String>, data: P, queued_at: u64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            collection: collection.into(),
            data,
            status: OperationStatus::Pending,
            retry_count: 0,
            queued_at,
            last_attempt_at: None,
            last_error: None,
        }
    }

    /// Mark as processing and stamp the attempt time
    pub fn mark_processing(&mut self, now: u64) {
        self.status = OperationStatus::Processing;
        self.last_attempt_at = Some(now);
    }

    /// Mark as completed and drop any earlier diagnostic
    pub fn mark_completed(&mut self) {
        self.status = OperationStatus::Completed;
        self.last_error = None;
    }

    /// Mark as failed with a diagnostic. `retry_count` is left to the caller.
    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.status = OperationStatus::Failed;
        self.last_error = Some(error.into());
    }
}

/// Deferred write: invoked once per attempt, possibly many times.
pub type OperationFn = Arc<dyn Fn() -> BoxFuture<'static, Result<(), CommonError>> + Send + Sync>;

/// Wrap an async closure as an [`OperationFn`]
///
/// ```rust
/// use certprep_common::sync::queue::operation;
///
/// let op = operation(|| async { Ok(()) });
/// let _future = op();
/// ```
pub fn operation<F, Fut>(f: F) -> OperationFn
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<(), CommonError>> + Send + 'static,
{
    Arc::new(move || f().boxed())
}

/// In-memory queue entry: the persisted record plus the closure that
/// performs the write. Entries restored from storage have no closure.
#[derive(Clone)]
pub struct RunnableQueuedOperation<P = serde_json::Value> {
    pub record: QueuedOperationRecord<P>,
    pub operation: Option<OperationFn>,
}

impl<P> RunnableQueuedOperation<P> {
    pub fn new(record: QueuedOperationRecord<P>, operation: Option<OperationFn>) -> Self {
        Self { record, operation }
    }

    /// Entry rebuilt from storage
    pub fn restored(record: QueuedOperationRecord<P>) -> Self {
        Self { record, operation: None }
    }

    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn status(&self) -> OperationStatus {
        self.record.status
    }

    pub fn is_runnable(&self) -> bool {
        self.operation.is_some()
    }
}

impl<P: Clone> RunnableQueuedOperation<P> {
    /// Projection onto the serializable record, dropping the closure
    pub fn to_record(&self) -> QueuedOperationRecord<P> {
        self.record.clone()
    }
}

impl<P: fmt::Debug> fmt::Debug for RunnableQueuedOperation<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunnableQueuedOperation")
            .field("record", &self.record)
            .field("operation", &self.operation.as_ref().map(|_| "<function>"))
            .finish()
    }
}

/// Arguments to [`OfflineQueue::enqueue`](super::OfflineQueue::enqueue)
pub struct EnqueueRequest<P = serde_json::Value> {
    pub kind: OperationType,
    pub collection: String,
    pub data: P,
    pub operation: OperationFn,
}

impl<P> EnqueueRequest<P> {
    pub fn new(
        kind: OperationType,
        collection: impl Into<String>,
        data: P,
        operation: OperationFn,
    ) -> Self {
        Self { kind, collection: collection.into(), data, operation }
    }
}

impl<P: fmt::Debug> fmt::Debug for EnqueueRequest<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnqueueRequest")
            .field("kind", &self.kind)
            .field("collection", &self.collection)
            .field("data", &self.data)
            .finish_non_exhaustive()
    }
}

/// Point-in-time view of the queue, computed on demand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueState<P = serde_json::Value> {
    pub total: usize,
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
    pub is_processing: bool,
    pub operations: Vec<QueuedOperationRecord<P>>,
}

impl<P: Clone> QueueState<P> {
    /// Count statuses over the given entries
    pub fn from_operations(operations: &[RunnableQueuedOperation<P>], is_processing: bool) -> Self {
        let mut state = Self {
            total: operations.len(),
            pending: 0,
            processing: 0,
            completed: 0,
            failed: 0,
            is_processing,
            operations: Vec::with_capacity(operations.len()),
        };

        for op in operations {
            match op.status() {
                OperationStatus::Pending => state.pending += 1,
                OperationStatus::Processing => state.processing += 1,
                OperationStatus::Completed => state.completed += 1,
                OperationStatus::Failed => state.failed += 1,
            }
            state.operations.push(op.to_record());
        }

        state
    }
}

/// Outcome of one processing pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSummary {
    /// Operations the pass selected
    pub visited: usize,
    pub completed: usize,
    pub failed: usize,
}

/// Queue configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Key the queue is persisted under; one queue owns one key
    pub storage_key: String,
    pub max_queue_size: usize,
    /// Attempts allowed per operation, across all passes
    pub max_retries: u32,
    pub expose_to_dev_tools: bool,
    /// Process on enqueue and when connectivity returns. Tests turn this off
    /// so no background pass races the assertions.
    pub auto_process: bool,
    pub base_retry_delay: Duration,
    pub max_retry_delay: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            storage_key: "certprep.offline_queue".to_string(),
            max_queue_size: 1000,
            max_retries: 5,
            expose_to_dev_tools: true,
            auto_process: true,
            base_retry_delay: Duration::from_secs(1),
            max_retry_delay: Duration::from_secs(30),
        }
    }
}

impl QueueConfig {
    /// Deterministic configuration for tests: no background processing, no
    /// devtools hook, millisecond backoff.
    pub fn testing() -> Self {
        Self {
            expose_to_dev_tools: false,
            auto_process: false,
            base_retry_delay: Duration::from_millis(1),
            max_retry_delay: Duration::from_millis(1),
            ..Default::default()
        }
    }

    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    pub fn with_max_queue_size(mut self, size: usize) -> Self {
        self.max_queue_size = size;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_auto_process(mut self, enabled: bool) -> Self {
        self.auto_process = enabled;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.storage_key.trim().is_empty() {
            return Err("Storage key must not be empty".to_string());
        }

        if self.max_queue_size == 0 {
            return Err("Max queue size must be greater than 0".to_string());
        }

        if !(1..=100).contains(&self.max_retries) {
            return Err(format!("Max retries must be between 1 and 100, got {}", self.max_retries));
        }

        if self.base_retry_delay > self.max_retry_delay {
            return Err("Base retry delay cannot exceed max retry delay".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for sync::queue::types.
    use std::str::FromStr;

    use serde_json::json;

    use super::*;

    fn runnable(status: OperationStatus) -> RunnableQueuedOperation {
        let mut record =
            QueuedOperationRecord::new(OperationType::Create, "quizzes", json!({}), 1);
        record.status = status;
        RunnableQueuedOperation::restored(record)
    }

    /// Validates `QueuedOperationRecord` behavior for the persisted layout
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms camelCase field names and `type` for the kind.
    /// - Ensures unset optional fields are omitted.
    #[test]
    fn test_record_serialized_layout() {
        let record = QueuedOperationRecord::new(
            OperationType::Update,
            "notes",
            json!({"body": "TCP handshake"}),
            1_700_000_000_000,
        );
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["type"], "update");
        assert_eq!(value["collection"], "notes");
        assert_eq!(value["status"], "pending");
        assert_eq!(value["retryCount"], 0);
        assert_eq!(value["queuedAt"], 1_700_000_000_000_u64);
        assert!(value.get("lastError").is_none());
        assert!(value.get("lastAttemptAt").is_none());
    }

    /// Validates `QueuedOperationRecord::new` behavior for the id scenario.
    ///
    /// Assertions:
    /// - Ensures two records never share an id.
    #[test]
    fn test_record_ids_unique() {
        let a = QueuedOperationRecord::new(OperationType::Create, "c", json!(null), 0);
        let b = QueuedOperationRecord::new(OperationType::Create, "c", json!(null), 0);
        assert_ne!(a.id, b.id);
        assert!(!a.id.is_empty());
    }

    /// Validates `QueuedOperationRecord` transitions for the
    /// fail-then-complete scenario.
    ///
    /// Assertions:
    /// - Confirms the attempt timestamp is stamped.
    /// - Confirms completion clears the last error.
    #[test]
    fn test_record_transitions() {
        let mut record = QueuedOperationRecord::new(OperationType::Create, "c", json!(1), 0);
        record.mark_processing(42);
        assert_eq!(record.status, OperationStatus::Processing);
        assert_eq!(record.last_attempt_at, Some(42));

        record.mark_failed("Network request failed");
        assert_eq!(record.status, OperationStatus::Failed);
        assert_eq!(record.last_error.as_deref(), Some("Network request failed"));

        record.mark_completed();
        assert_eq!(record.status, OperationStatus::Completed);
        assert!(record.last_error.is_none());
    }

    /// Validates `OperationStatus` behavior for the string conversion
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms display and case-insensitive parsing agree.
    /// - Confirms only pending and failed are eligible.
    #[test]
    fn test_status_conversions() {
        assert_eq!(OperationStatus::Processing.to_string(), "processing");
        assert_eq!(OperationStatus::from_str("FAILED").unwrap(), OperationStatus::Failed);
        assert!(OperationType::from_str("upsert").is_err());

        assert!(OperationStatus::Pending.is_eligible());
        assert!(OperationStatus::Failed.is_eligible());
        assert!(!OperationStatus::Processing.is_eligible());
        assert!(!OperationStatus::Completed.is_eligible());
    }

    /// Validates `QueueState::from_operations` behavior for the status
    /// counting scenario.
    ///
    /// Assertions:
    /// - Confirms each status bucket is counted.
    /// - Confirms records are returned in queue order.
    #[test]
    fn test_state_counts() {
        let ops = vec![
            runnable(OperationStatus::Pending),
            runnable(OperationStatus::Failed),
            runnable(OperationStatus::Completed),
            runnable(OperationStatus::Pending),
        ];
        let state = QueueState::from_operations(&ops, true);

        assert_eq!(state.total, 4);
        assert_eq!(state.pending, 2);
        assert_eq!(state.failed, 1);
        assert_eq!(state.completed, 1);
        assert_eq!(state.processing, 0);
        assert!(state.is_processing);
        assert_eq!(state.operations[3].id, ops[3].record.id);
    }

    /// Validates `RunnableQueuedOperation` behavior for the projection
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms the record survives projection and the closure does not
    ///   appear in debug output.
    #[test]
    fn test_runnable_projection() {
        let record = QueuedOperationRecord::new(OperationType::Batch, "c", json!([1, 2]), 0);
        let op = RunnableQueuedOperation::new(record.clone(), Some(operation(|| async { Ok(()) })));

        assert!(op.is_runnable());
        assert_eq!(op.to_record(), record);
        assert!(format!("{op:?}").contains("<function>"));
    }

    /// Validates `QueueConfig::validate` behavior for the invalid settings
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms defaults and the testing preset validate.
    /// - Ensures zero size, zero retries, an empty key and inverted delays
    ///   are rejected.
    #[test]
    fn test_config_validation() {
        assert!(QueueConfig::default().validate().is_ok());
        assert!(QueueConfig::testing().validate().is_ok());
        assert!(!QueueConfig::testing().auto_process);

        assert!(QueueConfig::default().with_max_queue_size(0).validate().is_err());
        assert!(QueueConfig::default().with_max_retries(0).validate().is_err());
        assert!(QueueConfig::default().with_storage_key(" ").validate().is_err());

        let inverted = QueueConfig {
            base_retry_delay: Duration::from_secs(10),
            max_retry_delay: Duration::from_secs(1),
            ..Default::default()
        };
        assert!(inverted.validate().is_err());
    }
}
