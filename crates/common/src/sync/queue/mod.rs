// Durable offline write queue
// Persistence, replay with retry, debug surface

mod core;
mod errors;
pub mod inspector;
pub mod metrics;
pub mod persistence;
mod types;

pub use self::core::{OfflineQueue, QueueBuilder, StateListener};
pub use self::errors::{QueueError, QueueResult};
pub use self::inspector::{DevToolsHook, QueueInspector};
pub use self::metrics::{QueueMetrics, QueueMetricsSnapshot};
pub use self::persistence::{KeyValueStore, LoadedQueue, QueueStore};
pub use self::types::{
    operation, EnqueueRequest, OperationFn, OperationStatus, OperationType, ProcessSummary,
    QueueConfig, QueuePayload, QueueState, QueuedOperationRecord, RunnableQueuedOperation,
    MAX_RETRIES_EXCEEDED, OPERATION_PANICKED, OPERATION_UNAVAILABLE,
};
