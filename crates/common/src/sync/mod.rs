//! Offline write synchronization
//!
//! ## Submodules
//!
//! - **`queue`**: durable offline operation queue with single-flight replay,
//!   load-time cleanup and a debug surface
//! - **`retry`**: retry executor with exponential backoff and jitter, plus
//!   the connectivity error classifier
//! - **`connectivity`**: shared online/offline signal that triggers replay
//!
//! ## Module Relationships
//!
//! The queue replays each operation through `retry::RetryStrategy` and
//! listens to `connectivity::NetworkMonitor` for reconnects. Persistence
//! goes through the `queue::KeyValueStore` trait so hosts can plug in any
//! string key-value backend.

pub mod connectivity;
pub mod queue;
pub mod retry;

pub use connectivity::NetworkMonitor;
// Re-export commonly used types from queue
pub use queue::{
    EnqueueRequest, KeyValueStore, OfflineQueue, OperationStatus, OperationType, ProcessSummary,
    QueueConfig, QueueError, QueueMetrics, QueueMetricsSnapshot, QueueResult, QueueState,
    QueueStore, QueuedOperationRecord,
};
// Re-export retry types
pub use retry::{RetryCondition, RetryPolicies, RetryStrategy};

// Re-export time abstractions from testing module
pub use crate::testing::time::{Clock, MockClock, SystemClock};
