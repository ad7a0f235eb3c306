//! Debug surface for the offline queue
//!
//! [`QueueInspector`] is a stateless facade over an [`OfflineQueue`] handle.
//! For tooling that cannot name the payload type (a devtools panel, an
//! admin endpoint) the inspector is also available as an object-safe
//! [`DevToolsHook`] speaking JSON, and one hook per process can be
//! published through [`install`].

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use once_cell::sync::OnceCell;
use serde_json::Value;
use tracing::{debug, info};

use super::core::OfflineQueue;
use super::errors::QueueResult;
use super::metrics::QueueMetricsSnapshot;
use super::types::{ProcessSummary, QueuePayload, QueueState, QueuedOperationRecord};

static DEV_TOOLS_HOOK: OnceCell<Arc<dyn DevToolsHook>> = OnceCell::new();

/// Type-erased inspection interface
pub trait DevToolsHook: Send + Sync {
    /// Queue snapshot as JSON
    fn state(&self) -> QueueResult<Value>;

    /// Raw records as a JSON array, closures stripped
    fn queue(&self) -> QueueResult<Value>;

    fn process_queue(&self) -> BoxFuture<'static, QueueResult<ProcessSummary>>;

    fn clear_queue(&self) -> QueueResult<usize>;

    fn clear_completed(&self) -> QueueResult<usize>;

    fn metrics(&self) -> QueueMetricsSnapshot;
}

/// Publish `hook` as the process-wide debug hook
///
/// Only the first installation wins; later calls (a second queue, a hot
/// reload) are logged and ignored. Returns whether this call installed it.
pub fn install(hook: Arc<dyn DevToolsHook>) -> bool {
    match DEV_TOOLS_HOOK.set(hook) {
        Ok(()) => {
            info!("Offline queue devtools hook installed");
            true
        }
        Err(_) => {
            debug!("Offline queue devtools hook already installed, skipping");
            false
        }
    }
}

/// The installed debug hook, if any
pub fn installed() -> Option<Arc<dyn DevToolsHook>> {
    DEV_TOOLS_HOOK.get().cloned()
}

/// Read and control facade over a queue
pub struct QueueInspector<P: QueuePayload = Value> {
    queue: OfflineQueue<P>,
}

impl<P: QueuePayload> Clone for QueueInspector<P> {
    fn clone(&self) -> Self {
        Self { queue: self.queue.clone() }
    }
}

impl<P: QueuePayload> QueueInspector<P> {
    pub fn new(queue: OfflineQueue<P>) -> Self {
        Self { queue }
    }

    pub fn get_state(&self) -> QueueResult<QueueState<P>> {
        self.queue.get_state()
    }

    pub fn get_queue(&self) -> QueueResult<Vec<QueuedOperationRecord<P>>> {
        Ok(self.queue.get_state()?.operations)
    }

    pub async fn process_queue(&self) -> QueueResult<ProcessSummary> {
        self.queue.process_queue().await
    }

    pub fn clear_queue(&self) -> QueueResult<usize> {
        self.queue.clear_queue()
    }

    pub fn clear_completed(&self) -> QueueResult<usize> {
        self.queue.clear_completed()
    }

    pub fn metrics(&self) -> QueueMetricsSnapshot {
        self.queue.metrics()
    }
}

impl<P: QueuePayload> DevToolsHook for QueueInspector<P> {
    fn state(&self) -> QueueResult<Value> {
        Ok(serde_json::to_value(self.get_state()?)?)
    }

    fn queue(&self) -> QueueResult<Value> {
        Ok(serde_json::to_value(self.get_queue()?)?)
    }

    fn process_queue(&self) -> BoxFuture<'static, QueueResult<ProcessSummary>> {
        let queue = self.queue.clone();
        async move { queue.process_queue().await }.boxed()
    }

    fn clear_queue(&self) -> QueueResult<usize> {
        QueueInspector::clear_queue(self)
    }

    fn clear_completed(&self) -> QueueResult<usize> {
        QueueInspector::clear_completed(self)
    }

    fn metrics(&self) -> QueueMetricsSnapshot {
        QueueInspector::metrics(self)
    }
}
