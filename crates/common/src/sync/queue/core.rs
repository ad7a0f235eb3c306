use std::sync::{Arc, Mutex, RwLock, Weak};
use std::time::Duration;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use super::errors::{QueueError, QueueResult};
use super::inspector::{self, QueueInspector};
use super::metrics::{QueueMetrics, QueueMetricsSnapshot};
use super::persistence::{KeyValueStore, QueueStore};
use super::types::{
    EnqueueRequest, OperationStatus, ProcessSummary, QueueConfig, QueuePayload, QueueState,
    QueuedOperationRecord, RunnableQueuedOperation, MAX_RETRIES_EXCEEDED, OPERATION_PANICKED,
    OPERATION_UNAVAILABLE,
};
use crate::error::CommonError;
use crate::sync::connectivity::NetworkMonitor;
use crate::sync::retry::{RetryPolicies, RetryStrategy};
use crate::testing::time::{Clock, SystemClock};

/// Callback invoked with a fresh snapshot after every persisted mutation
pub type StateListener<P> = Arc<dyn Fn(&QueueState<P>) + Send + Sync>;

type InFlightPass = Shared<BoxFuture<'static, QueueResult<ProcessSummary>>>;

/// Durable offline write queue
///
/// Writes that could not reach the remote store are appended here together
/// with a closure that replays them. The queue persists its records under a
/// single key after every mutation and replays eligible operations in
/// enqueue order, one pass at a time.
///
/// ## Ownership
///
/// Construct one queue per storage key and pass clones of the handle to
/// whoever needs it; clones share state. Two queues over the same key
/// overwrite each other's snapshots.
///
/// ## Error Handling
///
/// Mutations return `QueueResult<T>`. Lock poisoning is reported as
/// `CommonError::Lock` rather than panicking. A failed write during
/// `enqueue` restores the in-memory queue to its previous contents.
///
/// ## Concurrency
///
/// State lives behind a `std::sync::RwLock` that is never held across an
/// `.await`. Processing is single-flight: concurrent `process_queue` calls
/// await the same pass.
pub struct OfflineQueue<P: QueuePayload = Value> {
    inner: Arc<QueueInner<P>>,
}

struct QueueInner<P: QueuePayload> {
    config: QueueConfig,
    store: QueueStore,
    operations: RwLock<Vec<RunnableQueuedOperation<P>>>,
    in_flight: Mutex<Option<InFlightPass>>,
    retry: RetryStrategy,
    network: NetworkMonitor,
    clock: Arc<dyn Clock>,
    listener: Option<StateListener<P>>,
    metrics: QueueMetrics,
    connectivity_task: Mutex<Option<JoinHandle<()>>>,
}

impl<P: QueuePayload> Drop for QueueInner<P> {
    fn drop(&mut self) {
        if let Ok(slot) = self.connectivity_task.get_mut() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }
}

impl<P: QueuePayload> Clone for OfflineQueue<P> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<P: QueuePayload> std::fmt::Debug for OfflineQueue<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfflineQueue")
            .field("storage_key", &self.inner.config.storage_key)
            .field("is_processing", &self.is_processing())
            .finish_non_exhaustive()
    }
}

/// Releases the single-flight slot when a pass task ends, including when an
/// operation panics or the task is aborted mid-pass
struct PassGuard<P: QueuePayload> {
    queue: OfflineQueue<P>,
    finished: bool,
}

impl<P: QueuePayload> Drop for PassGuard<P> {
    fn drop(&mut self) {
        if !self.finished {
            self.queue.recover_interrupted_pass();
        }
        self.queue.finish_pass();
    }
}

/// Builder for [`OfflineQueue`]
pub struct QueueBuilder<P: QueuePayload = Value> {
    backend: Arc<dyn KeyValueStore>,
    config: QueueConfig,
    network: Option<NetworkMonitor>,
    clock: Option<Arc<dyn Clock>>,
    listener: Option<StateListener<P>>,
}

impl<P: QueuePayload> QueueBuilder<P> {
    pub fn config(mut self, config: QueueConfig) -> Self {
        self.config = config;
        self
    }

    /// Connectivity source; defaults to an always-online monitor
    pub fn network(mut self, network: NetworkMonitor) -> Self {
        self.network = Some(network);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn on_state_change<F>(mut self, listener: F) -> Self
    where
        F: Fn(&QueueState<P>) + Send + Sync + 'static,
    {
        self.listener = Some(Arc::new(listener));
        self
    }

    /// Validate the configuration, restore persisted operations and wire
    /// up connectivity-driven processing.
    ///
    /// The connectivity listener needs a Tokio runtime; without one the
    /// queue still works but only processes when asked to.
    pub fn build(self) -> QueueResult<OfflineQueue<P>> {
        self.config.validate().map_err(QueueError::InvalidState)?;

        let retry = RetryStrategy::custom(
            self.config.max_retries,
            self.config.base_retry_delay,
            self.config.max_retry_delay,
        )?
        .with_retry_condition(RetryPolicies::classified_condition());

        let store = QueueStore::new(self.backend, self.config.storage_key.clone());
        let loaded = store.load::<P>();
        if loaded.discarded > 0 || loaded.completed_dropped > 0 {
            info!(
                restored = loaded.records.len(),
                discarded = loaded.discarded,
                completed_dropped = loaded.completed_dropped,
                "Restored offline queue with cleanup"
            );
        }

        let operations: Vec<_> =
            loaded.records.into_iter().map(RunnableQueuedOperation::restored).collect();

        let metrics = QueueMetrics::new();
        metrics.update_size(operations.len());

        let queue = OfflineQueue {
            inner: Arc::new(QueueInner {
                retry,
                store,
                operations: RwLock::new(operations),
                in_flight: Mutex::new(None),
                network: self.network.unwrap_or_default(),
                clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
                listener: self.listener,
                metrics,
                connectivity_task: Mutex::new(None),
                config: self.config,
            }),
        };

        if queue.inner.config.auto_process {
            queue.start_connectivity_listener()?;
        }

        if queue.inner.config.expose_to_dev_tools {
            inspector::install(Arc::new(queue.inspector()));
        }

        debug!(
            storage_key = %queue.inner.config.storage_key,
            restored = queue.len(),
            auto_process = queue.inner.config.auto_process,
            "Offline queue ready"
        );

        Ok(queue)
    }
}

impl<P: QueuePayload> OfflineQueue<P> {
    /// Start building a queue over `backend`
    pub fn builder(backend: Arc<dyn KeyValueStore>) -> QueueBuilder<P> {
        QueueBuilder {
            backend,
            config: QueueConfig::default(),
            network: None,
            clock: None,
            listener: None,
        }
    }

    /// Isolated queue with [`QueueConfig::testing`]: nothing runs unless the
    /// test calls `process_queue`.
    pub fn for_testing(backend: Arc<dyn KeyValueStore>) -> QueueResult<Self> {
        Self::builder(backend).config(QueueConfig::testing()).build()
    }

    pub fn config(&self) -> &QueueConfig {
        &self.inner.config
    }

    pub fn network(&self) -> &NetworkMonitor {
        &self.inner.network
    }

    fn start_connectivity_listener(&self) -> QueueResult<()> {
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                warn!("No active Tokio runtime, reconnect processing disabled");
                return Ok(());
            }
        };

        let weak: Weak<QueueInner<P>> = Arc::downgrade(&self.inner);
        let mut changes = self.inner.network.subscribe();

        let handle = runtime.spawn(async move {
            while changes.changed().await.is_ok() {
                let online = *changes.borrow_and_update();
                if !online {
                    continue;
                }

                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let queue = OfflineQueue { inner };

                info!("Connectivity restored, replaying offline queue");
                if let Err(e) = queue.process_queue().await {
                    error!(error = %e, "Offline queue replay after reconnect failed");
                }
            }
        });

        let mut slot =
            self.inner.connectivity_task.lock().map_err(|e| CommonError::lock(e.to_string()))?;
        *slot = Some(handle);
        Ok(())
    }

    /// Stop reacting to connectivity changes
    pub fn teardown(&self) {
        match self.inner.connectivity_task.lock() {
            Ok(mut slot) => {
                if let Some(handle) = slot.take() {
                    handle.abort();
                    debug!("Offline queue connectivity listener stopped");
                }
            }
            Err(e) => error!("Connectivity task lock poisoned during teardown: {}", e),
        }
    }

    /// Append an operation and return its id
    ///
    /// Completed entries are evicted when the queue is full; if none exist
    /// the call fails with `CapacityExceeded` and the queue is untouched.
    /// Never waits for the operation to run.
    #[instrument(skip(self, request), fields(kind = %request.kind, collection = %request.collection))]
    pub fn enqueue(&self, request: EnqueueRequest<P>) -> QueueResult<String> {
        let EnqueueRequest { kind, collection, data, operation } = request;
        let record =
            QueuedOperationRecord::new(kind, collection, data, self.inner.clock.millis_since_epoch());
        let id = record.id.clone();

        {
            let mut ops =
                self.inner.operations.write().map_err(|e| CommonError::lock(e.to_string()))?;

            if ops.iter().any(|op| op.id() == id) {
                return Err(QueueError::DuplicateOperation(id));
            }

            let previous = ops.clone();
            let max = self.inner.config.max_queue_size;

            let mut evicted = 0;
            if ops.len() >= max {
                let before = ops.len();
                ops.retain(|op| op.status() != OperationStatus::Completed);
                evicted = before - ops.len();

                if ops.len() >= max {
                    *ops = previous;
                    self.inner.metrics.record_capacity_rejection();
                    warn!(max_queue_size = max, "Offline queue full, rejecting operation");
                    return Err(QueueError::CapacityExceeded(max));
                }
            }

            ops.push(RunnableQueuedOperation::new(record, Some(operation)));

            if let Err(e) = self.persist_locked(&ops) {
                *ops = previous;
                error!(operation_id = %id, error = %e, "Failed to persist enqueued operation, rolled back");
                return Err(e);
            }

            if evicted > 0 {
                self.inner.metrics.record_eviction(evicted);
                debug!(evicted, "Evicted completed operations to make room");
            }
            self.inner.metrics.record_enqueue();
            self.inner.metrics.update_size(ops.len());
        }

        info!(operation_id = %id, "Operation queued for replay");
        self.notify_state_change();

        if self.inner.config.auto_process && self.inner.network.is_online() && !self.is_processing()
        {
            self.spawn_processing();
        }

        Ok(id)
    }

    fn spawn_processing(&self) {
        match Handle::try_current() {
            Ok(runtime) => {
                let queue = self.clone();
                runtime.spawn(async move {
                    if let Err(e) = queue.process_queue().await {
                        error!(error = %e, "Background offline queue pass failed");
                    }
                });
            }
            Err(_) => {
                warn!("Skipping background processing: no active Tokio runtime detected");
            }
        }
    }

    /// Run a processing pass, or join the one already running
    ///
    /// The pass runs on its own task, so it finishes even if every caller
    /// stops awaiting it.
    pub async fn process_queue(&self) -> QueueResult<ProcessSummary> {
        let pass = {
            let mut slot =
                self.inner.in_flight.lock().map_err(|e| CommonError::lock(e.to_string()))?;

            match slot.as_ref() {
                Some(pass) => {
                    debug!("Joining in-flight offline queue pass");
                    pass.clone()
                }
                None => {
                    let queue = self.clone();
                    let task = tokio::spawn(async move {
                        let mut guard = PassGuard { queue: queue.clone(), finished: false };
                        let result = queue.run_pass().await;
                        guard.finished = true;
                        result
                    });

                    let pass: InFlightPass = async move {
                        match task.await {
                            Ok(result) => result,
                            Err(e) => Err(QueueError::from(CommonError::internal(format!(
                                "Offline queue pass aborted: {e}"
                            )))),
                        }
                    }
                    .boxed()
                    .shared();

                    *slot = Some(pass.clone());
                    pass
                }
            }
        };

        pass.await
    }

    fn finish_pass(&self) {
        match self.inner.in_flight.lock() {
            Ok(mut slot) => *slot = None,
            Err(e) => error!("In-flight slot lock poisoned: {}", e),
        }
    }

    /// Fail every operation a dead pass left in `Processing`
    ///
    /// The closure that panicked is dropped, so the operation is charged one
    /// attempt and can no longer be replayed; it stays visible (and
    /// removable) with [`OPERATION_PANICKED`] as its diagnostic.
    fn recover_interrupted_pass(&self) {
        let recovered = {
            let mut ops = match self.inner.operations.write() {
                Ok(ops) => ops,
                Err(e) => {
                    error!("Queue lock poisoned while recovering a dead pass: {}", e);
                    return;
                }
            };

            let mut recovered = 0;
            for op in ops.iter_mut().filter(|op| op.status() == OperationStatus::Processing) {
                op.record.retry_count = op.record.retry_count.saturating_add(1);
                op.record.mark_failed(OPERATION_PANICKED);
                op.operation = None;
                self.inner.metrics.record_failure();
                error!(
                    operation_id = %op.record.id,
                    kind = %op.record.kind,
                    collection = %op.record.collection,
                    "Queued operation panicked during replay"
                );
                recovered += 1;
            }

            if recovered > 0 {
                if let Err(e) = self.persist_locked(&ops) {
                    error!(error = %e, "Failed to persist queue after a dead pass");
                }
            }
            recovered
        };

        if recovered > 0 {
            self.notify_state_change();
        }
    }

    async fn run_pass(&self) -> QueueResult<ProcessSummary> {
        self.inner.metrics.record_pass();

        let candidates: Vec<String> = {
            let ops = self.inner.operations.read().map_err(|e| CommonError::lock(e.to_string()))?;
            ops.iter()
                .filter(|op| op.status().is_eligible())
                .map(|op| op.id().to_string())
                .collect()
        };

        let mut summary = ProcessSummary { visited: candidates.len(), ..Default::default() };
        if candidates.is_empty() {
            debug!("Offline queue pass found nothing to do");
            return Ok(summary);
        }

        info!(count = candidates.len(), "Processing offline queue");

        for id in &candidates {
            match self.process_operation(id).await {
                Ok(OperationStatus::Completed) => summary.completed += 1,
                Ok(OperationStatus::Failed) => summary.failed += 1,
                Ok(_) => {}
                // removed or picked up elsewhere since the pass started
                Err(QueueError::ItemNotFound(_) | QueueError::OperationInProgress(_)) => {}
                Err(e) => {
                    warn!(operation_id = %id, error = %e, "Continuing pass after operation error");
                }
            }
        }

        self.persist_current()?;
        self.notify_state_change();

        info!(
            visited = summary.visited,
            completed = summary.completed,
            failed = summary.failed,
            "Offline queue pass finished"
        );

        Ok(summary)
    }

    /// Run a single operation through the retry executor
    ///
    /// The attempt budget is `max_retries - retry_count`; every scheduled
    /// retry and the final failed attempt are charged to `retry_count`, so
    /// the cap holds across passes. An error that does not classify as
    /// retryable ends the run after that attempt. Operations already at the
    /// cap, or with no closure, are failed without being invoked.
    #[instrument(skip(self, id), fields(operation_id = %id))]
    pub async fn process_operation(&self, id: &str) -> QueueResult<OperationStatus> {
        let max_retries = self.inner.config.max_retries;

        let (operation, budget, label) = {
            let mut ops =
                self.inner.operations.write().map_err(|e| CommonError::lock(e.to_string()))?;
            let op = ops
                .iter_mut()
                .find(|op| op.id() == id)
                .ok_or_else(|| QueueError::ItemNotFound(id.to_string()))?;

            match op.status() {
                OperationStatus::Processing => {
                    return Err(QueueError::OperationInProgress(id.to_string()))
                }
                OperationStatus::Completed => return Ok(OperationStatus::Completed),
                OperationStatus::Pending | OperationStatus::Failed => {}
            }

            let terminal = if op.record.retry_count >= max_retries {
                Some(MAX_RETRIES_EXCEEDED)
            } else if op.operation.is_none() {
                Some(OPERATION_UNAVAILABLE)
            } else {
                None
            };

            if let Some(reason) = terminal {
                op.record.mark_failed(reason);
                warn!(
                    kind = %op.record.kind,
                    collection = %op.record.collection,
                    retry_count = op.record.retry_count,
                    reason,
                    "Queued operation cannot be attempted"
                );
                self.inner.metrics.record_failure();
                self.persist_locked(&ops)?;
                drop(ops);
                self.notify_state_change();
                return Ok(OperationStatus::Failed);
            }

            let Some(operation) = op.operation.clone() else {
                return Err(QueueError::InvalidState(format!("operation {id} lost its closure")));
            };

            op.record.mark_processing(self.inner.clock.millis_since_epoch());
            let budget = max_retries - op.record.retry_count;
            let label = format!("{}:{}", op.record.kind, op.record.collection);
            (operation, budget, label)
        };

        debug!(budget, "Replaying queued operation");

        let strategy = self.inner.retry.clone().with_max_attempts(budget)?;
        let result = strategy
            .execute_with_retry(&label, || operation(), |err: &CommonError, attempt, delay| {
                self.record_retry(id, err, attempt, delay)
            })
            .await;

        let status = {
            let mut ops =
                self.inner.operations.write().map_err(|e| CommonError::lock(e.to_string()))?;
            let Some(op) = ops.iter_mut().find(|op| op.id() == id) else {
                debug!("Operation removed while it was being replayed");
                return Err(QueueError::ItemNotFound(id.to_string()));
            };

            let status = match &result {
                Ok(()) => {
                    op.record.mark_completed();
                    self.inner.metrics.record_completion();
                    info!(retry_count = op.record.retry_count, "Queued operation replayed");
                    OperationStatus::Completed
                }
                Err(err) => {
                    op.record.retry_count = op.record.retry_count.saturating_add(1);
                    op.record.mark_failed(err.to_string());
                    self.inner.metrics.record_failure();
                    warn!(
                        retry_count = op.record.retry_count,
                        error = %err,
                        "Queued operation failed"
                    );
                    OperationStatus::Failed
                }
            };

            self.persist_locked(&ops)?;
            status
        };

        self.notify_state_change();
        Ok(status)
    }

    fn record_retry(&self, id: &str, err: &CommonError, attempt: u32, delay: Duration) {
        self.inner.metrics.record_retry();

        let mut ops = match self.inner.operations.write() {
            Ok(ops) => ops,
            Err(e) => {
                error!("Queue lock poisoned while recording retry: {}", e);
                return;
            }
        };

        if let Some(op) = ops.iter_mut().find(|op| op.id() == id) {
            op.record.retry_count = op.record.retry_count.saturating_add(1);
            op.record.last_error = Some(err.to_string());
            debug!(
                operation_id = %id,
                attempt,
                delay = ?delay,
                retry_count = op.record.retry_count,
                "Scheduling retry of queued operation"
            );
        }
    }

    /// Drop completed operations, returning how many were removed
    ///
    /// Persists and notifies only when something was removed.
    pub fn clear_completed(&self) -> QueueResult<usize> {
        let removed = {
            let mut ops =
                self.inner.operations.write().map_err(|e| CommonError::lock(e.to_string()))?;
            let before = ops.len();
            ops.retain(|op| op.status() != OperationStatus::Completed);
            let removed = before - ops.len();

            if removed > 0 {
                self.persist_locked(&ops)?;
                self.inner.metrics.update_size(ops.len());
            }
            removed
        };

        if removed > 0 {
            info!(removed, "Cleared completed operations");
            self.notify_state_change();
        }
        Ok(removed)
    }

    /// Drop every operation, returning how many were removed
    pub fn clear_queue(&self) -> QueueResult<usize> {
        let removed = {
            let mut ops =
                self.inner.operations.write().map_err(|e| CommonError::lock(e.to_string()))?;
            let removed = ops.len();
            ops.clear();
            self.persist_locked(&ops)?;
            self.inner.metrics.update_size(0);
            removed
        };

        info!(removed, "Offline queue cleared");
        self.notify_state_change();
        Ok(removed)
    }

    /// Look up an operation by id
    pub fn get_operation(&self, id: &str) -> Option<QueuedOperationRecord<P>> {
        let ops = self.inner.operations.read().ok()?;
        ops.iter().find(|op| op.id() == id).map(RunnableQueuedOperation::to_record)
    }

    /// Remove an operation that is not currently being replayed
    pub fn remove_operation(&self, id: &str) -> QueueResult<QueuedOperationRecord<P>> {
        let removed = {
            let mut ops =
                self.inner.operations.write().map_err(|e| CommonError::lock(e.to_string()))?;
            let index = ops
                .iter()
                .position(|op| op.id() == id)
                .ok_or_else(|| QueueError::ItemNotFound(id.to_string()))?;

            if ops[index].status() == OperationStatus::Processing {
                return Err(QueueError::OperationInProgress(id.to_string()));
            }

            let removed = ops.remove(index);
            self.persist_locked(&ops)?;
            self.inner.metrics.update_size(ops.len());
            removed
        };

        debug!(operation_id = %id, "Removed queued operation");
        self.notify_state_change();
        Ok(removed.record)
    }

    /// Whether anything is waiting for or undergoing replay
    pub fn has_pending_operations(&self) -> bool {
        self.inner
            .operations
            .read()
            .map(|ops| {
                ops.iter().any(|op| {
                    matches!(op.status(), OperationStatus::Pending | OperationStatus::Processing)
                })
            })
            .unwrap_or(false)
    }

    /// Snapshot of the queue
    pub fn get_state(&self) -> QueueResult<QueueState<P>> {
        let is_processing = self.is_processing();
        let ops = self.inner.operations.read().map_err(|e| CommonError::lock(e.to_string()))?;
        Ok(QueueState::from_operations(&ops, is_processing))
    }

    /// Whether a processing pass is in flight
    pub fn is_processing(&self) -> bool {
        self.inner.in_flight.lock().map(|slot| slot.is_some()).unwrap_or(false)
    }

    /// Number of queued operations, completed ones included
    pub fn len(&self) -> usize {
        self.inner.operations.read().map(|ops| ops.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get queue metrics
    pub fn metrics(&self) -> QueueMetricsSnapshot {
        self.inner.metrics.snapshot()
    }

    /// Debug facade over this queue
    pub fn inspector(&self) -> QueueInspector<P> {
        QueueInspector::new(self.clone())
    }

    fn persist_current(&self) -> QueueResult<()> {
        let ops = self.inner.operations.read().map_err(|e| CommonError::lock(e.to_string()))?;
        self.persist_locked(&ops)
    }

    fn persist_locked(&self, ops: &[RunnableQueuedOperation<P>]) -> QueueResult<()> {
        let records: Vec<_> = ops.iter().map(RunnableQueuedOperation::to_record).collect();
        let result = self.inner.store.save(&records);
        self.inner.metrics.record_persistence(result.is_ok());
        result
    }

    fn notify_state_change(&self) {
        let Some(listener) = self.inner.listener.as_ref() else {
            return;
        };

        match self.get_state() {
            Ok(state) => listener(&state),
            Err(e) => warn!(error = %e, "Skipping state change notification"),
        }
    }
}
