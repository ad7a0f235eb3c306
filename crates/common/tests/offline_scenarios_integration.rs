//! End-to-end offline scenarios
//!
//! Drives the queue the way the study app does: writes fail while the
//! device is offline, get queued, and are replayed either on demand, right
//! after enqueue, or when connectivity comes back.

#![cfg(feature = "runtime")]

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use certprep_common::error::CommonError;
use certprep_common::sync::queue::{
    operation, EnqueueRequest, OfflineQueue, OperationStatus, OperationType, QueueConfig,
    QueueResult,
};
use certprep_common::sync::NetworkMonitor;
use certprep_common::testing::{poll_until, wait_until_settled, MockStorage};
use serde_json::json;

const SETTLE: Duration = Duration::from_secs(2);

/// Operation that fails with a connectivity error `failures` times, then
/// succeeds. Returns the request and its call counter.
fn flaky_request(failures: u32) -> (EnqueueRequest, Arc<AtomicU32>) {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let request = EnqueueRequest::new(
        OperationType::Create,
        "attempts",
        json!({"quizId": "q-42", "score": 17, "total": 20}),
        operation(move || {
            let call = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if call < failures {
                    Err(CommonError::backend("study_store", "Network request failed", true))
                } else {
                    Ok(())
                }
            }
        }),
    );
    (request, calls)
}

/// Validates `OfflineQueue::process_queue` behavior for the single
/// transient failure scenario.
///
/// Assertions:
/// - Confirms the operation completes within one pass.
/// - Confirms it was invoked twice and one retry was charged.
#[tokio::test(flavor = "multi_thread")]
async fn test_transient_failure_recovers_in_one_pass() -> QueueResult<()> {
    let queue: OfflineQueue = OfflineQueue::builder(Arc::new(MockStorage::new()))
        .config(QueueConfig::testing().with_max_retries(5))
        .build()?;

    let (request, calls) = flaky_request(1);
    let id = queue.enqueue(request)?;

    let summary = queue.process_queue().await?;
    assert_eq!(summary.completed, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let record = queue.get_operation(&id).expect("completed entries stay until cleared");
    assert_eq!(record.status, OperationStatus::Completed);
    assert_eq!(record.retry_count, 1);
    assert!(record.last_error.is_none());
    assert_eq!(queue.metrics().total_retried, 1);
    Ok(())
}

/// Validates `OfflineQueue::process_queue` behavior for the concurrent
/// caller scenario.
///
/// Assertions:
/// - Confirms two overlapping calls share a single pass.
/// - Confirms each operation ran exactly once.
#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_process_calls_share_one_pass() -> QueueResult<()> {
    let queue: OfflineQueue = OfflineQueue::for_testing(Arc::new(MockStorage::new()))?;
    let calls = Arc::new(AtomicU32::new(0));

    for title in ["Subnetting drill", "OSPF areas"] {
        let counter = Arc::clone(&calls);
        queue.enqueue(EnqueueRequest::new(
            OperationType::Create,
            "quizzes",
            json!({"title": title}),
            operation(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok(())
                }
            }),
        ))?;
    }

    let (first, second) = tokio::join!(queue.process_queue(), queue.process_queue());
    let (first, second) = (first?, second?);

    assert_eq!(first, second);
    assert_eq!(first.completed, 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(queue.metrics().processing_passes, 1);
    assert!(!queue.is_processing());
    Ok(())
}

/// Validates `OfflineQueue::enqueue` behavior for the online auto-process
/// scenario.
///
/// Assertions:
/// - Confirms an operation enqueued while online is replayed without an
///   explicit `process_queue` call.
#[tokio::test(flavor = "multi_thread")]
async fn test_enqueue_while_online_processes_in_background() -> QueueResult<()> {
    let queue: OfflineQueue = OfflineQueue::builder(Arc::new(MockStorage::new()))
        .config(QueueConfig::testing().with_auto_process(true))
        .build()?;

    let (request, calls) = flaky_request(0);
    let id = queue.enqueue(request)?;

    assert!(wait_until_settled(&queue, SETTLE).await, "queue never settled");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(queue.get_operation(&id).map(|r| r.status), Some(OperationStatus::Completed));
    Ok(())
}

/// Validates `OfflineQueue` behavior for the reconnect scenario.
///
/// Assertions:
/// - Ensures nothing is replayed while offline.
/// - Confirms going back online triggers a pass that completes the work.
#[tokio::test(flavor = "multi_thread")]
async fn test_reconnect_triggers_processing() -> QueueResult<()> {
    let network = NetworkMonitor::offline();
    let queue: OfflineQueue = OfflineQueue::builder(Arc::new(MockStorage::new()))
        .config(QueueConfig::testing().with_auto_process(true))
        .network(network.clone())
        .build()?;

    let (request, calls) = flaky_request(0);
    queue.enqueue(request)?;

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(queue.has_pending_operations());

    network.set_online(true);

    let replayed = poll_until(SETTLE, Duration::from_millis(5), || async {
        calls.load(Ordering::SeqCst) == 1
    })
    .await;
    assert!(replayed, "reconnect did not replay the queue");
    assert!(wait_until_settled(&queue, SETTLE).await);
    assert_eq!(queue.get_state()?.completed, 1);
    Ok(())
}

/// Validates `OfflineQueue::teardown` behavior for the detached listener
/// scenario.
///
/// Assertions:
/// - Ensures connectivity changes after teardown no longer start a pass.
/// - Confirms explicit processing still works.
#[tokio::test(flavor = "multi_thread")]
async fn test_teardown_stops_reconnect_processing() -> QueueResult<()> {
    let network = NetworkMonitor::offline();
    let queue: OfflineQueue = OfflineQueue::builder(Arc::new(MockStorage::new()))
        .config(QueueConfig::testing().with_auto_process(true))
        .network(network.clone())
        .build()?;

    let (request, calls) = flaky_request(0);
    queue.enqueue(request)?;
    queue.teardown();

    network.set_online(true);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(queue.metrics().processing_passes, 0);

    let summary = queue.process_queue().await?;
    assert_eq!(summary.completed, 1);
    Ok(())
}

/// Validates `QueueBuilder::on_state_change` behavior for the subscriber
/// scenario.
///
/// Assertions:
/// - Confirms the listener sees the enqueue and the pass outcome.
/// - Confirms the last snapshot reflects the completed operation.
#[tokio::test(flavor = "multi_thread")]
async fn test_state_listener_observes_mutations() -> QueueResult<()> {
    let notifications = Arc::new(AtomicUsize::new(0));
    let last_completed = Arc::new(Mutex::new(None));

    let seen = Arc::clone(&notifications);
    let last = Arc::clone(&last_completed);
    let queue: OfflineQueue = OfflineQueue::builder(Arc::new(MockStorage::new()))
        .config(QueueConfig::testing())
        .on_state_change(move |state| {
            seen.fetch_add(1, Ordering::SeqCst);
            *last.lock().unwrap() = Some(state.completed);
        })
        .build()?;

    let (request, _calls) = flaky_request(0);
    queue.enqueue(request)?;
    assert_eq!(notifications.load(Ordering::SeqCst), 1);
    assert_eq!(*last_completed.lock().unwrap(), Some(0));

    queue.process_queue().await?;
    assert!(notifications.load(Ordering::SeqCst) >= 2);
    assert_eq!(*last_completed.lock().unwrap(), Some(1));
    Ok(())
}
