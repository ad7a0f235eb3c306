//! Integration tests for the file-backed key-value store
//!
//! Exercises the store on its own and as the persistence backend of a real
//! offline queue, including a simulated app restart.

use std::sync::Arc;

use certprep_common::sync::queue::{
    operation, EnqueueRequest, KeyValueStore, OfflineQueue, OperationStatus, OperationType,
    QueueConfig, OPERATION_UNAVAILABLE,
};
use certprep_common::CommonError;
use certprep_infra::FileKeyValueStore;
use serde_json::json;
use tempfile::TempDir;

fn quiz_request(title: &str) -> EnqueueRequest {
    EnqueueRequest::new(
        OperationType::Create,
        "quizzes",
        json!({"title": title, "certification": "SAA-C03"}),
        operation(|| async { Err(CommonError::backend("study_store", "Failed to fetch", true)) }),
    )
}

#[test]
fn test_get_set_remove_round_trip() {
    let dir = TempDir::new().unwrap();
    let store = FileKeyValueStore::open(dir.path()).unwrap();

    assert_eq!(store.get("missing").unwrap(), None);

    store.set("certprep.offline_queue", "[]").unwrap();
    store.set("certprep.offline_queue", r#"[{"id":"a"}]"#).unwrap();
    assert_eq!(store.get("certprep.offline_queue").unwrap().as_deref(), Some(r#"[{"id":"a"}]"#));

    store.remove("certprep.offline_queue").unwrap();
    assert_eq!(store.get("certprep.offline_queue").unwrap(), None);

    // Removing an absent key is not an error
    store.remove("certprep.offline_queue").unwrap();
}

#[test]
fn test_open_creates_nested_directory() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("profiles").join("default");

    let store = FileKeyValueStore::open(&nested).unwrap();
    store.set("k", "v").unwrap();

    assert!(nested.join("k").is_file());
}

#[test]
fn test_two_handles_share_files() {
    let dir = TempDir::new().unwrap();
    let writer = FileKeyValueStore::open(dir.path()).unwrap();
    let reader = FileKeyValueStore::open(dir.path()).unwrap();

    writer.set("shared", "value").unwrap();
    assert_eq!(reader.get("shared").unwrap().as_deref(), Some("value"));
}

/// Queued operations survive a restart with their data intact and no
/// replay closure
#[tokio::test(flavor = "multi_thread")]
async fn test_queue_survives_restart_on_disk() {
    let dir = TempDir::new().unwrap();

    let (first, second) = {
        let backend = Arc::new(FileKeyValueStore::open(dir.path()).unwrap());
        let queue: OfflineQueue = OfflineQueue::builder(backend)
            .config(QueueConfig::testing().with_max_retries(2))
            .build()
            .unwrap();

        let first = queue.enqueue(quiz_request("VPC peering")).unwrap();
        let second = queue.enqueue(quiz_request("S3 lifecycle")).unwrap();

        let summary = queue.process_queue().await.unwrap();
        assert_eq!(summary.failed, 2);
        (first, second)
    };

    let backend = Arc::new(FileKeyValueStore::open(dir.path()).unwrap());
    let restored: OfflineQueue = OfflineQueue::builder(backend)
        .config(QueueConfig::testing().with_max_retries(5))
        .build()
        .unwrap();

    assert_eq!(restored.len(), 2);
    let record = restored.get_operation(&first).unwrap();
    assert_eq!(record.status, OperationStatus::Failed);
    assert_eq!(record.retry_count, 2);
    assert_eq!(record.collection, "quizzes");
    assert_eq!(record.data["title"], "VPC peering");
    assert!(restored.get_operation(&second).is_some());

    // Nothing can replay a restored entry
    restored.process_queue().await.unwrap();
    let record = restored.get_operation(&first).unwrap();
    assert_eq!(record.status, OperationStatus::Failed);
    assert_eq!(record.last_error.as_deref(), Some(OPERATION_UNAVAILABLE));
}
