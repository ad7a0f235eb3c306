//! Integration tests for study write envelopes
//!
//! Scenario-style checks of the shapes that end up in the offline queue and
//! in the receipts handed back to the UI.

use certprep_domain::{
    Attempt, AttemptAnswer, AttemptDraft, StudyCollection, StudyError, StudyWrite, WriteReceipt,
};
use chrono::{TimeZone, Utc};
use serde_json::json;

fn attempt_draft() -> AttemptDraft {
    AttemptDraft {
        quiz_id: "q-42".to_string(),
        score: 17,
        total: 20,
        answers: vec![AttemptAnswer {
            question_id: "q-42-1".to_string(),
            choice: "B".to_string(),
            correct: true,
        }],
        completed_at: Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap(),
    }
}

/// Test a quiz attempt recorded offline survives the queue's JSON form
///
/// Scenario: user finishes a quiz on a plane, the attempt is queued and read
/// back after a restart
#[test]
fn test_recorded_attempt_survives_persistence() {
    let write = StudyWrite::RecordAttempt(attempt_draft());
    let persisted = serde_json::to_string(&write).unwrap();

    let restored: StudyWrite = serde_json::from_str(&persisted).unwrap();
    assert_eq!(restored, write);
    assert_eq!(restored.collection(), StudyCollection::Attempts.to_string());
    assert!(restored.is_create());

    let value: serde_json::Value = serde_json::from_str(&persisted).unwrap();
    assert_eq!(value["op"], "recordAttempt");
    assert_eq!(value["args"]["completedAt"], "2024-01-01T09:30:00Z");
}

/// Test the optimistic attempt receipt the UI renders while offline
#[test]
fn test_optimistic_attempt_receipt() {
    let receipt = WriteReceipt::queued(Attempt::new("temp_3", attempt_draft()), "op-9");
    let value = serde_json::to_value(&receipt).unwrap();

    assert_eq!(value["id"], "temp_3");
    assert_eq!(value["score"], 17);
    assert_eq!(value["_queued"], true);
    assert_eq!(value["_queueId"], "op-9");
    assert_eq!(receipt.queue_id(), Some("op-9"));
    assert_eq!(receipt.into_inner().details.total, 20);
}

/// Test unknown write shapes are rejected rather than silently accepted
#[test]
fn test_unknown_write_rejected() {
    let result = serde_json::from_value::<StudyWrite>(json!({"op": "deleteQuiz", "args": {}}));
    assert!(result.is_err());
}

/// Test domain errors round-trip through their serialized envelope
#[test]
fn test_error_envelope_round_trip() {
    let err: StudyError =
        serde_json::from_value(json!({"type": "Network", "message": "Failed to fetch"})).unwrap();
    assert_eq!(err, StudyError::Network("Failed to fetch".to_string()));
}
