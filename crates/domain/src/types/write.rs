//! Write envelopes for the offline path
//!
//! [`StudyWrite`] is what gets persisted in the offline queue: enough to
//! show the user what is waiting and to tell writes apart in a debug view.
//! [`WriteReceipt`] is what callers get back from a write, whether it
//! reached the store or was queued.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{AttemptDraft, NoteChanges, NoteDraft, QuizChanges, QuizDraft};
use crate::impl_domain_status_conversions;

/// Remote collections the app writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudyCollection {
    Quizzes,
    Notes,
    Attempts,
}

impl_domain_status_conversions!(StudyCollection {
    Quizzes => "quizzes",
    Notes => "notes",
    Attempts => "attempts",
});

/// A write as recorded in the offline queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "args", rename_all = "camelCase")]
pub enum StudyWrite {
    CreateQuiz(QuizDraft),
    UpdateQuiz { id: String, changes: QuizChanges },
    CreateNote(NoteDraft),
    UpdateNote { id: String, changes: NoteChanges },
    RecordAttempt(AttemptDraft),
    /// Opaque multi-document write submitted as one unit
    Batch { collection: String, payload: Value },
}

impl StudyWrite {
    /// Collection the write lands in
    pub fn collection(&self) -> String {
        match self {
            Self::CreateQuiz(_) | Self::UpdateQuiz { .. } => StudyCollection::Quizzes.to_string(),
            Self::CreateNote(_) | Self::UpdateNote { .. } => StudyCollection::Notes.to_string(),
            Self::RecordAttempt(_) => StudyCollection::Attempts.to_string(),
            Self::Batch { collection, .. } => collection.clone(),
        }
    }

    /// Id of the document being changed, for updates
    pub fn target_id(&self) -> Option<&str> {
        match self {
            Self::UpdateQuiz { id, .. } | Self::UpdateNote { id, .. } => Some(id),
            _ => None,
        }
    }

    pub fn is_create(&self) -> bool {
        matches!(self, Self::CreateQuiz(_) | Self::CreateNote(_) | Self::RecordAttempt(_))
    }
}

/// Optimistic result of an update: the target id with the submitted fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Updated<T> {
    pub id: String,
    #[serde(flatten)]
    pub changes: T,
}

impl<T> Updated<T> {
    pub fn new(id: impl Into<String>, changes: T) -> Self {
        Self { id: id.into(), changes }
    }
}

/// Echo of a committed or queued batch write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchCommit {
    pub collection: String,
    pub payload: Value,
}

/// Result of a write through the offline adapter
///
/// Serializes as the value itself; queued receipts add `_queued: true` and
/// `_queueId` so a client can mark the record as pending sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteReceipt<T> {
    #[serde(flatten)]
    pub value: T,
    #[serde(rename = "_queued", default, skip_serializing_if = "std::ops::Not::not")]
    pub queued: bool,
    #[serde(rename = "_queueId", default, skip_serializing_if = "Option::is_none")]
    pub queue_id: Option<String>,
}

impl<T> WriteReceipt<T> {
    /// The store accepted the write
    pub fn confirmed(value: T) -> Self {
        Self { value, queued: false, queue_id: None }
    }

    /// The write was queued; `value` is an optimistic stand-in
    pub fn queued(value: T, queue_id: impl Into<String>) -> Self {
        Self { value, queued: true, queue_id: Some(queue_id.into()) }
    }

    pub fn is_queued(&self) -> bool {
        self.queued
    }

    pub fn queue_id(&self) -> Option<&str> {
        self.queue_id.as_deref()
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}
