//! Port interfaces for the remote study store

use async_trait::async_trait;
use certprep_domain::{
    Attempt, AttemptDraft, Note, NoteChanges, NoteDraft, Quiz, QuizChanges, QuizDraft, Result,
};
use serde_json::Value;

/// Trait for the remote document store holding quizzes, notes and attempts
///
/// Implementations report a lost connection as `StudyError::Network` (or
/// with a message such as "Failed to fetch"); the offline adapter relies on
/// that to decide what to queue.
#[async_trait]
pub trait StudyStore: Send + Sync {
    /// Create a quiz and return it with its store-assigned id
    async fn create_quiz(&self, draft: &QuizDraft) -> Result<Quiz>;

    /// Apply a partial update to a quiz
    async fn update_quiz(&self, id: &str, changes: &QuizChanges) -> Result<()>;

    async fn create_note(&self, draft: &NoteDraft) -> Result<Note>;

    async fn update_note(&self, id: &str, changes: &NoteChanges) -> Result<()>;

    /// Record a finished quiz attempt
    async fn record_attempt(&self, draft: &AttemptDraft) -> Result<Attempt>;

    /// Commit a multi-document write to `collection` as one unit
    async fn commit_batch(&self, collection: &str, payload: &Value) -> Result<()>;

    async fn get_quiz(&self, id: &str) -> Result<Quiz>;

    /// List quizzes, optionally only those for one certification
    async fn list_quizzes(&self, certification: Option<&str>) -> Result<Vec<Quiz>>;

    async fn get_note(&self, id: &str) -> Result<Note>;
}
