//! Quiz attempts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One answered question within an attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptAnswer {
    pub question_id: String,
    pub choice: String,
    pub correct: bool,
}

/// A finished run through a quiz, as submitted by the client
///
/// Scores are computed client-side; the store only records them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptDraft {
    pub quiz_id: String,
    pub score: u32,
    pub total: u32,
    #[serde(default)]
    pub answers: Vec<AttemptAnswer>,
    pub completed_at: DateTime<Utc>,
}

/// Stored attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    pub id: String,
    #[serde(flatten)]
    pub details: AttemptDraft,
}

impl Attempt {
    pub fn new(id: impl Into<String>, details: AttemptDraft) -> Self {
        Self { id: id.into(), details }
    }
}
