//! Practice quizzes

use serde::{Deserialize, Serialize};

/// Fields submitted when creating a quiz
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizDraft {
    pub title: String,
    /// Exam the quiz prepares for, e.g. `CCNA 200-301`
    pub certification: String,
    #[serde(default)]
    pub question_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit_minutes: Option<u32>,
}

/// Stored quiz
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: String,
    #[serde(flatten)]
    pub details: QuizDraft,
}

impl Quiz {
    pub fn new(id: impl Into<String>, details: QuizDraft) -> Self {
        Self { id: id.into(), details }
    }
}

/// Partial update of a quiz; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuizChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certification: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit_minutes: Option<u32>,
}

impl QuizChanges {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
