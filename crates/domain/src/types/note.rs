//! Study notes
//!
//! Notes are free-form text, optionally pinned to a quiz or a single
//! question.

use serde::{Deserialize, Serialize};

/// Fields submitted when creating a note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDraft {
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Stored note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    #[serde(flatten)]
    pub details: NoteDraft,
}

impl Note {
    pub fn new(id: impl Into<String>, details: NoteDraft) -> Self {
        Self { id: id.into(), details }
    }
}

/// Partial update of a note
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NoteChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}
