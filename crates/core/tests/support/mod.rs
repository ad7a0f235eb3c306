//! In-memory study store for adapter tests
//!
//! Behaves like the remote document store while "online" and fails every
//! call with `StudyError::Network` while "offline", so tests can flip
//! connectivity and watch queued writes replay.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use certprep_core::StudyStore;
use certprep_domain::{
    Attempt, AttemptDraft, Note, NoteChanges, NoteDraft, Quiz, QuizChanges, QuizDraft, Result,
    StudyError,
};
use serde_json::Value;

#[derive(Default)]
struct Collections {
    quizzes: BTreeMap<String, Quiz>,
    notes: BTreeMap<String, Note>,
    attempts: Vec<Attempt>,
    batches: Vec<(String, Value)>,
}

/// In-memory mock for `StudyStore` with a connectivity switch.
#[derive(Default)]
pub struct InMemoryStudyStore {
    data: Mutex<Collections>,
    offline: AtomicBool,
    next_id: AtomicU32,
    writes: AtomicU32,
}

impl InMemoryStudyStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Successful writes so far
    pub fn write_count(&self) -> u32 {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn quizzes(&self) -> Vec<Quiz> {
        self.data.lock().unwrap().quizzes.values().cloned().collect()
    }

    pub fn attempts(&self) -> Vec<Attempt> {
        self.data.lock().unwrap().attempts.clone()
    }

    pub fn note(&self, id: &str) -> Option<Note> {
        self.data.lock().unwrap().notes.get(id).cloned()
    }

    pub fn seed_note(&self, note: Note) {
        self.data.lock().unwrap().notes.insert(note.id.clone(), note);
    }

    fn reachable(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StudyError::Network("Failed to fetch".to_string()))
        } else {
            Ok(())
        }
    }

    fn write(&self) -> Result<std::sync::MutexGuard<'_, Collections>> {
        self.reachable()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(self.data.lock().unwrap())
    }

    fn assign_id(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[async_trait]
impl StudyStore for InMemoryStudyStore {
    async fn create_quiz(&self, draft: &QuizDraft) -> Result<Quiz> {
        if draft.title.trim().is_empty() {
            return Err(StudyError::Validation("title is required".to_string()));
        }
        let quiz = Quiz::new(self.assign_id("quiz"), draft.clone());
        self.write()?.quizzes.insert(quiz.id.clone(), quiz.clone());
        Ok(quiz)
    }

    async fn update_quiz(&self, id: &str, changes: &QuizChanges) -> Result<()> {
        let mut data = self.write()?;
        let quiz = data
            .quizzes
            .get_mut(id)
            .ok_or_else(|| StudyError::NotFound(format!("quiz {id}")))?;
        if let Some(title) = &changes.title {
            quiz.details.title = title.clone();
        }
        if let Some(certification) = &changes.certification {
            quiz.details.certification = certification.clone();
        }
        Ok(())
    }

    async fn create_note(&self, draft: &NoteDraft) -> Result<Note> {
        let note = Note::new(self.assign_id("note"), draft.clone());
        self.write()?.notes.insert(note.id.clone(), note.clone());
        Ok(note)
    }

    async fn update_note(&self, id: &str, changes: &NoteChanges) -> Result<()> {
        let mut data = self.write()?;
        let note =
            data.notes.get_mut(id).ok_or_else(|| StudyError::NotFound(format!("note {id}")))?;
        if let Some(body) = &changes.body {
            note.details.body = body.clone();
        }
        if let Some(tags) = &changes.tags {
            note.details.tags = tags.clone();
        }
        Ok(())
    }

    async fn record_attempt(&self, draft: &AttemptDraft) -> Result<Attempt> {
        let attempt = Attempt::new(self.assign_id("attempt"), draft.clone());
        self.write()?.attempts.push(attempt.clone());
        Ok(attempt)
    }

    async fn commit_batch(&self, collection: &str, payload: &Value) -> Result<()> {
        self.write()?.batches.push((collection.to_string(), payload.clone()));
        Ok(())
    }

    async fn get_quiz(&self, id: &str) -> Result<Quiz> {
        self.reachable()?;
        self.data
            .lock()
            .unwrap()
            .quizzes
            .get(id)
            .cloned()
            .ok_or_else(|| StudyError::NotFound(format!("quiz {id}")))
    }

    async fn list_quizzes(&self, certification: Option<&str>) -> Result<Vec<Quiz>> {
        self.reachable()?;
        Ok(self
            .quizzes()
            .into_iter()
            .filter(|quiz| certification.map_or(true, |c| quiz.details.certification == c))
            .collect())
    }

    async fn get_note(&self, id: &str) -> Result<Note> {
        self.reachable()?;
        self.note(id).ok_or_else(|| StudyError::NotFound(format!("note {id}")))
    }
}
