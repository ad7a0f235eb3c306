//! Domain types and models
//!
//! Records of the three remote collections the app writes to, the payloads
//! that create or change them, and the write/receipt envelopes used while
//! offline.

pub mod attempt;
pub mod note;
pub mod quiz;
pub mod write;

pub use attempt::{Attempt, AttemptAnswer, AttemptDraft};
pub use note::{Note, NoteChanges, NoteDraft};
pub use quiz::{Quiz, QuizChanges, QuizDraft};
pub use write::{BatchCommit, StudyCollection, StudyWrite, Updated, WriteReceipt};
