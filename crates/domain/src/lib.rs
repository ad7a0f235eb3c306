//! # CertPrep Domain
//!
//! Business domain types for the CertPrep study app's write path.
//!
//! This crate contains:
//! - Study records and the payloads used to create or change them (quizzes,
//!   notes, quiz attempts)
//! - The serializable description of a queued write ([`StudyWrite`]) and the
//!   receipt returned to callers ([`WriteReceipt`])
//! - Domain error types and Result definitions
//! - Configuration structures
//!
//! ## Architecture
//! - No dependencies on other CertPrep crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
