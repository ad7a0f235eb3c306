//! # CertPrep Core
//!
//! Business logic of the study app's write path, free of infrastructure.
//!
//! This crate contains:
//! - The [`StudyStore`] port: the remote document store as an async trait
//! - [`OfflineStudyStore`]: the adapter that turns connectivity failures
//!   into queued writes with optimistic results
//!
//! ## Architecture Principles
//! - Depends on `certprep-common` and `certprep-domain` only
//! - No file system, HTTP, or platform code
//! - All external dependencies via traits

pub mod study;

pub use study::offline::{is_connectivity_failure, OfflineStudyStore};
pub use study::ports::StudyStore;
