//! # CertPrep Infrastructure
//!
//! Infrastructure implementations of the ports the offline write path
//! depends on.
//!
//! This crate contains:
//! - A file-backed key-value store for the persisted queue
//! - Configuration loading (environment variables, JSON/TOML files)
//! - Tracing subscriber bootstrap
//! - [`OfflineRuntime`]: wiring of store, connectivity signal, queue and
//!   the offline study store adapter
//!
//! ## Architecture
//! - Implements traits defined in `certprep-common` and `certprep-core`
//! - Contains all "impure" code (file system, process environment)

pub mod config;
pub mod context;
pub mod logging;
pub mod storage;

// Re-export commonly used items
pub use context::OfflineRuntime;
pub use logging::init_tracing;
pub use storage::FileKeyValueStore;
