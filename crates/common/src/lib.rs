//! Modular common utilities shared across CertPrep crates.
//!
//! The centrepiece is the offline write queue in [`sync`]: a durable,
//! single-flight replay queue for writes that could not reach the remote
//! study store.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: errors, utilities, id helpers
//! - `runtime`: async infrastructure (retry executor, offline queue,
//!   connectivity signal, debug surface)
//! - `observability`: tracing (pulled in by `runtime`)
//! - `test-utils`: mocks and clocks for downstream test suites

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod error;
#[cfg(feature = "foundation")]
#[macro_use]
pub mod utils;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod sync;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "foundation")]
pub use error::{CommonError, CommonResult, ErrorClassification};
#[cfg(feature = "runtime")]
pub use sync::{
    NetworkMonitor, OfflineQueue, OperationStatus, OperationType, QueueConfig, QueueError,
    QueueResult, QueueState, RetryStrategy,
};
#[cfg(feature = "foundation")]
pub use utils::ids::{generate_safe_numeric_id, NumericIdGenerator};
