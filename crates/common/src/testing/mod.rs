//! Testing utilities and helpers
//!
//! This module provides:
//! - **[`async_utils`]**: polling helpers for background queue passes
//! - **[`mocks`]**: in-memory [`KeyValueStore`](crate::sync::queue::KeyValueStore)
//!   with failure injection
//! - **[`time`]**: clock abstraction used for queue timestamps
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use certprep_common::testing::{MockClock, MockStorage};
//! use certprep_common::OfflineQueue;
//!
//! let storage = MockStorage::new();
//! let queue: OfflineQueue = OfflineQueue::builder(Arc::new(storage.clone()))
//!     .config(certprep_common::QueueConfig::testing())
//!     .clock(Arc::new(MockClock::new()))
//!     .build()
//!     .unwrap();
//! assert!(queue.is_empty());
//! ```

pub mod async_utils;
pub mod mocks;
pub mod time;

// Re-export commonly used items
// Note: Macros exported with #[macro_export] are available at crate root
pub use async_utils::{poll_until, timeout_ok, wait_until_settled};
pub use mocks::MockStorage;
pub use time::{Clock, MockClock, SystemClock};
