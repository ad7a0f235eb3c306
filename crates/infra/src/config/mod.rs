//! Configuration loading and management
//!
//! This module provides utilities for loading application configuration
//! from environment variables and files, and for turning the queue section
//! into a [`QueueConfig`](certprep_common::sync::QueueConfig).

pub mod loader;

// Re-export commonly used items
pub use loader::{load, load_from_env, load_from_file, probe_config_paths, queue_config};
