//! Application constants
//!
//! Centralized location for domain-level constants shared by the adapter
//! and the runtime wiring.

// Remote collections
pub const QUIZZES_COLLECTION: &str = "quizzes";
pub const NOTES_COLLECTION: &str = "notes";
pub const ATTEMPTS_COLLECTION: &str = "attempts";

/// Prefix of optimistic ids handed out for creates made while offline
pub const TEMP_ID_PREFIX: &str = "temp_";

// Queue defaults
pub const DEFAULT_QUEUE_STORAGE_KEY: &str = "certprep.offline_queue";
pub const DEFAULT_MAX_QUEUE_SIZE: usize = 1000;
pub const DEFAULT_MAX_RETRIES: u32 = 5;
pub const DEFAULT_BASE_RETRY_DELAY_MS: u64 = 1_000;
pub const DEFAULT_MAX_RETRY_DELAY_MS: u64 = 30_000;

// Storage and logging defaults
pub const DEFAULT_DATA_DIR: &str = ".certprep";
pub const DEFAULT_LOG_LEVEL: &str = "info";
