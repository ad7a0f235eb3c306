// Retry executor with exponential backoff and connectivity classification

pub mod constants;
pub mod policies;
pub mod strategy;

pub use policies::RetryPolicies;
pub use strategy::{RetryCondition, RetryStrategy};
