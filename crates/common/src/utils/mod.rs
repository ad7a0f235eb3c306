//! Common utility functions and helper macros
//!
//! - **[`macros`]**: status enum conversions
//! - **[`ids`]**: wrap-safe numeric id generation

#[macro_use]
pub mod macros;
pub mod ids;

pub use self::ids::{generate_safe_numeric_id, NumericIdGenerator};
