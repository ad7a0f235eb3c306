//! Macro for implementing Display and FromStr for string-valued enums
//!
//! Collections and similar wire-level names are stored as lowercase strings
//! in queued records; this macro keeps both directions in one place.
//!
//! # Example
//!
//! ```rust
//! use certprep_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum ReviewState {
//!     New,
//!     Learning,
//!     Mastered,
//! }
//!
//! impl_domain_status_conversions!(ReviewState {
//!     New => "new",
//!     Learning => "learning",
//!     Mastered => "mastered",
//! });
//!
//! assert_eq!(ReviewState::Learning.to_string(), "learning");
//! ```

/// Implements Display and FromStr traits for string-valued enums
///
/// This macro generates:
/// - Display trait: converts enum variants to their string form
/// - FromStr trait: parses case-insensitive strings to enum variants
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
