//! Macros for reducing boilerplate code
//!
//! Status-like enums in the queue are persisted and logged as lowercase
//! strings; these macros keep the string forms in one place.

/// Implements Display and FromStr traits for status enums
///
/// - `Display` writes the lowercase string given for each variant
/// - `FromStr` parses case-insensitively and reports the enum name on error
///
/// # Example
///
/// ```rust
/// use certprep_common::impl_status_conversions;
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// pub enum ReplayPhase {
///     Idle,
///     Draining,
/// }
///
/// impl_status_conversions!(ReplayPhase {
///     Idle => "idle",
///     Draining => "draining",
/// });
///
/// assert_eq!(ReplayPhase::Draining.to_string(), "draining");
/// ```
#[macro_export]
macro_rules! impl_status_conversions {
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
