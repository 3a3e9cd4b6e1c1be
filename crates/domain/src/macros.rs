//! Macro for implementing Display and FromStr for status enums
//!
//! Status enums are persisted and logged as lowercase snake_case strings.
//! Parsing is case-insensitive.
//!
//! # Example
//!
//! ```rust
//! use workpulse_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum SyncState {
//!     Pending,
//!     Synced,
//! }
//!
//! impl_domain_status_conversions!(SyncState {
//!     Pending => "pending",
//!     Synced => "synced",
//! });
//!
//! assert_eq!(SyncState::Synced.to_string(), "synced");
//! assert_eq!("PENDING".parse::<SyncState>(), Ok(SyncState::Pending));
//! ```

/// Implements Display and FromStr traits for status enums
///
/// * `$enum_name` - The name of the enum type
/// * `$variant => $str` - Mapping of enum variants to their string
///   representations
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
