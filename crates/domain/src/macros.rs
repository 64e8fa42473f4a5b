//! Macro for implementing Display and FromStr for status enums
//!
//! Status enums are stored as text columns, so both directions of the
//! string conversion live in one place: Display emits the canonical
//! lowercase form, FromStr parses case-insensitively.
//!
//! # Example
//!
//! ```rust
//! use slotline_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum JobStatus {
//!     Pending,
//!     Done,
//! }
//!
//! impl_domain_status_conversions!(JobStatus {
//!     Pending => "pending",
//!     Done => "done",
//! });
//! ```

/// Implements Display and FromStr traits for status enums
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

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
