//! # WorkPulse Domain
//!
//! Business domain types and models for WorkPulse.
//!
//! This crate contains:
//! - Persisted and derived data types (ActiveTaskSession, WorkDaySession,
//!   TaskLogEntry, etc.)
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Domain constants
//!
//! ## Architecture
//! - No dependencies on other WorkPulse crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
pub use utils::timestamp::{format_timestamp, parse_timestamp};
