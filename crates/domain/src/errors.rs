//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for WorkPulse
///
/// `Clone` so one failure can be handed to every caller that joined a
/// deduplicated query.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum WorkPulseError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WorkPulseError {
    /// Transient I/O failures that are worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Network(_) | Self::Timeout(_))
    }
}

/// Result type alias for WorkPulse operations
pub type Result<T> = std::result::Result<T, WorkPulseError>;
