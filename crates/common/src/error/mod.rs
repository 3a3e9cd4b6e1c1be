//! Common error types shared by the runtime utilities
//!
//! `CommonError` covers the failure patterns that show up in more than one
//! runtime module (timeouts, backend failures, subscriber failures). Crates
//! with richer domain errors should compose with it rather than duplicate
//! these variants.
//!
//! ```rust
//! use std::time::Duration;
//!
//! use workpulse_common::error::{CommonError, ErrorClassification, ErrorSeverity};
//!
//! let err = CommonError::timeout("heartbeat", Duration::from_secs(5));
//! assert!(err.is_retryable());
//! assert_eq!(err.severity(), ErrorSeverity::Warning);
//! ```

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Result alias for runtime utilities.
pub type CommonResult<T> = Result<T, CommonError>;

/// Failure patterns shared across runtime modules.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommonError {
    /// An operation did not complete before its deadline.
    #[error("Operation '{operation}' timed out after {duration:?}")]
    Timeout { operation: String, duration: Duration },

    /// An external collaborator (store, network) reported a failure.
    #[error("Backend error from '{service}': {message}")]
    Backend { service: String, message: String, is_retryable: bool },

    /// Input rejected by validation.
    #[error("Validation error for field '{field}': {message}")]
    Validation { field: String, message: String },

    /// A requested resource does not exist.
    #[error("{resource_type} not found")]
    NotFound { resource_type: String },

    /// A tick subscriber failed while handling a tick.
    #[error("Subscriber '{subscriber}' failed: {message}")]
    Subscriber { subscriber: String, message: String },

    /// Invariant violation or bug.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CommonError {
    /// Build a timeout error.
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout { operation: operation.into(), duration }
    }

    /// Build a backend error.
    pub fn backend(
        service: impl Into<String>,
        message: impl Into<String>,
        is_retryable: bool,
    ) -> Self {
        Self::Backend { service: service.into(), message: message.into(), is_retryable }
    }

    /// Build a validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation { field: field.into(), message: message.into() }
    }

    /// Build a subscriber failure.
    pub fn subscriber(subscriber: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Subscriber { subscriber: subscriber.into(), message: message.into() }
    }

    /// Build an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }
}

/// Standard interface for classifying errors by their characteristics.
pub trait ErrorClassification {
    /// Transient failures that may succeed when attempted again.
    fn is_retryable(&self) -> bool;

    /// Severity used for logging decisions.
    fn severity(&self) -> ErrorSeverity;
}

impl ErrorClassification for CommonError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Backend { is_retryable, .. } => *is_retryable,
            Self::Validation { .. }
            | Self::NotFound { .. }
            | Self::Subscriber { .. }
            | Self::Internal { .. } => false,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Timeout { .. } | Self::Subscriber { .. } => ErrorSeverity::Warning,
            Self::Validation { .. } | Self::NotFound { .. } => ErrorSeverity::Info,
            Self::Backend { .. } => ErrorSeverity::Error,
            Self::Internal { .. } => ErrorSeverity::Critical,
        }
    }
}

/// Error severity levels for monitoring and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Should be monitored but not critical
    Warning,
    /// Requires attention
    Error,
    /// Immediate action required
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}
