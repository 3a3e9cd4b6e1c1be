//! Resilience patterns for transient failures
//!
//! - **Retry Logic**: configurable retry strategies with backoff and jitter

pub mod retry;

pub use retry::{
    policies, ExponentialBackoff, Jitter, RetryConfig, RetryConfigBuilder, RetryDecision, RetryError,
    RetryExecutor, RetryPolicy, RetryResult,
};
