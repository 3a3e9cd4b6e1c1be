//! Common utilities shared across WorkPulse crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: errors and time formatting
//! - `runtime`: async infrastructure (cache, clock and tick source,
//!   resilience, lifecycle)

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod error;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod cache;
#[cfg(feature = "runtime")]
pub mod lifecycle;
#[cfg(feature = "runtime")]
pub mod resilience;
#[cfg(feature = "runtime")]
pub mod time;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "runtime")]
pub use cache::{AsyncCache, CacheConfig, CachePriority, EvictionPolicy, QueryCache};
#[cfg(feature = "foundation")]
pub use error::{CommonError, CommonResult, ErrorClassification, ErrorSeverity};
#[cfg(feature = "runtime")]
pub use lifecycle::{ManagerStatus, StatusCell};
#[cfg(feature = "runtime")]
pub use resilience::{
    policies, ExponentialBackoff, Jitter, RetryConfig, RetryDecision, RetryError, RetryExecutor,
    RetryPolicy, RetryResult,
};
#[cfg(feature = "runtime")]
pub use time::{
    ceil_minutes, format_clock, format_duration, Clock, MockClock, SystemClock, TickReport,
    TickSource,
};
