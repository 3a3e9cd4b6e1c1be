//! Retry with backoff and jitter for transient store failures.
//!
//! The executor is generic over the operation's error type. A
//! [`RetryPolicy`] decides per failure whether another attempt is worth
//! making; the [`ExponentialBackoff`] and [`Jitter`] decide how long to wait.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors returned by [`RetryExecutor`].
#[derive(Debug, Error)]
pub enum RetryError<E: fmt::Display> {
    /// Every attempt failed with a retryable error.
    #[error("All retry attempts exhausted after {attempts} tries: {last_error}")]
    AttemptsExhausted { attempts: u32, last_error: E },

    /// The policy refused to retry this error.
    #[error("Operation failed with non-retryable error: {error}")]
    NonRetryable { attempts: u32, error: E },

    /// The retry configuration is invalid.
    #[error("Invalid retry configuration: {message}")]
    InvalidConfiguration { message: String },
}

impl<E: fmt::Display> RetryError<E> {
    /// The last operation error, if one was observed.
    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::AttemptsExhausted { last_error, .. } => Some(last_error),
            Self::NonRetryable { error, .. } => Some(error),
            Self::InvalidConfiguration { .. } => None,
        }
    }

    /// Number of attempts made before giving up.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::AttemptsExhausted { attempts, .. } | Self::NonRetryable { attempts, .. } => *attempts,
            Self::InvalidConfiguration { .. } => 0,
        }
    }
}

/// Result type for retry operations
pub type RetryResult<T, E> = Result<T, RetryError<E>>;

/// Decision for whether to retry an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry with the configured backoff delay
    Retry,
    /// Give up
    Stop,
}

/// Determines whether an error should be retried.
pub trait RetryPolicy<E> {
    /// `attempt` is zero-based.
    fn should_retry(&self, error: &E, attempt: u32) -> RetryDecision;
}

/// Exponential backoff: `initial_delay * base^attempt`, capped at `max_delay`
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentialBackoff {
    pub initial_delay: Duration,
    pub base: f64,
    pub max_delay: Duration,
}

impl ExponentialBackoff {
    /// Delay before the retry that follows failed attempt `attempt`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay = self.initial_delay.as_millis() as f64 * self.base.powi(exponent);
        let delay_ms = delay.min(self.max_delay.as_millis() as f64) as u64;
        Duration::from_millis(delay_ms)
    }
}

/// Randomization applied to computed delays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Jitter {
    /// No jitter
    None,
    /// Anywhere from zero to the computed delay
    Full,
    /// Between half the computed delay and the computed delay
    #[default]
    Equal,
}

impl Jitter {
    /// Apply jitter to a computed delay.
    #[allow(clippy::cast_possible_truncation)]
    pub fn apply(self, delay: Duration) -> Duration {
        let millis = delay.as_millis() as u64;
        match self {
            Self::None => delay,
            Self::Full => Duration::from_millis(random_up_to(millis)),
            Self::Equal => {
                let half = millis / 2;
                Duration::from_millis(half + random_up_to(millis - half))
            }
        }
    }
}

fn random_up_to(max: u64) -> u64 {
    if max == 0 {
        return 0;
    }
    rand::thread_rng().gen_range(0..=max)
}

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Delay growth between attempts
    pub backoff: ExponentialBackoff,
    /// Jitter applied to each delay
    pub jitter: Jitter,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: ExponentialBackoff {
                initial_delay: Duration::from_millis(100),
                base: 2.0,
                max_delay: Duration::from_secs(5),
            },
            jitter: Jitter::Equal,
        }
    }
}

impl RetryConfig {
    /// Create a configuration builder
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be greater than 0".to_string());
        }
        if self.backoff.base <= 0.0 {
            return Err("exponential base must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Builder for [`RetryConfig`]
#[derive(Debug, Default)]
pub struct RetryConfigBuilder {
    config: RetryConfig,
}

impl RetryConfigBuilder {
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.max_attempts = attempts;
        self
    }

    pub fn exponential_backoff(
        mut self,
        initial_delay: Duration,
        base: f64,
        max_delay: Duration,
    ) -> Self {
        self.config.backoff = ExponentialBackoff { initial_delay, base, max_delay };
        self
    }

    pub fn jitter(mut self, jitter: Jitter) -> Self {
        self.config.jitter = jitter;
        self
    }

    pub fn no_jitter(self) -> Self {
        self.jitter(Jitter::None)
    }

    pub fn build(self) -> Result<RetryConfig, String> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Runs an async operation until it succeeds, the policy stops it, or
/// attempts run out.
#[derive(Debug, Clone)]
pub struct RetryExecutor<P> {
    config: RetryConfig,
    policy: P,
}

impl<P> RetryExecutor<P> {
    pub fn new(config: RetryConfig, policy: P) -> Self {
        Self { config, policy }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Execute `operation` with retries.
    pub async fn execute<F, Fut, T, E>(&self, mut operation: F) -> RetryResult<T, E>
    where
        P: RetryPolicy<E>,
        E: fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Err(message) = self.config.validate() {
            return Err(RetryError::InvalidConfiguration { message });
        }

        let mut attempt = 0u32;
        loop {
            let attempts = attempt + 1;
            match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(attempts, "operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(error) => {
                    if attempts >= self.config.max_attempts {
                        warn!(attempts, error = %error, "retry attempts exhausted");
                        return Err(RetryError::AttemptsExhausted { attempts, last_error: error });
                    }

                    if self.policy.should_retry(&error, attempt) == RetryDecision::Stop {
                        debug!(attempts, error = %error, "error is not retryable");
                        return Err(RetryError::NonRetryable { attempts, error });
                    }
                    let delay =
                        self.config.jitter.apply(self.config.backoff.calculate_delay(attempt));

                    debug!(attempts, ?delay, error = %error, "operation failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Pre-defined retry policies
pub mod policies {
    use super::{RetryDecision, RetryPolicy};

    /// Retries when the predicate accepts the error
    #[derive(Debug, Clone)]
    pub struct PredicateRetry<F> {
        predicate: F,
    }

    impl<F> PredicateRetry<F> {
        pub fn new(predicate: F) -> Self {
            Self { predicate }
        }
    }

    impl<F, E> RetryPolicy<E> for PredicateRetry<F>
    where
        F: Fn(&E) -> bool,
    {
        fn should_retry(&self, error: &E, _attempt: u32) -> RetryDecision {
            if (self.predicate)(error) {
                RetryDecision::Retry
            } else {
                RetryDecision::Stop
            }
        }
    }
}
