//! Configuration structures
//!
//! Every section defaults independently, so a partial file or environment
//! only overrides what it names.

use std::path::PathBuf;
use std::time::Duration;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_DATABASE_PATH, DEFAULT_POOL_SIZE, DEFAULT_TIMEZONE, HEARTBEAT_ATTEMPTS,
    HEARTBEAT_BACKOFF_MS, HEARTBEAT_INTERVAL_SECS, MAX_CONCURRENT_TASKS,
    PRESENCE_CACHE_TTL_SECS, QUERY_CACHE_MAX_ENTRIES, QUERY_CACHE_TTL_SECS,
    STALENESS_WINDOW_SECS, STORE_REQUEST_TIMEOUT_MS, TICK_INTERVAL_MS,
    WORK_SESSION_CACHE_TTL_SECS, WORK_SESSION_MIN_REFETCH_SECS,
};
use crate::errors::{Result, WorkPulseError};

/// Top-level application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub timers: TimerConfig,
    pub presence: PresenceConfig,
    pub work_session: WorkSessionConfig,
    pub cache: QueryCacheConfig,
    pub store: StoreConfig,
    pub logging: LoggingConfig,
}

/// SQLite store location and pool sizing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: PathBuf::from(DEFAULT_DATABASE_PATH), pool_size: DEFAULT_POOL_SIZE }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    /// Maximum number of simultaneously registered tasks
    pub max_concurrent_tasks: usize,
    pub tick_interval_ms: u64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self { max_concurrent_tasks: MAX_CONCURRENT_TASKS, tick_interval_ms: TICK_INTERVAL_MS }
    }
}

impl TimerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Heartbeat cadence, liveness window and presence query caching
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceConfig {
    pub heartbeat_interval_secs: u64,
    /// Sessions whose last heartbeat is older than this are not live
    pub staleness_window_secs: u64,
    pub presence_cache_ttl_secs: u64,
    pub heartbeat_attempts: u32,
    pub heartbeat_backoff_ms: u64,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: HEARTBEAT_INTERVAL_SECS,
            staleness_window_secs: STALENESS_WINDOW_SECS,
            presence_cache_ttl_secs: PRESENCE_CACHE_TTL_SECS,
            heartbeat_attempts: HEARTBEAT_ATTEMPTS,
            heartbeat_backoff_ms: HEARTBEAT_BACKOFF_MS,
        }
    }
}

impl PresenceConfig {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn staleness_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::try_from(self.staleness_window_secs).unwrap_or(i64::MAX))
    }

    pub fn presence_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.presence_cache_ttl_secs)
    }

    pub fn heartbeat_backoff(&self) -> Duration {
        Duration::from_millis(self.heartbeat_backoff_ms)
    }
}

/// Daily clock-in/clock-out caching and calendar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkSessionConfig {
    pub cache_ttl_secs: u64,
    /// Reads closer together than this reuse the previous result
    pub min_refetch_interval_secs: u64,
    /// IANA time zone used to derive the work-day date
    pub timezone: String,
}

impl Default for WorkSessionConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: WORK_SESSION_CACHE_TTL_SECS,
            min_refetch_interval_secs: WORK_SESSION_MIN_REFETCH_SECS,
            timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }
}

impl WorkSessionConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn min_refetch_interval(&self) -> Duration {
        Duration::from_secs(self.min_refetch_interval_secs)
    }

    /// Parse the configured time zone.
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| WorkPulseError::Config(format!("unknown time zone '{}'", self.timezone)))
    }
}

/// Shared query cache sizing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryCacheConfig {
    pub default_ttl_secs: u64,
    pub max_entries: usize,
}

impl Default for QueryCacheConfig {
    fn default() -> Self {
        Self { default_ttl_secs: QUERY_CACHE_TTL_SECS, max_entries: QUERY_CACHE_MAX_ENTRIES }
    }
}

impl QueryCacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Deadline for a single store request
    pub request_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { request_timeout_ms: STORE_REQUEST_TIMEOUT_MS }
    }
}

impl StoreConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}

impl Config {
    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: &str| Err(WorkPulseError::Config(message.to_string()));

        if self.timers.max_concurrent_tasks == 0 {
            return invalid("timers.max_concurrent_tasks must be at least 1");
        }
        if self.timers.tick_interval_ms == 0 {
            return invalid("timers.tick_interval_ms must be greater than 0");
        }
        if self.presence.heartbeat_interval_secs == 0 {
            return invalid("presence.heartbeat_interval_secs must be greater than 0");
        }
        if self.presence.staleness_window_secs < self.presence.heartbeat_interval_secs {
            return invalid("presence.staleness_window_secs must not be shorter than the heartbeat interval");
        }
        if self.presence.heartbeat_attempts == 0 {
            return invalid("presence.heartbeat_attempts must be at least 1");
        }
        if self.work_session.cache_ttl_secs == 0 {
            return invalid("work_session.cache_ttl_secs must be greater than 0");
        }
        if self.cache.max_entries == 0 {
            return invalid("cache.max_entries must be at least 1");
        }
        if self.store.request_timeout_ms == 0 {
            return invalid("store.request_timeout_ms must be greater than 0");
        }
        if self.database.pool_size == 0 {
            return invalid("database.pool_size must be at least 1");
        }
        self.work_session.tz()?;
        Ok(())
    }
}
