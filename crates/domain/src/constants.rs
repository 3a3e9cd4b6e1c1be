//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application. Configuration defaults are taken from here.

// Task timers
pub const MAX_CONCURRENT_TASKS: usize = 5;
pub const TICK_INTERVAL_MS: u64 = 1000;

// Presence
pub const STALENESS_WINDOW_SECS: u64 = 300;
pub const HEARTBEAT_INTERVAL_SECS: u64 = 30;
pub const PRESENCE_CACHE_TTL_SECS: u64 = 15;
pub const HEARTBEAT_ATTEMPTS: u32 = 3;
pub const HEARTBEAT_BACKOFF_MS: u64 = 250;

// Work day sessions
pub const WORK_SESSION_CACHE_TTL_SECS: u64 = 120;
pub const WORK_SESSION_MIN_REFETCH_SECS: u64 = 10;
pub const DEFAULT_TIMEZONE: &str = "UTC";

// Query cache
pub const QUERY_CACHE_TTL_SECS: u64 = 60;
pub const QUERY_CACHE_MAX_ENTRIES: usize = 256;

// Store
pub const STORE_REQUEST_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_DATABASE_PATH: &str = "workpulse.db";
pub const DEFAULT_POOL_SIZE: u32 = 4;

// Cache key prefixes
pub const PRESENCE_KEY_PREFIX: &str = "presence:";
pub const WORK_DAY_KEY_PREFIX: &str = "work_day:";
