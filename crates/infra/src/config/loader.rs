//! Configuration loader
//!
//! ## Loading Strategy
//! 1. If `WORKPULSE_DB_PATH` is set, the environment is used: defaults plus
//!    every `WORKPULSE_*` override that is present
//! 2. Otherwise the first config file found by [`probe_config_paths`] is
//!    parsed (TOML or JSON by extension)
//! 3. With neither, built-in defaults are used
//!
//! The result is always passed through [`Config::validate`].
//!
//! ## Environment Variables
//! - `WORKPULSE_DB_PATH`: Database file path (selects env loading)
//! - `WORKPULSE_DB_POOL_SIZE`: Connection pool size
//! - `WORKPULSE_MAX_TASKS`: Concurrent task cap
//! - `WORKPULSE_HEARTBEAT_INTERVAL`: Heartbeat interval in seconds
//! - `WORKPULSE_STALENESS_WINDOW`: Staleness window in seconds
//! - `WORKPULSE_STORE_TIMEOUT_MS`: Per-request store timeout
//! - `WORKPULSE_TIMEZONE`: IANA time zone for work dates
//! - `WORKPULSE_LOG_LEVEL`: Default log filter
//! - `WORKPULSE_LOG_JSON`: JSON log output (true/false)
//!
//! ## File Locations
//! `workpulse.toml`, `workpulse.json`, `config.toml` and `config.json` in the
//! working directory, its parent, and next to the executable.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use workpulse_domain::{Config, Result, WorkPulseError};

const DB_PATH_VAR: &str = "WORKPULSE_DB_PATH";
const FILE_NAMES: [&str; 4] = ["workpulse.toml", "workpulse.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy.
///
/// # Errors
/// Returns `WorkPulseError::Config` when a source exists but cannot be
/// parsed, or when the loaded values fail validation.
pub fn load() -> Result<Config> {
    let config = if std::env::var_os(DB_PATH_VAR).is_some() {
        tracing::info!("configuration loaded from environment variables");
        load_from_env()?
    } else if let Some(path) = probe_config_paths() {
        load_from_file(Some(path))?
    } else {
        tracing::info!("no configuration source found; using defaults");
        Config::default()
    };

    config.validate()?;
    Ok(config)
}

/// Load configuration from `WORKPULSE_*` variables.
///
/// `WORKPULSE_DB_PATH` is required; every other variable overrides its
/// default only when set.
///
/// # Errors
/// Returns `WorkPulseError::Config` if the path is missing or a variable has
/// an invalid value.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();
    config.database.path = PathBuf::from(env_var(DB_PATH_VAR)?);

    if let Some(size) = env_parse("WORKPULSE_DB_POOL_SIZE")? {
        config.database.pool_size = size;
    }
    if let Some(cap) = env_parse("WORKPULSE_MAX_TASKS")? {
        config.timers.max_concurrent_tasks = cap;
    }
    if let Some(secs) = env_parse("WORKPULSE_HEARTBEAT_INTERVAL")? {
        config.presence.heartbeat_interval_secs = secs;
    }
    if let Some(secs) = env_parse("WORKPULSE_STALENESS_WINDOW")? {
        config.presence.staleness_window_secs = secs;
    }
    if let Some(ms) = env_parse("WORKPULSE_STORE_TIMEOUT_MS")? {
        config.store.request_timeout_ms = ms;
    }
    if let Ok(timezone) = std::env::var("WORKPULSE_TIMEZONE") {
        config.work_session.timezone = timezone;
    }
    if let Ok(level) = std::env::var("WORKPULSE_LOG_LEVEL") {
        config.logging.level = level;
    }
    config.logging.json = env_bool("WORKPULSE_LOG_JSON", config.logging.json);

    Ok(config)
}

/// Load configuration from a file.
///
/// If `path` is `None`, probes the standard locations.
///
/// # Errors
/// Returns `WorkPulseError::Config` if the file is missing, unreadable or
/// malformed.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(WorkPulseError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            WorkPulseError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| WorkPulseError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse by file extension; anything but `.toml` and `.json` is rejected.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| WorkPulseError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| WorkPulseError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(WorkPulseError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// First existing config file in the standard locations, if any.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        dirs.extend([cwd.clone(), cwd.join("..")]);
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    dirs.iter()
        .flat_map(|dir| FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| WorkPulseError::Config(format!("Missing required environment variable: {key}")))
}

/// `Ok(None)` when unset; an error when set but unparsable.
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| WorkPulseError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(None),
    }
}

/// Accepts `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive).
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
