//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;
use workpulse_domain::{LoggingConfig, Result, WorkPulseError};

/// Install the global subscriber described by `config`.
///
/// `RUST_LOG` takes precedence over `config.level`. Returns `Ok(false)` when
/// a global subscriber was already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<bool> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level).map_err(|err| {
            WorkPulseError::Config(format!("invalid log level '{}': {err}", config.level))
        })?,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let installed =
        if config.json { builder.json().try_init() } else { builder.try_init() };

    match installed {
        Ok(()) => {
            tracing::debug!(level = %config.level, json = config.json, "tracing initialised");
            Ok(true)
        }
        Err(_) => Ok(false),
    }
}
