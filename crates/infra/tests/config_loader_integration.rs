//! Integration tests for configuration loader
//!
//! Tests loading complete configuration files from disk.

use std::io::Write;

use tempfile::TempDir;
use workpulse_domain::WorkPulseError;
use workpulse_infra::config;

fn write_file(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).expect("Failed to create config file");
    file.write_all(contents.as_bytes()).expect("Failed to write config file");
    path
}

#[test]
fn test_load_config_from_toml_file() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_file(
        &dir,
        "workpulse.toml",
        r#"
[database]
path = "/tmp/integration_test.db"
pool_size = 8

[timers]
max_concurrent_tasks = 5
tick_interval_ms = 500

[presence]
heartbeat_interval_secs = 20
staleness_window_secs = 240

[work_session]
timezone = "Australia/Sydney"

[logging]
level = "debug"
json = true
"#,
    );

    let config = config::load_from_file(Some(path)).expect("Failed to load TOML config");

    assert_eq!(config.database.path.to_str(), Some("/tmp/integration_test.db"));
    assert_eq!(config.database.pool_size, 8);
    assert_eq!(config.timers.tick_interval_ms, 500);
    assert_eq!(config.presence.heartbeat_interval_secs, 20);
    assert_eq!(config.presence.staleness_window_secs, 240);
    assert_eq!(config.presence.presence_cache_ttl_secs, 15);
    assert_eq!(config.work_session.timezone, "Australia/Sydney");
    assert!(config.logging.json);
    config.validate().expect("loaded config is valid");
}

#[test]
fn test_load_config_from_json_file() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_file(
        &dir,
        "config.json",
        r#"{
            "database": { "path": "/tmp/integration_test_json.db" },
            "cache": { "default_ttl_secs": 30, "max_entries": 64 },
            "store": { "request_timeout_ms": 2500 }
        }"#,
    );

    let config = config::load_from_file(Some(path)).expect("Failed to load JSON config");

    assert_eq!(config.database.pool_size, 4);
    assert_eq!(config.cache.default_ttl_secs, 30);
    assert_eq!(config.cache.max_entries, 64);
    assert_eq!(config.store.request_timeout_ms, 2500);
    assert_eq!(config.timers.max_concurrent_tasks, 5);
}

#[test]
fn test_load_config_with_malformed_toml() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_file(&dir, "workpulse.toml", "[timers\nmax_concurrent_tasks = ");

    let err = config::load_from_file(Some(path)).unwrap_err();
    assert!(matches!(err, WorkPulseError::Config(_)));
}

#[test]
fn test_invalid_values_fail_validation() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_file(&dir, "workpulse.toml", "[work_session]\ntimezone = \"Mars/Olympus\"\n");

    let config = config::load_from_file(Some(path)).expect("file parses");
    assert!(matches!(config.validate(), Err(WorkPulseError::Config(_))));
}
