//! Integration tests for engine start-up, ticking and shutdown.

mod support;

use std::time::Duration;

use chrono::Duration as ChronoDuration;
use support::{Harness, ACTOR};
use workpulse_common::lifecycle::ManagerStatus;
use workpulse_core::{StartOutcome, WorkPulseEngine};
use workpulse_domain::{Config, WorkPulseError};

fn engine(harness: &Harness) -> WorkPulseEngine {
    WorkPulseEngine::with_clock(&Config::default(), harness.stores(), harness.clock()).unwrap()
}

/// Validates `WorkPulseEngine::init` and `shutdown`.
///
/// Assertions:
/// - Confirms `Running` after init, with the live session restored.
/// - Confirms shutdown stops the tick source and is idempotent.
/// - Confirms a shut down engine cannot be initialized again.
#[tokio::test(start_paused = true)]
async fn test_init_recovers_and_shutdown_is_idempotent() {
    let harness = Harness::new();
    let now = harness.now();
    harness.sessions.seed(
        "s-1",
        ACTOR,
        "inspection",
        now - ChronoDuration::seconds(125),
        now - ChronoDuration::seconds(3),
    );
    let engine = engine(&harness);
    assert_eq!(engine.status(), ManagerStatus::Created);

    let report = engine.init(ACTOR).await.unwrap();
    assert_eq!(report.restored.len(), 1);
    assert_eq!(engine.status(), ManagerStatus::Running);
    assert_eq!(engine.actor_id().as_deref(), Some(ACTOR));
    assert!(engine.ticks().is_running());
    assert_eq!(engine.active_tasks()[0].elapsed_seconds, 125);

    engine.shutdown().await.unwrap();
    assert_eq!(engine.status(), ManagerStatus::Shutdown);
    assert!(!engine.ticks().is_running());
    engine.shutdown().await.unwrap();

    let err = engine.init(ACTOR).await.unwrap_err();
    assert!(matches!(err, WorkPulseError::InvalidState(_)));
}

/// Validates that the tick source drives the registry.
///
/// Assertions:
/// - Confirms a started task shows the clock's elapsed time after a tick.
#[tokio::test(start_paused = true)]
async fn test_ticks_update_active_tasks() {
    let harness = Harness::new();
    let engine = engine(&harness);
    engine.init(ACTOR).await.unwrap();

    let outcome = engine.tasks().start_task(ACTOR, "survey", "Survey").await.unwrap();
    assert!(matches!(outcome, StartOutcome::Started { .. }));

    harness.clock.advance_secs(3);
    tokio::time::sleep(Duration::from_millis(1500)).await;
    let task = &engine.active_tasks()[0];
    assert_eq!(task.elapsed_seconds, 3);
    assert_eq!(task.formatted_time, "0:03");
    assert!(engine.ticks().tick_count() >= 1);

    engine.shutdown().await.unwrap();
}

/// Validates init after a failed recovery.
///
/// Assertions:
/// - Confirms the engine lands in `Error` with the tick source stopped.
/// - Confirms a second init succeeds.
#[tokio::test(start_paused = true)]
async fn test_failed_recovery_allows_retry() {
    let harness = Harness::new();
    harness.sessions.faults.fail_next(
        "list_live_sessions",
        WorkPulseError::Network("offline".into()),
        1,
    );
    let engine = engine(&harness);

    assert!(engine.init(ACTOR).await.is_err());
    assert_eq!(engine.status(), ManagerStatus::Error);
    assert_eq!(engine.ticks().subscriber_count(), 0);

    engine.init(ACTOR).await.unwrap();
    assert_eq!(engine.status(), ManagerStatus::Running);
    engine.shutdown().await.unwrap();
}

/// Validates that invalid configuration is rejected up front.
///
/// Assertions:
/// - Confirms a zero task cap fails with `Config`.
#[test]
fn test_invalid_config_is_rejected() {
    let harness = Harness::new();
    let mut config = Config::default();
    config.timers.max_concurrent_tasks = 0;

    let err = WorkPulseEngine::with_clock(&config, harness.stores(), harness.clock())
        .err()
        .unwrap();
    assert!(matches!(err, WorkPulseError::Config(_)));
}
