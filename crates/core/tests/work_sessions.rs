//! Integration tests for the daily work session tracker.

mod support;

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, TimeZone, Utc};
use support::{Harness, ACTOR};
use workpulse_core::{TaskLogRepository, WorkDayRepository, WorkSessionTracker};
use workpulse_domain::{NewTaskLogEntry, WorkDayStatus, WorkPulseError, WorkSessionConfig};

fn tracker(harness: &Harness, config: &WorkSessionConfig) -> WorkSessionTracker {
    WorkSessionTracker::new(
        harness.work_days.clone(),
        harness.task_logs.clone(),
        harness.clock(),
        config,
        Duration::from_secs(10),
    )
    .unwrap()
}

async fn log_minutes(harness: &Harness, minutes: u32, work_date: NaiveDate) {
    harness
        .task_logs
        .append_entry(NewTaskLogEntry {
            actor_id: ACTOR.into(),
            task_type_id: "inspection".into(),
            units_completed: 1,
            time_spent_minutes: minutes,
            work_date,
            notes: None,
            created_at: harness.now(),
        })
        .await
        .unwrap();
}

/// Validates the work day state machine with clock-out totals.
///
/// Assertions:
/// - Confirms `not_clocked_in -> working -> clocked_out`.
/// - Confirms a repeated clock-in returns the open session.
/// - Confirms totals of 120 work, 30 task and 90 idle minutes.
/// - Confirms the closed day rejects both transitions.
#[tokio::test]
async fn test_clock_in_and_out_records_totals() {
    let harness = Harness::new();
    let tracker = tracker(&harness, &WorkSessionConfig::default());
    assert_eq!(tracker.status(ACTOR).await.unwrap(), WorkDayStatus::NotClockedIn);

    let session = tracker.clock_in(ACTOR).await.unwrap();
    assert_eq!(tracker.status(ACTOR).await.unwrap(), WorkDayStatus::Working);
    let again = tracker.clock_in(ACTOR).await.unwrap();
    assert_eq!(again.session_id, session.session_id);
    assert_eq!(harness.work_days.faults.calls("insert_clock_in"), 1);

    log_minutes(&harness, 20, tracker.today()).await;
    log_minutes(&harness, 10, tracker.today()).await;
    harness.clock.advance_secs(2 * 3600);

    let closed = tracker.clock_out(ACTOR).await.unwrap();
    assert_eq!(closed.total_work_minutes, Some(120));
    assert_eq!(closed.total_task_minutes, Some(30));
    assert_eq!(closed.total_idle_minutes, Some(90));
    assert_eq!(tracker.status(ACTOR).await.unwrap(), WorkDayStatus::ClockedOut);

    let err = tracker.clock_out(ACTOR).await.unwrap_err();
    assert!(matches!(err, WorkPulseError::InvalidState(_)));
    let err = tracker.clock_in(ACTOR).await.unwrap_err();
    assert!(matches!(err, WorkPulseError::InvalidState(_)));
}

/// Validates `WorkSessionTracker::clock_out` before clocking in.
///
/// Assertions:
/// - Confirms `InvalidState` and no write.
#[tokio::test]
async fn test_clock_out_without_clock_in_fails() {
    let harness = Harness::new();
    let tracker = tracker(&harness, &WorkSessionConfig::default());

    let err = tracker.clock_out(ACTOR).await.unwrap_err();
    assert!(matches!(err, WorkPulseError::InvalidState(_)));
    assert_eq!(harness.work_days.faults.calls("record_clock_out"), 0);
}

/// Validates the refetch throttle and the two minute cache.
///
/// Assertions:
/// - Confirms reads inside the TTL reach the store once.
/// - Confirms a read after the TTL and a forced refresh each re-read.
#[tokio::test]
async fn test_reads_are_throttled_and_cached() {
    let harness = Harness::new();
    let tracker = tracker(&harness, &WorkSessionConfig::default());

    tracker.current_session(ACTOR).await.unwrap();
    tracker.current_session(ACTOR).await.unwrap();
    assert_eq!(harness.work_days.faults.calls("find_session"), 1);

    harness.clock.advance_secs(11);
    tracker.current_session(ACTOR).await.unwrap();
    assert_eq!(harness.work_days.faults.calls("find_session"), 1);

    harness.clock.advance_secs(120);
    tracker.current_session(ACTOR).await.unwrap();
    assert_eq!(harness.work_days.faults.calls("find_session"), 2);

    tracker.refresh(ACTOR).await.unwrap();
    assert_eq!(harness.work_days.faults.calls("find_session"), 3);
}

/// Validates that a failed read is not cached.
///
/// Assertions:
/// - Confirms the error reaches the caller.
/// - Confirms the next read goes back to the store and succeeds.
#[tokio::test]
async fn test_failed_read_is_not_cached() {
    let harness = Harness::new();
    let tracker = tracker(&harness, &WorkSessionConfig::default());
    harness.work_days.faults.fail_next(
        "find_session",
        WorkPulseError::Network("offline".into()),
        1,
    );

    assert!(tracker.current_session(ACTOR).await.is_err());
    assert_eq!(tracker.current_session(ACTOR).await.unwrap(), None);
    assert_eq!(harness.work_days.faults.calls("find_session"), 2);
}

/// Validates that the work date follows the configured time zone.
///
/// Assertions:
/// - Confirms 03:00 UTC falls on the previous day in New York.
#[tokio::test]
async fn test_work_date_uses_configured_timezone() {
    let harness = Harness::starting_at(Utc.with_ymd_and_hms(2025, 3, 1, 3, 0, 0).unwrap());
    let config = WorkSessionConfig { timezone: "America/New_York".into(), ..Default::default() };
    let tracker = tracker(&harness, &config);

    let session = tracker.clock_in(ACTOR).await.unwrap();
    assert_eq!(session.date, NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
}

/// Validates `WorkSessionTracker::refresh` while an older read is still in
/// flight.
///
/// Assertions:
/// - Confirms the refresh issues its own read and sees the new clock-in.
/// - Confirms the older read still answers its own caller.
/// - Confirms later reads are served the refreshed session, not the older
///   read's result.
#[tokio::test]
async fn test_refresh_ignores_read_started_before_write() {
    let harness = Harness::new();
    let tracker = Arc::new(tracker(&harness, &WorkSessionConfig::default()));
    let gate = harness.work_days.hold_next_find();

    let earlier = tokio::spawn({
        let tracker = Arc::clone(&tracker);
        async move { tracker.current_session(ACTOR).await }
    });
    while harness.work_days.faults.calls("find_session") == 0 {
        tokio::task::yield_now().await;
    }

    let written = harness
        .work_days
        .insert_clock_in(ACTOR, tracker.today(), harness.now())
        .await
        .unwrap();
    let refreshed = tracker.refresh(ACTOR).await.unwrap();
    assert_eq!(refreshed.as_ref().map(|s| s.session_id.as_str()), Some(written.session_id.as_str()));

    gate.notify_one();
    assert_eq!(earlier.await.unwrap().unwrap(), None);

    assert_eq!(tracker.status(ACTOR).await.unwrap(), WorkDayStatus::Working);
    harness.clock.advance_secs(11);
    assert_eq!(tracker.status(ACTOR).await.unwrap(), WorkDayStatus::Working);
    assert_eq!(harness.work_days.faults.calls("find_session"), 2);
}
