//! Per-task stopwatch.
//!
//! Elapsed time is computed from wall-clock segments rather than counted
//! ticks, so a late or skipped tick never loses time. A tick only refreshes
//! the observed value.

use chrono::{DateTime, Utc};
use workpulse_common::time::{ceil_minutes, format_clock};

/// Stopwatch for one active task.
///
/// Elapsed time advances only while the timer is running and not paused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskTimer {
    task_type_id: String,
    /// Working time from closed segments.
    banked_millis: u64,
    /// Start of the open working segment; `Some` iff running and not paused.
    segment_started_at: Option<DateTime<Utc>>,
    running: bool,
    paused: bool,
    pause_started_at: Option<DateTime<Utc>>,
    total_paused_seconds: u64,
    elapsed_seconds: u64,
}

fn millis_between(from: DateTime<Utc>, to: DateTime<Utc>) -> u64 {
    u64::try_from((to - from).num_milliseconds()).unwrap_or(0)
}

impl TaskTimer {
    pub fn new(task_type_id: impl Into<String>) -> Self {
        Self::seeded(task_type_id, 0)
    }

    /// Stopped timer that already carries `elapsed_seconds` of work.
    pub fn seeded(task_type_id: impl Into<String>, elapsed_seconds: u64) -> Self {
        Self {
            task_type_id: task_type_id.into(),
            banked_millis: elapsed_seconds.saturating_mul(1000),
            segment_started_at: None,
            running: false,
            paused: false,
            pause_started_at: None,
            total_paused_seconds: 0,
            elapsed_seconds,
        }
    }

    pub fn task_type_id(&self) -> &str {
        &self.task_type_id
    }

    /// Start advancing. Returns `false` if already running.
    pub fn start(&mut self, now: DateTime<Utc>) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        self.paused = false;
        self.pause_started_at = None;
        self.segment_started_at = Some(now);
        true
    }

    /// Halt advancement, keeping elapsed time.
    pub fn stop(&mut self, now: DateTime<Utc>) -> bool {
        if !self.running {
            return false;
        }
        if self.paused {
            self.close_pause(now);
        } else {
            self.close_segment(now);
        }
        self.running = false;
        self.paused = false;
        self.refresh(now);
        true
    }

    /// Stop and zero elapsed and paused time.
    pub fn reset(&mut self) {
        let task_type_id = std::mem::take(&mut self.task_type_id);
        *self = Self::new(task_type_id);
    }

    /// Freeze elapsed time until [`resume`](Self::resume).
    pub fn pause(&mut self, now: DateTime<Utc>) -> bool {
        if !self.running || self.paused {
            return false;
        }
        self.close_segment(now);
        self.paused = true;
        self.pause_started_at = Some(now);
        self.refresh(now);
        true
    }

    pub fn resume(&mut self, now: DateTime<Utc>) -> bool {
        if !self.running || !self.paused {
            return false;
        }
        self.close_pause(now);
        self.paused = false;
        self.segment_started_at = Some(now);
        self.refresh(now);
        true
    }

    /// Refresh the observed elapsed value for a tick at `now`.
    pub fn tick(&mut self, now: DateTime<Utc>) {
        self.refresh(now);
    }

    /// Elapsed working seconds as of the last tick or state change.
    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    /// Elapsed working seconds as of `now`.
    pub fn elapsed_at(&self, now: DateTime<Utc>) -> u64 {
        let open = self.segment_started_at.map_or(0, |start| millis_between(start, now));
        (self.banked_millis + open) / 1000
    }

    /// Whole minutes, rounded up.
    pub fn minutes(&self) -> u64 {
        ceil_minutes(self.elapsed_seconds)
    }

    /// `H:MM:SS` from one hour up, `M:SS` below.
    pub fn formatted_time(&self) -> String {
        format_clock(self.elapsed_seconds)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause_started_at(&self) -> Option<DateTime<Utc>> {
        self.pause_started_at
    }

    pub fn total_paused_seconds(&self) -> u64 {
        self.total_paused_seconds
    }

    fn close_segment(&mut self, now: DateTime<Utc>) {
        if let Some(start) = self.segment_started_at.take() {
            self.banked_millis += millis_between(start, now);
        }
    }

    fn close_pause(&mut self, now: DateTime<Utc>) {
        if let Some(start) = self.pause_started_at.take() {
            self.total_paused_seconds += millis_between(start, now) / 1000;
        }
    }

    fn refresh(&mut self, now: DateTime<Utc>) {
        self.elapsed_seconds = self.elapsed_at(now);
    }
}
