//! Daily clock-in/clock-out sessions

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_domain_status_conversions;

/// Where the actor stands for the current work day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkDayStatus {
    NotClockedIn,
    Working,
    /// Terminal for the date
    ClockedOut,
}

impl_domain_status_conversions!(WorkDayStatus {
    NotClockedIn => "not_clocked_in",
    Working => "working",
    ClockedOut => "clocked_out",
});

/// One per `(actor_id, date)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkDaySession {
    pub session_id: String, // UUIDv7
    pub actor_id: String,
    pub date: NaiveDate,
    pub clock_in_time: DateTime<Utc>,
    pub clock_out_time: Option<DateTime<Utc>>,
    pub total_work_minutes: Option<i64>,
    pub total_task_minutes: Option<i64>,
    pub total_idle_minutes: Option<i64>,
}

impl WorkDaySession {
    pub fn status(&self) -> WorkDayStatus {
        if self.clock_out_time.is_some() {
            WorkDayStatus::ClockedOut
        } else {
            WorkDayStatus::Working
        }
    }
}

/// Values written at clock-out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockOutTotals {
    pub clock_out_time: DateTime<Utc>,
    pub total_work_minutes: i64,
    pub total_task_minutes: i64,
    pub total_idle_minutes: i64,
}

impl ClockOutTotals {
    /// Work minutes round up; idle time is whatever work time the task log
    /// does not cover, never negative.
    pub fn compute(
        clock_in: DateTime<Utc>,
        clock_out: DateTime<Utc>,
        task_minutes: i64,
    ) -> Self {
        let worked_secs = (clock_out - clock_in).num_seconds().max(0);
        let total_work_minutes = (worked_secs + 59) / 60;
        let total_task_minutes = task_minutes.max(0);

        Self {
            clock_out_time: clock_out,
            total_work_minutes,
            total_task_minutes,
            total_idle_minutes: (total_work_minutes - total_task_minutes).max(0),
        }
    }
}
