//! Port interface for daily work sessions

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use workpulse_domain::{ClockOutTotals, Result, WorkDaySession};

#[async_trait]
pub trait WorkDayRepository: Send + Sync {
    async fn find_session(&self, actor_id: &str, date: NaiveDate) -> Result<Option<WorkDaySession>>;

    /// Insert the day's row. Fails with `InvalidState` if one already exists.
    async fn insert_clock_in(
        &self,
        actor_id: &str,
        date: NaiveDate,
        at: DateTime<Utc>,
    ) -> Result<WorkDaySession>;

    async fn record_clock_out(
        &self,
        session_id: &str,
        totals: ClockOutTotals,
    ) -> Result<WorkDaySession>;
}
