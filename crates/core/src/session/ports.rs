//! Port interfaces for task sessions
//!
//! These traits define the boundaries between core business logic
//! and infrastructure implementations.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use workpulse_domain::{
    ActiveTaskSession, NewActiveSession, NewTaskLogEntry, Result, StoredSessionRow, TaskLogEntry,
    TaskType,
};

/// Persistence for live task sessions
#[async_trait]
pub trait ActiveSessionRepository: Send + Sync {
    /// Create the session, superseding any existing row for the same actor
    /// and task type (last writer wins).
    async fn upsert_session(&self, session: NewActiveSession) -> Result<ActiveTaskSession>;

    /// Set `last_heartbeat` on an existing row.
    ///
    /// Returns `false` when the row no longer exists; never recreates it.
    async fn touch_heartbeat(&self, session_id: &str, at: DateTime<Utc>) -> Result<bool>;

    /// Active rows for `actor_id` with a heartbeat at or after `since`.
    async fn list_live_sessions(
        &self,
        actor_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<StoredSessionRow>>;

    /// Active rows for `task_type_id`, any actor, heartbeat at or after
    /// `since`.
    async fn list_live_sessions_for_task_type(
        &self,
        task_type_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<StoredSessionRow>>;

    /// Delete the row. Returns `false` if it was already gone.
    async fn deactivate_session(&self, session_id: &str) -> Result<bool>;
}

/// Append-only task log
#[async_trait]
pub trait TaskLogRepository: Send + Sync {
    async fn append_entry(&self, entry: NewTaskLogEntry) -> Result<TaskLogEntry>;

    /// Sum of `time_spent_minutes` for the actor's entries on `date`.
    async fn total_minutes_for_date(&self, actor_id: &str, date: NaiveDate) -> Result<i64>;
}

/// Task type catalog lookups
#[async_trait]
pub trait TaskTypeCatalog: Send + Sync {
    async fn find_task_type(&self, task_type_id: &str) -> Result<Option<TaskType>>;
}
