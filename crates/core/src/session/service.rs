//! Actor-initiated task actions.
//!
//! Local registry state is updated first so the UI reacts immediately; the
//! store is written afterwards. A failed session write leaves the timer
//! running and flagged unpersisted until [`TaskSessionService::retry_unpersisted`]
//! or the next recovery reconciles it. Store errors from these actions are
//! returned to the caller.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::{debug, info, instrument, warn};
use workpulse_common::time::Clock;
use workpulse_domain::{
    CompletionInput, NewActiveSession, NewTaskLogEntry, Result, TaskLogEntry, WorkPulseError,
};

use super::ports::{ActiveSessionRepository, TaskLogRepository};
use super::presence::HeartbeatTracker;
use crate::store::with_store_timeout;
use crate::timer::{SharedRegistry, StartRejection, TaskRef};

/// Result of a start request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Started { session_id: String },
    AlreadyActive,
    /// Every slot is taken; nothing was written
    SlotLimitReached,
}

impl From<StartRejection> for StartOutcome {
    fn from(rejection: StartRejection) -> Self {
        match rejection {
            StartRejection::AlreadyActive => Self::AlreadyActive,
            StartRejection::SlotLimitReached => Self::SlotLimitReached,
        }
    }
}

pub struct TaskSessionService {
    registry: SharedRegistry,
    sessions: Arc<dyn ActiveSessionRepository>,
    task_logs: Arc<dyn TaskLogRepository>,
    clock: Arc<dyn Clock>,
    timezone: Tz,
    store_timeout: Duration,
    presence: Option<Arc<HeartbeatTracker>>,
}

impl TaskSessionService {
    pub fn new(
        registry: SharedRegistry,
        sessions: Arc<dyn ActiveSessionRepository>,
        task_logs: Arc<dyn TaskLogRepository>,
        clock: Arc<dyn Clock>,
        timezone: Tz,
        store_timeout: Duration,
    ) -> Self {
        Self { registry, sessions, task_logs, clock, timezone, store_timeout, presence: None }
    }

    /// Invalidate presence lists when sessions change.
    pub fn with_presence(mut self, presence: Arc<HeartbeatTracker>) -> Self {
        self.presence = Some(presence);
        self
    }

    /// Start a timer and persist its session.
    ///
    /// Duplicate and over-capacity requests are answered locally without
    /// I/O.
    #[instrument(skip(self))]
    pub async fn start_task(
        &self,
        actor_id: &str,
        task_type_id: &str,
        name: &str,
    ) -> Result<StartOutcome> {
        let now = self.clock.utc_now();
        let started = self.registry.lock().try_start_task(task_type_id, name, now);
        if let Err(rejection) = started {
            return Ok(rejection.into());
        }

        match self.persist_session(actor_id, task_type_id, now).await {
            Ok(session_id) => {
                info!(session_id = %session_id, "task started");
                self.invalidate_presence(task_type_id).await;
                Ok(StartOutcome::Started { session_id })
            }
            Err(err) => {
                self.registry.lock().mark_unpersisted(task_type_id);
                warn!(error = %err, "task started locally but session write failed");
                Err(err)
            }
        }
    }

    /// Retry session writes for tasks whose start was not persisted.
    ///
    /// Returns how many were persisted; stops at the first failure.
    pub async fn retry_unpersisted(&self, actor_id: &str) -> Result<usize> {
        let pending = self.registry.lock().unpersisted_tasks();
        let mut persisted = 0;

        for (task_type_id, started_at) in pending {
            self.persist_session(actor_id, &task_type_id, started_at).await?;
            self.invalidate_presence(&task_type_id).await;
            persisted += 1;
        }
        Ok(persisted)
    }

    async fn persist_session(
        &self,
        actor_id: &str,
        task_type_id: &str,
        started_at: DateTime<Utc>,
    ) -> Result<String> {
        let request = NewActiveSession {
            actor_id: actor_id.to_string(),
            task_type_id: task_type_id.to_string(),
            started_at,
        };
        let session = with_store_timeout(
            "upsert_session",
            self.store_timeout,
            self.sessions.upsert_session(request),
        )
        .await?;

        let attached = self.registry.lock().attach_session(task_type_id, &session.session_id);
        if !attached {
            debug!(session_id = %session.session_id, "task removed before its session was written");
            self.delete_session(&session.session_id).await;
        }
        Ok(session.session_id)
    }

    /// Stop the timer and return its final state for the completion dialog.
    pub fn stop_task(&self, task_type_id: &str) -> Option<TaskRef> {
        self.registry.lock().stop_task(task_type_id, self.clock.utc_now())
    }

    /// Write the task's log entry and release it.
    ///
    /// `time_spent_minutes` comes from `input` as entered by the actor. On a
    /// failed write the task stays registered so the actor can retry.
    #[instrument(skip(self, input))]
    pub async fn complete_task(
        &self,
        actor_id: &str,
        task_type_id: &str,
        input: CompletionInput,
    ) -> Result<TaskLogEntry> {
        input.validate()?;
        let now = self.clock.utc_now();
        let task = self
            .registry
            .lock()
            .stop_task(task_type_id, now)
            .ok_or_else(|| WorkPulseError::NotFound(format!("active task {task_type_id}")))?;

        let entry = NewTaskLogEntry {
            actor_id: actor_id.to_string(),
            task_type_id: task_type_id.to_string(),
            units_completed: input.units_completed,
            time_spent_minutes: input.time_spent_minutes,
            work_date: now.with_timezone(&self.timezone).date_naive(),
            notes: input.notes,
            created_at: now,
        };

        let written = with_store_timeout(
            "append_entry",
            self.store_timeout,
            self.task_logs.append_entry(entry),
        )
        .await
        .inspect_err(|err| warn!(error = %err, "task log write failed; keeping timer"))?;

        if let Some(session_id) = &task.session_id {
            self.delete_session(session_id).await;
        }
        self.registry.lock().remove_task(task_type_id);
        self.invalidate_presence(task_type_id).await;

        info!(
            entry_id = %written.id,
            minutes = written.time_spent_minutes,
            timer_minutes = task.minutes(),
            "task completed"
        );
        Ok(written)
    }

    /// Drop a task without logging it. Returns `false` if it was not
    /// registered.
    pub async fn discard_task(&self, task_type_id: &str) -> bool {
        let task = self.registry.lock().get(task_type_id);
        let Some(task) = task else {
            return false;
        };

        self.registry.lock().remove_task(task_type_id);
        if let Some(session_id) = &task.session_id {
            self.delete_session(session_id).await;
        }
        self.invalidate_presence(task_type_id).await;
        debug!(task_type_id, "task discarded");
        true
    }

    pub fn pause_task(&self, task_type_id: &str) -> bool {
        self.registry.lock().pause_task(task_type_id, self.clock.utc_now())
    }

    pub fn resume_task(&self, task_type_id: &str) -> bool {
        self.registry.lock().resume_task(task_type_id, self.clock.utc_now())
    }

    /// Pause every running timer.
    pub fn pause_all(&self) -> usize {
        self.registry.lock().stop_all_tasks(self.clock.utc_now())
    }

    /// Resume every paused timer.
    pub fn resume_all(&self) -> usize {
        self.registry.lock().start_all_tasks(self.clock.utc_now())
    }

    pub fn active_tasks(&self) -> Vec<TaskRef> {
        self.registry.lock().get_active_tasks_with_timers()
    }

    async fn delete_session(&self, session_id: &str) {
        let deleted = with_store_timeout(
            "deactivate_session",
            self.store_timeout,
            self.sessions.deactivate_session(session_id),
        )
        .await;

        if let Err(err) = deleted {
            warn!(session_id, error = %err, "session cleanup failed; row will age out");
        }
    }

    async fn invalidate_presence(&self, task_type_id: &str) {
        if let Some(presence) = &self.presence {
            presence.invalidate_presence(task_type_id).await;
        }
    }
}
