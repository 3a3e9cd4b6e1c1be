//! Bounded set of concurrently active task timers.
//!
//! Tasks are kept in insertion order. A stopped task stays registered, and
//! keeps its slot, until [`TimerRegistry::remove_task`] confirms its log
//! entry was written.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;
use workpulse_domain::constants::MAX_CONCURRENT_TASKS;

use super::task_timer::TaskTimer;

/// Registry handle shared between the tick subscriber and services.
pub type SharedRegistry = Arc<Mutex<TimerRegistry>>;

/// Why a start request was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartRejection {
    AlreadyActive,
    SlotLimitReached,
}

/// Read-only view of a registered task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskRef {
    pub task_type_id: String,
    pub name: String,
    pub session_id: Option<String>,
    pub started_at: DateTime<Utc>,
    pub elapsed_seconds: u64,
    pub formatted_time: String,
    pub running: bool,
    pub paused: bool,
    /// Local start has not reached the store yet
    pub unpersisted: bool,
}

impl TaskRef {
    /// Suggested minutes for the completion dialog, rounded up.
    pub fn minutes(&self) -> u64 {
        workpulse_common::time::ceil_minutes(self.elapsed_seconds)
    }
}

#[derive(Debug, Clone)]
struct ActiveTask {
    name: String,
    started_at: DateTime<Utc>,
    session_id: Option<String>,
    unpersisted: bool,
    timer: TaskTimer,
}

impl ActiveTask {
    fn view(&self) -> TaskRef {
        TaskRef {
            task_type_id: self.timer.task_type_id().to_string(),
            name: self.name.clone(),
            session_id: self.session_id.clone(),
            started_at: self.started_at,
            elapsed_seconds: self.timer.elapsed_seconds(),
            formatted_time: self.timer.formatted_time(),
            running: self.timer.is_running(),
            paused: self.timer.is_paused(),
            unpersisted: self.unpersisted,
        }
    }
}

/// Owner of every active [`TaskTimer`].
#[derive(Debug, Clone)]
pub struct TimerRegistry {
    tasks: Vec<ActiveTask>,
    max_tasks: usize,
}

impl Default for TimerRegistry {
    fn default() -> Self {
        Self::new(MAX_CONCURRENT_TASKS)
    }
}

impl TimerRegistry {
    pub fn new(max_tasks: usize) -> Self {
        Self { tasks: Vec::with_capacity(max_tasks), max_tasks }
    }

    pub fn into_shared(self) -> SharedRegistry {
        Arc::new(Mutex::new(self))
    }

    /// Start a new timer for `task_type_id`.
    ///
    /// Returns `false`, without side effects, if the task is already
    /// registered or every slot is taken.
    pub fn start_task(&mut self, task_type_id: &str, name: &str, now: DateTime<Utc>) -> bool {
        self.try_start_task(task_type_id, name, now).is_ok()
    }

    /// Like [`start_task`](Self::start_task) but reports the reason.
    pub fn try_start_task(
        &mut self,
        task_type_id: &str,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StartRejection> {
        self.insert(task_type_id, name, 0, now, None)
    }

    /// Register a running timer pre-seeded with `elapsed_seconds`.
    pub fn restore_task(
        &mut self,
        task_type_id: &str,
        name: &str,
        elapsed_seconds: u64,
        started_at: DateTime<Utc>,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StartRejection> {
        self.insert(task_type_id, name, elapsed_seconds, now, Some(session_id.to_string()))?;
        if let Some(task) = self.find_mut(task_type_id) {
            task.started_at = started_at;
        }
        Ok(())
    }

    fn insert(
        &mut self,
        task_type_id: &str,
        name: &str,
        elapsed_seconds: u64,
        now: DateTime<Utc>,
        session_id: Option<String>,
    ) -> Result<(), StartRejection> {
        if self.contains(task_type_id) {
            debug!(task_type_id, "start rejected: already active");
            return Err(StartRejection::AlreadyActive);
        }
        if self.tasks.len() >= self.max_tasks {
            debug!(task_type_id, max = self.max_tasks, "start rejected: slot limit reached");
            return Err(StartRejection::SlotLimitReached);
        }

        let mut timer = TaskTimer::seeded(task_type_id, elapsed_seconds);
        timer.start(now);
        self.tasks.push(ActiveTask {
            name: name.to_string(),
            started_at: now,
            session_id,
            unpersisted: false,
            timer,
        });
        Ok(())
    }

    /// Stop the timer and return its final state.
    ///
    /// The task stays registered until [`remove_task`](Self::remove_task).
    pub fn stop_task(&mut self, task_type_id: &str, now: DateTime<Utc>) -> Option<TaskRef> {
        let task = self.find_mut(task_type_id)?;
        task.timer.stop(now);
        Some(task.view())
    }

    pub fn remove_task(&mut self, task_type_id: &str) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.timer.task_type_id() != task_type_id);
        before != self.tasks.len()
    }

    pub fn pause_task(&mut self, task_type_id: &str, now: DateTime<Utc>) -> bool {
        self.find_mut(task_type_id).is_some_and(|task| task.timer.pause(now))
    }

    pub fn resume_task(&mut self, task_type_id: &str, now: DateTime<Utc>) -> bool {
        self.find_mut(task_type_id).is_some_and(|task| task.timer.resume(now))
    }

    /// Global pause. Returns how many timers were paused.
    pub fn stop_all_tasks(&mut self, now: DateTime<Utc>) -> usize {
        self.tasks.iter_mut().map(|task| task.timer.pause(now)).filter(|paused| *paused).count()
    }

    /// Global resume. Returns how many timers were resumed.
    pub fn start_all_tasks(&mut self, now: DateTime<Utc>) -> usize {
        self.tasks.iter_mut().map(|task| task.timer.resume(now)).filter(|resumed| *resumed).count()
    }

    /// Refresh every timer for a tick at `now`.
    pub fn tick(&mut self, now: DateTime<Utc>) {
        for task in &mut self.tasks {
            task.timer.tick(now);
        }
    }

    pub fn get_active_tasks_with_timers(&self) -> Vec<TaskRef> {
        self.tasks.iter().map(ActiveTask::view).collect()
    }

    pub fn get(&self, task_type_id: &str) -> Option<TaskRef> {
        self.find(task_type_id).map(ActiveTask::view)
    }

    pub fn contains(&self, task_type_id: &str) -> bool {
        self.find(task_type_id).is_some()
    }

    /// Record the persisted session for a task. Clears the unpersisted flag.
    pub fn attach_session(&mut self, task_type_id: &str, session_id: &str) -> bool {
        let Some(task) = self.find_mut(task_type_id) else {
            return false;
        };
        task.session_id = Some(session_id.to_string());
        task.unpersisted = false;
        true
    }

    pub fn mark_unpersisted(&mut self, task_type_id: &str) -> bool {
        let Some(task) = self.find_mut(task_type_id) else {
            return false;
        };
        task.unpersisted = true;
        true
    }

    /// Tasks whose session write failed, with their local start time.
    pub fn unpersisted_tasks(&self) -> Vec<(String, DateTime<Utc>)> {
        self.tasks
            .iter()
            .filter(|task| task.unpersisted && task.timer.is_running())
            .map(|task| (task.timer.task_type_id().to_string(), task.started_at))
            .collect()
    }

    /// Session ids that should receive heartbeats: running tasks, paused or
    /// not, that have a persisted session.
    pub fn heartbeat_targets(&self) -> Vec<String> {
        self.tasks
            .iter()
            .filter(|task| task.timer.is_running())
            .filter_map(|task| task.session_id.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_tasks
    }

    fn find(&self, task_type_id: &str) -> Option<&ActiveTask> {
        self.tasks.iter().find(|task| task.timer.task_type_id() == task_type_id)
    }

    fn find_mut(&mut self, task_type_id: &str) -> Option<&mut ActiveTask> {
        self.tasks.iter_mut().find(|task| task.timer.task_type_id() == task_type_id)
    }
}
