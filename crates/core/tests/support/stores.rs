//! In-memory store ports
//!
//! Timestamps are kept as stored text, the same way the SQLite adapter
//! keeps them, so corrupt rows can be seeded directly.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use tokio::sync::Notify;
use workpulse_core::{ActiveSessionRepository, TaskLogRepository, TaskTypeCatalog, WorkDayRepository};
use workpulse_domain::{
    format_timestamp, ActiveTaskSession, ClockOutTotals, NewActiveSession, NewTaskLogEntry, Result,
    StoredSessionRow, TaskLogEntry, TaskType, WorkDaySession, WorkPulseError,
};

/// Scripted failures and call counts per operation name.
#[derive(Default)]
pub struct FaultPlan {
    pending: Mutex<HashMap<&'static str, VecDeque<WorkPulseError>>>,
    calls: Mutex<HashMap<&'static str, usize>>,
}

impl FaultPlan {
    /// Fail the next `times` calls to `operation` with `error`.
    pub fn fail_next(&self, operation: &'static str, error: WorkPulseError, times: usize) {
        let mut pending = self.pending.lock();
        let queue = pending.entry(operation).or_default();
        queue.extend(std::iter::repeat(error).take(times));
    }

    pub fn calls(&self, operation: &str) -> usize {
        self.calls.lock().get(operation).copied().unwrap_or(0)
    }

    fn check(&self, operation: &'static str) -> Result<()> {
        *self.calls.lock().entry(operation).or_default() += 1;
        match self.pending.lock().get_mut(operation).and_then(VecDeque::pop_front) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct InMemorySessions {
    rows: Mutex<Vec<StoredSessionRow>>,
    next_id: Mutex<u64>,
    pub faults: FaultPlan,
}

impl InMemorySessions {
    /// Seed a row verbatim, including malformed timestamps.
    pub fn insert_raw(&self, row: StoredSessionRow) {
        self.rows.lock().push(row);
    }

    /// Seed a well-formed live row.
    pub fn seed(
        &self,
        session_id: &str,
        actor_id: &str,
        task_type_id: &str,
        started_at: DateTime<Utc>,
        last_heartbeat: DateTime<Utc>,
    ) {
        self.insert_raw(StoredSessionRow {
            session_id: session_id.into(),
            actor_id: actor_id.into(),
            task_type_id: task_type_id.into(),
            started_at: format_timestamp(started_at),
            last_heartbeat: format_timestamp(last_heartbeat),
            is_active: true,
        });
    }

    pub fn rows(&self) -> Vec<StoredSessionRow> {
        self.rows.lock().clone()
    }

    pub fn find(&self, session_id: &str) -> Option<StoredSessionRow> {
        self.rows.lock().iter().find(|row| row.session_id == session_id).cloned()
    }
}

#[async_trait]
impl ActiveSessionRepository for InMemorySessions {
    async fn upsert_session(&self, session: NewActiveSession) -> Result<ActiveTaskSession> {
        self.faults.check("upsert_session")?;
        let session_id = {
            let mut next = self.next_id.lock();
            *next += 1;
            format!("session-{next}")
        };

        let mut rows = self.rows.lock();
        rows.retain(|row| {
            !(row.actor_id == session.actor_id && row.task_type_id == session.task_type_id)
        });
        let stored = StoredSessionRow {
            session_id: session_id.clone(),
            actor_id: session.actor_id.clone(),
            task_type_id: session.task_type_id.clone(),
            started_at: format_timestamp(session.started_at),
            last_heartbeat: format_timestamp(session.started_at),
            is_active: true,
        };
        rows.push(stored.clone());
        ActiveTaskSession::try_from(stored)
    }

    async fn touch_heartbeat(&self, session_id: &str, at: DateTime<Utc>) -> Result<bool> {
        self.faults.check("touch_heartbeat")?;
        let mut rows = self.rows.lock();
        match rows.iter_mut().find(|row| row.session_id == session_id) {
            Some(row) => {
                row.last_heartbeat = format_timestamp(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_live_sessions(
        &self,
        actor_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<StoredSessionRow>> {
        self.faults.check("list_live_sessions")?;
        let since = format_timestamp(since);
        Ok(self
            .rows
            .lock()
            .iter()
            .filter(|row| row.actor_id == actor_id && row.is_active && row.last_heartbeat >= since)
            .cloned()
            .collect())
    }

    async fn list_live_sessions_for_task_type(
        &self,
        task_type_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<StoredSessionRow>> {
        self.faults.check("list_live_sessions_for_task_type")?;
        let since = format_timestamp(since);
        Ok(self
            .rows
            .lock()
            .iter()
            .filter(|row| {
                row.task_type_id == task_type_id && row.is_active && row.last_heartbeat >= since
            })
            .cloned()
            .collect())
    }

    async fn deactivate_session(&self, session_id: &str) -> Result<bool> {
        self.faults.check("deactivate_session")?;
        let mut rows = self.rows.lock();
        let before = rows.len();
        rows.retain(|row| row.session_id != session_id);
        Ok(rows.len() != before)
    }
}

#[derive(Default)]
pub struct InMemoryTaskLogs {
    entries: Mutex<Vec<TaskLogEntry>>,
    pub faults: FaultPlan,
}

impl InMemoryTaskLogs {
    pub fn entries(&self) -> Vec<TaskLogEntry> {
        self.entries.lock().clone()
    }
}

#[async_trait]
impl TaskLogRepository for InMemoryTaskLogs {
    async fn append_entry(&self, entry: NewTaskLogEntry) -> Result<TaskLogEntry> {
        self.faults.check("append_entry")?;
        let mut entries = self.entries.lock();
        let written = TaskLogEntry {
            id: format!("log-{}", entries.len() + 1),
            actor_id: entry.actor_id,
            task_type_id: entry.task_type_id,
            units_completed: entry.units_completed,
            time_spent_minutes: entry.time_spent_minutes,
            work_date: entry.work_date,
            notes: entry.notes,
            created_at: entry.created_at,
        };
        entries.push(written.clone());
        Ok(written)
    }

    async fn total_minutes_for_date(&self, actor_id: &str, date: NaiveDate) -> Result<i64> {
        self.faults.check("total_minutes_for_date")?;
        Ok(self
            .entries
            .lock()
            .iter()
            .filter(|entry| entry.actor_id == actor_id && entry.work_date == date)
            .map(|entry| i64::from(entry.time_spent_minutes))
            .sum())
    }
}

#[derive(Default)]
pub struct InMemoryWorkDays {
    sessions: Mutex<Vec<WorkDaySession>>,
    find_gate: Mutex<Option<Arc<Notify>>>,
    pub faults: FaultPlan,
}

impl InMemoryWorkDays {
    pub fn sessions(&self) -> Vec<WorkDaySession> {
        self.sessions.lock().clone()
    }

    /// Make the next `find_session` read its rows, then wait for the
    /// returned gate before answering.
    pub fn hold_next_find(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.find_gate.lock() = Some(Arc::clone(&gate));
        gate
    }
}

#[async_trait]
impl WorkDayRepository for InMemoryWorkDays {
    async fn find_session(&self, actor_id: &str, date: NaiveDate) -> Result<Option<WorkDaySession>> {
        self.faults.check("find_session")?;
        let found = self
            .sessions
            .lock()
            .iter()
            .find(|session| session.actor_id == actor_id && session.date == date)
            .cloned();

        let gate = self.find_gate.lock().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(found)
    }

    async fn insert_clock_in(
        &self,
        actor_id: &str,
        date: NaiveDate,
        at: DateTime<Utc>,
    ) -> Result<WorkDaySession> {
        self.faults.check("insert_clock_in")?;
        let mut sessions = self.sessions.lock();
        if sessions.iter().any(|session| session.actor_id == actor_id && session.date == date) {
            return Err(WorkPulseError::InvalidState(format!("work day {date} already exists")));
        }
        let session = WorkDaySession {
            session_id: format!("day-{}", sessions.len() + 1),
            actor_id: actor_id.to_string(),
            date,
            clock_in_time: at,
            clock_out_time: None,
            total_work_minutes: None,
            total_task_minutes: None,
            total_idle_minutes: None,
        };
        sessions.push(session.clone());
        Ok(session)
    }

    async fn record_clock_out(
        &self,
        session_id: &str,
        totals: ClockOutTotals,
    ) -> Result<WorkDaySession> {
        self.faults.check("record_clock_out")?;
        let mut sessions = self.sessions.lock();
        let session = sessions
            .iter_mut()
            .find(|session| session.session_id == session_id)
            .ok_or_else(|| WorkPulseError::NotFound(format!("work day {session_id}")))?;
        session.clock_out_time = Some(totals.clock_out_time);
        session.total_work_minutes = Some(totals.total_work_minutes);
        session.total_task_minutes = Some(totals.total_task_minutes);
        session.total_idle_minutes = Some(totals.total_idle_minutes);
        Ok(session.clone())
    }
}

#[derive(Default)]
pub struct InMemoryCatalog {
    types: Mutex<HashMap<String, TaskType>>,
    pub faults: FaultPlan,
}

impl InMemoryCatalog {
    pub fn insert(&self, task_type: TaskType) {
        self.types.lock().insert(task_type.id.clone(), task_type);
    }
}

#[async_trait]
impl TaskTypeCatalog for InMemoryCatalog {
    async fn find_task_type(&self, task_type_id: &str) -> Result<Option<TaskType>> {
        self.faults.check("find_task_type")?;
        Ok(self.types.lock().get(task_type_id).cloned())
    }
}
