//! Active task sessions
//!
//! One live row per `(actor_id, task_type_id)`. A row is live while
//! `is_active` holds and its last heartbeat falls inside the staleness
//! window.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, WorkPulseError};
use crate::utils::timestamp::parse_timestamp;

/// Validated active task session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveTaskSession {
    pub session_id: String, // UUIDv7
    pub actor_id: String,
    pub task_type_id: String,
    pub started_at: DateTime<Utc>,
    pub last_heartbeat: DateTime<Utc>,
    pub is_active: bool,
}

impl ActiveTaskSession {
    /// Whether the heartbeat is younger than `window` at `now`.
    pub fn is_live(&self, now: DateTime<Utc>, window: chrono::Duration) -> bool {
        self.is_active && now - self.last_heartbeat < window
    }

    /// Whole seconds since the session started, never negative.
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> u64 {
        u64::try_from((now - self.started_at).num_seconds()).unwrap_or(0)
    }
}

/// Session row exactly as read from the store.
///
/// Timestamps stay as text so a malformed value surfaces as
/// [`WorkPulseError::Corrupt`] for that row alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSessionRow {
    pub session_id: String,
    pub actor_id: String,
    pub task_type_id: String,
    pub started_at: String,
    pub last_heartbeat: String,
    pub is_active: bool,
}

impl TryFrom<StoredSessionRow> for ActiveTaskSession {
    type Error = WorkPulseError;

    fn try_from(row: StoredSessionRow) -> Result<Self> {
        let started_at = parse_timestamp(&row.started_at).map_err(|err| {
            WorkPulseError::Corrupt(format!("session {} started_at: {err}", row.session_id))
        })?;
        let last_heartbeat = parse_timestamp(&row.last_heartbeat).map_err(|err| {
            WorkPulseError::Corrupt(format!("session {} last_heartbeat: {err}", row.session_id))
        })?;

        Ok(Self {
            session_id: row.session_id,
            actor_id: row.actor_id,
            task_type_id: row.task_type_id,
            started_at,
            last_heartbeat,
            is_active: row.is_active,
        })
    }
}

/// Request to create, or supersede, the session for an actor and task type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActiveSession {
    pub actor_id: String,
    pub task_type_id: String,
    pub started_at: DateTime<Utc>,
}

/// Another actor (or this one) currently working on a task type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceEntry {
    pub actor_id: String,
    pub task_type_id: String,
    pub started_at: DateTime<Utc>,
    pub last_heartbeat: DateTime<Utc>,
}

impl From<&ActiveTaskSession> for PresenceEntry {
    fn from(session: &ActiveTaskSession) -> Self {
        Self {
            actor_id: session.actor_id.clone(),
            task_type_id: session.task_type_id.clone(),
            started_at: session.started_at,
            last_heartbeat: session.last_heartbeat,
        }
    }
}
