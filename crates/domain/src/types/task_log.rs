//! Completed task log entries

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, WorkPulseError};

/// Immutable record written once an actor confirms a completed task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskLogEntry {
    pub id: String, // UUIDv7
    pub actor_id: String,
    pub task_type_id: String,
    pub units_completed: u32,
    pub time_spent_minutes: u32,
    pub work_date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTaskLogEntry {
    pub actor_id: String,
    pub task_type_id: String,
    pub units_completed: u32,
    pub time_spent_minutes: u32,
    pub work_date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// What the actor entered in the completion dialog.
///
/// `time_spent_minutes` is taken as given; the timer's own minute count is
/// only a suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionInput {
    pub units_completed: u32,
    pub time_spent_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl CompletionInput {
    pub fn validate(&self) -> Result<()> {
        if let Some(notes) = &self.notes {
            if notes.chars().count() > 2000 {
                return Err(WorkPulseError::InvalidInput("notes exceed 2000 characters".into()));
            }
        }
        Ok(())
    }
}
