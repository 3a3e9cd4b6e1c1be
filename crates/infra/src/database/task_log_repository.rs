//! Append-only task log entries.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::params;
use uuid::Uuid;
use workpulse_core::TaskLogRepository;
use workpulse_domain::{format_timestamp, NewTaskLogEntry, Result as DomainResult, TaskLogEntry};

use super::manager::{with_connection, DbManager};
use crate::errors::conversions::map_sql_error;

/// Work dates are stored as ISO calendar dates.
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqliteTaskLogRepository {
    db: Arc<DbManager>,
}

impl SqliteTaskLogRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TaskLogRepository for SqliteTaskLogRepository {
    async fn append_entry(&self, entry: NewTaskLogEntry) -> DomainResult<TaskLogEntry> {
        with_connection(&self.db, move |conn| {
            let id = Uuid::now_v7().to_string();
            conn.execute(
                "INSERT INTO task_log_entries (
                    id, actor_id, task_type_id, units_completed, time_spent_minutes,
                    work_date, notes, created_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    id,
                    entry.actor_id,
                    entry.task_type_id,
                    entry.units_completed,
                    entry.time_spent_minutes,
                    entry.work_date.format(DATE_FORMAT).to_string(),
                    entry.notes,
                    format_timestamp(entry.created_at),
                ],
            )
            .map_err(map_sql_error)?;

            Ok(TaskLogEntry {
                id,
                actor_id: entry.actor_id,
                task_type_id: entry.task_type_id,
                units_completed: entry.units_completed,
                time_spent_minutes: entry.time_spent_minutes,
                work_date: entry.work_date,
                notes: entry.notes,
                created_at: entry.created_at,
            })
        })
        .await
    }

    async fn total_minutes_for_date(&self, actor_id: &str, date: NaiveDate) -> DomainResult<i64> {
        let actor_id = actor_id.to_string();
        with_connection(&self.db, move |conn| {
            conn.query_row(
                "SELECT COALESCE(SUM(time_spent_minutes), 0) FROM task_log_entries
                 WHERE actor_id = ?1 AND work_date = ?2",
                params![actor_id, date.format(DATE_FORMAT).to_string()],
                |row| row.get(0),
            )
            .map_err(map_sql_error)
        })
        .await
    }
}
