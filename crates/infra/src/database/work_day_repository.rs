//! Daily clock-in/clock-out rows, unique per actor and date.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;
use workpulse_core::WorkDayRepository;
use workpulse_domain::{
    format_timestamp, parse_timestamp, ClockOutTotals, Result as DomainResult, WorkDaySession,
    WorkPulseError,
};

use super::manager::{with_connection, DbManager};
use super::task_log_repository::DATE_FORMAT;
use crate::errors::conversions::map_sql_error;

const WORK_DAY_COLUMNS: &str = "session_id, actor_id, date, clock_in_time, clock_out_time,
     total_work_minutes, total_task_minutes, total_idle_minutes";

pub struct SqliteWorkDayRepository {
    db: Arc<DbManager>,
}

impl SqliteWorkDayRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl WorkDayRepository for SqliteWorkDayRepository {
    async fn find_session(
        &self,
        actor_id: &str,
        date: NaiveDate,
    ) -> DomainResult<Option<WorkDaySession>> {
        let actor_id = actor_id.to_string();
        with_connection(&self.db, move |conn| {
            let row = conn
                .query_row(
                    &format!(
                        "SELECT {WORK_DAY_COLUMNS} FROM work_day_sessions
                         WHERE actor_id = ?1 AND date = ?2"
                    ),
                    params![actor_id, date.format(DATE_FORMAT).to_string()],
                    map_work_day_row,
                )
                .optional()
                .map_err(map_sql_error)?;
            row.map(WorkDaySession::try_from).transpose()
        })
        .await
    }

    async fn insert_clock_in(
        &self,
        actor_id: &str,
        date: NaiveDate,
        at: DateTime<Utc>,
    ) -> DomainResult<WorkDaySession> {
        let actor_id = actor_id.to_string();
        with_connection(&self.db, move |conn| {
            let session_id = Uuid::now_v7().to_string();
            conn.execute(
                "INSERT INTO work_day_sessions (session_id, actor_id, date, clock_in_time)
                 VALUES (?1, ?2, ?3, ?4)",
                params![session_id, actor_id, date.format(DATE_FORMAT).to_string(), format_timestamp(at)],
            )
            .map_err(map_sql_error)?;
            find_by_id(conn, &session_id)
        })
        .await
    }

    async fn record_clock_out(
        &self,
        session_id: &str,
        totals: ClockOutTotals,
    ) -> DomainResult<WorkDaySession> {
        let session_id = session_id.to_string();
        with_connection(&self.db, move |conn| {
            let updated = conn
                .execute(
                    "UPDATE work_day_sessions SET
                        clock_out_time = ?1,
                        total_work_minutes = ?2,
                        total_task_minutes = ?3,
                        total_idle_minutes = ?4
                     WHERE session_id = ?5 AND clock_out_time IS NULL",
                    params![
                        format_timestamp(totals.clock_out_time),
                        totals.total_work_minutes,
                        totals.total_task_minutes,
                        totals.total_idle_minutes,
                        session_id,
                    ],
                )
                .map_err(map_sql_error)?;

            let session = find_by_id(conn, &session_id)?;
            if updated == 0 {
                return Err(WorkPulseError::InvalidState(format!(
                    "work day {session_id} is already clocked out"
                )));
            }
            Ok(session)
        })
        .await
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Row as stored, before timestamps are parsed.
struct WorkDayRow {
    session_id: String,
    actor_id: String,
    date: String,
    clock_in_time: String,
    clock_out_time: Option<String>,
    total_work_minutes: Option<i64>,
    total_task_minutes: Option<i64>,
    total_idle_minutes: Option<i64>,
}

impl TryFrom<WorkDayRow> for WorkDaySession {
    type Error = WorkPulseError;

    fn try_from(row: WorkDayRow) -> DomainResult<Self> {
        let date = NaiveDate::parse_from_str(&row.date, DATE_FORMAT).map_err(|err| {
            WorkPulseError::Corrupt(format!("work day {} has bad date: {err}", row.session_id))
        })?;

        Ok(Self {
            date,
            clock_in_time: parse_timestamp(&row.clock_in_time)?,
            clock_out_time: row.clock_out_time.as_deref().map(parse_timestamp).transpose()?,
            total_work_minutes: row.total_work_minutes,
            total_task_minutes: row.total_task_minutes,
            total_idle_minutes: row.total_idle_minutes,
            session_id: row.session_id,
            actor_id: row.actor_id,
        })
    }
}

fn map_work_day_row(row: &Row<'_>) -> rusqlite::Result<WorkDayRow> {
    Ok(WorkDayRow {
        session_id: row.get(0)?,
        actor_id: row.get(1)?,
        date: row.get(2)?,
        clock_in_time: row.get(3)?,
        clock_out_time: row.get(4)?,
        total_work_minutes: row.get(5)?,
        total_task_minutes: row.get(6)?,
        total_idle_minutes: row.get(7)?,
    })
}

fn find_by_id(conn: &Connection, session_id: &str) -> DomainResult<WorkDaySession> {
    let row = conn
        .query_row(
            &format!("SELECT {WORK_DAY_COLUMNS} FROM work_day_sessions WHERE session_id = ?1"),
            params![session_id],
            map_work_day_row,
        )
        .optional()
        .map_err(map_sql_error)?
        .ok_or_else(|| WorkPulseError::NotFound(format!("work day {session_id}")))?;
    WorkDaySession::try_from(row)
}
