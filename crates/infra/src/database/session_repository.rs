//! Active task session repository using SQLite
//!
//! Stores one row per `(actor_id, task_type_id)`. Timestamps are written as
//! RFC 3339 text and returned raw so callers can detect corrupt rows.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;
use workpulse_core::ActiveSessionRepository;
use workpulse_domain::{
    format_timestamp, ActiveTaskSession, NewActiveSession, Result as DomainResult,
    StoredSessionRow, WorkPulseError,
};

use super::manager::{with_connection, DbManager};
use crate::errors::conversions::map_sql_error;

const SESSION_COLUMNS: &str =
    "session_id, actor_id, task_type_id, started_at, last_heartbeat, is_active";

/// SQLite-backed implementation of `ActiveSessionRepository`
pub struct SqliteSessionRepository {
    db: Arc<DbManager>,
}

impl SqliteSessionRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ActiveSessionRepository for SqliteSessionRepository {
    async fn upsert_session(&self, session: NewActiveSession) -> DomainResult<ActiveTaskSession> {
        with_connection(&self.db, move |conn| {
            upsert(conn, &session)?;
            let row = find_by_actor_task(conn, &session.actor_id, &session.task_type_id)?
                .ok_or_else(|| {
                    WorkPulseError::Internal("session row missing after upsert".into())
                })?;
            ActiveTaskSession::try_from(row)
        })
        .await
    }

    async fn touch_heartbeat(&self, session_id: &str, at: DateTime<Utc>) -> DomainResult<bool> {
        let session_id = session_id.to_string();
        with_connection(&self.db, move |conn| {
            let updated = conn
                .execute(
                    "UPDATE active_task_sessions SET last_heartbeat = ?1
                     WHERE session_id = ?2 AND is_active = 1",
                    params![format_timestamp(at), session_id],
                )
                .map_err(map_sql_error)?;
            Ok(updated > 0)
        })
        .await
    }

    async fn list_live_sessions(
        &self,
        actor_id: &str,
        since: DateTime<Utc>,
    ) -> DomainResult<Vec<StoredSessionRow>> {
        let actor_id = actor_id.to_string();
        with_connection(&self.db, move |conn| {
            query_rows(
                conn,
                &format!(
                    "SELECT {SESSION_COLUMNS} FROM active_task_sessions
                     WHERE actor_id = ?1 AND is_active = 1 AND last_heartbeat >= ?2
                     ORDER BY started_at ASC"
                ),
                &actor_id,
                since,
            )
        })
        .await
    }

    async fn list_live_sessions_for_task_type(
        &self,
        task_type_id: &str,
        since: DateTime<Utc>,
    ) -> DomainResult<Vec<StoredSessionRow>> {
        let task_type_id = task_type_id.to_string();
        with_connection(&self.db, move |conn| {
            query_rows(
                conn,
                &format!(
                    "SELECT {SESSION_COLUMNS} FROM active_task_sessions
                     WHERE task_type_id = ?1 AND is_active = 1 AND last_heartbeat >= ?2
                     ORDER BY started_at ASC"
                ),
                &task_type_id,
                since,
            )
        })
        .await
    }

    async fn deactivate_session(&self, session_id: &str) -> DomainResult<bool> {
        let session_id = session_id.to_string();
        with_connection(&self.db, move |conn| {
            let deleted = conn
                .execute(
                    "DELETE FROM active_task_sessions WHERE session_id = ?1",
                    params![session_id],
                )
                .map_err(map_sql_error)?;
            Ok(deleted > 0)
        })
        .await
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn map_session_row(row: &Row<'_>) -> rusqlite::Result<StoredSessionRow> {
    Ok(StoredSessionRow {
        session_id: row.get(0)?,
        actor_id: row.get(1)?,
        task_type_id: row.get(2)?,
        started_at: row.get(3)?,
        last_heartbeat: row.get(4)?,
        is_active: row.get(5)?,
    })
}

/// Insert or replace the live row for the session's actor and task type.
///
/// A replaced row gets a fresh session id, so heartbeats for the old id stop
/// matching.
fn upsert(conn: &Connection, session: &NewActiveSession) -> DomainResult<()> {
    let started_at = format_timestamp(session.started_at);
    conn.execute(
        "INSERT INTO active_task_sessions (
            session_id, actor_id, task_type_id, started_at, last_heartbeat, is_active
         ) VALUES (?1, ?2, ?3, ?4, ?4, 1)
         ON CONFLICT(actor_id, task_type_id) DO UPDATE SET
            session_id = excluded.session_id,
            started_at = excluded.started_at,
            last_heartbeat = excluded.last_heartbeat,
            is_active = 1",
        params![Uuid::now_v7().to_string(), session.actor_id, session.task_type_id, started_at],
    )
    .map_err(map_sql_error)?;
    Ok(())
}

fn find_by_actor_task(
    conn: &Connection,
    actor_id: &str,
    task_type_id: &str,
) -> DomainResult<Option<StoredSessionRow>> {
    conn.query_row(
        &format!(
            "SELECT {SESSION_COLUMNS} FROM active_task_sessions
             WHERE actor_id = ?1 AND task_type_id = ?2"
        ),
        params![actor_id, task_type_id],
        map_session_row,
    )
    .optional()
    .map_err(map_sql_error)
}

fn query_rows(
    conn: &Connection,
    sql: &str,
    key: &str,
    since: DateTime<Utc>,
) -> DomainResult<Vec<StoredSessionRow>> {
    let mut stmt = conn.prepare(sql).map_err(map_sql_error)?;
    let rows = stmt
        .query_map(params![key, format_timestamp(since)], map_session_row)
        .map_err(map_sql_error)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(map_sql_error)?;
    Ok(rows)
}
