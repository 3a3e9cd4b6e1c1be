//! Task type catalog stored alongside the sessions.

use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};
use workpulse_core::TaskTypeCatalog;
use workpulse_domain::{Result as DomainResult, TaskType};

use super::manager::{with_connection, DbManager};
use crate::errors::conversions::map_sql_error;

pub struct SqliteTaskTypeCatalog {
    db: Arc<DbManager>,
}

impl SqliteTaskTypeCatalog {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Insert or rename a task type.
    pub async fn upsert_task_type(&self, task_type: TaskType) -> DomainResult<()> {
        with_connection(&self.db, move |conn| {
            conn.execute(
                "INSERT INTO task_types (id, name, category) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET name = excluded.name, category = excluded.category",
                params![task_type.id, task_type.name, task_type.category],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl TaskTypeCatalog for SqliteTaskTypeCatalog {
    async fn find_task_type(&self, task_type_id: &str) -> DomainResult<Option<TaskType>> {
        let task_type_id = task_type_id.to_string();
        with_connection(&self.db, move |conn| {
            conn.query_row(
                "SELECT id, name, category FROM task_types WHERE id = ?1",
                params![task_type_id],
                |row| Ok(TaskType { id: row.get(0)?, name: row.get(1)?, category: row.get(2)? }),
            )
            .optional()
            .map_err(map_sql_error)
        })
        .await
    }
}
