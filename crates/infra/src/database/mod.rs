//! SQLite implementations of the store ports

pub mod manager;
pub mod session_repository;
pub mod task_log_repository;
pub mod task_type_repository;
pub mod work_day_repository;

use std::sync::Arc;

pub use manager::{DbManager, SqliteConnection, SqlitePool};
pub use session_repository::SqliteSessionRepository;
pub use task_log_repository::SqliteTaskLogRepository;
pub use task_type_repository::SqliteTaskTypeCatalog;
pub use work_day_repository::SqliteWorkDayRepository;
use workpulse_core::EngineStores;

/// Every engine port backed by the same database.
pub fn sqlite_stores(db: &Arc<DbManager>) -> EngineStores {
    EngineStores {
        sessions: Arc::new(SqliteSessionRepository::new(Arc::clone(db))),
        task_logs: Arc::new(SqliteTaskLogRepository::new(Arc::clone(db))),
        work_days: Arc::new(SqliteWorkDayRepository::new(Arc::clone(db))),
        catalog: Arc::new(SqliteTaskTypeCatalog::new(Arc::clone(db))),
    }
}
