//! Domain types and models
//!
//! Persisted records mirror the store tables; in-memory timer state lives in
//! `workpulse-core`.

pub mod session;
pub mod task_log;
pub mod task_type;
pub mod work_day;

pub use session::{ActiveTaskSession, NewActiveSession, PresenceEntry, StoredSessionRow};
pub use task_log::{CompletionInput, NewTaskLogEntry, TaskLogEntry};
pub use task_type::TaskType;
pub use work_day::{ClockOutTotals, WorkDaySession, WorkDayStatus};
