//! Conversions from adapter errors into [`WorkPulseError`].

use rusqlite::Error as SqlError;
use thiserror::Error;
use tokio::task::JoinError;
use workpulse_domain::WorkPulseError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct InfraError(pub WorkPulseError);

impl From<InfraError> for WorkPulseError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<WorkPulseError> for InfraError {
    fn from(value: WorkPulseError) -> Self {
        InfraError(value)
    }
}

trait IntoWorkPulseError {
    fn into_workpulse(self) -> WorkPulseError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → WorkPulseError */
/* -------------------------------------------------------------------------- */

const SQLITE_CONSTRAINT_PRIMARYKEY: i32 = 1555;
const SQLITE_CONSTRAINT_UNIQUE: i32 = 2067;

impl IntoWorkPulseError for SqlError {
    fn into_workpulse(self) -> WorkPulseError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        WorkPulseError::Database("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        WorkPulseError::Database("database is locked".into())
                    }
                    (
                        ErrorCode::ConstraintViolation,
                        SQLITE_CONSTRAINT_UNIQUE | SQLITE_CONSTRAINT_PRIMARYKEY,
                    ) => WorkPulseError::InvalidState(format!("unique constraint violation: {message}")),
                    (ErrorCode::ConstraintViolation, _) => {
                        WorkPulseError::InvalidInput(format!("constraint violation: {message}"))
                    }
                    _ => WorkPulseError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => WorkPulseError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                WorkPulseError::Corrupt(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, name, ty) => {
                WorkPulseError::Corrupt(format!("column '{name}' has unexpected type {ty}"))
            }
            RE::Utf8Error(_) => WorkPulseError::Corrupt("invalid UTF-8 returned from sqlite".into()),
            RE::InvalidPath(path) => WorkPulseError::Config(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            other => WorkPulseError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_workpulse())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → WorkPulseError */
/* -------------------------------------------------------------------------- */

impl IntoWorkPulseError for r2d2::Error {
    fn into_workpulse(self) -> WorkPulseError {
        WorkPulseError::Database(format!("connection pool: {self}"))
    }
}

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(value.into_workpulse())
    }
}

/* -------------------------------------------------------------------------- */
/* tokio::task::JoinError → WorkPulseError */
/* -------------------------------------------------------------------------- */

impl IntoWorkPulseError for JoinError {
    fn into_workpulse(self) -> WorkPulseError {
        if self.is_cancelled() {
            WorkPulseError::Internal("blocking store task was cancelled".into())
        } else {
            WorkPulseError::Internal(format!("blocking store task panicked: {self}"))
        }
    }
}

impl From<JoinError> for InfraError {
    fn from(value: JoinError) -> Self {
        InfraError(value.into_workpulse())
    }
}

/// Map a rusqlite error straight to the domain error.
pub(crate) fn map_sql_error(err: SqlError) -> WorkPulseError {
    WorkPulseError::from(InfraError::from(err))
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
