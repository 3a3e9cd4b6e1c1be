//! # WorkPulse Infrastructure
//!
//! Infrastructure implementations of the engine's store ports.
//!
//! This crate contains:
//! - SQLite repositories over an r2d2 connection pool
//! - Configuration loading from environment and files
//! - Tracing subscriber setup
//!
//! ## Architecture
//! - Implements traits defined in `workpulse-core`
//! - Contains all "impure" code (file and database I/O)

pub mod config;
pub mod database;
pub mod errors;
pub mod observability;

pub use database::{
    sqlite_stores, DbManager, SqliteSessionRepository, SqliteTaskLogRepository,
    SqliteTaskTypeCatalog, SqliteWorkDayRepository,
};
pub use errors::InfraError;
pub use observability::init_tracing;
