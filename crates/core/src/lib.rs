//! # WorkPulse Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Task timers and the bounded registry that owns them
//! - Session recovery, heartbeats and presence
//! - Daily work sessions
//! - Port interfaces (traits) for every store the engine needs
//! - The engine root tying them to one tick source and cache
//!
//! ## Architecture Principles
//! - Only depends on `workpulse-common` and `workpulse-domain`
//! - No database or platform code
//! - All external dependencies via traits

pub mod engine;
pub mod session;
pub mod store;
pub mod timer;
pub mod workday;

pub use engine::{EngineStores, WorkPulseEngine};
pub use session::{
    ActiveSessionRepository, HeartbeatReport, HeartbeatTracker, RecoveryReport,
    SessionRecoveryService, StartOutcome, TaskLogRepository, TaskSessionService, TaskTypeCatalog,
};
pub use store::with_store_timeout;
pub use timer::{SharedRegistry, StartRejection, TaskRef, TaskTimer, TimerRegistry};
pub use workday::{WorkDayRepository, WorkSessionTracker};
