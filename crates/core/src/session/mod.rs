//! Task sessions: persistence ports, recovery, heartbeats and the
//! actor-facing service

pub mod ports;
pub mod presence;
pub mod recovery;
pub mod service;

pub use ports::{ActiveSessionRepository, TaskLogRepository, TaskTypeCatalog};
pub use presence::{HeartbeatReport, HeartbeatTracker, PresenceCache};
pub use recovery::{RecoveryReport, SessionRecoveryService};
pub use service::{StartOutcome, TaskSessionService};
