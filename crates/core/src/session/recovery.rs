//! Rebuilds running timers from live persisted sessions.
//!
//! Elapsed time is reconstructed as `now - started_at`. Pause history is not
//! persisted, so time a previous client spent paused is counted as work.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, instrument, warn};
use workpulse_common::time::Clock;
use workpulse_domain::{ActiveTaskSession, Result};

use super::ports::{ActiveSessionRepository, TaskTypeCatalog};
use crate::store::with_store_timeout;
use crate::timer::{SharedRegistry, StartRejection};

/// What a recovery pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Task type ids registered as running timers.
    pub restored: Vec<String>,
    /// Rows dropped because a timestamp did not parse.
    pub skipped_corrupt: usize,
    /// Rows whose heartbeat fell outside the staleness window.
    pub skipped_stale: usize,
    /// Rows not registered because the task was already active or every
    /// slot was taken.
    pub skipped_rejected: usize,
}

/// Restores an actor's live sessions into the timer registry, once per
/// actor for the lifetime of the service.
pub struct SessionRecoveryService {
    sessions: Arc<dyn ActiveSessionRepository>,
    catalog: Arc<dyn TaskTypeCatalog>,
    registry: SharedRegistry,
    clock: Arc<dyn Clock>,
    staleness_window: chrono::Duration,
    store_timeout: Duration,
    completed: AsyncMutex<HashMap<String, RecoveryReport>>,
}

impl SessionRecoveryService {
    pub fn new(
        sessions: Arc<dyn ActiveSessionRepository>,
        catalog: Arc<dyn TaskTypeCatalog>,
        registry: SharedRegistry,
        clock: Arc<dyn Clock>,
        staleness_window: chrono::Duration,
        store_timeout: Duration,
    ) -> Self {
        Self {
            sessions,
            catalog,
            registry,
            clock,
            staleness_window,
            store_timeout,
            completed: AsyncMutex::new(HashMap::new()),
        }
    }

    /// Run recovery for `actor_id`.
    ///
    /// Later calls for the same actor return the first report without
    /// touching the store. A failed listing is not remembered, so the next
    /// call tries again.
    #[instrument(skip(self))]
    pub async fn recover(&self, actor_id: &str) -> Result<RecoveryReport> {
        let mut completed = self.completed.lock().await;
        if let Some(report) = completed.get(actor_id) {
            debug!("recovery already ran for actor");
            return Ok(report.clone());
        }

        let report = self.run(actor_id).await?;
        info!(
            restored = report.restored.len(),
            corrupt = report.skipped_corrupt,
            stale = report.skipped_stale,
            rejected = report.skipped_rejected,
            "session recovery finished"
        );
        completed.insert(actor_id.to_string(), report.clone());
        Ok(report)
    }

    /// Whether recovery has completed for `actor_id`.
    pub async fn is_recovered(&self, actor_id: &str) -> bool {
        self.completed.lock().await.contains_key(actor_id)
    }

    async fn run(&self, actor_id: &str) -> Result<RecoveryReport> {
        let now = self.clock.utc_now();
        let since = now - self.staleness_window;
        let rows = with_store_timeout(
            "list_live_sessions",
            self.store_timeout,
            self.sessions.list_live_sessions(actor_id, since),
        )
        .await?;

        let mut report = RecoveryReport::default();
        for row in rows {
            let session_id = row.session_id.clone();
            let session = match ActiveTaskSession::try_from(row) {
                Ok(session) => session,
                Err(err) => {
                    warn!(session_id = %session_id, error = %err, "skipping corrupt session row");
                    report.skipped_corrupt += 1;
                    continue;
                }
            };

            if session.actor_id != actor_id || !session.is_live(now, self.staleness_window) {
                debug!(session_id = %session.session_id, "skipping stale session");
                report.skipped_stale += 1;
                continue;
            }

            let name = self.task_name(&session.task_type_id).await;
            let elapsed = session.elapsed_seconds(now);
            let restored = self.registry.lock().restore_task(
                &session.task_type_id,
                &name,
                elapsed,
                session.started_at,
                &session.session_id,
                now,
            );

            match restored {
                Ok(()) => {
                    debug!(task_type_id = %session.task_type_id, elapsed, "restored timer");
                    report.restored.push(session.task_type_id);
                }
                Err(StartRejection::AlreadyActive) => {
                    debug!(task_type_id = %session.task_type_id, "task already active locally");
                    report.skipped_rejected += 1;
                }
                Err(StartRejection::SlotLimitReached) => {
                    warn!(task_type_id = %session.task_type_id, "no free slot for recovered session");
                    report.skipped_rejected += 1;
                }
            }
        }

        Ok(report)
    }

    async fn task_name(&self, task_type_id: &str) -> String {
        let lookup = with_store_timeout(
            "find_task_type",
            self.store_timeout,
            self.catalog.find_task_type(task_type_id),
        )
        .await;

        match lookup {
            Ok(Some(task_type)) => task_type.name,
            Ok(None) => task_type_id.to_string(),
            Err(err) => {
                warn!(task_type_id, error = %err, "task type lookup failed; using id as name");
                task_type_id.to_string()
            }
        }
    }
}
