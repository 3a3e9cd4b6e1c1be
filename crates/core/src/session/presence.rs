//! Heartbeats for locally running tasks and co-worker presence queries.
//!
//! Heartbeat and presence failures are logged and swallowed: neither path
//! can stop or alter a local timer.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use workpulse_common::cache::QueryCache;
use workpulse_common::resilience::{policies::PredicateRetry, RetryConfig, RetryExecutor};
use workpulse_common::time::Clock;
use workpulse_domain::constants::PRESENCE_KEY_PREFIX;
use workpulse_domain::{ActiveTaskSession, PresenceConfig, PresenceEntry, Result, WorkPulseError};

use super::ports::ActiveSessionRepository;
use crate::store::with_store_timeout;
use crate::timer::SharedRegistry;

type TransientRetry = RetryExecutor<PredicateRetry<fn(&WorkPulseError) -> bool>>;

/// Shared cache for presence lists keyed by task type.
pub type PresenceCache = QueryCache<Vec<PresenceEntry>, WorkPulseError, Arc<dyn Clock>>;

/// Outcome of one heartbeat round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeartbeatReport {
    pub touched: usize,
    /// Rows that no longer exist, e.g. superseded from another tab.
    pub missing: usize,
    pub failed: usize,
}

pub struct HeartbeatTracker {
    sessions: Arc<dyn ActiveSessionRepository>,
    registry: SharedRegistry,
    clock: Arc<dyn Clock>,
    presence_cache: PresenceCache,
    config: PresenceConfig,
    store_timeout: Duration,
    retry: TransientRetry,
}

impl HeartbeatTracker {
    pub fn new(
        sessions: Arc<dyn ActiveSessionRepository>,
        registry: SharedRegistry,
        clock: Arc<dyn Clock>,
        presence_cache: PresenceCache,
        config: PresenceConfig,
        store_timeout: Duration,
    ) -> Self {
        let retry_config = RetryConfig::builder()
            .max_attempts(config.heartbeat_attempts.max(1))
            .exponential_backoff(config.heartbeat_backoff(), 2.0, config.heartbeat_interval())
            .build()
            .unwrap_or_default();
        let is_transient: fn(&WorkPulseError) -> bool = WorkPulseError::is_transient;

        Self {
            sessions,
            registry,
            clock,
            presence_cache,
            config,
            store_timeout,
            retry: RetryExecutor::new(retry_config, PredicateRetry::new(is_transient)),
        }
    }

    /// Refresh `last_heartbeat` for every running task with a session.
    ///
    /// Transient failures are retried with bounded backoff; anything left
    /// over is logged and picked up again next round.
    pub async fn beat_once(&self) -> HeartbeatReport {
        let targets = self.registry.lock().heartbeat_targets();
        let mut report = HeartbeatReport::default();

        for session_id in targets {
            let result = self
                .retry
                .execute(|| {
                    let now = self.clock.utc_now();
                    with_store_timeout(
                        "touch_heartbeat",
                        self.store_timeout,
                        self.sessions.touch_heartbeat(&session_id, now),
                    )
                })
                .await;

            match result {
                Ok(true) => report.touched += 1,
                Ok(false) => {
                    debug!(session_id = %session_id, "heartbeat target no longer exists");
                    report.missing += 1;
                }
                Err(err) => {
                    warn!(session_id = %session_id, error = %err, "heartbeat failed");
                    report.failed += 1;
                }
            }
        }

        report
    }

    /// Run [`beat_once`](Self::beat_once) every heartbeat interval until
    /// `shutdown` is cancelled.
    pub fn spawn(self: &Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        let tracker = Arc::clone(self);
        let period = self.config.heartbeat_interval();

        tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(?period, "heartbeat loop started");

            loop {
                tokio::select! {
                    () = shutdown.cancelled() => break,
                    _ = interval.tick() => {
                        let report = tracker.beat_once().await;
                        debug!(
                            touched = report.touched,
                            missing = report.missing,
                            failed = report.failed,
                            "heartbeat round"
                        );
                    }
                }
            }

            info!("heartbeat loop stopped");
        })
    }

    /// Live sessions on `task_type_id`, across actors.
    ///
    /// Served through the presence cache; a store failure yields an empty
    /// list.
    pub async fn active_sessions_for_task_type(&self, task_type_id: &str) -> Vec<PresenceEntry> {
        let key = format!("{PRESENCE_KEY_PREFIX}{task_type_id}");
        let sessions = Arc::clone(&self.sessions);
        let clock = Arc::clone(&self.clock);
        let window = self.config.staleness_window();
        let timeout = self.store_timeout;
        let task_type_id = task_type_id.to_string();

        let fetched = self
            .presence_cache
            .execute_query(key, self.config.presence_cache_ttl(), move || async move {
                fetch_presence(sessions, clock, window, timeout, task_type_id).await
            })
            .await;

        fetched.unwrap_or_else(|err| {
            warn!(error = %err, "presence query failed");
            Vec::new()
        })
    }

    /// Drop the cached presence list for `task_type_id`.
    pub async fn invalidate_presence(&self, task_type_id: &str) {
        self.presence_cache.invalidate(&format!("{PRESENCE_KEY_PREFIX}{task_type_id}")).await;
    }
}

async fn fetch_presence(
    sessions: Arc<dyn ActiveSessionRepository>,
    clock: Arc<dyn Clock>,
    window: chrono::Duration,
    timeout: Duration,
    task_type_id: String,
) -> Result<Vec<PresenceEntry>> {
    let now = clock.utc_now();
    let rows = with_store_timeout(
        "list_live_sessions_for_task_type",
        timeout,
        sessions.list_live_sessions_for_task_type(&task_type_id, now - window),
    )
    .await?;

    let entries = rows
        .into_iter()
        .filter_map(|row| {
            let session_id = row.session_id.clone();
            match ActiveTaskSession::try_from(row) {
                Ok(session) => Some(session),
                Err(err) => {
                    warn!(session_id = %session_id, error = %err, "skipping corrupt presence row");
                    None
                }
            }
        })
        .filter(|session| session.is_live(now, window))
        .map(|session| PresenceEntry::from(&session))
        .collect();

    Ok(entries)
}
