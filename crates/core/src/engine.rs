//! Explicitly constructed engine root.
//!
//! Owns the shared tick source, the timer registry, the query cache and
//! every service built on them. Nothing here is process-global; the host
//! creates one engine per signed-in actor and calls [`WorkPulseEngine::init`]
//! and [`WorkPulseEngine::shutdown`] around its lifetime.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};
use workpulse_common::cache::{CacheConfig, QueryCache};
use workpulse_common::lifecycle::{ManagerStatus, StatusCell};
use workpulse_common::time::{Clock, SystemClock, TickSource};
use workpulse_domain::{Config, PresenceEntry, Result, WorkPulseError};

use crate::session::{
    ActiveSessionRepository, HeartbeatTracker, RecoveryReport, SessionRecoveryService,
    TaskLogRepository, TaskSessionService, TaskTypeCatalog,
};
use crate::timer::{SharedRegistry, TaskRef, TimerRegistry};
use crate::workday::{WorkDayRepository, WorkSessionTracker};

const REGISTRY_SUBSCRIBER: &str = "timer-registry";

/// Store adapters the engine runs against.
#[derive(Clone)]
pub struct EngineStores {
    pub sessions: Arc<dyn ActiveSessionRepository>,
    pub task_logs: Arc<dyn TaskLogRepository>,
    pub work_days: Arc<dyn WorkDayRepository>,
    pub catalog: Arc<dyn TaskTypeCatalog>,
}

struct Running {
    actor_id: String,
    shutdown: CancellationToken,
    heartbeat: JoinHandle<()>,
}

pub struct WorkPulseEngine {
    ticks: TickSource<Arc<dyn Clock>>,
    registry: SharedRegistry,
    tasks: TaskSessionService,
    recovery: SessionRecoveryService,
    heartbeat: Arc<HeartbeatTracker>,
    work_sessions: WorkSessionTracker,
    status: StatusCell,
    running: Mutex<Option<Running>>,
}

impl WorkPulseEngine {
    /// Engine on the system clock.
    pub fn new(config: &Config, stores: EngineStores) -> Result<Self> {
        Self::with_clock(config, stores, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &Config, stores: EngineStores, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        let store_timeout = config.store.request_timeout();
        let timezone = config.work_session.tz()?;

        let registry = TimerRegistry::new(config.timers.max_concurrent_tasks).into_shared();
        let ticks = TickSource::with_clock(config.timers.tick_interval(), Arc::clone(&clock));
        let query_cache = QueryCache::with_clock(
            CacheConfig::prioritized(config.cache.default_ttl(), config.cache.max_entries),
            Arc::clone(&clock),
        );

        let heartbeat = Arc::new(HeartbeatTracker::new(
            Arc::clone(&stores.sessions),
            Arc::clone(&registry),
            Arc::clone(&clock),
            query_cache,
            config.presence.clone(),
            store_timeout,
        ));
        let recovery = SessionRecoveryService::new(
            Arc::clone(&stores.sessions),
            Arc::clone(&stores.catalog),
            Arc::clone(&registry),
            Arc::clone(&clock),
            config.presence.staleness_window(),
            store_timeout,
        );
        let tasks = TaskSessionService::new(
            Arc::clone(&registry),
            Arc::clone(&stores.sessions),
            Arc::clone(&stores.task_logs),
            Arc::clone(&clock),
            timezone,
            store_timeout,
        )
        .with_presence(Arc::clone(&heartbeat));
        let work_sessions = WorkSessionTracker::new(
            Arc::clone(&stores.work_days),
            Arc::clone(&stores.task_logs),
            clock,
            &config.work_session,
            store_timeout,
        )?;

        Ok(Self {
            ticks,
            registry,
            tasks,
            recovery,
            heartbeat,
            work_sessions,
            status: StatusCell::default(),
            running: Mutex::new(None),
        })
    }

    /// Wire timers to the tick source, recover live sessions and start the
    /// heartbeat loop.
    ///
    /// The engine reports `Running` only after recovery completed. A failed
    /// recovery leaves it in `Error`, from which `init` may be retried.
    #[instrument(skip(self))]
    pub async fn init(&self, actor_id: &str) -> Result<RecoveryReport> {
        self.status
            .transition_if(ManagerStatus::can_initialize, ManagerStatus::Initializing)
            .map_err(|current| {
                WorkPulseError::InvalidState(format!("cannot initialize engine in state {current}"))
            })?;

        self.ticks.init();
        let registry = Arc::clone(&self.registry);
        self.ticks.subscribe(REGISTRY_SUBSCRIBER, move |now| {
            registry.lock().tick(now);
            Ok(())
        });

        let report = match self.recovery.recover(actor_id).await {
            Ok(report) => report,
            Err(err) => {
                warn!(error = %err, "session recovery failed");
                self.ticks.unsubscribe(REGISTRY_SUBSCRIBER);
                self.status.set(ManagerStatus::Error);
                return Err(err);
            }
        };

        let shutdown = CancellationToken::new();
        let heartbeat = self.heartbeat.spawn(shutdown.clone());
        *self.running.lock() =
            Some(Running { actor_id: actor_id.to_string(), shutdown, heartbeat });

        self.status.set(ManagerStatus::Running);
        info!(restored = report.restored.len(), "engine running");
        Ok(report)
    }

    /// Stop the heartbeat loop and the tick source.
    ///
    /// Registered timers are left as they are; their sessions age out of the
    /// staleness window unless another client resumes them.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> Result<()> {
        if self.status.get() == ManagerStatus::Shutdown {
            return Ok(());
        }
        self.status.set(ManagerStatus::ShuttingDown);

        let running = self.running.lock().take();
        if let Some(running) = running {
            running.shutdown.cancel();
            if let Err(err) = running.heartbeat.await {
                warn!(error = %err, "heartbeat loop ended abnormally");
            }
            info!(actor_id = %running.actor_id, "engine stopped");
        }

        self.ticks.unsubscribe(REGISTRY_SUBSCRIBER);
        self.ticks.shutdown();
        self.status.set(ManagerStatus::Shutdown);
        Ok(())
    }

    pub fn status(&self) -> ManagerStatus {
        self.status.get()
    }

    /// Actor the engine was initialized for.
    pub fn actor_id(&self) -> Option<String> {
        self.running.lock().as_ref().map(|running| running.actor_id.clone())
    }

    pub fn tasks(&self) -> &TaskSessionService {
        &self.tasks
    }

    pub fn work_sessions(&self) -> &WorkSessionTracker {
        &self.work_sessions
    }

    pub fn heartbeat(&self) -> &Arc<HeartbeatTracker> {
        &self.heartbeat
    }

    pub fn ticks(&self) -> &TickSource<Arc<dyn Clock>> {
        &self.ticks
    }

    pub fn active_tasks(&self) -> Vec<TaskRef> {
        self.registry.lock().get_active_tasks_with_timers()
    }

    /// Co-workers currently on `task_type_id`.
    pub async fn presence(&self, task_type_id: &str) -> Vec<PresenceEntry> {
        self.heartbeat.active_sessions_for_task_type(task_type_id).await
    }
}
