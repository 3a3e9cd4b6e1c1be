//! Daily clock-in/clock-out state.
//!
//! Reads go through a TTL cache that also collapses concurrent identical
//! reads, and a fetch is not repeated within the minimum refetch interval
//! even if the cache entry was dropped. [`WorkSessionTracker::refresh`]
//! bypasses both.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use chrono_tz::Tz;
use parking_lot::Mutex;
use tracing::{debug, info, instrument};
use workpulse_common::cache::QueryCache;
use workpulse_common::time::Clock;
use workpulse_domain::constants::WORK_DAY_KEY_PREFIX;
use workpulse_domain::{
    ClockOutTotals, Result, WorkDaySession, WorkDayStatus, WorkPulseError, WorkSessionConfig,
};

use super::ports::WorkDayRepository;
use crate::session::TaskLogRepository;
use crate::store::with_store_timeout;

type WorkDayCache = QueryCache<Option<WorkDaySession>, WorkPulseError, Arc<dyn Clock>>;

/// Last fetch per cache key, for the refetch throttle.
///
/// A fetch records its result only if no refresh or write happened since it
/// started; entries older than the throttle window are pruned on insert.
#[derive(Debug, Default)]
struct FetchLog {
    entries: HashMap<String, (Instant, Option<WorkDaySession>)>,
    generation: u64,
}

impl FetchLog {
    fn get(&self, key: &str, now: Instant, window: Duration) -> Option<Option<WorkDaySession>> {
        let (fetched_at, session) = self.entries.get(key)?;
        (now.saturating_duration_since(*fetched_at) < window).then(|| session.clone())
    }

    fn record(
        &mut self,
        key: String,
        at: Instant,
        session: Option<WorkDaySession>,
        window: Duration,
    ) {
        self.entries.retain(|_, (fetched_at, _)| at.saturating_duration_since(*fetched_at) < window);
        self.entries.insert(key, (at, session));
    }

    /// Forget `key` and disown every fetch started before this call.
    fn reset(&mut self, key: &str) {
        self.generation += 1;
        self.entries.remove(key);
    }
}

type RecentFetches = Arc<Mutex<FetchLog>>;

pub struct WorkSessionTracker {
    repository: Arc<dyn WorkDayRepository>,
    task_logs: Arc<dyn TaskLogRepository>,
    clock: Arc<dyn Clock>,
    timezone: Tz,
    cache: WorkDayCache,
    recent: RecentFetches,
    cache_ttl: Duration,
    min_refetch_interval: Duration,
    store_timeout: Duration,
}

impl WorkSessionTracker {
    pub fn new(
        repository: Arc<dyn WorkDayRepository>,
        task_logs: Arc<dyn TaskLogRepository>,
        clock: Arc<dyn Clock>,
        config: &WorkSessionConfig,
        store_timeout: Duration,
    ) -> Result<Self> {
        let cache = QueryCache::with_clock(
            workpulse_common::cache::CacheConfig::lru(64),
            Arc::clone(&clock),
        );
        Ok(Self {
            repository,
            task_logs,
            clock,
            timezone: config.tz()?,
            cache,
            recent: Arc::new(Mutex::new(FetchLog::default())),
            cache_ttl: config.cache_ttl(),
            min_refetch_interval: config.min_refetch_interval(),
            store_timeout,
        })
    }

    /// Today's date in the configured time zone.
    pub fn today(&self) -> NaiveDate {
        self.clock.utc_now().with_timezone(&self.timezone).date_naive()
    }

    /// Today's session, served from cache when possible.
    pub async fn current_session(&self, actor_id: &str) -> Result<Option<WorkDaySession>> {
        let today = self.today();
        let key = self.cache_key(actor_id, today);

        if let Some(session) = self.throttled(&key) {
            debug!(key = %key, "work day read throttled");
            return Ok(session);
        }

        let fetch = self.fetcher(actor_id, today, key.clone());
        self.cache.execute_query(key, self.cache_ttl, fetch).await
    }

    /// Drop the cached state and read it again from the store.
    pub async fn refresh(&self, actor_id: &str) -> Result<Option<WorkDaySession>> {
        let today = self.today();
        let key = self.cache_key(actor_id, today);
        self.recent.lock().reset(&key);
        self.cache.invalidate(&key).await;

        let fetch = self.fetcher(actor_id, today, key.clone());
        self.cache.execute_query(key, self.cache_ttl, fetch).await
    }

    pub async fn status(&self, actor_id: &str) -> Result<WorkDayStatus> {
        Ok(self
            .current_session(actor_id)
            .await?
            .map_or(WorkDayStatus::NotClockedIn, |session| session.status()))
    }

    /// `not_clocked_in -> working`.
    ///
    /// Clocking in while already working returns the open session. After
    /// clock-out the day is closed.
    #[instrument(skip(self))]
    pub async fn clock_in(&self, actor_id: &str) -> Result<WorkDaySession> {
        let today = self.today();
        if let Some(existing) = self.refresh(actor_id).await? {
            return match existing.status() {
                WorkDayStatus::ClockedOut => Err(WorkPulseError::InvalidState(format!(
                    "already clocked out for {today}"
                ))),
                WorkDayStatus::Working | WorkDayStatus::NotClockedIn => Ok(existing),
            };
        }

        let now = self.clock.utc_now();
        let session = with_store_timeout(
            "insert_clock_in",
            self.store_timeout,
            self.repository.insert_clock_in(actor_id, today, now),
        )
        .await?;

        info!(session_id = %session.session_id, date = %today, "clocked in");
        self.store_fresh(actor_id, today, Some(session.clone())).await;
        Ok(session)
    }

    /// `working -> clocked_out`, writing the day's totals.
    #[instrument(skip(self))]
    pub async fn clock_out(&self, actor_id: &str) -> Result<WorkDaySession> {
        let session = self
            .refresh(actor_id)
            .await?
            .ok_or_else(|| WorkPulseError::InvalidState("not clocked in".to_string()))?;
        if session.status() == WorkDayStatus::ClockedOut {
            return Err(WorkPulseError::InvalidState(format!(
                "already clocked out for {}",
                session.date
            )));
        }

        let task_minutes = with_store_timeout(
            "total_minutes_for_date",
            self.store_timeout,
            self.task_logs.total_minutes_for_date(actor_id, session.date),
        )
        .await?;
        let totals =
            ClockOutTotals::compute(session.clock_in_time, self.clock.utc_now(), task_minutes);

        let updated = with_store_timeout(
            "record_clock_out",
            self.store_timeout,
            self.repository.record_clock_out(&session.session_id, totals),
        )
        .await?;

        info!(
            session_id = %updated.session_id,
            work = totals.total_work_minutes,
            task = totals.total_task_minutes,
            idle = totals.total_idle_minutes,
            "clocked out"
        );
        self.store_fresh(actor_id, updated.date, Some(updated.clone())).await;
        Ok(updated)
    }

    fn cache_key(&self, actor_id: &str, date: NaiveDate) -> String {
        format!("{WORK_DAY_KEY_PREFIX}{actor_id}:{date}")
    }

    fn throttled(&self, key: &str) -> Option<Option<WorkDaySession>> {
        self.recent.lock().get(key, self.clock.now(), self.min_refetch_interval)
    }

    fn fetcher(
        &self,
        actor_id: &str,
        date: NaiveDate,
        key: String,
    ) -> impl FnOnce() -> futures::future::BoxFuture<'static, Result<Option<WorkDaySession>>> {
        let repository = Arc::clone(&self.repository);
        let clock = Arc::clone(&self.clock);
        let recent = Arc::clone(&self.recent);
        let timeout = self.store_timeout;
        let window = self.min_refetch_interval;
        let generation = self.recent.lock().generation;
        let actor_id = actor_id.to_string();

        move || {
            Box::pin(async move {
                let session = with_store_timeout(
                    "find_session",
                    timeout,
                    repository.find_session(&actor_id, date),
                )
                .await?;
                {
                    let mut log = recent.lock();
                    if log.generation == generation {
                        log.record(key, clock.now(), session.clone(), window);
                    }
                }
                Ok(session)
            })
        }
    }

    async fn store_fresh(&self, actor_id: &str, date: NaiveDate, session: Option<WorkDaySession>) {
        let key = self.cache_key(actor_id, date);
        {
            let mut log = self.recent.lock();
            log.reset(&key);
            log.record(key.clone(), self.clock.now(), session.clone(), self.min_refetch_interval);
        }
        self.cache.prime(key, session, self.cache_ttl).await;
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    const WINDOW: Duration = Duration::from_secs(10);

    fn day(actor_id: &str) -> WorkDaySession {
        WorkDaySession {
            session_id: format!("day-{actor_id}"),
            actor_id: actor_id.to_string(),
            date: Utc::now().date_naive(),
            clock_in_time: Utc::now(),
            clock_out_time: None,
            total_work_minutes: None,
            total_task_minutes: None,
            total_idle_minutes: None,
        }
    }

    /// Validates `FetchLog::record` pruning.
    ///
    /// Assertions:
    /// - Confirms entries older than the window are dropped on insert.
    /// - Confirms entries inside the window are kept and served.
    #[test]
    fn test_fetch_log_prunes_expired_entries() {
        let mut log = FetchLog::default();
        let start = Instant::now();

        log.record("day:actor-1:2025-02-28".into(), start, Some(day("actor-1")), WINDOW);
        log.record("day:actor-2:2025-03-01".into(), start + Duration::from_secs(5), None, WINDOW);
        log.record(
            "day:actor-1:2025-03-01".into(),
            start + Duration::from_secs(12),
            Some(day("actor-1")),
            WINDOW,
        );

        assert_eq!(log.entries.len(), 2);
        assert!(!log.entries.contains_key("day:actor-1:2025-02-28"));
        let now = start + Duration::from_secs(13);
        assert_eq!(log.get("day:actor-2:2025-03-01", now, WINDOW), Some(None));
        assert!(log.get("day:actor-1:2025-03-01", now, WINDOW).is_some_and(|s| s.is_some()));
    }

    /// Validates `FetchLog::reset`.
    ///
    /// Assertions:
    /// - Confirms the key is forgotten and the generation advances.
    #[test]
    fn test_fetch_log_reset_bumps_generation() {
        let mut log = FetchLog::default();
        let start = Instant::now();
        log.record("k".into(), start, None, WINDOW);

        log.reset("k");
        assert_eq!(log.generation, 1);
        assert_eq!(log.get("k", start, WINDOW), None);
    }
}
