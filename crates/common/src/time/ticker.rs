//! Shared 1 Hz tick source
//!
//! A single interval fans out to every registered subscriber so N timers do
//! not need N intervals. The driver task starts lazily with the first
//! subscriber and stops when the last one leaves.
//!
//! Subscribers are isolated from each other: a callback that returns an
//! error or panics is logged and the remaining callbacks still run. The
//! subscriber list is snapshotted before each dispatch, so callbacks may
//! subscribe or unsubscribe during a tick. A handle removed mid-tick is not
//! called afterwards; a handle added mid-tick first fires on the next tick.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::clock::{Clock, SystemClock};
use crate::error::CommonResult;

/// Callback invoked with the tick timestamp.
pub type TickCallback = Arc<dyn Fn(DateTime<Utc>) -> CommonResult<()> + Send + Sync>;

/// Outcome of one dispatch round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Callbacks that completed successfully.
    pub delivered: usize,
    /// Callbacks that returned an error or panicked.
    pub failed: usize,
}

struct Subscriber {
    id: String,
    callback: TickCallback,
    active: AtomicBool,
}

#[derive(Default)]
struct TickerState {
    subscribers: Vec<Arc<Subscriber>>,
    driver: Option<CancellationToken>,
    shut_down: bool,
}

struct TickInner<C> {
    clock: C,
    period: Duration,
    state: Mutex<TickerState>,
    ticks: AtomicU64,
}

/// Process-wide tick source, constructed explicitly and shared by handle.
///
/// # Examples
///
/// ```
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// use workpulse_common::time::{MockClock, TickSource};
///
/// let source = TickSource::with_clock(Duration::from_secs(1), MockClock::new());
/// let hits = Arc::new(AtomicU32::new(0));
/// let counter = Arc::clone(&hits);
/// source.subscribe("counter", move |_now| {
///     counter.fetch_add(1, Ordering::SeqCst);
///     Ok(())
/// });
///
/// source.tick_now();
/// assert_eq!(hits.load(Ordering::SeqCst), 1);
/// ```
pub struct TickSource<C = SystemClock>
where
    C: Clock + Clone + 'static,
{
    inner: Arc<TickInner<C>>,
}

impl<C> Clone for TickSource<C>
where
    C: Clock + Clone + 'static,
{
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl TickSource<SystemClock> {
    /// Tick source backed by the system clock.
    pub fn new(period: Duration) -> Self {
        Self::with_clock(period, SystemClock)
    }
}

impl<C> TickSource<C>
where
    C: Clock + Clone + 'static,
{
    /// Tick source with an injected clock.
    pub fn with_clock(period: Duration, clock: C) -> Self {
        Self {
            inner: Arc::new(TickInner {
                clock,
                period,
                state: Mutex::new(TickerState::default()),
                ticks: AtomicU64::new(0),
            }),
        }
    }

    /// Register a per-tick listener under `id`.
    ///
    /// Re-using an id replaces the previous callback.
    pub fn subscribe<F>(&self, id: impl Into<String>, callback: F)
    where
        F: Fn(DateTime<Utc>) -> CommonResult<()> + Send + Sync + 'static,
    {
        let id = id.into();
        let mut state = self.inner.state.lock();

        if let Some(pos) = state.subscribers.iter().position(|s| s.id == id) {
            let previous = state.subscribers.remove(pos);
            previous.active.store(false, Ordering::SeqCst);
        }

        debug!(subscriber = %id, "tick subscriber registered");
        state.subscribers.push(Arc::new(Subscriber {
            id,
            callback: Arc::new(callback),
            active: AtomicBool::new(true),
        }));

        if !state.shut_down {
            start_driver(&self.inner, &mut state);
        }
    }

    /// Remove the listener registered under `id`.
    ///
    /// Returns `false` when no such listener exists.
    pub fn unsubscribe(&self, id: &str) -> bool {
        let mut state = self.inner.state.lock();
        let Some(pos) = state.subscribers.iter().position(|s| s.id == id) else {
            return false;
        };

        let removed = state.subscribers.remove(pos);
        removed.active.store(false, Ordering::SeqCst);
        debug!(subscriber = %id, "tick subscriber removed");

        if state.subscribers.is_empty() {
            stop_driver(&mut state);
        }
        true
    }

    /// Number of registered listeners.
    pub fn subscriber_count(&self) -> usize {
        self.inner.state.lock().subscribers.len()
    }

    /// Whether the background interval is currently running.
    pub fn is_running(&self) -> bool {
        self.inner.state.lock().driver.is_some()
    }

    /// Total dispatch rounds since construction.
    pub fn tick_count(&self) -> u64 {
        self.inner.ticks.load(Ordering::Relaxed)
    }

    /// Dispatch a tick at the clock's current time.
    pub fn tick_now(&self) -> TickReport {
        self.inner.dispatch(self.inner.clock.utc_now())
    }

    /// Dispatch a tick with an explicit timestamp.
    pub fn dispatch(&self, now: DateTime<Utc>) -> TickReport {
        self.inner.dispatch(now)
    }

    /// Re-arm the source after a [`shutdown`](Self::shutdown).
    pub fn init(&self) {
        let mut state = self.inner.state.lock();
        state.shut_down = false;
        if !state.subscribers.is_empty() {
            start_driver(&self.inner, &mut state);
        }
    }

    /// Stop the interval and drop every subscriber.
    pub fn shutdown(&self) {
        let mut state = self.inner.state.lock();
        state.shut_down = true;
        for subscriber in state.subscribers.drain(..) {
            subscriber.active.store(false, Ordering::SeqCst);
        }
        stop_driver(&mut state);
        debug!("tick source shut down");
    }
}

impl<C: Clock> TickInner<C> {
    fn dispatch(&self, now: DateTime<Utc>) -> TickReport {
        let snapshot: Vec<Arc<Subscriber>> = self.state.lock().subscribers.clone();
        self.ticks.fetch_add(1, Ordering::Relaxed);

        let mut report = TickReport::default();
        for subscriber in snapshot {
            if !subscriber.active.load(Ordering::SeqCst) {
                continue;
            }

            match catch_unwind(AssertUnwindSafe(|| (subscriber.callback)(now))) {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(err)) => {
                    report.failed += 1;
                    warn!(subscriber = %subscriber.id, error = %err, "tick subscriber failed");
                }
                Err(_) => {
                    report.failed += 1;
                    warn!(subscriber = %subscriber.id, "tick subscriber panicked");
                }
            }
        }
        report
    }
}

fn start_driver<C>(inner: &Arc<TickInner<C>>, state: &mut TickerState)
where
    C: Clock + Clone + 'static,
{
    if state.driver.is_some() {
        return;
    }

    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        debug!("no tokio runtime available; ticks must be dispatched manually");
        return;
    };

    let token = CancellationToken::new();
    let cancelled = token.clone();
    let weak: Weak<TickInner<C>> = Arc::downgrade(inner);
    let period = inner.period;

    runtime.spawn(async move {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                () = cancelled.cancelled() => break,
                _ = interval.tick() => {
                    let Some(inner) = weak.upgrade() else { break };
                    inner.dispatch(inner.clock.utc_now());
                }
            }
        }
    });

    state.driver = Some(token);
}

fn stop_driver(state: &mut TickerState) {
    if let Some(token) = state.driver.take() {
        token.cancel();
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for time::ticker.
    use std::sync::atomic::AtomicU32;

    use super::*;
    use crate::error::CommonError;
    use crate::time::MockClock;

    fn counter_callback(
        counter: &Arc<AtomicU32>,
    ) -> impl Fn(DateTime<Utc>) -> CommonResult<()> + Send + Sync + 'static {
        let counter = Arc::clone(counter);
        move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Validates `TickSource::dispatch` behavior for the failing subscriber
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms the healthy subscriber still receives the tick.
    /// - Confirms the report counts one failure and one delivery.
    #[test]
    fn test_failing_subscriber_is_isolated() {
        let source = TickSource::with_clock(Duration::from_secs(1), MockClock::new());
        let hits = Arc::new(AtomicU32::new(0));

        source.subscribe("broken", |_| Err(CommonError::internal("boom")));
        source.subscribe("healthy", counter_callback(&hits));

        let report = source.tick_now();
        assert_eq!(report, TickReport { delivered: 1, failed: 1 });
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    /// Validates `TickSource::dispatch` behavior for the panicking subscriber
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms a panic in one callback does not stop the others.
    #[test]
    fn test_panicking_subscriber_is_isolated() {
        let source = TickSource::with_clock(Duration::from_secs(1), MockClock::new());
        let hits = Arc::new(AtomicU32::new(0));

        source.subscribe("panics", |_| panic!("subscriber bug"));
        source.subscribe("healthy", counter_callback(&hits));

        let report = source.tick_now();
        assert_eq!(report.failed, 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    /// Validates `TickSource::unsubscribe` behavior when a callback removes a
    /// later subscriber mid-tick.
    ///
    /// Assertions:
    /// - Confirms the removed subscriber is not called in the same round.
    /// - Confirms earlier subscribers are called exactly once.
    #[test]
    fn test_unsubscribe_during_tick() {
        let source = TickSource::with_clock(Duration::from_secs(1), MockClock::new());
        let first = Arc::new(AtomicU32::new(0));
        let victim = Arc::new(AtomicU32::new(0));

        let handle = source.clone();
        let first_counter = Arc::clone(&first);
        source.subscribe("remover", move |_| {
            first_counter.fetch_add(1, Ordering::SeqCst);
            handle.unsubscribe("victim");
            Ok(())
        });
        source.subscribe("victim", counter_callback(&victim));

        source.tick_now();
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(victim.load(Ordering::SeqCst), 0);
        assert_eq!(source.subscriber_count(), 1);
    }

    /// Validates `TickSource::subscribe` behavior when a callback registers a
    /// new subscriber mid-tick.
    ///
    /// Assertions:
    /// - Confirms the newcomer first fires on the following tick.
    #[test]
    fn test_subscribe_during_tick() {
        let source = TickSource::with_clock(Duration::from_secs(1), MockClock::new());
        let newcomer = Arc::new(AtomicU32::new(0));

        let handle = source.clone();
        let newcomer_counter = Arc::clone(&newcomer);
        source.subscribe("adder", move |_| {
            handle.subscribe("newcomer", counter_callback(&newcomer_counter));
            Ok(())
        });

        source.tick_now();
        assert_eq!(newcomer.load(Ordering::SeqCst), 0);

        source.tick_now();
        assert_eq!(newcomer.load(Ordering::SeqCst), 1);
    }

    /// Validates lazy start and stop of the driver interval.
    ///
    /// Assertions:
    /// - Ensures the driver is idle without subscribers.
    /// - Ensures the driver runs with one subscriber and stops after the last
    ///   unsubscribes.
    #[tokio::test(start_paused = true)]
    async fn test_driver_starts_and_stops_with_subscribers() {
        let source = TickSource::new(Duration::from_secs(1));
        assert!(!source.is_running());

        let hits = Arc::new(AtomicU32::new(0));
        source.subscribe("counter", counter_callback(&hits));
        assert!(source.is_running());

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 3);

        assert!(source.unsubscribe("counter"));
        assert!(!source.is_running());

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    /// Validates `TickSource::shutdown` and `TickSource::init`.
    ///
    /// Assertions:
    /// - Ensures shutdown clears subscribers and stops the driver.
    /// - Ensures subscribing after shutdown does not restart the driver until
    ///   `init` is called.
    #[tokio::test(start_paused = true)]
    async fn test_shutdown_and_init() {
        let source = TickSource::new(Duration::from_secs(1));
        let hits = Arc::new(AtomicU32::new(0));
        source.subscribe("counter", counter_callback(&hits));

        source.shutdown();
        assert_eq!(source.subscriber_count(), 0);
        assert!(!source.is_running());

        source.subscribe("counter", counter_callback(&hits));
        assert!(!source.is_running());

        source.init();
        assert!(source.is_running());
    }
}
