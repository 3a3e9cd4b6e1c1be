//! Read-through query cache that collapses identical concurrent requests.
//!
//! [`QueryCache::execute_query`] answers from a fresh cached value when one
//! exists. Otherwise, if a query with the same key is already in flight, the
//! caller awaits that same future instead of issuing a second request. Only
//! successful results are cached; an error is handed to every waiting caller
//! and the next call retries.
//!
//! Every in-flight query carries a generation number. Invalidating a key
//! disowns its in-flight query: callers already waiting still receive its
//! result, later callers start a fresh query, and the disowned result is
//! never written to the cache.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::trace;

use super::async_core::AsyncCache;
use super::config::{CacheConfig, CachePriority};
use super::stats::CacheStats;
use crate::time::{Clock, SystemClock};

type SharedQuery<V, E> = Shared<BoxFuture<'static, Result<V, E>>>;

struct InFlight<V, E> {
    generation: u64,
    query: SharedQuery<V, E>,
}

type InFlightMap<V, E> = Arc<Mutex<HashMap<String, InFlight<V, E>>>>;

fn is_current<V, E>(registry: &InFlightMap<V, E>, key: &str, generation: u64) -> bool {
    registry.lock().get(key).is_some_and(|entry| entry.generation == generation)
}

/// Deduplicating, memoizing cache for read queries keyed by string.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use workpulse_common::cache::{CacheConfig, QueryCache};
///
/// #[tokio::main]
/// async fn main() {
///     let cache: QueryCache<u32, String> = QueryCache::new(CacheConfig::lru(16));
///     let value = cache
///         .execute_query("answer", Duration::from_secs(60), || async { Ok::<_, String>(42) })
///         .await;
///     assert_eq!(value, Ok(42));
/// }
/// ```
pub struct QueryCache<V, E, C = SystemClock>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
    C: Clock + Clone + 'static,
{
    values: AsyncCache<String, V, C>,
    in_flight: InFlightMap<V, E>,
    generations: Arc<AtomicU64>,
}

impl<V, E> QueryCache<V, E, SystemClock>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Query cache backed by the system clock.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<V, E, C> QueryCache<V, E, C>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
    C: Clock + Clone + 'static,
{
    /// Query cache with an injected clock.
    pub fn with_clock(config: CacheConfig, clock: C) -> Self {
        Self {
            values: AsyncCache::with_clock(config, clock),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            generations: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Run `fetch` for `key` unless a fresh value or an identical in-flight
    /// query can answer instead.
    pub async fn execute_query<F, Fut>(
        &self,
        key: impl Into<String>,
        ttl: Duration,
        fetch: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        self.execute_query_with_priority(key, ttl, CachePriority::Normal, fetch).await
    }

    /// Same as [`execute_query`](Self::execute_query) with an explicit
    /// retention priority for the cached result.
    pub async fn execute_query_with_priority<F, Fut>(
        &self,
        key: impl Into<String>,
        ttl: Duration,
        priority: CachePriority,
        fetch: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let key = key.into();

        if let Some(value) = self.values.get(&key).await {
            trace!(query = %key, "query served from cache");
            return Ok(value);
        }

        let pending = {
            let mut in_flight = self.in_flight.lock();
            if let Some(existing) = in_flight.get(&key) {
                trace!(query = %key, "joining in-flight query");
                self.values.metrics().record_join();
                existing.query.clone()
            } else {
                let generation = self.generations.fetch_add(1, Ordering::Relaxed);
                let request = fetch();
                let values = self.values.clone();
                let registry = Arc::clone(&self.in_flight);
                let cache_key = key.clone();

                let shared = async move {
                    let result = request.await;
                    if let Ok(value) = &result {
                        let stored = values
                            .insert_if(cache_key.clone(), value.clone(), Some(ttl), priority, || {
                                is_current(&registry, &cache_key, generation)
                            })
                            .await;
                        if !stored {
                            trace!(query = %cache_key, "query invalidated in flight; result not cached");
                        }
                    }

                    let mut entries = registry.lock();
                    if entries.get(&cache_key).is_some_and(|entry| entry.generation == generation) {
                        entries.remove(&cache_key);
                    }
                    drop(entries);
                    result
                }
                .boxed()
                .shared();

                in_flight.insert(key, InFlight { generation, query: shared.clone() });
                shared
            }
        };

        pending.await
    }

    /// Store a value directly, as after a write that returned fresh state.
    ///
    /// A query for `key` still in flight is disowned so it cannot overwrite
    /// the primed value.
    pub async fn prime(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        self.in_flight.lock().remove(&key);
        self.values.insert_with(key, value, Some(ttl), CachePriority::Normal).await;
    }

    /// Drop the cached value for `key` and disown any in-flight query, so
    /// the next call refetches.
    pub async fn invalidate(&self, key: &str) -> bool {
        if self.in_flight.lock().remove(key).is_some() {
            trace!(query = %key, "in-flight query disowned");
        }
        self.values.remove(&key.to_string()).await.is_some()
    }

    /// Drop every key starting with `prefix`, in flight or cached.
    pub async fn invalidate_prefix(&self, prefix: &str) {
        self.in_flight.lock().retain(|key, _| !key.starts_with(prefix));
        self.values.retain_keys(|key| !key.starts_with(prefix)).await;
    }

    /// Whether a query for `key` is currently in flight.
    pub fn is_in_flight(&self, key: &str) -> bool {
        self.in_flight.lock().contains_key(key)
    }

    /// Cache statistics, including joined in-flight queries.
    pub fn stats(&self) -> CacheStats {
        self.values.stats()
    }

    /// Drop every cached value. Queries in flight still answer their
    /// callers but their results are not cached.
    pub async fn clear(&self) {
        self.in_flight.lock().clear();
        self.values.clear().await;
    }
}

impl<V, E, C> Clone for QueryCache<V, E, C>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
    C: Clock + Clone + 'static,
{
    fn clone(&self) -> Self {
        Self {
            values: self.values.clone(),
            in_flight: Arc::clone(&self.in_flight),
            generations: Arc::clone(&self.generations),
        }
    }
}
