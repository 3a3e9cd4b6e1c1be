//! Async cache with per-entry TTL and priority-aware eviction.
//!
//! Uses `tokio::sync::RwLock` for access from async contexts. Time comes from
//! an injected [`Clock`] so expiry can be tested without sleeping.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use super::config::{CacheConfig, CachePriority, EvictionPolicy};
use super::stats::{CacheStats, MetricsCollector};
use crate::time::{Clock, SystemClock};

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Option<Instant>,
    last_accessed: Instant,
    priority: CachePriority,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| now >= deadline)
    }
}

/// Async cache with configurable eviction and TTL support.
///
/// # Examples
///
/// ```
/// use workpulse_common::cache::{AsyncCache, CacheConfig};
///
/// #[tokio::main]
/// async fn main() {
///     let cache: AsyncCache<String, i32> = AsyncCache::new(CacheConfig::lru(100));
///
///     cache.insert("key".to_string(), 42).await;
///     assert_eq!(cache.get(&"key".to_string()).await, Some(42));
/// }
/// ```
pub struct AsyncCache<K, V, C = SystemClock>
where
    K: Eq + Hash + Clone,
    V: Clone,
    C: Clock + Clone,
{
    storage: Arc<RwLock<HashMap<K, CacheEntry<V>>>>,
    config: CacheConfig,
    metrics: MetricsCollector,
    clock: C,
}

impl<K, V> AsyncCache<K, V, SystemClock>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates a cache backed by the system clock.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<K, V, C> AsyncCache<K, V, C>
where
    K: Eq + Hash + Clone,
    V: Clone,
    C: Clock + Clone,
{
    /// Creates a cache with an injected clock.
    pub fn with_clock(config: CacheConfig, clock: C) -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
            config,
            metrics: MetricsCollector::default(),
            clock,
        }
    }

    /// Inserts with the configured default TTL and normal priority.
    pub async fn insert(&self, key: K, value: V) {
        self.insert_with(key, value, self.config.ttl, CachePriority::Normal).await;
    }

    /// Inserts with an explicit TTL (None = never expires) and priority.
    ///
    /// When the cache is full, one entry is evicted according to the
    /// configured policy before the new entry is stored.
    pub async fn insert_with(&self, key: K, value: V, ttl: Option<Duration>, priority: CachePriority) {
        let now = self.clock.now();
        let mut storage = self.storage.write().await;
        self.store_entry(&mut storage, key, value, ttl, priority, now);
    }

    /// Inserts only if `condition` holds, evaluated under the write lock.
    ///
    /// Returns whether the value was stored.
    pub(crate) async fn insert_if<F>(
        &self,
        key: K,
        value: V,
        ttl: Option<Duration>,
        priority: CachePriority,
        condition: F,
    ) -> bool
    where
        F: FnOnce() -> bool,
    {
        let now = self.clock.now();
        let mut storage = self.storage.write().await;
        if !condition() {
            return false;
        }
        self.store_entry(&mut storage, key, value, ttl, priority, now);
        true
    }

    fn store_entry(
        &self,
        storage: &mut HashMap<K, CacheEntry<V>>,
        key: K,
        value: V,
        ttl: Option<Duration>,
        priority: CachePriority,
        now: Instant,
    ) {
        if let Some(max_size) = self.config.max_size {
            if storage.len() >= max_size && !storage.contains_key(&key) {
                self.purge_expired(storage, now);
                if storage.len() >= max_size {
                    self.evict_one(storage);
                }
            }
        }

        storage.insert(
            key,
            CacheEntry {
                value,
                expires_at: ttl.map(|ttl| now + ttl),
                last_accessed: now,
                priority,
            },
        );
        self.metrics.record_insert();
    }

    /// Returns a fresh value, dropping the entry if it has expired.
    pub async fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let mut storage = self.storage.write().await;

        let expired = match storage.get_mut(key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.last_accessed = now;
                self.metrics.record_hit();
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            storage.remove(key);
            self.metrics.record_expiration();
        }
        self.metrics.record_miss();
        None
    }

    /// Removes and returns a value regardless of freshness.
    pub async fn remove(&self, key: &K) -> Option<V> {
        self.storage.write().await.remove(key).map(|entry| entry.value)
    }

    /// Checks for a fresh entry without touching recency.
    pub async fn contains_key(&self, key: &K) -> bool {
        let now = self.clock.now();
        self.storage.read().await.get(key).is_some_and(|entry| !entry.is_expired(now))
    }

    /// Number of stored entries, including ones not yet purged.
    pub async fn len(&self) -> usize {
        self.storage.read().await.len()
    }

    /// Returns `true` if the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.storage.read().await.is_empty()
    }

    /// Clears all entries from the cache.
    pub async fn clear(&self) {
        self.storage.write().await.clear();
    }

    /// Keeps only the entries whose key satisfies `keep`.
    pub async fn retain_keys<F>(&self, mut keep: F)
    where
        F: FnMut(&K) -> bool,
    {
        self.storage.write().await.retain(|key, _| keep(key));
    }

    /// Removes all expired entries and returns how many were dropped.
    pub async fn cleanup_expired(&self) -> usize {
        let now = self.clock.now();
        let mut storage = self.storage.write().await;
        self.purge_expired(&mut storage, now)
    }

    /// Returns current cache statistics.
    ///
    /// Uses a non-blocking read; size reports 0 while the lock is held.
    pub fn stats(&self) -> CacheStats {
        let size = self.storage.try_read().map(|s| s.len()).unwrap_or(0);
        self.metrics.snapshot(size, self.config.max_size)
    }

    pub(crate) fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    fn purge_expired(&self, storage: &mut HashMap<K, CacheEntry<V>>, now: Instant) -> usize {
        let before = storage.len();
        storage.retain(|_, entry| !entry.is_expired(now));
        let removed = before - storage.len();
        for _ in 0..removed {
            self.metrics.record_expiration();
        }
        removed
    }

    fn evict_one(&self, storage: &mut HashMap<K, CacheEntry<V>>) {
        let victim = match self.config.eviction_policy {
            EvictionPolicy::LRU => storage
                .iter()
                .min_by_key(|(_, entry)| entry.last_accessed)
                .map(|(key, _)| key.clone()),
            EvictionPolicy::Priority => storage
                .iter()
                .min_by_key(|(_, entry)| (entry.priority, entry.last_accessed))
                .map(|(key, _)| key.clone()),
            EvictionPolicy::None => None,
        };

        if let Some(key) = victim {
            storage.remove(&key);
            self.metrics.record_eviction();
        }
    }
}

impl<K, V, C> Clone for AsyncCache<K, V, C>
where
    K: Eq + Hash + Clone,
    V: Clone,
    C: Clock + Clone,
{
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            config: self.config.clone(),
            metrics: self.metrics.clone(),
            clock: self.clock.clone(),
        }
    }
}
