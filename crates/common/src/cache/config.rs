//! Cache configuration types and builder patterns

use std::time::Duration;

/// Eviction policy applied when a bounded cache is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvictionPolicy {
    /// Least Recently Used - evicts the least recently accessed entry
    #[default]
    LRU,
    /// Evicts the lowest [`CachePriority`] first, least recently used within
    /// a priority band
    Priority,
    /// No automatic eviction; inserts beyond capacity are still accepted
    None,
}

/// Retention priority attached to an entry.
///
/// Only consulted by [`EvictionPolicy::Priority`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum CachePriority {
    /// Recomputable data, evicted first
    Low,
    #[default]
    Normal,
    /// Data that is expensive to refetch, evicted last
    High,
}

/// Configuration for cache behavior
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries (None = unlimited)
    pub max_size: Option<usize>,

    /// Default time-to-live for entries (None = no expiration)
    pub ttl: Option<Duration>,

    /// Eviction policy when max_size is reached
    pub eviction_policy: EvictionPolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_size: None, ttl: None, eviction_policy: EvictionPolicy::LRU }
    }
}

impl CacheConfig {
    /// Create a new configuration builder
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }

    /// Quick preset for a TTL-only cache
    pub fn ttl(duration: Duration) -> Self {
        Self { max_size: None, ttl: Some(duration), eviction_policy: EvictionPolicy::None }
    }

    /// Quick preset for a bounded LRU cache
    pub fn lru(max_size: usize) -> Self {
        Self { max_size: Some(max_size), ttl: None, eviction_policy: EvictionPolicy::LRU }
    }

    /// Bounded cache with priority-aware eviction and a default TTL
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use workpulse_common::cache::{CacheConfig, EvictionPolicy};
    ///
    /// let config = CacheConfig::prioritized(Duration::from_secs(60), 256);
    /// assert_eq!(config.eviction_policy, EvictionPolicy::Priority);
    /// ```
    pub fn prioritized(ttl: Duration, max_size: usize) -> Self {
        Self {
            max_size: Some(max_size),
            ttl: Some(ttl),
            eviction_policy: EvictionPolicy::Priority,
        }
    }
}

/// Builder for CacheConfig with fluent API
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    config: CacheConfig,
}

impl CacheConfigBuilder {
    /// Set maximum number of entries
    pub fn max_size(mut self, size: usize) -> Self {
        self.config.max_size = Some(size);
        self
    }

    /// Set the default time-to-live for entries
    pub fn ttl(mut self, duration: Duration) -> Self {
        self.config.ttl = Some(duration);
        self
    }

    /// Set eviction policy
    pub fn eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.config.eviction_policy = policy;
        self
    }

    /// Build the configuration
    pub fn build(self) -> CacheConfig {
        self.config
    }
}
