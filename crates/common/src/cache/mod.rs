//! Async caches with TTL expiry, priority-aware eviction and query
//! deduplication.
//!
//! # Features
//!
//! - **Per-entry TTL**: each insert may carry its own time-to-live
//! - **Eviction**: LRU, priority-then-LRU, or none when the cache is full
//! - **Expired first**: a full cache drops expired entries before evicting
//! - **Deduplication**: [`QueryCache`] collapses identical in-flight queries
//! - **Testable**: clock abstraction for deterministic expiry tests
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! use workpulse_common::cache::{AsyncCache, CacheConfig, CachePriority};
//!
//! #[tokio::main]
//! async fn main() {
//!     let cache: AsyncCache<String, u32> =
//!         AsyncCache::new(CacheConfig::prioritized(Duration::from_secs(60), 64));
//!
//!     cache
//!         .insert_with("profile".to_string(), 7, None, CachePriority::High)
//!         .await;
//!     assert_eq!(cache.get(&"profile".to_string()).await, Some(7));
//!
//!     let stats = cache.stats();
//!     assert_eq!(stats.hits, 1);
//! }
//! ```

mod async_core;
mod config;
mod dedup;
mod stats;

pub use async_core::AsyncCache;
pub use config::{CacheConfig, CacheConfigBuilder, CachePriority, EvictionPolicy};
pub use dedup::QueryCache;
pub use stats::CacheStats;
