//! Two-tier tile cache: bounded local store plus an optional remote store.
//!
//! Reads consult the remote tier first and fall back to the local tier;
//! writes go to both. Any remote failure is logged and absorbed, so an
//! unreachable remote only lowers the hit rate.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::local::LocalTileStore;
use super::stats::{CacheCounters, CacheStats};
use super::traits::{CachedTile, RemoteStore};

/// Default entry lifetime (24 hours).
pub const DEFAULT_TTL_SECS: u64 = 86_400;

/// Default local capacity in entries.
pub const DEFAULT_MAX_ENTRIES: usize = 1000;

/// Tile cache configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// When false, `get` always misses silently and `set` is a no-op.
    pub enabled: bool,
    /// Entry lifetime in both tiers.
    pub ttl: Duration,
    /// Local tier capacity.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

/// Tiered tile cache.
///
/// Construct with [`TileCache::new`] for local-only caching or
/// [`TileCache::with_remote`] to inject a shared store.
pub struct TileCache {
    config: CacheConfig,
    local: LocalTileStore,
    remote: Option<Arc<dyn RemoteStore>>,
    counters: CacheCounters,
}

impl TileCache {
    pub fn new(config: CacheConfig) -> Self {
        Self::build(config, None)
    }

    pub fn with_remote(config: CacheConfig, remote: Arc<dyn RemoteStore>) -> Self {
        Self::build(config, Some(remote))
    }

    fn build(config: CacheConfig, remote: Option<Arc<dyn RemoteStore>>) -> Self {
        let local = LocalTileStore::new(config.max_entries, config.ttl);
        Self {
            config,
            local,
            remote,
            counters: CacheCounters::default(),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    fn remote_key(key: &str) -> String {
        format!("tile:{}", key)
    }

    /// Look up a tile by key.
    pub async fn get(&self, key: &str) -> Option<CachedTile> {
        if !self.config.enabled {
            return None;
        }

        if let Some(remote) = &self.remote {
            match remote.get(&Self::remote_key(key)).await {
                Ok(Some(tile)) => {
                    self.counters.hit();
                    debug!(key, tier = remote.name(), "Cache hit");
                    return Some(tile);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(
                        key,
                        tier = remote.name(),
                        error = %e,
                        "Remote cache read failed, continuing with local cache"
                    );
                }
            }
        }

        match self.local.get(key) {
            Some(tile) => {
                self.counters.hit();
                debug!(key, tier = "local", "Cache hit");
                Some(tile)
            }
            None => {
                self.counters.miss();
                None
            }
        }
    }

    /// Store a tile under `key` in every tier.
    pub async fn set(&self, key: &str, value: CachedTile) {
        if !self.config.enabled {
            return;
        }

        if let Some(remote) = &self.remote {
            if let Err(e) = remote
                .set(&Self::remote_key(key), value.clone(), self.config.ttl)
                .await
            {
                warn!(
                    key,
                    tier = remote.name(),
                    error = %e,
                    "Remote cache write failed, using local cache only"
                );
            }
        }

        let evicted = self.local.insert(key, value);
        if evicted > 0 {
            debug!(evicted, "Local cache over capacity, evicted oldest entries");
        }
        self.counters.evicted(evicted);
    }

    /// Drop expired local entries. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.local.purge_expired()
    }

    /// Cumulative hit/miss/eviction counts and current key count.
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot(self.local.live_len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::traits::tests::{FailingRemoteStore, MapRemoteStore};
    use std::sync::atomic::Ordering;

    fn config(max_entries: usize) -> CacheConfig {
        CacheConfig {
            enabled: true,
            ttl: Duration::from_secs(60),
            max_entries,
        }
    }

    fn tile(byte: u8) -> CachedTile {
        CachedTile::new(vec![byte; 8], "application/x-protobuf")
    }

    #[tokio::test]
    async fn test_set_then_get_counts_one_hit() {
        let cache = TileCache::new(config(10));
        cache.set("p:1:0:0", tile(1)).await;

        let got = cache.get("p:1:0:0").await;
        assert_eq!(got, Some(tile(1)));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.keys, 1);
    }

    #[tokio::test]
    async fn test_stats_keys_exclude_expired_entries() {
        let cache = TileCache::new(CacheConfig {
            ttl: Duration::ZERO,
            ..config(10)
        });
        cache.set("a", tile(1)).await;
        cache.set("b", tile(2)).await;
        assert_eq!(cache.stats().keys, 0);
    }

    #[tokio::test]
    async fn test_miss_is_counted() {
        let cache = TileCache::new(config(10));
        assert!(cache.get("absent").await.is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[tokio::test]
    async fn test_overflow_evicts_exactly_one_least_recent() {
        let cache = TileCache::new(config(3));
        cache.set("a", tile(1)).await;
        cache.set("b", tile(2)).await;
        cache.set("c", tile(3)).await;

        assert!(cache.get("a").await.is_some());
        assert!(cache.get("c").await.is_some());

        cache.set("d", tile(4)).await;

        let stats = cache.stats();
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.keys, 3);
        assert!(cache.get("b").await.is_none(), "b was least recently accessed");
        assert!(cache.get("a").await.is_some());
        assert!(cache.get("d").await.is_some());
    }

    #[tokio::test]
    async fn test_disabled_cache_is_inert() {
        let cache = TileCache::new(CacheConfig {
            enabled: false,
            ..config(10)
        });
        cache.set("a", tile(1)).await;
        assert!(cache.get("a").await.is_none());
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[tokio::test]
    async fn test_remote_consulted_first() {
        let remote = Arc::new(MapRemoteStore::default());
        remote
            .entries
            .lock()
            .insert("tile:shared".to_string(), tile(7));

        let cache = TileCache::with_remote(config(10), remote.clone());
        assert_eq!(cache.get("shared").await, Some(tile(7)));
        assert_eq!(cache.stats().hits, 1);
    }

    #[tokio::test]
    async fn test_set_writes_both_tiers() {
        let remote = Arc::new(MapRemoteStore::default());
        let cache = TileCache::with_remote(config(10), remote.clone());

        cache.set("k", tile(3)).await;
        assert_eq!(remote.sets.load(Ordering::Relaxed), 1);
        assert!(remote.entries.lock().contains_key("tile:k"));
        assert_eq!(cache.stats().keys, 1);
    }

    #[tokio::test]
    async fn test_failing_remote_falls_back_to_local() {
        let cache = TileCache::with_remote(config(10), Arc::new(FailingRemoteStore));

        cache.set("k", tile(5)).await;
        assert_eq!(cache.get("k").await, Some(tile(5)));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 0);
    }

    #[tokio::test]
    async fn test_concurrent_gets_do_not_lose_counts() {
        let cache = Arc::new(TileCache::new(config(100)));
        cache.set("hot", tile(1)).await;

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move {
                    for _ in 0..50 {
                        cache.get("hot").await;
                        cache.get(&format!("cold-{}", i)).await;
                    }
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let stats = cache.stats();
        assert_eq!(stats.hits, 800);
        assert_eq!(stats.misses, 800);
    }
}
