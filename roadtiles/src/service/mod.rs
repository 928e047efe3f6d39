//! Rate-limited service facade.
//!
//! [`RoadTileService`] wires the tile core together from a [`ConfigFile`]:
//! tiered cache (with a Redis tier when configured), the Kerala PWD
//! provider, the composite, the road matcher, the per-client rate limiter
//! and the officials client. Every client-facing entry point is admitted
//! through the rate limiter first; diagnostics are not.
//!
//! # Example
//!
//! ```ignore
//! use roadtiles::config::ConfigFile;
//! use roadtiles::service::RoadTileService;
//!
//! let config = ConfigFile::load()?;
//! let service = RoadTileService::from_config(&config).await?;
//! service.start_maintenance(config.check_period());
//!
//! let road = service.match_road("203.0.113.7", 8.5241, 76.9366).await?;
//! service.shutdown().await;
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cache::{CacheStats, TileCache};
use crate::composite::TileComposite;
use crate::config::ConfigFile;
use crate::coord::TileCoord;
use crate::error::ServiceError;
use crate::matcher::{RoadMatchResult, RoadMatcher, RoadMatcherConfig};
use crate::mvt::ParsedTile;
use crate::officials::{OfficialsClient, OfficialsLookup, OfficialsMetricsSnapshot};
use crate::provider::{
    AsyncHttpClient, AsyncReqwestClient, HttpTileProvider, ProviderError, TileBytes,
};
use crate::rate_limit::{RateLimitConfig, RateLimiter};

/// Admission weight of one request.
const REQUEST_WEIGHT: u32 = 1;

/// Outcome of one maintenance sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    pub expired_tiles: usize,
    pub idle_clients: usize,
}

/// The assembled tile service.
pub struct RoadTileService<C = AsyncReqwestClient> {
    composite: Arc<TileComposite>,
    matcher: RoadMatcher,
    limiter: Arc<RateLimiter>,
    officials: Arc<OfficialsClient<C>>,
    cancellation: CancellationToken,
    maintenance: Mutex<Option<JoinHandle<()>>>,
}

impl RoadTileService<AsyncReqwestClient> {
    /// Build the production service from configuration.
    ///
    /// A configured Redis tier that cannot be reached is logged and skipped;
    /// the service then runs with the in-memory tier alone.
    pub async fn from_config(config: &ConfigFile) -> Result<Self, ProviderError> {
        let tile_client =
            AsyncReqwestClient::new(config.provider_timeout(), &config.provider.user_agent)?;
        let officials_config = config.officials_config();
        let officials_client =
            AsyncReqwestClient::new(officials_config.timeout, &config.provider.user_agent)?;

        let cache = build_cache(config).await;
        let mut composite = TileComposite::new(cache);
        composite.register(Arc::new(HttpTileProvider::new(
            tile_client,
            config.provider_config(),
        )));

        info!(
            providers = ?composite.provider_names(),
            cache_enabled = config.cache.enabled,
            rate_limit_enabled = config.rate_limit.enabled,
            "Road tile service configured"
        );

        Ok(Self::from_parts(
            Arc::new(composite),
            config.matcher_config(),
            config.rate_limit_config(),
            Arc::new(OfficialsClient::new(officials_client, officials_config)),
        ))
    }
}

#[cfg(feature = "redis")]
async fn build_cache(config: &ConfigFile) -> Arc<TileCache> {
    use crate::cache::RedisStore;
    use tracing::warn;

    let cache_config = config.cache_config();
    if let (true, Some(url)) = (cache_config.enabled, config.cache.redis_url.as_deref()) {
        match RedisStore::connect(url).await {
            Ok(store) => {
                info!("Redis cache tier connected");
                return Arc::new(TileCache::with_remote(cache_config, Arc::new(store)));
            }
            Err(e) => warn!(error = %e, "Redis unavailable, using in-memory cache only"),
        }
    }
    Arc::new(TileCache::new(cache_config))
}

#[cfg(not(feature = "redis"))]
async fn build_cache(config: &ConfigFile) -> Arc<TileCache> {
    if config.cache.redis_url.is_some() {
        info!("redis_url ignored: built without the redis feature");
    }
    Arc::new(TileCache::new(config.cache_config()))
}

impl<C: AsyncHttpClient + 'static> RoadTileService<C> {
    /// Assemble a service from prebuilt components.
    pub fn from_parts(
        composite: Arc<TileComposite>,
        matcher_config: RoadMatcherConfig,
        rate_limit: RateLimitConfig,
        officials: Arc<OfficialsClient<C>>,
    ) -> Self {
        Self {
            matcher: RoadMatcher::new(Arc::clone(&composite), matcher_config),
            composite,
            limiter: Arc::new(RateLimiter::new(rate_limit)),
            officials,
            cancellation: CancellationToken::new(),
            maintenance: Mutex::new(None),
        }
    }

    pub fn composite(&self) -> &Arc<TileComposite> {
        &self.composite
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    fn admit(&self, client_id: &str) -> Result<(), ServiceError> {
        self.limiter
            .allow(client_id, REQUEST_WEIGHT)
            .ensure_allowed()
            .map(|_| ())
            .inspect_err(|_| debug!(client_id, "Request rate limited"))
    }

    pub async fn fetch_tile(
        &self,
        client_id: &str,
        provider: &str,
        z: i64,
        x: i64,
        y: i64,
    ) -> Result<TileBytes, ServiceError> {
        self.admit(client_id)?;
        self.composite.fetch_tile(provider, z, x, y).await
    }

    pub fn parse_tile(
        &self,
        client_id: &str,
        provider: &str,
        buffer: &[u8],
        tile: Option<TileCoord>,
    ) -> Result<ParsedTile, ServiceError> {
        self.admit(client_id)?;
        self.composite.parse_tile(provider, buffer, tile)
    }

    pub async fn match_road(
        &self,
        client_id: &str,
        lat: f64,
        lng: f64,
    ) -> Result<Option<RoadMatchResult>, ServiceError> {
        self.admit(client_id)?;
        self.matcher.match_road(lat, lng).await
    }

    pub async fn officials(
        &self,
        client_id: &str,
        section_id: u64,
    ) -> Result<OfficialsLookup, ServiceError> {
        self.admit(client_id)?;
        self.officials.fetch_officials(section_id).await
    }

    /// Schedule a background re-fetch of one section's officials.
    ///
    /// Returns once the refresh is scheduled; its outcome shows up in
    /// [`officials_metrics`](Self::officials_metrics).
    pub fn refresh_officials(
        &self,
        client_id: &str,
        section_id: u64,
    ) -> Result<JoinHandle<()>, ServiceError> {
        self.admit(client_id)?;
        if section_id == 0 {
            return Err(ServiceError::InvalidInput(
                "section id must be positive".to_string(),
            ));
        }
        Ok(self.officials.spawn_refresh(section_id))
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.composite.cache_stats()
    }

    pub async fn provider_health(&self) -> BTreeMap<String, bool> {
        self.composite.health().await
    }

    pub fn officials_metrics(&self) -> OfficialsMetricsSnapshot {
        self.officials.metrics()
    }

    /// Drop expired tiles and idle rate-limit buckets.
    pub fn run_maintenance(&self) -> MaintenanceReport {
        let report = MaintenanceReport {
            expired_tiles: self.composite.cache().purge_expired(),
            idle_clients: self.limiter.purge_idle(),
        };
        debug!(
            expired_tiles = report.expired_tiles,
            idle_clients = report.idle_clients,
            "Maintenance sweep complete"
        );
        report
    }

    /// Start the periodic maintenance task. Replaces any running one.
    pub fn start_maintenance(&self, period: Duration) {
        let cache = Arc::clone(self.composite.cache());
        let limiter = Arc::clone(&self.limiter);
        let token = self.cancellation.child_token();
        let period = period.max(Duration::from_secs(1));

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let expired = cache.purge_expired();
                        let idle = limiter.purge_idle();
                        debug!(expired_tiles = expired, idle_clients = idle, "Maintenance sweep complete");
                    }
                }
            }
            debug!("Maintenance task stopped");
        });

        if let Some(previous) = self.maintenance.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Stop background work.
    pub async fn shutdown(&self) {
        self.cancellation.cancel();
        let handle = self.maintenance.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        info!("Road tile service stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheConfig;
    use crate::mvt::tests::road_tile;
    use crate::officials::OfficialsConfig;
    use crate::provider::{MockAsyncHttpClient, StaticTileProvider, KERALA_PWD_NAME};

    const CLIENT: &str = "198.51.100.4";

    fn service(max_requests: u32) -> (RoadTileService<MockAsyncHttpClient>, Arc<StaticTileProvider>) {
        let tile = TileCoord { z: 14, x: 11693, y: 7728 };
        let body = road_tile(
            "roads",
            &[(vec![("name", "MC Road")], vec![(0, 0), (4096, 4096)])],
        );
        let provider = Arc::new(StaticTileProvider::new(KERALA_PWD_NAME, 9, 15).with_tile(tile, body));

        let mut composite = TileComposite::new(Arc::new(TileCache::new(CacheConfig::default())));
        composite.register(provider.clone());

        let officials = OfficialsClient::new(
            MockAsyncHttpClient::new(vec![MockAsyncHttpClient::ok(br#"{"division":"Kollam"}"#)]),
            OfficialsConfig::default(),
        );

        let service = RoadTileService::from_parts(
            Arc::new(composite),
            RoadMatcherConfig::default(),
            RateLimitConfig {
                enabled: true,
                window: Duration::from_secs(60),
                max_requests,
            },
            Arc::new(officials),
        );
        (service, provider)
    }

    #[tokio::test]
    async fn test_fetch_through_facade() {
        let (service, provider) = service(10);
        let tile = service
            .fetch_tile(CLIENT, KERALA_PWD_NAME, 14, 11693, 7728)
            .await
            .unwrap();
        assert!(!tile.cached);
        assert_eq!(provider.fetch_count(), 1);
        assert_eq!(service.cache_stats().keys, 1);
    }

    #[tokio::test]
    async fn test_rate_limit_applies_across_operations() {
        let (service, provider) = service(2);

        service
            .fetch_tile(CLIENT, KERALA_PWD_NAME, 14, 11693, 7728)
            .await
            .unwrap();
        service.parse_tile(CLIENT, KERALA_PWD_NAME, &[1, 2], None).unwrap();

        let err = service.match_road(CLIENT, 8.5, 76.9).await.unwrap_err();
        assert!(matches!(err, ServiceError::RateLimited { .. }));
        assert!(matches!(
            service.officials(CLIENT, 1).await,
            Err(ServiceError::RateLimited { .. })
        ));
        assert_eq!(provider.fetch_count(), 1);

        // Other clients are unaffected.
        assert!(service.officials("192.0.2.1", 1).await.is_ok());
    }

    #[tokio::test]
    async fn test_diagnostics_not_rate_limited() {
        let (service, _) = service(1);
        service.parse_tile(CLIENT, KERALA_PWD_NAME, &[1], None).unwrap();

        for _ in 0..3 {
            let health = service.provider_health().await;
            assert_eq!(health.get(KERALA_PWD_NAME), Some(&true));
            let _ = service.cache_stats();
        }
    }

    #[tokio::test]
    async fn test_refresh_officials_runs_in_background() {
        let (service, _) = service(10);
        let handle = service.refresh_officials(CLIENT, 42).unwrap();
        handle.await.unwrap();

        let metrics = service.officials_metrics();
        assert_eq!(metrics.refreshes_started, 1);
        assert_eq!(metrics.refreshes_succeeded, 1);

        let lookup = service.officials(CLIENT, 42).await.unwrap();
        assert!(lookup.cached);
        assert!(matches!(
            service.refresh_officials(CLIENT, 0),
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_maintenance_lifecycle() {
        let (service, _) = service(10);
        service.start_maintenance(Duration::from_secs(600));
        service.start_maintenance(Duration::from_secs(600));

        assert_eq!(service.run_maintenance(), MaintenanceReport::default());
        service.shutdown().await;
        assert!(service.maintenance.lock().is_none());
    }
}
