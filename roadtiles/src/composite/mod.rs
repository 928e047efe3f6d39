//! Provider registry fronted by the tile cache.
//!
//! [`TileComposite`] is the single entry point for tile bytes: it validates
//! the address, serves cache hits, delegates misses to the named provider
//! and stores what comes back. It also dispatches diagnostic parses and
//! aggregates provider health.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, CachedTile, TileCache};
use crate::coord::{CoordError, TileCoord};
use crate::error::ServiceError;
use crate::mvt::{self, ParsedTile};
use crate::provider::{ProviderMetadata, TileBytes, TileProvider};

/// Registry of named tile providers sharing one cache.
pub struct TileComposite {
    providers: HashMap<String, Arc<dyn TileProvider>>,
    cache: Arc<TileCache>,
}

impl TileComposite {
    /// Create an empty registry over `cache`.
    pub fn new(cache: Arc<TileCache>) -> Self {
        Self {
            providers: HashMap::new(),
            cache,
        }
    }

    /// Register a provider under its own name, replacing any previous one.
    pub fn register(&mut self, provider: Arc<dyn TileProvider>) -> Option<Arc<dyn TileProvider>> {
        let name = provider.name().to_string();
        info!(provider = name.as_str(), "Registered tile provider");
        self.providers.insert(name, provider)
    }

    /// Look up a provider by name.
    pub fn provider(&self, name: &str) -> Result<&Arc<dyn TileProvider>, ServiceError> {
        self.providers
            .get(name)
            .ok_or_else(|| ServiceError::UnknownProvider(name.to_string()))
    }

    /// Registered provider names in sorted order.
    pub fn provider_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn metadata(&self, provider: &str) -> Result<ProviderMetadata, ServiceError> {
        Ok(self.provider(provider)?.metadata())
    }

    pub fn cache(&self) -> &Arc<TileCache> {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Fetch a tile from raw, unvalidated coordinates.
    pub async fn fetch_tile(
        &self,
        provider: &str,
        z: i64,
        x: i64,
        y: i64,
    ) -> Result<TileBytes, ServiceError> {
        let tile = TileCoord::try_new(z, x, y)?;
        self.fetch_coord(provider, tile).await
    }

    /// Fetch a tile, serving from cache when possible.
    pub async fn fetch_coord(
        &self,
        provider_name: &str,
        tile: TileCoord,
    ) -> Result<TileBytes, ServiceError> {
        let provider = self.provider(provider_name)?;

        let meta = provider.metadata();
        if tile.z < meta.min_zoom || tile.z > meta.max_zoom {
            return Err(CoordError::UnsupportedZoom {
                zoom: tile.z,
                min: meta.min_zoom,
                max: meta.max_zoom,
            }
            .into());
        }

        let key = tile.cache_key(provider_name);
        if let Some(hit) = self.cache.get(&key).await {
            debug!(key = key.as_str(), "Serving tile from cache");
            return Ok(TileBytes {
                data: hit.data,
                content_type: hit.content_type,
                cached: true,
                fetched_at: Utc::now(),
            });
        }

        let fetched = provider.fetch_tile(tile).await?;
        self.cache
            .set(
                &key,
                CachedTile::new(fetched.data.clone(), fetched.content_type.clone()),
            )
            .await;

        Ok(TileBytes {
            cached: false,
            ..fetched
        })
    }

    /// Diagnostic decode of a tile buffer.
    ///
    /// Fails only for an unknown provider or an empty buffer; corrupt bytes
    /// produce an empty [`ParsedTile`].
    pub fn parse_tile(
        &self,
        provider: &str,
        buffer: &[u8],
        tile: Option<TileCoord>,
    ) -> Result<ParsedTile, ServiceError> {
        self.provider(provider)?;
        if buffer.is_empty() {
            return Err(ServiceError::InvalidInput("empty tile buffer".to_string()));
        }
        Ok(mvt::parse_vector_tile(buffer, tile))
    }

    /// Probe every provider concurrently.
    ///
    /// Each probe runs in its own task so a panicking provider is reported
    /// as unhealthy instead of taking the aggregate down.
    pub async fn health(&self) -> BTreeMap<String, bool> {
        let probes = self.providers.iter().map(|(name, provider)| {
            let name = name.clone();
            let provider = Arc::clone(provider);
            let handle = tokio::spawn(async move { provider.is_healthy().await });
            async move {
                let healthy = match handle.await {
                    Ok(healthy) => healthy,
                    Err(e) => {
                        warn!(provider = name.as_str(), error = %e, "Provider health check failed");
                        false
                    }
                };
                (name, healthy)
            }
        });

        join_all(probes).await.into_iter().collect()
    }
}
