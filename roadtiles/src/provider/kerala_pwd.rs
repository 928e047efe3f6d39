//! HTTP vector tile provider and the Kerala PWD road network source.
//!
//! Tiles are requested as `GET {base_url}/{z}/{x}/{y}.mvt`. A 200 with a
//! non-empty body is success, a 404 ends the request immediately, and every
//! other outcome is retried under the provider's [`RetryPolicy`].

use std::time::Instant;

use tracing::{debug, error, warn};

use super::http::{AsyncHttpClient, HttpResponse};
use super::retry::RetryPolicy;
use super::types::{ProviderError, ProviderMetadata, TileBytes, TileProvider};
use crate::cache::{BoxFuture, DEFAULT_CONTENT_TYPE};
use crate::coord::TileCoord;

/// Registry name of the Kerala PWD provider.
pub const KERALA_PWD_NAME: &str = "kerala-pwd";

/// Kerala PWD KSTP network section tile endpoint.
pub const KERALA_PWD_BASE_URL: &str =
    "https://pwdrmms.kerala.gov.in/citizen/kstp-network-sections";

/// Referer the tile endpoint expects.
pub const KERALA_PWD_REFERER: &str = "https://pwdrmms.kerala.gov.in/citizen/portal/";

pub const KERALA_PWD_MIN_ZOOM: u8 = 9;
pub const KERALA_PWD_MAX_ZOOM: u8 = 15;
pub const KERALA_PWD_ATTRIBUTION: &str = "Kerala PWD / KSTP Network";

/// Column and row of the tile probed by health checks.
const HEALTH_PROBE_X: u32 = 364;
const HEALTH_PROBE_Y: u32 = 239;

/// Configuration for an [`HttpTileProvider`].
#[derive(Debug, Clone, PartialEq)]
pub struct HttpProviderConfig {
    pub name: String,
    /// URL prefix without a trailing slash.
    pub base_url: String,
    /// Extra request headers sent with every fetch.
    pub headers: Vec<(String, String)>,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub attribution: Option<String>,
    pub retry: RetryPolicy,
}

impl HttpProviderConfig {
    /// Kerala PWD defaults.
    pub fn kerala_pwd() -> Self {
        Self {
            name: KERALA_PWD_NAME.to_string(),
            base_url: KERALA_PWD_BASE_URL.to_string(),
            headers: vec![
                ("Referer".to_string(), KERALA_PWD_REFERER.to_string()),
                ("Accept".to_string(), DEFAULT_CONTENT_TYPE.to_string()),
            ],
            min_zoom: KERALA_PWD_MIN_ZOOM,
            max_zoom: KERALA_PWD_MAX_ZOOM,
            attribution: Some(KERALA_PWD_ATTRIBUTION.to_string()),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Replaces the `Referer` header.
    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        let referer = referer.into();
        self.headers.retain(|(name, _)| !name.eq_ignore_ascii_case("referer"));
        self.headers.push(("Referer".to_string(), referer));
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Tile provider speaking plain HTTP.
pub struct HttpTileProvider<C: AsyncHttpClient> {
    config: HttpProviderConfig,
    client: C,
}

impl<C: AsyncHttpClient> HttpTileProvider<C> {
    pub fn new(client: C, config: HttpProviderConfig) -> Self {
        Self { config, client }
    }

    /// The Kerala PWD road network source.
    pub fn kerala_pwd(client: C) -> Self {
        Self::new(client, HttpProviderConfig::kerala_pwd())
    }

    pub fn config(&self) -> &HttpProviderConfig {
        &self.config
    }

    /// Full URL for a tile.
    pub fn tile_url(&self, tile: &TileCoord) -> String {
        format!(
            "{}/{}/{}/{}.mvt",
            self.config.base_url, tile.z, tile.x, tile.y
        )
    }

    fn classify(url: &str, response: HttpResponse) -> Result<TileBytes, ProviderError> {
        match response.status {
            200 if !response.body.is_empty() => Ok(TileBytes::fresh(
                response.body,
                response
                    .content_type
                    .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            )),
            200 => Err(ProviderError::InvalidResponse(format!(
                "empty body from {}",
                url
            ))),
            404 => Err(ProviderError::NotFound {
                url: url.to_string(),
            }),
            status => Err(ProviderError::HttpStatus {
                status,
                url: url.to_string(),
            }),
        }
    }

    async fn fetch_once(&self, url: &str) -> Result<TileBytes, ProviderError> {
        let response = self.client.get(url, &self.config.headers).await?;
        Self::classify(url, response)
    }

    async fn fetch_with_retry(&self, tile: TileCoord) -> Result<TileBytes, ProviderError> {
        if !self.supports_zoom(tile.z) {
            return Err(ProviderError::UnsupportedZoom {
                zoom: tile.z,
                min: self.config.min_zoom,
                max: self.config.max_zoom,
            });
        }

        let url = self.tile_url(&tile);
        let start = Instant::now();
        let mut attempt = 0;

        loop {
            attempt += 1;
            let err = match self.fetch_once(&url).await {
                Ok(bytes) => {
                    debug!(
                        provider = self.config.name.as_str(),
                        tile = %tile,
                        attempt,
                        bytes = bytes.data.len(),
                        "Tile fetched"
                    );
                    return Ok(bytes);
                }
                Err(e) => e,
            };

            if !err.is_retryable() {
                debug!(provider = self.config.name.as_str(), tile = %tile, error = %err, "Tile fetch not retryable");
                return Err(err);
            }

            match self.config.retry.delay_for_attempt(attempt) {
                Some(delay) => {
                    warn!(
                        provider = self.config.name.as_str(),
                        tile = %tile,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Tile fetch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                None => {
                    error!(
                        provider = self.config.name.as_str(),
                        tile = %tile,
                        attempts = attempt,
                        duration_ms = start.elapsed().as_millis() as u64,
                        error = %err,
                        "Tile fetch failed"
                    );
                    return Err(err);
                }
            }
        }
    }

    async fn probe(&self) -> bool {
        let probe = TileCoord {
            z: self.config.min_zoom.max(9),
            x: HEALTH_PROBE_X,
            y: HEALTH_PROBE_Y,
        };
        let url = self.tile_url(&probe);
        match self.fetch_once(&url).await {
            Ok(_) => true,
            Err(e) => {
                debug!(provider = self.config.name.as_str(), error = %e, "Health probe failed");
                false
            }
        }
    }
}

impl<C: AsyncHttpClient> TileProvider for HttpTileProvider<C> {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            name: self.config.name.clone(),
            min_zoom: self.config.min_zoom,
            max_zoom: self.config.max_zoom,
            attribution: self.config.attribution.clone(),
        }
    }

    fn fetch_tile(&self, tile: TileCoord) -> BoxFuture<'_, Result<TileBytes, ProviderError>> {
        Box::pin(self.fetch_with_retry(tile))
    }

    fn is_healthy(&self) -> BoxFuture<'_, bool> {
        Box::pin(self.probe())
    }
}
