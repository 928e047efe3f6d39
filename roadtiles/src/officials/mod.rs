//! Road officials registry client
//!
//! Looks up the engineers responsible for a PWD network section from the
//! registry's shared-data API. Normalized records are held in an in-memory
//! TTL cache keyed by `section:{id}`; misses go to the registry with the same
//! bounded exponential backoff the tile providers use.
//!
//! ```ignore
//! use roadtiles::officials::{OfficialsClient, OfficialsConfig};
//! use roadtiles::provider::AsyncReqwestClient;
//!
//! let client = OfficialsClient::new(AsyncReqwestClient::with_defaults()?, OfficialsConfig::default());
//! let lookup = client.fetch_officials(1234).await?;
//! println!("{}", lookup.data.officials.ee.mobile);
//! ```

mod types;

pub use types::{Official, Officials, OfficialsLookup, OfficialsRoster, TITLE_AE, TITLE_AEE, TITLE_EE};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::future::Cache;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::ServiceError;
use crate::provider::{AsyncHttpClient, ProviderError, RetryPolicy, DEFAULT_MAX_ATTEMPTS};
use types::RegistryResponse;

/// Registry API root.
pub const DEFAULT_API_BASE_URL: &str = "https://apipwdrmms.kerala.gov.in";

/// Tenant presented in the `TenantId` header.
pub const DEFAULT_TENANT_ID: &str = "kstp";

pub const DEFAULT_API_REFERER: &str = "https://pwdrmms.kerala.gov.in/";

/// Registry request timeout (10 seconds).
pub const DEFAULT_API_TIMEOUT_MS: u64 = 10_000;

/// Officials cache lifetime (24 hours).
pub const DEFAULT_OFFICIALS_TTL_SECS: u64 = 86_400;

pub const DEFAULT_OFFICIALS_MAX_ENTRIES: u64 = 10_000;

/// Registry client configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct OfficialsConfig {
    pub api_base_url: String,
    pub tenant_id: String,
    /// Value of the `shared-public-key` header. Empty when not provisioned.
    pub shared_key: String,
    pub referer: String,
    pub timeout: Duration,
    pub cache_ttl: Duration,
    pub max_entries: u64,
    pub retries: u32,
}

impl Default for OfficialsConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            tenant_id: DEFAULT_TENANT_ID.to_string(),
            shared_key: String::new(),
            referer: DEFAULT_API_REFERER.to_string(),
            timeout: Duration::from_millis(DEFAULT_API_TIMEOUT_MS),
            cache_ttl: Duration::from_secs(DEFAULT_OFFICIALS_TTL_SECS),
            max_entries: DEFAULT_OFFICIALS_MAX_ENTRIES,
            retries: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Parses a road identifier from tile properties into a section id.
///
/// Road ids arrive as strings ("1234", "1234.0"); only positive integers
/// name a network section.
pub fn parse_section_id(road_id: &str) -> Result<u64, ServiceError> {
    let trimmed = road_id.trim();
    let id = trimmed
        .parse::<u64>()
        .ok()
        .or_else(|| {
            trimmed
                .parse::<f64>()
                .ok()
                .filter(|v| v.fract() == 0.0 && *v >= 1.0 && *v <= u64::MAX as f64)
                .map(|v| v as u64)
        })
        .filter(|id| *id > 0);

    id.ok_or_else(|| ServiceError::InvalidInput(format!("not a section id: '{}'", road_id)))
}

#[derive(Debug, Clone)]
struct CachedOfficials {
    data: Officials,
    fetched_at: DateTime<Utc>,
}

/// Background refresh counters.
#[derive(Debug, Default)]
pub struct OfficialsMetrics {
    refreshes_started: AtomicU64,
    refreshes_succeeded: AtomicU64,
    refreshes_failed: AtomicU64,
}

/// Point-in-time copy of [`OfficialsMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfficialsMetricsSnapshot {
    pub refreshes_started: u64,
    pub refreshes_succeeded: u64,
    pub refreshes_failed: u64,
}

impl OfficialsMetrics {
    pub fn snapshot(&self) -> OfficialsMetricsSnapshot {
        OfficialsMetricsSnapshot {
            refreshes_started: self.refreshes_started.load(Ordering::Relaxed),
            refreshes_succeeded: self.refreshes_succeeded.load(Ordering::Relaxed),
            refreshes_failed: self.refreshes_failed.load(Ordering::Relaxed),
        }
    }
}

/// Cached client for the officials registry.
pub struct OfficialsClient<C> {
    http: C,
    config: OfficialsConfig,
    retry: RetryPolicy,
    cache: Cache<String, CachedOfficials>,
    metrics: OfficialsMetrics,
}

impl<C: AsyncHttpClient> OfficialsClient<C> {
    pub fn new(http: C, config: OfficialsConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_entries)
            .time_to_live(config.cache_ttl)
            .build();
        let retry = RetryPolicy::exponential(config.retries.max(1));
        Self {
            http,
            config,
            retry,
            cache,
            metrics: OfficialsMetrics::default(),
        }
    }

    pub fn config(&self) -> &OfficialsConfig {
        &self.config
    }

    pub fn metrics(&self) -> OfficialsMetricsSnapshot {
        self.metrics.snapshot()
    }

    fn cache_key(section_id: u64) -> String {
        format!("section:{}", section_id)
    }

    /// Registry URL for one section.
    pub fn section_url(&self, section_id: u64) -> String {
        format!(
            "{}/identity/api/v1/shared-data/network-sections/{}/defect-liability-period-details?unit=KM",
            self.config.api_base_url.trim_end_matches('/'),
            section_id
        )
    }

    fn headers(&self) -> Vec<(String, String)> {
        vec![
            ("TenantId".to_string(), self.config.tenant_id.clone()),
            ("shared-public-key".to_string(), self.config.shared_key.clone()),
            ("Referer".to_string(), self.config.referer.clone()),
            ("Accept".to_string(), "application/json".to_string()),
        ]
    }

    /// Officials for `section_id`, from cache when fresh.
    pub async fn fetch_officials(&self, section_id: u64) -> Result<OfficialsLookup, ServiceError> {
        if section_id == 0 {
            return Err(ServiceError::InvalidInput("section id must be positive".to_string()));
        }

        let key = Self::cache_key(section_id);
        if let Some(hit) = self.cache.get(&key).await {
            debug!(section_id, "Officials served from cache");
            return Ok(OfficialsLookup {
                data: hit.data,
                cached: true,
                fetched_at: hit.fetched_at,
            });
        }

        self.fetch_and_store(section_id).await
    }

    /// Fetches upstream, bypassing the cache, and stores the record on success.
    ///
    /// A failed fetch leaves any cached record in place.
    async fn fetch_and_store(&self, section_id: u64) -> Result<OfficialsLookup, ServiceError> {
        let data = self.fetch_with_retry(section_id).await?;
        let entry = CachedOfficials {
            data,
            fetched_at: Utc::now(),
        };
        self.cache
            .insert(Self::cache_key(section_id), entry.clone())
            .await;

        Ok(OfficialsLookup {
            data: entry.data,
            cached: false,
            fetched_at: entry.fetched_at,
        })
    }

    async fn fetch_once(&self, url: &str) -> Result<Officials, ProviderError> {
        let response = self.http.get(url, &self.headers()).await?;
        match response.status {
            404 => Err(ProviderError::NotFound {
                url: url.to_string(),
            }),
            status if !response.is_success() => Err(ProviderError::HttpStatus {
                status,
                url: url.to_string(),
            }),
            _ => serde_json::from_slice::<RegistryResponse>(&response.body)
                .map(RegistryResponse::normalize)
                .map_err(|e| ProviderError::InvalidResponse(format!("officials payload: {}", e))),
        }
    }

    async fn fetch_with_retry(&self, section_id: u64) -> Result<Officials, ProviderError> {
        let url = self.section_url(section_id);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let err = match self.fetch_once(&url).await {
                Ok(officials) => {
                    debug!(section_id, attempt, "Officials fetched");
                    return Ok(officials);
                }
                Err(e) => e,
            };

            if !err.is_retryable() {
                return Err(err);
            }

            match self.retry.delay_for_attempt(attempt) {
                Some(delay) => {
                    warn!(
                        section_id,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Officials fetch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                None => {
                    error!(section_id, attempts = attempt, error = %err, "Officials fetch failed");
                    return Err(err);
                }
            }
        }
    }
}

impl<C: AsyncHttpClient + 'static> OfficialsClient<C> {
    /// Re-fetches `section_id` in a detached task, replacing the cached record
    /// only when the fetch succeeds.
    ///
    /// The caller is never blocked or failed; outcomes land in the metrics
    /// and the log.
    pub fn spawn_refresh(self: &Arc<Self>, section_id: u64) -> JoinHandle<()> {
        let client = Arc::clone(self);
        client.metrics.refreshes_started.fetch_add(1, Ordering::Relaxed);

        tokio::spawn(async move {
            match client.fetch_and_store(section_id).await {
                Ok(_) => {
                    client.metrics.refreshes_succeeded.fetch_add(1, Ordering::Relaxed);
                    info!(section_id, "Officials refreshed");
                }
                Err(e) => {
                    client.metrics.refreshes_failed.fetch_add(1, Ordering::Relaxed);
                    warn!(section_id, error = %e, "Officials refresh failed");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockAsyncHttpClient;

    const BODY: &[u8] = br#"{"division":"Roads Division Kollam","mobileEE":"9446000001","emailAE":"ae@example.org","measuredLength":4.2}"#;

    fn client(script: Vec<Result<crate::provider::HttpResponse, ProviderError>>) -> OfficialsClient<MockAsyncHttpClient> {
        OfficialsClient::new(MockAsyncHttpClient::new(script), OfficialsConfig::default())
    }

    #[tokio::test]
    async fn test_request_shape() {
        let client = client(vec![MockAsyncHttpClient::ok(BODY)]);
        let lookup = client.fetch_officials(1234).await.unwrap();
        assert!(!lookup.cached);
        assert_eq!(lookup.data.division.as_deref(), Some("Roads Division Kollam"));

        let requests = client.http.requests.lock();
        let (url, headers) = &requests[0];
        assert_eq!(
            url,
            "https://apipwdrmms.kerala.gov.in/identity/api/v1/shared-data/network-sections/1234/defect-liability-period-details?unit=KM"
        );
        assert!(headers.contains(&("TenantId".to_string(), "kstp".to_string())));
        assert!(headers.iter().any(|(k, _)| k == "shared-public-key"));
        assert!(headers.contains(&("Referer".to_string(), DEFAULT_API_REFERER.to_string())));
    }

    #[tokio::test]
    async fn test_second_lookup_is_cached() {
        let client = client(vec![MockAsyncHttpClient::ok(BODY)]);
        let first = client.fetch_officials(7).await.unwrap();
        let second = client.fetch_officials(7).await.unwrap();

        assert!(second.cached);
        assert_eq!(second.data, first.data);
        assert_eq!(second.fetched_at, first.fetched_at);
        assert_eq!(client.http.request_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_is_terminal() {
        let client = client(vec![MockAsyncHttpClient::status(404)]);
        let err = client.fetch_officials(9).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert_eq!(client.http.request_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_retried() {
        let client = client(vec![
            MockAsyncHttpClient::status(503),
            MockAsyncHttpClient::status(502),
            MockAsyncHttpClient::ok(BODY),
        ]);
        let start = tokio::time::Instant::now();
        let lookup = client.fetch_officials(11).await.unwrap();

        assert_eq!(lookup.data.officials.ee.mobile, "9446000001");
        assert_eq!(client.http.request_count(), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_json_exhausts_retries() {
        let client = client(vec![MockAsyncHttpClient::ok(b"<html>maintenance</html>")]);
        let err = client.fetch_officials(11).await.unwrap_err();
        assert!(matches!(err, ServiceError::UpstreamUnavailable(msg) if msg.contains("officials payload")));
        assert_eq!(client.http.request_count(), 3);
    }

    #[tokio::test]
    async fn test_zero_section_rejected() {
        let client = client(vec![MockAsyncHttpClient::ok(BODY)]);
        assert!(matches!(
            client.fetch_officials(0).await,
            Err(ServiceError::InvalidInput(_))
        ));
        assert_eq!(client.http.request_count(), 0);
    }

    #[tokio::test]
    async fn test_refresh_replaces_cached_record() {
        let updated = br#"{"division":"Roads Division Kottarakkara"}"#;
        let client = Arc::new(client(vec![
            MockAsyncHttpClient::ok(BODY),
            MockAsyncHttpClient::ok(updated),
        ]));
        client.fetch_officials(5).await.unwrap();

        client.spawn_refresh(5).await.unwrap();

        let lookup = client.fetch_officials(5).await.unwrap();
        assert!(lookup.cached);
        assert_eq!(lookup.data.division.as_deref(), Some("Roads Division Kottarakkara"));
        assert_eq!(
            client.metrics(),
            OfficialsMetricsSnapshot {
                refreshes_started: 1,
                refreshes_succeeded: 1,
                refreshes_failed: 0,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_failure_is_counted() {
        let client = Arc::new(client(vec![MockAsyncHttpClient::status(500)]));
        client.spawn_refresh(3).await.unwrap();

        let metrics = client.metrics();
        assert_eq!(metrics.refreshes_started, 1);
        assert_eq!(metrics.refreshes_failed, 1);
        assert_eq!(client.http.request_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_keeps_cached_record() {
        let client = Arc::new(client(vec![
            MockAsyncHttpClient::ok(BODY),
            MockAsyncHttpClient::status(503),
        ]));
        let first = client.fetch_officials(5).await.unwrap();

        client.spawn_refresh(5).await.unwrap();
        assert_eq!(client.http.request_count(), 4);

        let lookup = client.fetch_officials(5).await.unwrap();
        assert!(lookup.cached);
        assert_eq!(lookup.data, first.data);
        assert_eq!(lookup.fetched_at, first.fetched_at);
        assert_eq!(client.http.request_count(), 4);
        assert_eq!(client.metrics().refreshes_failed, 1);
    }

    #[test]
    fn test_parse_section_id() {
        assert_eq!(parse_section_id("1234").unwrap(), 1234);
        assert_eq!(parse_section_id(" 88.0 ").unwrap(), 88);
        assert!(parse_section_id("0").is_err());
        assert!(parse_section_id("12.5").is_err());
        assert!(parse_section_id("NH-66").is_err());
        assert!(parse_section_id("").is_err());
    }
}
