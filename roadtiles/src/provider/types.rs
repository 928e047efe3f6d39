//! Provider types and traits

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::cache::BoxFuture;
use crate::coord::TileCoord;

/// Raw tile payload returned by a fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct TileBytes {
    pub data: Bytes,
    pub content_type: String,
    /// True when served from the cache rather than the upstream.
    pub cached: bool,
    pub fetched_at: DateTime<Utc>,
}

impl TileBytes {
    /// A freshly fetched (uncached) payload stamped with the current time.
    pub fn fresh(data: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            content_type: content_type.into(),
            cached: false,
            fetched_at: Utc::now(),
        }
    }
}

/// Static description of a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderMetadata {
    pub name: String,
    pub min_zoom: u8,
    pub max_zoom: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribution: Option<String>,
}

/// Errors that can occur when talking to an upstream.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// HTTP 404: the upstream has no such resource. Never retried.
    #[error("Not found: {url}")]
    NotFound { url: String },

    /// Any other non-success HTTP status.
    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    /// Connection, timeout or body read failure.
    #[error("Request failed: {0}")]
    Transport(String),

    /// Response arrived but was unusable (empty or oversized body, bad JSON).
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Zoom outside the provider's declared range.
    #[error("Zoom level {zoom} not supported by provider (range {min}-{max})")]
    UnsupportedZoom { zoom: u8, min: u8, max: u8 },

    /// The HTTP client could not be constructed.
    #[error("Failed to create HTTP client: {0}")]
    ClientInit(String),
}

impl ProviderError {
    /// Whether another attempt at the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::HttpStatus { .. }
                | ProviderError::Transport(_)
                | ProviderError::InvalidResponse(_)
        )
    }
}

/// A named upstream source of vector tiles.
///
/// Dyn-compatible so providers can be registered by name as
/// `Arc<dyn TileProvider>` and new sources added without touching callers.
pub trait TileProvider: Send + Sync {
    /// Registry name (e.g. "kerala-pwd").
    fn name(&self) -> &str;

    fn metadata(&self) -> ProviderMetadata;

    /// Fetch one tile, retrying transient failures internally.
    fn fetch_tile(&self, tile: TileCoord) -> BoxFuture<'_, Result<TileBytes, ProviderError>>;

    /// Probe the upstream with a known tile. Never fails; reports `false` instead.
    fn is_healthy(&self) -> BoxFuture<'_, bool>;

    fn supports_zoom(&self, zoom: u8) -> bool {
        let meta = self.metadata();
        zoom >= meta.min_zoom && zoom <= meta.max_zoom
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider serving a fixed map of tiles; anything else is a 404.
    pub struct StaticTileProvider {
        pub name: String,
        pub min_zoom: u8,
        pub max_zoom: u8,
        pub tiles: HashMap<TileCoord, Result<Vec<u8>, ProviderError>>,
        pub healthy: bool,
        pub fetches: AtomicUsize,
    }

    impl StaticTileProvider {
        pub fn new(name: &str, min_zoom: u8, max_zoom: u8) -> Self {
            Self {
                name: name.to_string(),
                min_zoom,
                max_zoom,
                tiles: HashMap::new(),
                healthy: true,
                fetches: AtomicUsize::new(0),
            }
        }

        pub fn with_tile(mut self, tile: TileCoord, data: Vec<u8>) -> Self {
            self.tiles.insert(tile, Ok(data));
            self
        }

        pub fn with_failure(mut self, tile: TileCoord, error: ProviderError) -> Self {
            self.tiles.insert(tile, Err(error));
            self
        }

        pub fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    impl TileProvider for StaticTileProvider {
        fn name(&self) -> &str {
            &self.name
        }

        fn metadata(&self) -> ProviderMetadata {
            ProviderMetadata {
                name: self.name.clone(),
                min_zoom: self.min_zoom,
                max_zoom: self.max_zoom,
                attribution: None,
            }
        }

        fn fetch_tile(&self, tile: TileCoord) -> BoxFuture<'_, Result<TileBytes, ProviderError>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let result = match self.tiles.get(&tile) {
                Some(Ok(data)) => Ok(TileBytes::fresh(data.clone(), "application/x-protobuf")),
                Some(Err(e)) => Err(e.clone()),
                None => Err(ProviderError::NotFound {
                    url: format!("static://{}", tile),
                }),
            };
            Box::pin(async move { result })
        }

        fn is_healthy(&self) -> BoxFuture<'_, bool> {
            let healthy = self.healthy;
            Box::pin(async move { healthy })
        }
    }

    #[test]
    fn test_retryable_classification() {
        assert!(!ProviderError::NotFound { url: "u".into() }.is_retryable());
        assert!(ProviderError::HttpStatus {
            status: 503,
            url: "u".into()
        }
        .is_retryable());
        assert!(ProviderError::Transport("timeout".into()).is_retryable());
        assert!(ProviderError::InvalidResponse("empty body".into()).is_retryable());
        assert!(!ProviderError::UnsupportedZoom {
            zoom: 3,
            min: 9,
            max: 15
        }
        .is_retryable());
        assert!(!ProviderError::ClientInit("tls".into()).is_retryable());
    }

    #[test]
    fn test_supports_zoom_uses_metadata_range() {
        let provider = StaticTileProvider::new("static", 9, 15);
        assert!(!provider.supports_zoom(8));
        assert!(provider.supports_zoom(9));
        assert!(provider.supports_zoom(15));
        assert!(!provider.supports_zoom(16));
    }

    #[test]
    fn test_metadata_serializes_camel_case() {
        let meta = ProviderMetadata {
            name: "kerala-pwd".to_string(),
            min_zoom: 9,
            max_zoom: 15,
            attribution: Some("Kerala PWD / KSTP Network".to_string()),
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["minZoom"], 9);
        assert_eq!(json["maxZoom"], 15);
        assert_eq!(json["attribution"], "Kerala PWD / KSTP Network");
    }
}
