//! Remote cache tier abstraction.
//!
//! The `RemoteStore` trait is the seam for an optional shared cache (for
//! example Redis) that sits in front of the local tile store. It is
//! dyn-compatible so the concrete store can be injected at construction time
//! as `Arc<dyn RemoteStore>`, and swapped for a fake in tests.
//!
//! Remote failures are never fatal: `TileCache` logs them and carries on with
//! the local tier.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Content type assumed when a stored tile has none recorded.
pub const DEFAULT_CONTENT_TYPE: &str = "application/x-protobuf";

/// A tile payload as stored in the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedTile {
    /// Raw tile bytes.
    pub data: Bytes,
    /// Content type reported by the upstream.
    pub content_type: String,
}

impl CachedTile {
    pub fn new(data: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            content_type: content_type.into(),
        }
    }
}

/// Errors that can occur in a cache tier.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The remote store could not be reached.
    #[error("Cache backend unavailable: {0}")]
    Unavailable(String),

    /// The remote store returned something unusable.
    #[error("Cache backend error: {0}")]
    Backend(String),
}

/// Shared key-value store used as the secondary cache tier.
pub trait RemoteStore: Send + Sync {
    /// Short name for logs (e.g. "redis").
    fn name(&self) -> &str;

    /// Retrieve a tile by key.
    ///
    /// - `Ok(Some(tile))` if the key exists
    /// - `Ok(None)` if the key is not found
    /// - `Err(_)` if the backend failed
    fn get(&self, key: &str) -> BoxFuture<'_, Result<Option<CachedTile>, CacheError>>;

    /// Store a tile with the given time-to-live.
    fn set(
        &self,
        key: &str,
        value: CachedTile,
        ttl: Duration,
    ) -> BoxFuture<'_, Result<(), CacheError>>;
}
