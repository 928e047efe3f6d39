//! Redis-backed remote cache tier.
//!
//! Each tile occupies two keys: the payload under `{key}` and its content
//! type under `{key}:ct`, written together with the same expiry.

use std::time::Duration;

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{info, trace};

use super::traits::{BoxFuture, CacheError, CachedTile, RemoteStore, DEFAULT_CONTENT_TYPE};

/// Remote store backed by a Redis server.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect to `url` (e.g. `redis://127.0.0.1:6379`).
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client =
            redis::Client::open(url).map_err(|e| CacheError::Unavailable(e.to_string()))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;
        info!(url, "Connected to Redis cache");
        Ok(Self { conn })
    }

    fn content_type_key(key: &str) -> String {
        format!("{}:ct", key)
    }
}

fn backend(e: redis::RedisError) -> CacheError {
    if e.is_io_error() || e.is_connection_dropped() || e.is_timeout() {
        CacheError::Unavailable(e.to_string())
    } else {
        CacheError::Backend(e.to_string())
    }
}

impl RemoteStore for RedisStore {
    fn name(&self) -> &str {
        "redis"
    }

    fn get(&self, key: &str) -> BoxFuture<'_, Result<Option<CachedTile>, CacheError>> {
        let data_key = key.to_string();
        let ct_key = Self::content_type_key(key);
        let mut conn = self.conn.clone();
        Box::pin(async move {
            let (data, content_type): (Option<Vec<u8>>, Option<String>) =
                conn.mget(vec![data_key.as_str(), ct_key.as_str()]).await.map_err(backend)?;
            trace!(key = data_key.as_str(), hit = data.is_some(), "Redis lookup");
            Ok(data.map(|bytes| {
                CachedTile::new(
                    bytes,
                    content_type.unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
                )
            }))
        })
    }

    fn set(
        &self,
        key: &str,
        value: CachedTile,
        ttl: Duration,
    ) -> BoxFuture<'_, Result<(), CacheError>> {
        let data_key = key.to_string();
        let ct_key = Self::content_type_key(key);
        let mut conn = self.conn.clone();
        // Redis rejects an expiry of zero seconds.
        let seconds = ttl.as_secs().max(1);
        Box::pin(async move {
            let () = redis::pipe()
                .atomic()
                .set_ex(&data_key, value.data.as_ref(), seconds)
                .ignore()
                .set_ex(&ct_key, value.content_type.as_str(), seconds)
                .ignore()
                .query_async(&mut conn)
                .await
                .map_err(backend)?;
            Ok(())
        })
    }
}
