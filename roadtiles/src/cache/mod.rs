//! Tile caching.
//!
//! [`TileCache`] fronts every upstream fetch. It holds a bounded local store
//! with TTL and least-recently-accessed eviction, and can be given a shared
//! remote tier (Redis, behind the `redis` feature) that is consulted first.

mod local;
mod stats;
mod tiered;
mod traits;

#[cfg(feature = "redis")]
mod redis;

pub use local::LocalTileStore;
pub use stats::CacheStats;
pub use tiered::{CacheConfig, TileCache, DEFAULT_MAX_ENTRIES, DEFAULT_TTL_SECS};
pub use traits::{BoxFuture, CacheError, CachedTile, RemoteStore, DEFAULT_CONTENT_TYPE};

#[cfg(feature = "redis")]
pub use self::redis::RedisStore;
