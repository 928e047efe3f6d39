//! Per-client sliding-window admission control.
//!
//! Each client identifier (typically a source IP) owns a bucket of admission
//! timestamps. A request is admitted when the number of timestamps still
//! inside the trailing window plus its weight does not exceed the limit.
//!
//! Buckets live in a sharded concurrent map and each bucket has its own lock,
//! so requests from different clients never contend with one another.
//!
//! # Example
//!
//! ```
//! use roadtiles::rate_limit::{RateLimitConfig, RateLimiter};
//!
//! let limiter = RateLimiter::new(RateLimitConfig::default());
//! let decision = limiter.allow("203.0.113.7", 1);
//! assert!(decision.allowed);
//! ```

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

use crate::error::ServiceError;

/// Default trailing window (15 minutes).
pub const DEFAULT_WINDOW_SECS: u64 = 15 * 60;

/// Default number of requests admitted per window.
pub const DEFAULT_MAX_REQUESTS: u32 = 1000;

/// Rate limiter configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitConfig {
    /// When false every request is admitted.
    pub enabled: bool,
    /// Length of the trailing window.
    pub window: Duration,
    /// Maximum total weight admitted per window.
    pub max_requests: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window: Duration::from_secs(DEFAULT_WINDOW_SECS),
            max_requests: DEFAULT_MAX_REQUESTS,
        }
    }
}

/// Outcome of one admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Weight still available in the current window.
    pub remaining: u32,
    /// Epoch milliseconds at which the oldest counted request leaves the window.
    pub reset_time_ms: i64,
    pub limit: u32,
}

impl RateLimitDecision {
    /// Time until the window frees up, suitable for a `Retry-After` header.
    pub fn retry_after(&self, now_ms: i64) -> Duration {
        Duration::from_millis(self.reset_time_ms.saturating_sub(now_ms).max(0) as u64)
    }

    /// Converts a rejection into [`ServiceError::RateLimited`].
    pub fn ensure_allowed(self) -> Result<Self, ServiceError> {
        if self.allowed {
            return Ok(self);
        }
        let retry_after = self.retry_after(now_millis());
        Err(ServiceError::RateLimited {
            retry_after_ms: retry_after.as_millis() as u64,
            reset_time_ms: self.reset_time_ms,
        })
    }
}

type Bucket = Arc<Mutex<VecDeque<i64>>>;

/// Sliding-window rate limiter keyed by client identifier.
pub struct RateLimiter {
    config: RateLimitConfig,
    buckets: DashMap<String, Bucket>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: DashMap::new(),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Checks and records a request of the given weight for `client_id`.
    pub fn allow(&self, client_id: &str, weight: u32) -> RateLimitDecision {
        self.allow_at(client_id, weight, now_millis())
    }

    /// Same as [`allow`](Self::allow) with an explicit clock reading.
    pub fn allow_at(&self, client_id: &str, weight: u32, now_ms: i64) -> RateLimitDecision {
        let limit = self.config.max_requests;
        let window_ms = self.config.window.as_millis() as i64;

        if !self.config.enabled {
            return RateLimitDecision {
                allowed: true,
                remaining: limit,
                reset_time_ms: now_ms + window_ms,
                limit,
            };
        }

        // Clone the bucket handle out so the map shard is not held while we
        // work on the bucket itself.
        let bucket = self
            .buckets
            .entry(client_id.to_string())
            .or_default()
            .value()
            .clone();
        let mut timestamps = bucket.lock();

        while let Some(&oldest) = timestamps.front() {
            if now_ms - oldest < window_ms {
                break;
            }
            timestamps.pop_front();
        }

        let count = timestamps.len() as u64;
        let reset_time_ms = timestamps
            .front()
            .map(|oldest| oldest + window_ms)
            .unwrap_or(now_ms + window_ms);

        if count + weight as u64 > limit as u64 {
            debug!(
                client = client_id,
                count,
                weight,
                limit,
                "Rate limit exceeded"
            );
            return RateLimitDecision {
                allowed: false,
                remaining: (limit as u64).saturating_sub(count) as u32,
                reset_time_ms,
                limit,
            };
        }

        for _ in 0..weight {
            timestamps.push_back(now_ms);
        }
        let remaining = (limit as usize).saturating_sub(timestamps.len()) as u32;
        let reset_time_ms = timestamps
            .front()
            .map(|oldest| oldest + window_ms)
            .unwrap_or(now_ms + window_ms);

        RateLimitDecision {
            allowed: true,
            remaining,
            reset_time_ms,
            limit,
        }
    }

    /// Number of client buckets currently tracked.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Drops buckets whose every timestamp has left the window.
    ///
    /// A bucket whose handle is held by an in-flight [`allow_at`](Self::allow_at)
    /// is kept, so its admission is never recorded into a detached deque.
    /// Returns the number of buckets removed.
    pub fn purge_idle_at(&self, now_ms: i64) -> usize {
        let window_ms = self.config.window.as_millis() as i64;
        let before = self.buckets.len();
        self.buckets.retain(|_, bucket| {
            if Arc::strong_count(bucket) > 1 {
                return true;
            }
            let timestamps = bucket.lock();
            timestamps
                .back()
                .is_some_and(|newest| now_ms - newest < window_ms)
        });
        before.saturating_sub(self.buckets.len())
    }

    /// Drops idle buckets using the current wall clock.
    pub fn purge_idle(&self) -> usize {
        self.purge_idle_at(now_millis())
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
