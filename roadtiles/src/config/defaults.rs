//! Default values for every config key.

use crate::cache::{DEFAULT_MAX_ENTRIES, DEFAULT_TTL_SECS};
use crate::provider::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_TIMEOUT_MS, DEFAULT_USER_AGENT, KERALA_PWD_BASE_URL,
    KERALA_PWD_MAX_ZOOM, KERALA_PWD_MIN_ZOOM, KERALA_PWD_REFERER,
};
use crate::rate_limit::{DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW_SECS};

pub const DEFAULT_PROVIDER_BASE_URL: &str = KERALA_PWD_BASE_URL;
pub const DEFAULT_PROVIDER_REFERER: &str = KERALA_PWD_REFERER;
pub const DEFAULT_PROVIDER_USER_AGENT: &str = DEFAULT_USER_AGENT;
pub const DEFAULT_PROVIDER_TIMEOUT_MS: u64 = DEFAULT_TIMEOUT_MS;
pub const DEFAULT_PROVIDER_RETRIES: u32 = DEFAULT_MAX_ATTEMPTS;
pub const DEFAULT_PROVIDER_MIN_ZOOM: u8 = KERALA_PWD_MIN_ZOOM;
pub const DEFAULT_PROVIDER_MAX_ZOOM: u8 = KERALA_PWD_MAX_ZOOM;

pub const DEFAULT_CACHE_TTL_SECS: u64 = DEFAULT_TTL_SECS;
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = DEFAULT_MAX_ENTRIES;

/// Expired-entry sweep interval (10 minutes).
pub const DEFAULT_CACHE_CHECK_PERIOD_SECS: u64 = 600;

pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = DEFAULT_WINDOW_SECS;
pub const DEFAULT_RATE_LIMIT_MAX_REQUESTS: u32 = DEFAULT_MAX_REQUESTS;

pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_FILE: &str = "roadtiles.log";
