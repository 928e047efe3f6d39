//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file. The
//! `*_config()` accessors on [`ConfigFile`] turn them into the runtime
//! configuration types the components take.

use std::path::PathBuf;
use std::time::Duration;

use super::defaults::*;
use crate::cache::CacheConfig;
use crate::matcher::RoadMatcherConfig;
use crate::officials::OfficialsConfig;
use crate::provider::{HttpProviderConfig, RetryPolicy, KERALA_PWD_NAME};
use crate::rate_limit::RateLimitConfig;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub provider: ProviderSettings,
    pub cache: CacheSettings,
    pub rate_limit: RateLimitSettings,
    pub officials: OfficialsSettings,
    pub matcher: MatcherSettings,
    pub logging: LoggingSettings,
}

/// Kerala PWD tile endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    pub base_url: String,
    pub referer: String,
    pub user_agent: String,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Total attempts per tile, including the first.
    pub retries: u32,
    pub min_zoom: u8,
    pub max_zoom: u8,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PROVIDER_BASE_URL.to_string(),
            referer: DEFAULT_PROVIDER_REFERER.to_string(),
            user_agent: DEFAULT_PROVIDER_USER_AGENT.to_string(),
            timeout_ms: DEFAULT_PROVIDER_TIMEOUT_MS,
            retries: DEFAULT_PROVIDER_RETRIES,
            min_zoom: DEFAULT_PROVIDER_MIN_ZOOM,
            max_zoom: DEFAULT_PROVIDER_MAX_ZOOM,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    pub enabled: bool,
    pub ttl_secs: u64,
    pub max_entries: usize,
    /// Interval between expired-entry sweeps.
    pub check_period_secs: u64,
    /// Shared store; only honored when built with the `redis` feature.
    pub redis_url: Option<String>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: DEFAULT_CACHE_TTL_SECS,
            max_entries: DEFAULT_CACHE_MAX_ENTRIES,
            check_period_secs: DEFAULT_CACHE_CHECK_PERIOD_SECS,
            redis_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitSettings {
    pub enabled: bool,
    pub window_secs: u64,
    pub max_requests: u32,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            window_secs: DEFAULT_RATE_LIMIT_WINDOW_SECS,
            max_requests: DEFAULT_RATE_LIMIT_MAX_REQUESTS,
        }
    }
}

/// Officials registry API.
#[derive(Debug, Clone, PartialEq)]
pub struct OfficialsSettings {
    pub api_base_url: String,
    pub tenant_id: String,
    pub shared_key: String,
    pub referer: String,
    pub timeout_ms: u64,
    pub cache_ttl_secs: u64,
    pub retries: u32,
}

impl Default for OfficialsSettings {
    fn default() -> Self {
        let defaults = OfficialsConfig::default();
        Self {
            api_base_url: defaults.api_base_url,
            tenant_id: defaults.tenant_id,
            shared_key: defaults.shared_key,
            referer: defaults.referer,
            timeout_ms: defaults.timeout.as_millis() as u64,
            cache_ttl_secs: defaults.cache_ttl.as_secs(),
            retries: defaults.retries,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatcherSettings {
    pub preferred_zoom: u8,
    pub max_radius_m: f64,
}

impl Default for MatcherSettings {
    fn default() -> Self {
        let defaults = RoadMatcherConfig::default();
        Self {
            preferred_zoom: defaults.preferred_zoom,
            max_radius_m: defaults.max_radius_m,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    pub directory: PathBuf,
    pub file: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            directory: super::file::config_directory().join("logs"),
            file: DEFAULT_LOG_FILE.to_string(),
        }
    }
}

impl ConfigFile {
    pub fn provider_config(&self) -> HttpProviderConfig {
        let mut config = HttpProviderConfig::kerala_pwd()
            .with_base_url(self.provider.base_url.as_str())
            .with_referer(self.provider.referer.as_str())
            .with_retry(RetryPolicy::exponential(self.provider.retries.max(1)));
        config.min_zoom = self.provider.min_zoom;
        config.max_zoom = self.provider.max_zoom;
        config
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider.timeout_ms)
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            enabled: self.cache.enabled,
            ttl: Duration::from_secs(self.cache.ttl_secs),
            max_entries: self.cache.max_entries,
        }
    }

    pub fn check_period(&self) -> Duration {
        Duration::from_secs(self.cache.check_period_secs)
    }

    pub fn rate_limit_config(&self) -> RateLimitConfig {
        RateLimitConfig {
            enabled: self.rate_limit.enabled,
            window: Duration::from_secs(self.rate_limit.window_secs),
            max_requests: self.rate_limit.max_requests,
        }
    }

    pub fn officials_config(&self) -> OfficialsConfig {
        OfficialsConfig {
            api_base_url: self.officials.api_base_url.clone(),
            tenant_id: self.officials.tenant_id.clone(),
            shared_key: self.officials.shared_key.clone(),
            referer: self.officials.referer.clone(),
            timeout: Duration::from_millis(self.officials.timeout_ms),
            cache_ttl: Duration::from_secs(self.officials.cache_ttl_secs),
            retries: self.officials.retries,
            ..OfficialsConfig::default()
        }
    }

    pub fn matcher_config(&self) -> RoadMatcherConfig {
        RoadMatcherConfig {
            provider: KERALA_PWD_NAME.to_string(),
            preferred_zoom: self.matcher.preferred_zoom,
            max_radius_m: self.matcher.max_radius_m,
        }
    }
}
