//! INI serialization logic for converting `ConfigFile` → INI string.

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let redis_url = config.cache.redis_url.as_deref().unwrap_or("");

    format!(
        r#"[provider]
; Kerala PWD vector tile endpoint, without a trailing slash
base_url = {}
; Referer presented to the tile server
referer = {}
user_agent = {}
; Request timeout in milliseconds
timeout_ms = {}
; Total attempts per tile, including the first
retries = {}
min_zoom = {}
max_zoom = {}

[cache]
enabled = {}
; Entry lifetime in seconds
ttl_secs = {}
; In-memory tier capacity
max_entries = {}
; Seconds between expired-entry sweeps
check_period_secs = {}
; Optional shared store, e.g. redis://127.0.0.1:6379 (requires the redis feature)
redis_url = {}

[rate_limit]
enabled = {}
window_secs = {}
; Requests admitted per client per window
max_requests = {}

[officials]
; Officials registry API
api_base_url = {}
tenant_id = {}
; Value of the shared-public-key header
shared_key = {}
referer = {}
timeout_ms = {}
cache_ttl_secs = {}
retries = {}

[matcher]
; Zoom used for road matching, clamped to the provider's range
preferred_zoom = {}
; Distance in metres at which match confidence reaches zero
max_radius_m = {}

[logging]
; Default filter when RUST_LOG is unset
level = {}
directory = {}
file = {}
"#,
        config.provider.base_url,
        config.provider.referer,
        config.provider.user_agent,
        config.provider.timeout_ms,
        config.provider.retries,
        config.provider.min_zoom,
        config.provider.max_zoom,
        config.cache.enabled,
        config.cache.ttl_secs,
        config.cache.max_entries,
        config.cache.check_period_secs,
        redis_url,
        config.rate_limit.enabled,
        config.rate_limit.window_secs,
        config.rate_limit.max_requests,
        config.officials.api_base_url,
        config.officials.tenant_id,
        config.officials.shared_key,
        config.officials.referer,
        config.officials.timeout_ms,
        config.officials.cache_ttl_secs,
        config.officials.retries,
        config.matcher.preferred_zoom,
        config.matcher.max_radius_m,
        config.logging.level,
        config.logging.directory.display(),
        config.logging.file,
    )
}
