//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use ini::{Ini, Properties};
use std::path::PathBuf;
use std::str::FromStr;

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::coord::MAX_ZOOM;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [provider] section
    if let Some(section) = ini.section(Some("provider")) {
        if let Some(v) = non_empty(section, "base_url") {
            config.provider.base_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = non_empty(section, "referer") {
            config.provider.referer = v.to_string();
        }
        if let Some(v) = non_empty(section, "user_agent") {
            config.provider.user_agent = v.to_string();
        }
        if let Some(v) = section.get("timeout_ms") {
            config.provider.timeout_ms =
                parse_number(v, "provider", "timeout_ms", "expected milliseconds")?;
        }
        if let Some(v) = section.get("retries") {
            config.provider.retries = parse_attempts(v, "provider")?;
        }
        if let Some(v) = section.get("min_zoom") {
            config.provider.min_zoom = parse_zoom(v, "provider", "min_zoom")?;
        }
        if let Some(v) = section.get("max_zoom") {
            config.provider.max_zoom = parse_zoom(v, "provider", "max_zoom")?;
        }
        if config.provider.min_zoom > config.provider.max_zoom {
            return Err(ConfigFileError::InvalidValue {
                section: "provider".to_string(),
                key: "min_zoom".to_string(),
                value: config.provider.min_zoom.to_string(),
                reason: format!("must not exceed max_zoom ({})", config.provider.max_zoom),
            });
        }
    }

    // [cache] section
    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = section.get("enabled") {
            config.cache.enabled = parse_bool(v, "cache", "enabled")?;
        }
        if let Some(v) = section.get("ttl_secs") {
            config.cache.ttl_secs = parse_number(v, "cache", "ttl_secs", "expected seconds")?;
        }
        if let Some(v) = section.get("max_entries") {
            config.cache.max_entries =
                parse_number(v, "cache", "max_entries", "expected an entry count")?;
        }
        if let Some(v) = section.get("check_period_secs") {
            config.cache.check_period_secs =
                parse_number(v, "cache", "check_period_secs", "expected seconds")?;
        }
        if let Some(v) = section.get("redis_url") {
            let v = v.trim();
            config.cache.redis_url = (!v.is_empty()).then(|| v.to_string());
        }
    }

    // [rate_limit] section
    if let Some(section) = ini.section(Some("rate_limit")) {
        if let Some(v) = section.get("enabled") {
            config.rate_limit.enabled = parse_bool(v, "rate_limit", "enabled")?;
        }
        if let Some(v) = section.get("window_secs") {
            config.rate_limit.window_secs =
                parse_number(v, "rate_limit", "window_secs", "expected seconds")?;
        }
        if let Some(v) = section.get("max_requests") {
            config.rate_limit.max_requests =
                parse_number(v, "rate_limit", "max_requests", "expected a request count")?;
        }
    }

    // [officials] section
    if let Some(section) = ini.section(Some("officials")) {
        if let Some(v) = non_empty(section, "api_base_url") {
            config.officials.api_base_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = non_empty(section, "tenant_id") {
            config.officials.tenant_id = v.to_string();
        }
        if let Some(v) = section.get("shared_key") {
            config.officials.shared_key = v.trim().to_string();
        }
        if let Some(v) = non_empty(section, "referer") {
            config.officials.referer = v.to_string();
        }
        if let Some(v) = section.get("timeout_ms") {
            config.officials.timeout_ms =
                parse_number(v, "officials", "timeout_ms", "expected milliseconds")?;
        }
        if let Some(v) = section.get("cache_ttl_secs") {
            config.officials.cache_ttl_secs =
                parse_number(v, "officials", "cache_ttl_secs", "expected seconds")?;
        }
        if let Some(v) = section.get("retries") {
            config.officials.retries = parse_attempts(v, "officials")?;
        }
    }

    // [matcher] section
    if let Some(section) = ini.section(Some("matcher")) {
        if let Some(v) = section.get("preferred_zoom") {
            config.matcher.preferred_zoom = parse_zoom(v, "matcher", "preferred_zoom")?;
        }
        if let Some(v) = section.get("max_radius_m") {
            let radius: f64 = parse_number(v, "matcher", "max_radius_m", "expected metres")?;
            if !(radius.is_finite() && radius > 0.0) {
                return Err(invalid("matcher", "max_radius_m", v, "must be a positive distance"));
            }
            config.matcher.max_radius_m = radius;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = non_empty(section, "level") {
            config.logging.level = v.to_string();
        }
        if let Some(v) = non_empty(section, "directory") {
            config.logging.directory = expand_tilde(v);
        }
        if let Some(v) = non_empty(section, "file") {
            config.logging.file = v.to_string();
        }
    }

    Ok(config)
}

fn non_empty<'a>(section: &'a Properties, key: &str) -> Option<&'a str> {
    section.get(key).map(str::trim).filter(|v| !v.is_empty())
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_number<T: FromStr>(
    value: &str,
    section: &str,
    key: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, reason))
}

pub(super) fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn parse_bool(value: &str, section: &str, key: &str) -> Result<bool, ConfigFileError> {
    parse_flag(value).ok_or_else(|| invalid(section, key, value, "must be true or false"))
}

fn parse_zoom(value: &str, section: &str, key: &str) -> Result<u8, ConfigFileError> {
    let zoom: u8 = parse_number(value, section, key, "expected a zoom level")?;
    if zoom > MAX_ZOOM {
        return Err(invalid(section, key, value, "zoom must be between 0 and 20"));
    }
    Ok(zoom)
}

fn parse_attempts(value: &str, section: &str) -> Result<u32, ConfigFileError> {
    let attempts: u32 = parse_number(value, section, "retries", "expected an attempt count")?;
    if attempts == 0 {
        return Err(invalid(section, "retries", value, "must be at least 1"));
    }
    Ok(attempts)
}

fn expand_tilde(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(rest),
        None => PathBuf::from(path),
    }
}
