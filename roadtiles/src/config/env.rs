//! Environment variable overrides.
//!
//! Deployments configure the service through the environment; any variable
//! that is set wins over the file. Unset or empty variables are ignored.

use std::str::FromStr;

use super::file::ConfigFileError;
use super::parser::parse_flag;
use super::settings::ConfigFile;

pub const ENV_BASE_URL: &str = "KERALA_PWD_BASE_URL";
pub const ENV_TIMEOUT: &str = "KERALA_PWD_TIMEOUT";
pub const ENV_RETRIES: &str = "KERALA_PWD_RETRIES";
pub const ENV_CACHE_ENABLED: &str = "TILE_CACHE_ENABLED";
pub const ENV_CACHE_TTL: &str = "TILE_CACHE_TTL";
pub const ENV_RATE_LIMIT_ENABLED: &str = "RATE_LIMIT_ENABLED";
pub const ENV_REDIS_URL: &str = "REDIS_URL";
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
pub const ENV_API_BASE_URL: &str = "KERALA_PWD_API_BASE_URL";
pub const ENV_TENANT_ID: &str = "KERALA_PWD_TENANT_ID";
pub const ENV_SHARED_KEY: &str = "KERALA_PWD_SHARED_KEY";
pub const ENV_API_REFERER: &str = "KERALA_PWD_REFERER";
pub const ENV_API_TIMEOUT: &str = "KERALA_PWD_API_TIMEOUT";
pub const ENV_OFFICIALS_CACHE_TTL: &str = "KERALA_PWD_CACHE_TTL";

impl ConfigFile {
    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigFileError> {
        self.apply_overrides_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable source.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigFileError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(v) = get(ENV_BASE_URL) {
            self.provider.base_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = get(ENV_TIMEOUT) {
            self.provider.timeout_ms = number(ENV_TIMEOUT, &v)?;
        }
        if let Some(v) = get(ENV_RETRIES) {
            self.provider.retries = number::<u32>(ENV_RETRIES, &v)?.max(1);
        }
        if let Some(v) = get(ENV_CACHE_ENABLED) {
            self.cache.enabled = flag(ENV_CACHE_ENABLED, &v)?;
        }
        if let Some(v) = get(ENV_CACHE_TTL) {
            self.cache.ttl_secs = number(ENV_CACHE_TTL, &v)?;
        }
        if let Some(v) = get(ENV_RATE_LIMIT_ENABLED) {
            self.rate_limit.enabled = flag(ENV_RATE_LIMIT_ENABLED, &v)?;
        }
        if let Some(v) = get(ENV_REDIS_URL) {
            self.cache.redis_url = Some(v);
        }
        if let Some(v) = get(ENV_LOG_LEVEL) {
            self.logging.level = v;
        }
        if let Some(v) = get(ENV_API_BASE_URL) {
            self.officials.api_base_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = get(ENV_TENANT_ID) {
            self.officials.tenant_id = v;
        }
        if let Some(v) = get(ENV_SHARED_KEY) {
            self.officials.shared_key = v;
        }
        if let Some(v) = get(ENV_API_REFERER) {
            self.officials.referer = v;
        }
        if let Some(v) = get(ENV_API_TIMEOUT) {
            self.officials.timeout_ms = number(ENV_API_TIMEOUT, &v)?;
        }
        if let Some(v) = get(ENV_OFFICIALS_CACHE_TTL) {
            self.officials.cache_ttl_secs = number(ENV_OFFICIALS_CACHE_TTL, &v)?;
        }

        Ok(())
    }
}

fn number<T: FromStr>(var: &str, value: &str) -> Result<T, ConfigFileError> {
    value.parse().map_err(|_| ConfigFileError::InvalidEnv {
        var: var.to_string(),
        value: value.to_string(),
        reason: "expected a non-negative integer".to_string(),
    })
}

fn flag(var: &str, value: &str) -> Result<bool, ConfigFileError> {
    parse_flag(value).ok_or_else(|| ConfigFileError::InvalidEnv {
        var: var.to_string(),
        value: value.to_string(),
        reason: "must be true or false".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn apply(vars: &[(&str, &str)]) -> Result<ConfigFile, ConfigFileError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut config = ConfigFile::default();
        config.apply_overrides_from(|name| vars.get(name).cloned())?;
        Ok(config)
    }

    #[test]
    fn test_no_variables_leaves_defaults() {
        assert_eq!(apply(&[]).unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_overrides_applied() {
        let config = apply(&[
            (ENV_BASE_URL, "http://127.0.0.1:9000/"),
            (ENV_TIMEOUT, "3000"),
            (ENV_CACHE_ENABLED, "false"),
            (ENV_RATE_LIMIT_ENABLED, "0"),
            (ENV_REDIS_URL, "redis://cache:6379"),
            (ENV_TENANT_ID, "kstp2"),
            (ENV_OFFICIALS_CACHE_TTL, "60"),
            (ENV_LOG_LEVEL, "roadtiles=trace"),
        ])
        .unwrap();

        assert_eq!(config.provider.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.provider.timeout_ms, 3000);
        assert!(!config.cache.enabled);
        assert!(!config.rate_limit.enabled);
        assert_eq!(config.cache.redis_url.as_deref(), Some("redis://cache:6379"));
        assert_eq!(config.officials.tenant_id, "kstp2");
        assert_eq!(config.officials.cache_ttl_secs, 60);
        assert_eq!(config.logging.level, "roadtiles=trace");
    }

    #[test]
    fn test_empty_variable_ignored() {
        let config = apply(&[(ENV_REDIS_URL, "  "), (ENV_CACHE_TTL, "")]).unwrap();
        assert_eq!(config.cache.redis_url, None);
        assert_eq!(config.cache.ttl_secs, ConfigFile::default().cache.ttl_secs);
    }

    #[test]
    fn test_bad_value_rejected() {
        let err = apply(&[(ENV_CACHE_TTL, "1d")]).unwrap_err();
        assert!(matches!(err, ConfigFileError::InvalidEnv { var, .. } if var == ENV_CACHE_TTL));
    }
}
