//! Configuration file handling for ~/.roadtiles/config.ini.
//!
//! Settings structs live in [`super::settings`], constants in
//! [`super::defaults`], parsing in [`super::parser`], environment overrides
//! in [`super::env`] and serialization in [`super::writer`].

use ini::Ini;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::settings::ConfigFile;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// An environment override carried a value that does not parse.
    #[error("Invalid environment override: {var} = '{value}' - {reason}")]
    InvalidEnv {
        var: String,
        value: String,
        reason: String,
    },

    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

impl ConfigFile {
    /// Load from the default path, then apply environment overrides.
    pub fn load() -> Result<Self, ConfigFileError> {
        let mut config = Self::load_from(&config_file_path())?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration from a specific path.
    ///
    /// A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        let content = super::writer::to_config_string(self);
        std::fs::write(path, content).map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// Create the default config file if it doesn't exist.
    ///
    /// Returns the path to the config file.
    pub fn ensure_exists() -> Result<PathBuf, ConfigFileError> {
        let path = config_file_path();
        if !path.exists() {
            Self::default().save_to(&path)?;
        }
        Ok(path)
    }
}

/// Get the path to the config directory (~/.roadtiles).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".roadtiles")
}

/// Get the path to the config file (~/.roadtiles/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_CACHE_CHECK_PERIOD_SECS;

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config = ConfigFile::load_from(&temp_dir.path().join("nonexistent.ini")).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_save_then_load_preserves_values() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.ini");

        let mut config = ConfigFile::default();
        config.provider.base_url = "http://localhost:8080/tiles".to_string();
        config.cache.redis_url = Some("redis://127.0.0.1/".to_string());
        config.rate_limit.enabled = false;
        config.officials.shared_key = "abc123".to_string();
        config.matcher.max_radius_m = 250.0;
        config.save_to(&path).unwrap();

        let loaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.cache.check_period_secs, DEFAULT_CACHE_CHECK_PERIOD_SECS);
    }

    #[test]
    fn test_config_path_layout() {
        let path = config_file_path();
        assert!(path.ends_with(".roadtiles/config.ini"));
    }
}
