//! Shared helpers for CLI commands.

use std::path::Path;

use roadtiles::config::ConfigFile;
use roadtiles::coord::TileCoord;
use roadtiles::service::RoadTileService;
use serde::Serialize;

use crate::error::CliError;

/// Rate-limit identity of the local user.
pub const CLI_CLIENT_ID: &str = "cli";

/// Load configuration from `path` or the default location, with env overrides.
pub fn load_config(path: Option<&Path>) -> Result<ConfigFile, CliError> {
    let config = match path {
        Some(path) => {
            let mut config = ConfigFile::load_from(path)?;
            config.apply_env_overrides()?;
            config
        }
        None => ConfigFile::load()?,
    };
    Ok(config)
}

pub async fn build_service(config: &ConfigFile) -> Result<RoadTileService, CliError> {
    RoadTileService::from_config(config)
        .await
        .map_err(CliError::ServiceCreation)
}

/// Parse a `z/x/y` tile address.
pub fn parse_tile(value: &str) -> Result<TileCoord, CliError> {
    let parts: Vec<&str> = value.trim().split('/').collect();
    let numbers: Vec<i64> = parts
        .iter()
        .map(|p| p.trim().parse::<i64>())
        .collect::<Result<_, _>>()
        .map_err(|_| CliError::InvalidArgument(format!("expected z/x/y, got '{}'", value)))?;

    match numbers.as_slice() {
        [z, x, y] => TileCoord::try_new(*z, *x, *y)
            .map_err(|e| CliError::InvalidArgument(e.to_string())),
        _ => Err(CliError::InvalidArgument(format!(
            "expected z/x/y, got '{}'",
            value
        ))),
    }
}

pub fn read_file(path: &Path) -> Result<Vec<u8>, CliError> {
    std::fs::read(path).map_err(|error| CliError::FileRead {
        path: path.display().to_string(),
        error,
    })
}

pub fn write_file(path: &Path, data: &[u8]) -> Result<(), CliError> {
    std::fs::write(path, data).map_err(|error| CliError::FileWrite {
        path: path.display().to_string(),
        error,
    })
}

/// Pretty-print a value as JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tile() {
        let tile = parse_tile("14/11693/7728").unwrap();
        assert_eq!(tile, TileCoord { z: 14, x: 11693, y: 7728 });
    }

    #[test]
    fn test_parse_tile_rejects_malformed() {
        for value in ["14/11693", "a/b/c", "14/11693/7728/1", "3/8/0", ""] {
            assert!(
                matches!(parse_tile(value), Err(CliError::InvalidArgument(_))),
                "{} should be rejected",
                value
            );
        }
    }

    #[test]
    fn test_load_config_from_path() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("config.ini");
        std::fs::write(&path, "[matcher]\npreferred_zoom = 12\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.matcher.preferred_zoom, 12);
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_file(Path::new("/nonexistent/tile.mvt")).unwrap_err();
        assert!(matches!(err, CliError::FileRead { .. }));
    }
}
