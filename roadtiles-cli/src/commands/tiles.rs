//! Tile fetch and parse commands.

use std::path::PathBuf;

use clap::Args;
use roadtiles::config::ConfigFile;
use roadtiles::provider::KERALA_PWD_NAME;
use serde::Serialize;

use super::common::{self, CLI_CLIENT_ID};
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Tile address as z/x/y
    pub tile: String,

    /// Provider name
    #[arg(long, default_value = KERALA_PWD_NAME)]
    pub provider: String,

    /// Write the raw tile to this file
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Print the decoded tile summary instead of fetch metadata
    #[arg(long)]
    pub parse: bool,
}

#[derive(Debug, Args)]
pub struct ParseArgs {
    /// Tile file to decode (raw or gzip-compressed MVT)
    pub file: PathBuf,

    /// Tile address as z/x/y, enables sample coordinates
    #[arg(long)]
    pub tile: Option<String>,

    /// Provider name
    #[arg(long, default_value = KERALA_PWD_NAME)]
    pub provider: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FetchSummary<'a> {
    tile: String,
    provider: &'a str,
    size_bytes: usize,
    content_type: &'a str,
    cached: bool,
    fetched_at: String,
}

pub async fn fetch(config: &ConfigFile, args: FetchArgs) -> Result<(), CliError> {
    let tile = common::parse_tile(&args.tile)?;
    let service = common::build_service(config).await?;

    let fetched = service
        .fetch_tile(
            CLI_CLIENT_ID,
            &args.provider,
            tile.z as i64,
            tile.x as i64,
            tile.y as i64,
        )
        .await?;

    if let Some(path) = &args.output {
        common::write_file(path, &fetched.data)?;
        eprintln!("Wrote {} bytes to {}", fetched.data.len(), path.display());
    }

    if args.parse {
        let parsed = service.parse_tile(CLI_CLIENT_ID, &args.provider, &fetched.data, Some(tile))?;
        return common::print_json(&parsed);
    }

    common::print_json(&FetchSummary {
        tile: tile.to_string(),
        provider: &args.provider,
        size_bytes: fetched.data.len(),
        content_type: &fetched.content_type,
        cached: fetched.cached,
        fetched_at: fetched.fetched_at.to_rfc3339(),
    })
}

pub async fn parse(config: &ConfigFile, args: ParseArgs) -> Result<(), CliError> {
    let tile = args.tile.as_deref().map(common::parse_tile).transpose()?;
    let buffer = common::read_file(&args.file)?;
    let service = common::build_service(config).await?;

    let parsed = service.parse_tile(CLI_CLIENT_ID, &args.provider, &buffer, tile)?;
    common::print_json(&parsed)
}
