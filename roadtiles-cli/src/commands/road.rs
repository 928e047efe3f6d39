//! Road matching command.

use clap::Args;
use roadtiles::config::ConfigFile;
use roadtiles::matcher::RoadMatchResult;
use roadtiles::officials::{parse_section_id, OfficialsLookup};
use serde::Serialize;
use tracing::warn;

use super::common::{self, CLI_CLIENT_ID};
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct MatchArgs {
    /// Latitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Longitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lng: f64,

    /// Also look up the officials for the matched road's section
    #[arg(long)]
    pub officials: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MatchOutput {
    road: RoadMatchResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    officials: Option<OfficialsLookup>,
}

pub async fn run(config: &ConfigFile, args: MatchArgs) -> Result<(), CliError> {
    let service = common::build_service(config).await?;

    let road = match service.match_road(CLI_CLIENT_ID, args.lat, args.lng).await? {
        Some(road) => road,
        None => {
            println!("No road found near {}, {}", args.lat, args.lng);
            return Ok(());
        }
    };

    let officials = match (args.officials, road.road_id.as_deref()) {
        (true, Some(road_id)) => {
            let section = parse_section_id(road_id)?;
            Some(service.officials(CLI_CLIENT_ID, section).await?)
        }
        (true, None) => {
            warn!(road = road.road_name.as_str(), "Matched road has no id, skipping officials");
            None
        }
        (false, _) => None,
    };

    common::print_json(&MatchOutput { road, officials })
}
