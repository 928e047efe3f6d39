//! Officials lookup command.

use clap::Args;
use roadtiles::config::ConfigFile;
use roadtiles::officials::parse_section_id;

use super::common::{self, CLI_CLIENT_ID};
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct OfficialsArgs {
    /// Network section id (the road id from the tile properties)
    pub section: String,

    /// Bypass the cache and re-fetch from the registry
    #[arg(long)]
    pub refresh: bool,
}

pub async fn run(config: &ConfigFile, args: OfficialsArgs) -> Result<(), CliError> {
    let section = parse_section_id(&args.section)?;
    let service = common::build_service(config).await?;

    if args.refresh {
        let refresh = service.refresh_officials(CLI_CLIENT_ID, section)?;
        let _ = refresh.await;
        let metrics = service.officials_metrics();
        if metrics.refreshes_failed > 0 {
            eprintln!("Refresh failed; see the log for details");
        }
    }

    let lookup = service.officials(CLI_CLIENT_ID, section).await?;
    common::print_json(&lookup)
}
