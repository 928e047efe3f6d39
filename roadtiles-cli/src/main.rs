//! RoadTiles CLI - Command-line interface
//!
//! Fetches and decodes Kerala PWD road tiles, matches coordinates to roads
//! and looks up the responsible officials.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use roadtiles::config::ConfigFile;
use roadtiles::logging::{init_logging, LoggingGuard};

use commands::config::ConfigAction;
use commands::officials::OfficialsArgs;
use commands::road::MatchArgs;
use commands::tiles::{FetchArgs, ParseArgs};
use error::CliError;

#[derive(Parser)]
#[command(name = "roadtiles")]
#[command(version = roadtiles::VERSION)]
#[command(about = "Kerala PWD road tiles, road matching and officials lookup", long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.roadtiles/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch one tile through the cache
    Fetch(FetchArgs),
    /// Decode a tile file and print its layers and sample features
    Parse(ParseArgs),
    /// Find the road nearest to a point
    Match(MatchArgs),
    /// Probe every provider and show cache statistics
    Health,
    /// Look up the officials responsible for a road section
    Officials(OfficialsArgs),
    /// Manage the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        e.exit();
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = commands::common::load_config(cli.config.as_deref())?;

    if let Command::Config { action } = cli.command {
        return commands::config::run(action, &config);
    }

    let _guard = start_logging(&config)?;

    match cli.command {
        Command::Fetch(args) => commands::tiles::fetch(&config, args).await,
        Command::Parse(args) => commands::tiles::parse(&config, args).await,
        Command::Match(args) => commands::road::run(&config, args).await,
        Command::Health => commands::health::run(&config).await,
        Command::Officials(args) => commands::officials::run(&config, args).await,
        Command::Config { .. } => Ok(()),
    }
}

fn start_logging(config: &ConfigFile) -> Result<LoggingGuard, CliError> {
    init_logging(
        &config.logging.directory,
        &config.logging.file,
        &config.logging.level,
    )
    .map_err(|e| CliError::LoggingInit(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_match_accepts_negative_coordinates() {
        let cli = Cli::try_parse_from([
            "roadtiles", "match", "--lat", "-8.5", "--lng", "-76.9", "--officials",
        ])
        .unwrap();
        match cli.command {
            Command::Match(args) => {
                assert_eq!(args.lat, -8.5);
                assert_eq!(args.lng, -76.9);
                assert!(args.officials);
            }
            _ => panic!("expected match command"),
        }
    }

    #[test]
    fn test_fetch_defaults_to_kerala_provider() {
        let cli = Cli::try_parse_from(["roadtiles", "fetch", "14/11693/7728"]).unwrap();
        match cli.command {
            Command::Fetch(args) => {
                assert_eq!(args.provider, "kerala-pwd");
                assert!(args.output.is_none());
            }
            _ => panic!("expected fetch command"),
        }
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from(["roadtiles", "config", "show", "--config", "/tmp/rt.ini"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/rt.ini")));
        assert!(matches!(
            cli.command,
            Command::Config {
                action: ConfigAction::Show
            }
        ));
    }
}
