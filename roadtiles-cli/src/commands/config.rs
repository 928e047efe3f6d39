//! Configuration management CLI commands.

use clap::Subcommand;
use roadtiles::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Config action subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the config file path
    Path,
    /// Write a default config file if none exists
    Init,
    /// Show the effective configuration, including environment overrides
    Show,
}

pub fn run(action: ConfigAction, config: &ConfigFile) -> Result<(), CliError> {
    match action {
        ConfigAction::Path => {
            println!("{}", config_file_path().display());
        }
        ConfigAction::Init => {
            let path = ConfigFile::ensure_exists()?;
            println!("Config file: {}", path.display());
        }
        ConfigAction::Show => {
            let shared_key = if config.officials.shared_key.is_empty() {
                "(not set)"
            } else {
                "(set)"
            };

            println!("[provider]");
            println!("  base_url    {}", config.provider.base_url);
            println!("  referer     {}", config.provider.referer);
            println!("  timeout     {} ms", config.provider.timeout_ms);
            println!("  retries     {}", config.provider.retries);
            println!(
                "  zoom        {}-{}",
                config.provider.min_zoom, config.provider.max_zoom
            );
            println!("[cache]");
            println!("  enabled     {}", config.cache.enabled);
            println!("  ttl         {} s", config.cache.ttl_secs);
            println!("  max_entries {}", config.cache.max_entries);
            println!(
                "  redis_url   {}",
                config.cache.redis_url.as_deref().unwrap_or("(none)")
            );
            println!("[rate_limit]");
            println!("  enabled     {}", config.rate_limit.enabled);
            println!(
                "  limit       {} per {} s",
                config.rate_limit.max_requests, config.rate_limit.window_secs
            );
            println!("[officials]");
            println!("  api         {}", config.officials.api_base_url);
            println!("  tenant      {}", config.officials.tenant_id);
            println!("  shared_key  {}", shared_key);
            println!("  cache_ttl   {} s", config.officials.cache_ttl_secs);
            println!("[matcher]");
            println!("  zoom        {}", config.matcher.preferred_zoom);
            println!("  max_radius  {} m", config.matcher.max_radius_m);
            println!("[logging]");
            println!("  level       {}", config.logging.level);
            println!(
                "  file        {}",
                config.logging.directory.join(&config.logging.file).display()
            );
        }
    }
    Ok(())
}
