//! Provider health and cache diagnostics.

use roadtiles::config::ConfigFile;

use super::common;
use crate::error::CliError;

pub async fn run(config: &ConfigFile) -> Result<(), CliError> {
    let service = common::build_service(config).await?;
    let health = service.provider_health().await;

    for (provider, healthy) in &health {
        let status = if *healthy { "healthy" } else { "UNHEALTHY" };
        println!("{:<16} {}", provider, status);
        if let Ok(meta) = service.composite().metadata(provider) {
            println!("  zoom {}-{}", meta.min_zoom, meta.max_zoom);
            if let Some(attribution) = meta.attribution {
                println!("  {}", attribution);
            }
        }
    }
    println!("cache            {}", service.cache_stats());

    if health.values().all(|healthy| *healthy) {
        Ok(())
    } else {
        Err(CliError::Service(
            roadtiles::error::ServiceError::UpstreamUnavailable(
                "one or more providers failed the health probe".to_string(),
            ),
        ))
    }
}
