use anyhow::Context;
use folio_cache_contracts::CacheService;
use folio_config::Config;
use tracing::{info, warn};

use crate::{
    cache, email,
    environment::{ConfigProvider, Provider},
};

pub async fn serve(config: Config) -> anyhow::Result<()> {
    let cache = match &config.cache {
        Some(cache_config) => {
            info!("Connecting to valkey cache");
            let cache = cache::connect(cache_config).await?;
            cache.ping().await.context("Failed to reach valkey cache")?;
            Some(cache)
        }
        None => {
            warn!("No cache configured, contact submissions are not rate limited");
            None
        }
    };

    let email = email::build(&config.email)?;

    let config_provider = ConfigProvider::new(&config)?;
    let server = Provider::new(config_provider, cache, email).rest_server()?;
    info!(
        "Starting http server on {}:{}",
        config.http.host, config.http.port
    );
    server.serve().await
}
