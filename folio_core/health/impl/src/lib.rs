use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use folio_cache_contracts::CacheService;
use folio_core_health_contracts::{HealthFeatureService, HealthStatus};
use tokio::sync::RwLock;
use tracing::error;

#[derive(Debug, Clone)]
pub struct HealthFeatureServiceImpl<Cache> {
    cache: Option<Cache>,
    config: HealthFeatureConfig,
    state: Arc<State>,
}

#[derive(Debug, Clone)]
pub struct HealthFeatureConfig {
    pub cache_ttl: Duration,
}

#[derive(Debug, Default)]
struct State {
    cache: RwLock<Option<CachedStatus>>,
}

#[derive(Debug)]
struct CachedStatus {
    status: HealthStatus,
    timestamp: Instant,
}

impl<Cache> HealthFeatureServiceImpl<Cache> {
    pub fn new(cache: Option<Cache>, config: HealthFeatureConfig) -> Self {
        Self {
            cache,
            config,
            state: Default::default(),
        }
    }
}

impl<Cache> HealthFeatureService for HealthFeatureServiceImpl<Cache>
where
    Cache: CacheService,
{
    async fn get_status(&self) -> HealthStatus {
        let now = Instant::now();
        let is_fresh = |cached: &&CachedStatus| now < cached.timestamp + self.config.cache_ttl;

        let cache_guard = self.state.cache.read().await;
        if let Some(cached) = cache_guard.as_ref().filter(is_fresh) {
            return cached.status;
        }
        drop(cache_guard);

        let mut cache_guard = self.state.cache.write().await;
        if let Some(cached) = cache_guard.as_ref().filter(is_fresh) {
            return cached.status;
        }

        let cache = match &self.cache {
            Some(cache) => Some(
                cache
                    .ping()
                    .await
                    .inspect_err(|err| error!("Failed to ping cache: {err:#}"))
                    .is_ok(),
            ),
            None => None,
        };

        let status = HealthStatus { cache };

        cache_guard
            .insert(CachedStatus {
                status,
                timestamp: now,
            })
            .status
    }
}
