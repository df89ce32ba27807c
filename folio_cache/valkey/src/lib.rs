use std::time::Duration;

use anyhow::Context;
use bb8_redis::{
    bb8::{Pool, PooledConnection},
    redis::{self, AsyncCommands},
    RedisConnectionManager,
};
use folio_cache_contracts::CacheService;
use folio_utils::trace_instrument;

#[derive(Debug, Clone)]
pub struct ValkeyCache {
    pool: Pool<RedisConnectionManager>,
}

#[derive(Debug)]
pub struct ValkeyCacheConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Option<Duration>,
    pub max_lifetime: Option<Duration>,
}

impl ValkeyCache {
    pub async fn connect(config: &ValkeyCacheConfig) -> anyhow::Result<Self> {
        let manager = RedisConnectionManager::new(config.url.as_str())?;
        let pool = Pool::builder()
            .max_size(config.max_connections)
            .min_idle(config.min_connections)
            .connection_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout)
            .max_lifetime(config.max_lifetime)
            .build(manager)
            .await?;

        Ok(Self { pool })
    }

    pub async fn clear(&self) -> anyhow::Result<()> {
        let mut conn = self.conn().await?;
        redis::cmd("FLUSHDB")
            .exec_async(&mut *conn)
            .await
            .context("Failed to execute FLUSHDB command")
    }

    async fn conn(&self) -> anyhow::Result<PooledConnection<'_, RedisConnectionManager>> {
        self.pool
            .get()
            .await
            .context("Failed to acquire cache connection")
    }
}

impl CacheService for ValkeyCache {
    #[trace_instrument(skip(self))]
    async fn incr(&self, key: &str) -> anyhow::Result<u64> {
        let mut conn = self.conn().await?;
        conn.incr(key, 1u64)
            .await
            .context("Failed to increment counter")
    }

    #[trace_instrument(skip(self))]
    async fn pexpire(&self, key: &str, ttl: Duration) -> anyhow::Result<()> {
        let ttl = ttl
            .as_millis()
            .try_into()
            .context("Expiry timeout out of range")?;
        let mut conn = self.conn().await?;
        conn.pexpire::<_, ()>(key, ttl)
            .await
            .context("Failed to set expiry timeout")
    }

    #[trace_instrument(skip(self))]
    async fn ping(&self) -> anyhow::Result<()> {
        let mut conn = self.conn().await?;
        redis::cmd("PING")
            .exec_async(&mut *conn)
            .await
            .context("Failed to ping cache")
    }
}
