use std::{net::IpAddr, time::Duration};

use anyhow::Context;
use folio_cache_contracts::CacheService;
use folio_core_contact_contracts::rate_limit::{ContactRateLimitService, ContactRateLimitStatus};
use folio_utils::trace_instrument;

/// Fixed window counter per client address.
///
/// The window starts with the first request from an address, so a burst
/// around the end of a window may admit up to twice `max_requests`.
#[derive(Debug, Clone)]
pub struct ContactRateLimitServiceImpl<Cache> {
    /// Rate limiting is disabled without a cache.
    cache: Option<Cache>,
    config: ContactRateLimitConfig,
}

#[derive(Debug, Clone)]
pub struct ContactRateLimitConfig {
    pub max_requests: u64,
    pub window: Duration,
}

impl<Cache> ContactRateLimitServiceImpl<Cache> {
    pub fn new(cache: Option<Cache>, config: ContactRateLimitConfig) -> Self {
        Self { cache, config }
    }
}

impl<Cache> ContactRateLimitService for ContactRateLimitServiceImpl<Cache>
where
    Cache: CacheService,
{
    #[trace_instrument(skip(self))]
    async fn check(&self, client_ip: IpAddr) -> anyhow::Result<ContactRateLimitStatus> {
        let Some(cache) = &self.cache else {
            return Ok(ContactRateLimitStatus::Unlimited);
        };

        let key = cache_key(client_ip);
        let count = cache
            .incr(&key)
            .await
            .context("Failed to increment rate limit counter")?;

        if count == 1 {
            cache
                .pexpire(&key, self.config.window)
                .await
                .context("Failed to set expiry of rate limit counter")?;
        }

        Ok(match self.config.max_requests.checked_sub(count) {
            Some(remaining) => ContactRateLimitStatus::Allowed { remaining },
            None => ContactRateLimitStatus::Exceeded,
        })
    }
}

fn cache_key(client_ip: IpAddr) -> String {
    format!("ratelimit:contact:{client_ip}")
}
