use std::{future::Future, time::Duration};

/// Shared key value store for short lived counters.
#[cfg_attr(feature = "mock", mockall::automock)]
pub trait CacheService: Send + Sync + 'static {
    /// Atomically increments the counter stored at `key` and returns the new
    /// value.
    ///
    /// A missing counter is created with the value `1` and no expiry.
    fn incr(&self, key: &str) -> impl Future<Output = anyhow::Result<u64>> + Send;

    /// Sets a timeout after which the item at `key` is removed automatically.
    ///
    /// Does nothing if the item does not exist.
    fn pexpire(&self, key: &str, ttl: Duration)
        -> impl Future<Output = anyhow::Result<()>> + Send;

    /// Verify the connection to the cache.
    fn ping(&self) -> impl Future<Output = anyhow::Result<()>> + Send;
}

#[cfg(feature = "mock")]
impl MockCacheService {
    pub fn with_incr(mut self, key: String, result: u64) -> Self {
        self.expect_incr()
            .once()
            .with(mockall::predicate::eq(key))
            .return_once(move |_| Box::pin(std::future::ready(Ok(result))));
        self
    }

    pub fn with_incr_error(mut self, key: String) -> Self {
        self.expect_incr()
            .once()
            .with(mockall::predicate::eq(key))
            .return_once(|_| {
                Box::pin(std::future::ready(Err(anyhow::anyhow!(
                    "connection refused"
                ))))
            });
        self
    }

    pub fn with_pexpire(mut self, key: String, ttl: Duration) -> Self {
        self.expect_pexpire()
            .once()
            .with(mockall::predicate::eq(key), mockall::predicate::eq(ttl))
            .return_once(|_, _| Box::pin(std::future::ready(Ok(()))));
        self
    }

    pub fn with_ping(mut self, ok: bool) -> Self {
        self.expect_ping().once().return_once(move || {
            Box::pin(std::future::ready(if ok {
                Ok(())
            } else {
                Err(anyhow::anyhow!("connection refused"))
            }))
        });
        self
    }
}
