use std::{future::Future, net::IpAddr};

#[cfg_attr(feature = "mock", mockall::automock)]
pub trait ContactRateLimitService: Send + Sync + 'static {
    /// Count a submission from the given address and decide whether it may
    /// pass.
    ///
    /// Every call counts, including calls that end up being rejected.
    fn check(
        &self,
        client_ip: IpAddr,
    ) -> impl Future<Output = anyhow::Result<ContactRateLimitStatus>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactRateLimitStatus {
    /// Rate limiting is disabled.
    Unlimited,
    Allowed { remaining: u64 },
    Exceeded,
}

impl ContactRateLimitStatus {
    pub fn is_exceeded(self) -> bool {
        self == Self::Exceeded
    }
}

#[cfg(feature = "mock")]
impl MockContactRateLimitService {
    pub fn with_check(mut self, client_ip: IpAddr, result: ContactRateLimitStatus) -> Self {
        self.expect_check()
            .once()
            .with(mockall::predicate::eq(client_ip))
            .return_once(move |_| Box::pin(std::future::ready(Ok(result))));
        self
    }

    pub fn with_check_error(mut self, client_ip: IpAddr) -> Self {
        self.expect_check()
            .once()
            .with(mockall::predicate::eq(client_ip))
            .return_once(|_| {
                Box::pin(std::future::ready(Err(anyhow::anyhow!(
                    "Failed to increment rate limit counter"
                ))))
            });
        self
    }
}
