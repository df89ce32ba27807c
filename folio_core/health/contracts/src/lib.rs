use std::future::Future;

#[cfg_attr(feature = "mock", mockall::automock)]
pub trait HealthFeatureService: Send + Sync + 'static {
    /// Return the status of the backend's dependencies.
    ///
    /// The result may be cached for a short time.
    fn get_status(&self) -> impl Future<Output = HealthStatus> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthStatus {
    /// `None` if no cache has been configured.
    pub cache: Option<bool>,
}

impl HealthStatus {
    pub fn is_healthy(self) -> bool {
        self.cache != Some(false)
    }
}

#[cfg(feature = "mock")]
impl MockHealthFeatureService {
    pub fn with_get_status(mut self, result: HealthStatus) -> Self {
        self.expect_get_status()
            .once()
            .return_once(move || Box::pin(std::future::ready(result)));
        self
    }
}
