use std::{future::Future, net::IpAddr};

use folio_models::contact::ContactValidationErrors;
use serde_json::Value;
use thiserror::Error;

pub mod rate_limit;

#[cfg_attr(feature = "mock", mockall::automock)]
pub trait ContactFeatureService: Send + Sync + 'static {
    /// Handle a submission of the contact form.
    ///
    /// The request passes the origin check, the rate limit and the payload
    /// validation (in this order) before the site owner is notified. If the
    /// notification has been delivered, an acknowledgement is sent back to
    /// the sender on a best effort basis.
    fn submit(
        &self,
        request: ContactFormRequest,
    ) -> impl Future<Output = Result<ContactSubmitOutcome, ContactSubmitError>> + Send;
}

/// Everything the contact feature needs to know about an incoming request.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactFormRequest {
    /// Value of the `Origin` header, if any.
    pub origin: Option<String>,
    pub client_ip: IpAddr,
    /// The decoded request body, `null` if it could not be decoded.
    pub body: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactSubmitOutcome {
    /// The site owner has been notified.
    Delivered,
    /// The honeypot field was filled in, the submission has been discarded
    /// silently.
    Filtered,
}

#[derive(Debug, Error)]
pub enum ContactSubmitError {
    #[error("Forbidden origin")]
    ForbiddenOrigin,
    #[error("Too many requests")]
    RateLimited,
    #[error("Invalid submission: {0}")]
    Invalid(ContactValidationErrors),
    #[error("Email provider API key missing")]
    NotConfigured,
    /// The email provider refused the notification.
    #[error("{0}")]
    Delivery(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[cfg(feature = "mock")]
impl MockContactFeatureService {
    pub fn with_submit(
        mut self,
        request: ContactFormRequest,
        result: Result<ContactSubmitOutcome, ContactSubmitError>,
    ) -> Self {
        self.expect_submit()
            .once()
            .with(mockall::predicate::eq(request))
            .return_once(|_| Box::pin(std::future::ready(result)));
        self
    }
}
