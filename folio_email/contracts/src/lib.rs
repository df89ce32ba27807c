use std::future::Future;

use folio_models::email_address::EmailAddress;
use thiserror::Error;

#[cfg_attr(feature = "mock", mockall::automock)]
pub trait EmailService: Send + Sync + 'static {
    /// Hand an email over to the email provider.
    ///
    /// Exactly one attempt is made; failed deliveries are not retried.
    fn send(&self, email: Email) -> impl Future<Output = Result<(), EmailSendError>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub recipients: Vec<EmailAddress>,
    pub subject: String,
    pub html: String,
    pub text: Option<String>,
    pub reply_to: Option<EmailAddress>,
}

#[derive(Debug, Error)]
pub enum EmailSendError {
    /// No credential for the email provider has been configured.
    #[error("Email provider API key missing")]
    NotConfigured,
    /// The email provider refused the email.
    #[error("{0}")]
    Rejected(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[cfg(feature = "mock")]
impl MockEmailService {
    pub fn with_send(mut self, email: Email) -> Self {
        self.expect_send()
            .once()
            .with(mockall::predicate::eq(email))
            .return_once(|_| Box::pin(std::future::ready(Ok(()))));
        self
    }

    pub fn with_send_error(mut self, email: Email, error: EmailSendError) -> Self {
        self.expect_send()
            .once()
            .with(mockall::predicate::eq(email))
            .return_once(|_| Box::pin(std::future::ready(Err(error))));
        self
    }
}
