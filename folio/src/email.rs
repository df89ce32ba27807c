use anyhow::Context;
use folio_config::EmailConfig;
use folio_email_impl::{EmailServiceConfig, EmailServiceImpl};
use tracing::warn;

/// Create the client for the email provider API
pub fn build(config: &EmailConfig) -> anyhow::Result<EmailServiceImpl> {
    if config.api_key.as_deref().map_or(true, String::is_empty) {
        warn!("No email provider API key configured, contact submissions will fail");
    }

    EmailServiceImpl::new(EmailServiceConfig {
        endpoint: config.endpoint.clone(),
        api_key: config.api_key.clone(),
        from: config.from.clone(),
        from_name: config.from_name.clone(),
    })
    .context("Failed to create email service")
}
