use std::sync::Arc;

use anyhow::{anyhow, Context};
use folio_email_contracts::{Email, EmailSendError, EmailService};
use folio_models::{email_address::EmailAddress, Sensitive};
use folio_utils::trace_instrument;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::http::HttpClient;

mod http;

/// Sends emails through the HTTP API of Resend (or a compatible server).
#[derive(Debug, Clone)]
pub struct EmailServiceImpl {
    config: Arc<EmailServiceConfig>,
    client: HttpClient,
}

#[derive(Debug)]
pub struct EmailServiceConfig {
    pub endpoint: Url,
    pub api_key: Option<Sensitive<String>>,
    pub from: EmailAddress,
    pub from_name: Option<String>,
}

impl EmailServiceImpl {
    pub fn new(config: EmailServiceConfig) -> anyhow::Result<Self> {
        Ok(Self {
            config: config.into(),
            client: HttpClient::new().context("Failed to create http client")?,
        })
    }

    fn sender(&self) -> String {
        match self.config.from_name.as_deref() {
            Some(name) if !name.is_empty() => format!("{name} <{}>", self.config.from),
            _ => self.config.from.to_string(),
        }
    }
}

impl EmailService for EmailServiceImpl {
    #[trace_instrument(skip(self, email), fields(recipients = ?email.recipients, subject = %email.subject))]
    async fn send(&self, email: Email) -> Result<(), EmailSendError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|api_key| !api_key.is_empty())
            .ok_or(EmailSendError::NotConfigured)?;

        let request = SendEmailRequest {
            from: self.sender(),
            to: email.recipients.iter().map(|x| x.as_str()).collect(),
            subject: &email.subject,
            html: &email.html,
            text: email.text.as_deref(),
            reply_to: email.reply_to.as_ref().map(|x| x.as_str()),
        };

        let response = self
            .client
            .post(self.config.endpoint.clone())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to email provider")?;

        let status = response.status();
        if status.is_success() {
            let SendEmailResponse { id } = response
                .json()
                .await
                .context("Failed to parse email provider response")?;
            debug!(%id, "email accepted by provider");
            return Ok(());
        }

        match response.json::<ProviderError>().await {
            Ok(error) => {
                debug!(status = error.status_code, name = %error.name, "email rejected by provider");
                Err(EmailSendError::Rejected(error.message))
            }
            Err(err) => Err(anyhow!(err)
                .context(format!("Email provider responded with status {status}"))
                .into()),
        }
    }
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: String,
    to: Vec<&'a str>,
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

#[derive(Deserialize)]
struct SendEmailResponse {
    id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProviderError {
    status_code: u16,
    message: String,
    name: String,
}
