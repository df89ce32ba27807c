use std::sync::Arc;

use anyhow::Context;
use folio_core_contact_contracts::{
    rate_limit::ContactRateLimitService, ContactFeatureService, ContactFormRequest,
    ContactSubmitError, ContactSubmitOutcome,
};
use folio_email_contracts::{Email, EmailSendError, EmailService};
use folio_models::{contact::ContactSubmission, email_address::EmailAddress};
use folio_templates_contracts::{
    ContactAcknowledgementTemplate, ContactNotificationTemplate, TemplateService,
};
use folio_utils::trace_instrument;
use tracing::{debug, info, warn};

pub use origin::AllowedOrigins;

mod origin;
pub mod rate_limit;


#[derive(Debug, Clone)]
pub struct ContactFeatureServiceImpl<RateLimit, Email, Template> {
    rate_limit: RateLimit,
    email: Email,
    template: Template,
    config: ContactFeatureConfig,
}

#[derive(Debug, Clone)]
pub struct ContactFeatureConfig {
    pub allowed_origins: Arc<AllowedOrigins>,
    /// Receives the notifications about new submissions.
    pub recipient: Arc<EmailAddress>,
    pub subject_prefix: Arc<str>,
}

impl<RateLimit, EmailS, Template> ContactFeatureServiceImpl<RateLimit, EmailS, Template> {
    pub fn new(
        rate_limit: RateLimit,
        email: EmailS,
        template: Template,
        config: ContactFeatureConfig,
    ) -> Self {
        Self {
            rate_limit,
            email,
            template,
            config,
        }
    }
}

impl<RateLimit, EmailS, Template> ContactFeatureService
    for ContactFeatureServiceImpl<RateLimit, EmailS, Template>
where
    RateLimit: ContactRateLimitService,
    EmailS: EmailService,
    Template: TemplateService,
{
    #[trace_instrument(skip(self, request), fields(client_ip = %request.client_ip))]
    async fn submit(
        &self,
        request: ContactFormRequest,
    ) -> Result<ContactSubmitOutcome, ContactSubmitError> {
        if !self
            .config
            .allowed_origins
            .allows(request.origin.as_deref())
        {
            debug!(origin = ?request.origin, "rejecting submission from foreign origin");
            return Err(ContactSubmitError::ForbiddenOrigin);
        }

        let status = self
            .rate_limit
            .check(request.client_ip)
            .await
            .context("Failed to check rate limit")?;
        if status.is_exceeded() {
            debug!("rejecting submission, rate limit exceeded");
            return Err(ContactSubmitError::RateLimited);
        }

        let submission =
            ContactSubmission::parse(&request.body).map_err(ContactSubmitError::Invalid)?;

        if submission.is_bot() {
            info!("honeypot filled in, discarding submission");
            return Ok(ContactSubmitOutcome::Filtered);
        }

        self.notify_owner(&submission).await?;

        if let Err(err) = self.acknowledge(&submission).await {
            warn!("Failed to send acknowledgement to sender: {err:#}");
        }

        Ok(ContactSubmitOutcome::Delivered)
    }
}

impl<RateLimit, EmailS, Template> ContactFeatureServiceImpl<RateLimit, EmailS, Template>
where
    EmailS: EmailService,
    Template: TemplateService,
{
    async fn notify_owner(&self, submission: &ContactSubmission) -> Result<(), ContactSubmitError> {
        let rendered = self
            .template
            .render(&ContactNotificationTemplate {
                name: submission.name.to_string(),
                email: submission.email.to_string(),
                budget: submission.budget.clone(),
                subject: submission.subject.to_string(),
                message: submission.message.to_string(),
            })
            .context("Failed to render contact notification")?;

        let email = Email {
            recipients: vec![(*self.config.recipient).clone()],
            subject: format!("{} {}", self.config.subject_prefix, *submission.subject),
            html: rendered.html,
            text: Some(rendered.text),
            reply_to: Some(submission.email.clone()),
        };

        self.email.send(email).await.map_err(|err| match err {
            EmailSendError::NotConfigured => ContactSubmitError::NotConfigured,
            EmailSendError::Rejected(message) => ContactSubmitError::Delivery(message),
            EmailSendError::Other(err) => err.context("Failed to send contact notification").into(),
        })
    }

    async fn acknowledge(&self, submission: &ContactSubmission) -> anyhow::Result<()> {
        let rendered = self
            .template
            .render(&ContactAcknowledgementTemplate {
                name: submission.name.to_string(),
                subject: submission.subject.to_string(),
                message: submission.message.to_string(),
            })
            .context("Failed to render contact acknowledgement")?;

        let email = Email {
            recipients: vec![submission.email.clone()],
            subject: format!("Thanks for reaching out, {}!", *submission.name),
            html: rendered.html,
            text: Some(rendered.text),
            reply_to: None,
        };

        self.email
            .send(email)
            .await
            .context("Failed to send contact acknowledgement")
    }
}
