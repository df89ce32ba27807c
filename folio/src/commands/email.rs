use clap::Subcommand;
use folio_config::Config;
use folio_email_contracts::{Email, EmailService};
use folio_models::email_address::EmailAddress;

use crate::email;

#[derive(Debug, Subcommand)]
pub enum EmailCommand {
    /// Test email deliverability
    Test { recipient: EmailAddress },
}

impl EmailCommand {
    pub async fn invoke(self, config: Config) -> anyhow::Result<()> {
        match self {
            EmailCommand::Test { recipient } => test(config, recipient).await,
        }
    }
}

async fn test(config: Config, recipient: EmailAddress) -> anyhow::Result<()> {
    let email_service = email::build(&config.email)?;

    email_service
        .send(Email {
            recipients: vec![recipient],
            subject: "Email Deliverability Test".into(),
            html: "<p>Email deliverability seems to be working!</p>".into(),
            text: Some("Email deliverability seems to be working!".into()),
            reply_to: None,
        })
        .await?;

    println!("Email has been accepted by the provider");

    Ok(())
}
