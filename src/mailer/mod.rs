//! Outbound mail delivery.
//!
//! `MailSender` is the only seam between dispatch logic and the provider.
//! Two backends exist, picked by `provider` in the config:
//! the SendGrid v3 web API and an authenticated SMTP relay.

mod sendgrid;
mod smtp;

use async_trait::async_trait;

use std::sync::Arc;

pub use sendgrid::SendGridSender;
pub use smtp::SmtpSender;

use crate::{
    config::{Config, Provider},
    models::{Credential, EmailAddress, SendReceipt},
};

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Invalid email address format: {0}")]
    AddressFormat(#[from] lettre::address::AddressError),

    #[error("Failed to build email message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("SMTP transport error: {0}")]
    SmtpTransport(#[from] lettre::transport::smtp::Error),

    #[error("Failed to connect to SMTP relay: {0}")]
    SmtpRelay(lettre::transport::smtp::Error),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider rejected the message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[async_trait]
pub trait MailSender: Send + Sync {
    /// Sends one message to exactly one recipient.
    async fn send_single(
        &self,
        credential: &Credential,
        from: &EmailAddress,
        to: &EmailAddress,
        subject: &str,
        plain_text_body: &str,
        html_body: &str,
    ) -> Result<SendReceipt, MailError>;

    /// Sends one message addressed to all `recipients` at once.
    async fn send_batch(
        &self,
        credential: &Credential,
        from: &EmailAddress,
        subject: &str,
        html_body: &str,
        recipients: &[EmailAddress],
    ) -> Result<SendReceipt, MailError>;
}

pub fn from_config(cfg: &Config) -> Result<Arc<dyn MailSender>, MailError> {
    let sender: Arc<dyn MailSender> = match cfg.provider {
        Provider::Sendgrid => Arc::new(SendGridSender::new(
            &cfg.sendgrid.api_base,
            cfg.request_timeout,
        )?),
        Provider::Smtp => Arc::new(SmtpSender::new(
            cfg.smtp.relay.clone(),
            cfg.smtp.username.clone(),
            cfg.request_timeout,
        )),
    };
    Ok(sender)
}
