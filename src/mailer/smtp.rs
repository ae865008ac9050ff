use async_trait::async_trait;
use lettre::{
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, header::ContentType},
    transport::smtp::authentication::Credentials,
};

use std::time::Duration;

use super::{MailError, MailSender};
use crate::models::{Credential, EmailAddress, SendReceipt};

/// Authenticated SMTP relay. With SendGrid the username is the literal
/// `apikey` and the per-request API key is the password.
pub struct SmtpSender {
    relay: String,
    username: String,
    timeout: Duration,
}

fn mailbox(address: &EmailAddress) -> Result<Mailbox, MailError> {
    let email = address.address().parse::<Address>()?;
    Ok(Mailbox::new(address.name().map(str::to_owned), email))
}

impl SmtpSender {
    pub const fn new(relay: String, username: String, timeout: Duration) -> Self {
        Self {
            relay,
            username,
            timeout,
        }
    }

    async fn deliver(
        &self,
        credential: &Credential,
        email: Message,
        accepted: usize,
    ) -> Result<SendReceipt, MailError> {
        let creds = Credentials::new(self.username.clone(), credential.expose().to_owned());

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.relay)
            .map_err(MailError::SmtpRelay)?
            .credentials(creds)
            .timeout(Some(self.timeout))
            .build();

        tracing::debug!("Relaying mail through {}", self.relay);

        let response = mailer.send(email).await?;

        Ok(SendReceipt {
            accepted,
            reference: response.first_line().map(str::to_owned),
        })
    }
}

#[async_trait]
impl MailSender for SmtpSender {
    async fn send_single(
        &self,
        credential: &Credential,
        from: &EmailAddress,
        to: &EmailAddress,
        subject: &str,
        plain_text_body: &str,
        html_body: &str,
    ) -> Result<SendReceipt, MailError> {
        let email = Message::builder()
            .from(mailbox(from)?)
            .to(mailbox(to)?)
            .subject(subject)
            .multipart(MultiPart::alternative_plain_html(
                plain_text_body.to_owned(),
                html_body.to_owned(),
            ))?;

        self.deliver(credential, email, 1).await
    }

    async fn send_batch(
        &self,
        credential: &Credential,
        from: &EmailAddress,
        subject: &str,
        html_body: &str,
        recipients: &[EmailAddress],
    ) -> Result<SendReceipt, MailError> {
        let mut builder = Message::builder().from(mailbox(from)?).subject(subject);
        for recipient in recipients {
            builder = builder.to(mailbox(recipient)?);
        }

        let email = builder
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_owned())?;

        self.deliver(credential, email, recipients.len()).await
    }
}
