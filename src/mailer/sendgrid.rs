use async_trait::async_trait;
use serde::Serialize;

use std::time::Duration;

use super::{MailError, MailSender};
use crate::models::{Credential, EmailAddress, SendReceipt};

const MAIL_SEND_PATH: &str = "/v3/mail/send";

/// SendGrid v3 `mail/send` client. The API key comes with each request,
/// so one client serves every caller.
#[derive(Clone)]
pub struct SendGridSender {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Serialize)]
struct MailSendPayload<'a> {
    personalizations: [Personalization<'a>; 1],
    from: Address<'a>,
    subject: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    content: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Personalization<'a> {
    to: Vec<Address<'a>>,
}

#[derive(Serialize)]
struct Address<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

impl<'a> From<&'a EmailAddress> for Address<'a> {
    fn from(address: &'a EmailAddress) -> Self {
        Self {
            email: address.address(),
            name: address.name(),
        }
    }
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    mime: &'static str,
    value: &'a str,
}

impl SendGridSender {
    pub fn new(api_base: &str, timeout: Duration) -> Result<Self, MailError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: format!("{}{MAIL_SEND_PATH}", api_base.trim_end_matches('/')),
        })
    }

    async fn post(
        &self,
        credential: &Credential,
        payload: &MailSendPayload<'_>,
        accepted: usize,
    ) -> Result<SendReceipt, MailError> {
        tracing::debug!("Posting mail to {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(credential.expose())
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let reference = response
            .headers()
            .get("x-message-id")
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        Ok(SendReceipt {
            accepted,
            reference,
        })
    }
}

#[async_trait]
impl MailSender for SendGridSender {
    async fn send_single(
        &self,
        credential: &Credential,
        from: &EmailAddress,
        to: &EmailAddress,
        subject: &str,
        plain_text_body: &str,
        html_body: &str,
    ) -> Result<SendReceipt, MailError> {
        let payload = MailSendPayload {
            personalizations: [Personalization {
                to: vec![to.into()],
            }],
            from: from.into(),
            subject,
            content: vec![
                Content {
                    mime: "text/plain",
                    value: plain_text_body,
                },
                Content {
                    mime: "text/html",
                    value: html_body,
                },
            ],
        };

        self.post(credential, &payload, 1).await
    }

    async fn send_batch(
        &self,
        credential: &Credential,
        from: &EmailAddress,
        subject: &str,
        html_body: &str,
        recipients: &[EmailAddress],
    ) -> Result<SendReceipt, MailError> {
        let mut content = Vec::new();
        if !html_body.is_empty() {
            content.push(Content {
                mime: "text/html",
                value: html_body,
            });
        }

        let payload = MailSendPayload {
            personalizations: [Personalization {
                to: recipients.iter().map(Address::from).collect(),
            }],
            from: from.into(),
            subject,
            content,
        };

        self.post(credential, &payload, recipients.len()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, header, method, path},
    };

    fn sender(server: &MockServer) -> SendGridSender {
        SendGridSender::new(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    fn from() -> EmailAddress {
        EmailAddress::with_name("support@testmail.com", "Platform Data Ingestion Status")
    }

    #[tokio::test]
    async fn single_send_posts_plain_and_html_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/mail/send"))
            .and(header("authorization", "Bearer SG.key"))
            .and(body_json(json!({
                "personalizations": [{ "to": [{ "email": "ops@co.com" }] }],
                "from": { "email": "support@testmail.com", "name": "Platform Data Ingestion Status" },
                "subject": "Pipeline X",
                "content": [
                    { "type": "text/plain", "value": "message" },
                    { "type": "text/html", "value": "<b>failed</b>" }
                ]
            })))
            .respond_with(ResponseTemplate::new(202).insert_header("X-Message-Id", "abc123"))
            .expect(1)
            .mount(&server)
            .await;

        let receipt = sender(&server)
            .send_single(
                &Credential::new("SG.key"),
                &from(),
                &EmailAddress::new("ops@co.com"),
                "Pipeline X",
                "message",
                "<b>failed</b>",
            )
            .await
            .unwrap();

        assert_eq!(
            receipt,
            SendReceipt {
                accepted: 1,
                reference: Some("abc123".to_owned()),
            }
        );
    }

    #[tokio::test]
    async fn batch_send_lists_every_recipient_in_one_personalization() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/mail/send"))
            .and(body_json(json!({
                "personalizations": [{ "to": [
                    { "email": "a@x.com" },
                    { "email": "b@x.com" }
                ] }],
                "from": { "email": "support@testmail.com", "name": "Platform Data Ingestion Status" },
                "subject": "Pipeline X",
                "content": [{ "type": "text/html", "value": "body" }]
            })))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let receipt = sender(&server)
            .send_batch(
                &Credential::new("SG.key"),
                &from(),
                "Pipeline X",
                "body",
                &[EmailAddress::new("a@x.com"), EmailAddress::new("b@x.com")],
            )
            .await
            .unwrap();

        assert_eq!(receipt.accepted, 2);
        assert_eq!(receipt.reference, None);
    }

    #[tokio::test]
    async fn batch_send_omits_content_for_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/mail/send"))
            .and(body_json(json!({
                "personalizations": [{ "to": [
                    { "email": "a@x.com" },
                    { "email": "b@x.com" }
                ] }],
                "from": { "email": "support@testmail.com", "name": "Platform Data Ingestion Status" },
                "subject": "s"
            })))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        sender(&server)
            .send_batch(
                &Credential::new("SG.key"),
                &from(),
                "s",
                "",
                &[EmailAddress::new("a@x.com"), EmailAddress::new("b@x.com")],
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn non_success_status_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/mail/send"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let err = sender(&server)
            .send_single(
                &Credential::new("wrong"),
                &from(),
                &EmailAddress::new("ops@co.com"),
                "s",
                "message",
                "body",
            )
            .await
            .unwrap_err();

        match err {
            MailError::Rejected { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "bad key");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn endpoint_ignores_trailing_slash() {
        let sender = SendGridSender::new("https://api.sendgrid.com/", Duration::from_secs(1))
            .unwrap();
        assert_eq!(sender.endpoint, "https://api.sendgrid.com/v3/mail/send");
    }
}
