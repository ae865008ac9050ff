use std::sync::Arc;

use crate::{
    classifier,
    dto::NotificationQuery,
    mailer::MailSender,
    models::{ComposedMessage, EmailAddress, NotificationRequest, Route, ValidationError},
};

/// Returned for every dispatched request, whether or not the provider
/// accepted the mail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Acknowledgement;

#[derive(Clone)]
pub struct NotificationService {
    mailer: Arc<dyn MailSender>,
    sender: EmailAddress,
    plain_text_body: String,
}

/// Appends the remediation hint for the request's error text (if any) to
/// its message and picks the send route from the recipient count.
pub fn compose(request: &NotificationRequest) -> ComposedMessage {
    let suggestion = if request.error_text.is_empty() {
        String::new()
    } else {
        classifier::classify(&request.error_text)
    };

    ComposedMessage {
        subject: request.subject.clone(),
        html_body: format!("{}{suggestion}", request.message),
        route: request.recipients.route(),
    }
}

impl NotificationService {
    pub fn new(mailer: Arc<dyn MailSender>, sender: EmailAddress, plain_text_body: String) -> Self {
        Self {
            mailer,
            sender,
            plain_text_body,
        }
    }

    /// Validates the query and sends the notification. Only an unusable
    /// recipient list is reported back; delivery failures are logged and
    /// still acknowledged.
    pub async fn dispatch(
        &self,
        query: NotificationQuery,
    ) -> Result<Acknowledgement, ValidationError> {
        let request = NotificationRequest::try_from(query)?;
        Ok(self.deliver(&request).await)
    }

    pub async fn deliver(&self, request: &NotificationRequest) -> Acknowledgement {
        let message = compose(request);
        let route = message.route.label();

        tracing::info!(
            route,
            recipients = request.recipients.count(),
            "Sending notification '{}'",
            message.subject
        );

        let outcome = match &message.route {
            Route::Single(to) => {
                self.mailer
                    .send_single(
                        &request.credential,
                        &self.sender,
                        to,
                        &message.subject,
                        &self.plain_text_body,
                        &message.html_body,
                    )
                    .await
            }
            Route::Batch(recipients) => {
                self.mailer
                    .send_batch(
                        &request.credential,
                        &self.sender,
                        &message.subject,
                        &message.html_body,
                        recipients,
                    )
                    .await
            }
        };

        match outcome {
            Ok(receipt) => tracing::info!(
                route,
                accepted = receipt.accepted,
                reference = receipt.reference.as_deref().unwrap_or("-"),
                "Notification mail sent"
            ),
            Err(e) => tracing::error!(route, "Failed to send notification mail: {e}"),
        }

        Acknowledgement
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{RecordingMailer, SentMail};
    use super::*;
    use crate::{classifier::FailureCategory, models::Credential};
    use pretty_assertions::assert_eq;

    fn identity() -> EmailAddress {
        EmailAddress::with_name("support@testmail.com", "Platform Data Ingestion Status")
    }

    fn service(mailer: Arc<RecordingMailer>) -> NotificationService {
        NotificationService::new(mailer, identity(), "message".to_owned())
    }

    fn query(tolist: &str, message: &str, errormessage: &str) -> NotificationQuery {
        NotificationQuery {
            keyval: Credential::new("SG.key"),
            tolist: tolist.to_owned(),
            message: message.to_owned(),
            subject: "Pipeline X".to_owned(),
            errormessage: errormessage.to_owned(),
        }
    }

    #[tokio::test]
    async fn single_recipient_uses_single_path_with_unsplit_address() {
        let mailer = Arc::new(RecordingMailer::default());
        let ack = service(mailer.clone())
            .dispatch(query("a@x.com", "Load failed.", "file is not available"))
            .await;

        assert_eq!(ack, Ok(Acknowledgement));
        assert_eq!(
            mailer.sent(),
            vec![SentMail::Single {
                credential: "SG.key".to_owned(),
                from: identity(),
                to: EmailAddress::new("a@x.com"),
                subject: "Pipeline X".to_owned(),
                plain_text_body: "message".to_owned(),
                html_body: format!(
                    "Load failed.{}",
                    FailureCategory::MissingSourceFile.suggestion()
                ),
            }]
        );
    }

    #[tokio::test]
    async fn several_recipients_use_one_batch_send_in_order() {
        let mailer = Arc::new(RecordingMailer::default());
        service(mailer.clone())
            .dispatch(query("a@x.com,b@x.com", "Load failed.", ""))
            .await
            .unwrap();

        assert_eq!(
            mailer.sent(),
            vec![SentMail::Batch {
                credential: "SG.key".to_owned(),
                from: identity(),
                subject: "Pipeline X".to_owned(),
                html_body: "Load failed.".to_owned(),
                recipients: vec![EmailAddress::new("a@x.com"), EmailAddress::new("b@x.com")],
            }]
        );
    }

    #[tokio::test]
    async fn empty_recipient_list_is_rejected_without_sending() {
        let mailer = Arc::new(RecordingMailer::default());
        let result = service(mailer.clone())
            .dispatch(query("", "Load failed.", ""))
            .await;

        assert_eq!(result, Err(ValidationError::EmptyRecipientList));
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn delivery_failure_is_still_acknowledged() {
        let mailer = Arc::new(RecordingMailer::failing());
        let svc = service(mailer.clone());

        let single = svc.dispatch(query("a@x.com", "m", "")).await;
        let batch = svc.dispatch(query("a@x.com,b@x.com", "m", "")).await;

        assert_eq!(single, Ok(Acknowledgement));
        assert_eq!(batch, Ok(Acknowledgement));
        assert_eq!(mailer.sent().len(), 2);
    }

    #[tokio::test]
    async fn rest_source_failure_end_to_end() {
        let mailer = Arc::new(RecordingMailer::default());
        service(mailer.clone())
            .dispatch(query(
                "ops@co.com",
                "Pipeline X failed.",
                "RestSourceCallFailed: timeout",
            ))
            .await
            .unwrap();

        let expected_body = "Pipeline X failed.<br>Suggested Action: <br>\t\t\t\t 1.Please verify the data source URL and the credentials are correct.<br>\t\t\t\t 2.Rerun the pipeline after ensuring the data source URL and the credentials are correct.";
        match mailer.sent().as_slice() {
            [SentMail::Single {
                to,
                subject,
                html_body,
                ..
            }] => {
                assert_eq!(to, &EmailAddress::new("ops@co.com"));
                assert_eq!(subject, "Pipeline X");
                assert_eq!(html_body, expected_body);
            }
            other => panic!("expected one single send, got {other:?}"),
        }
    }

    #[test]
    fn compose_without_error_text_keeps_message_as_is() {
        let request = NotificationRequest::try_from(query("a@x.com", "<p>ok</p>", "")).unwrap();
        let message = compose(&request);

        assert_eq!(message.html_body, "<p>ok</p>");
        assert_eq!(message.subject, "Pipeline X");
        assert_eq!(message.route, Route::Single(EmailAddress::new("a@x.com")));
    }

    #[test]
    fn compose_appends_fallback_for_unknown_error() {
        let request =
            NotificationRequest::try_from(query("a@x.com", "Failed.", "boom")).unwrap();

        assert_eq!(
            compose(&request).html_body,
            "Failed.<br>Suggested Action: Please contact the technical team to solve the issue."
        );
    }
}
