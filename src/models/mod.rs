use serde::Deserialize;

use std::fmt;

use crate::dto::NotificationQuery;

/// Mail-provider API key supplied per request. Never printed.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Address handed to the mail provider as-is. Format problems surface at
/// the provider boundary, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress {
    address: String,
    name: Option<String>,
}

impl EmailAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: None,
        }
    }

    pub fn with_name(address: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: Some(name.into()),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name} <{}>", self.address),
            None => f.write_str(&self.address),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Recipient list is empty")]
    EmptyRecipientList,

    #[error("Recipient #{position} in the list is empty")]
    EmptyRecipient { position: usize },
}

/// Comma-delimited recipient list that holds at least one address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipients {
    raw: String,
    addresses: Vec<EmailAddress>,
}

impl Recipients {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        if raw.trim().is_empty() {
            return Err(ValidationError::EmptyRecipientList);
        }

        let addresses = raw
            .split(',')
            .enumerate()
            .map(|(idx, part)| {
                if part.trim().is_empty() {
                    Err(ValidationError::EmptyRecipient { position: idx + 1 })
                } else {
                    Ok(EmailAddress::new(part))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            raw: raw.to_owned(),
            addresses,
        })
    }

    pub fn count(&self) -> usize {
        self.addresses.len()
    }

    /// More than one address goes out as one batched message; a single
    /// address is sent from the unsplit raw value.
    pub fn route(&self) -> Route {
        if self.addresses.len() > 1 {
            Route::Batch(self.addresses.clone())
        } else {
            Route::Single(EmailAddress::new(self.raw.clone()))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Single(EmailAddress),
    Batch(Vec<EmailAddress>),
}

impl Route {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Single(_) => "single",
            Self::Batch(_) => "batch",
        }
    }
}

#[derive(Debug, Clone)]
pub struct NotificationRequest {
    pub credential: Credential,
    pub recipients: Recipients,
    pub message: String,
    pub subject: String,
    pub error_text: String,
}

impl TryFrom<NotificationQuery> for NotificationRequest {
    type Error = ValidationError;

    fn try_from(query: NotificationQuery) -> Result<Self, Self::Error> {
        Ok(Self {
            recipients: Recipients::parse(&query.tolist)?,
            credential: query.keyval,
            message: query.message,
            subject: query.subject,
            error_text: query.errormessage,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedMessage {
    pub subject: String,
    pub html_body: String,
    pub route: Route,
}

/// What the provider reported back for an accepted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    pub accepted: usize,
    pub reference: Option<String>,
}
