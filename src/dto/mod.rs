use serde::Deserialize;

use crate::models::Credential;

/// Query parameters of the `SendMail` trigger. Every field may be absent;
/// recipient validation happens when the request is built from it.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct NotificationQuery {
    pub keyval: Credential,
    pub tolist: String,
    pub message: String,
    pub subject: String,
    pub errormessage: String,
}
