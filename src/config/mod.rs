use serde::{Deserialize, Serialize};

use std::{env, fs, path::Path, str::FromStr, time::Duration};

use crate::models::EmailAddress;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub port: u16,
    #[serde(default)]
    pub provider: Provider,
    #[serde(default)]
    pub sender: SenderConfig,
    #[serde(default = "default_plain_text_body")]
    pub plain_text_body: String,
    #[serde(default)]
    pub sendgrid: SendGridConfig,
    #[serde(default)]
    pub smtp: SmtpConfig,
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Sendgrid,
    Smtp,
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sendgrid" => Ok(Self::Sendgrid),
            "smtp" => Ok(Self::Smtp),
            other => Err(format!("unknown mail provider '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SenderConfig {
    pub address: String,
    pub name: String,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            address: "support@testmail.com".to_owned(),
            name: "Platform Data Ingestion Status".to_owned(),
        }
    }
}

impl SenderConfig {
    pub fn identity(&self) -> EmailAddress {
        EmailAddress::with_name(self.address.clone(), self.name.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendGridConfig {
    pub api_base: String,
}

impl Default for SendGridConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.sendgrid.com".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub relay: String,
    pub username: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            relay: "smtp.sendgrid.net".to_owned(),
            username: "apikey".to_owned(),
        }
    }
}

fn default_plain_text_body() -> String {
    "message".to_owned()
}

const fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

pub fn from_yaml(contents: &str) -> Result<Config, Box<dyn std::error::Error>> {
    serde_yaml::from_str(contents).map_err(Into::into)
}

fn load_from_env() -> Result<Config, Box<dyn std::error::Error>> {
    let port = env::var("NOTIFIER_PORT")
        .map_err(|_| "NOTIFIER_PORT environment variable is required")?
        .parse::<u16>()
        .map_err(|e| format!("Failed to parse NOTIFIER_PORT: {e}"))?;

    let provider = match env::var("NOTIFIER_PROVIDER") {
        Ok(value) => value.parse::<Provider>()?,
        Err(_) => Provider::default(),
    };

    let request_timeout = match env::var("NOTIFIER_REQUEST_TIMEOUT") {
        Ok(value) => humantime_serde::re::humantime::parse_duration(&value)
            .map_err(|e| format!("Failed to parse NOTIFIER_REQUEST_TIMEOUT: {e}"))?,
        Err(_) => default_request_timeout(),
    };

    let mut sender = SenderConfig::default();
    if let Ok(address) = env::var("NOTIFIER_SENDER_ADDRESS") {
        sender.address = address;
    }
    if let Ok(name) = env::var("NOTIFIER_SENDER_NAME") {
        sender.name = name;
    }

    let mut sendgrid = SendGridConfig::default();
    if let Ok(api_base) = env::var("NOTIFIER_SENDGRID_API_BASE") {
        sendgrid.api_base = api_base;
    }

    let mut smtp = SmtpConfig::default();
    if let Ok(relay) = env::var("NOTIFIER_SMTP_RELAY") {
        smtp.relay = relay;
    }
    if let Ok(username) = env::var("NOTIFIER_SMTP_USERNAME") {
        smtp.username = username;
    }

    Ok(Config {
        port,
        provider,
        sender,
        plain_text_body: env::var("NOTIFIER_PLAIN_TEXT_BODY")
            .unwrap_or_else(|_| default_plain_text_body()),
        sendgrid,
        smtp,
        request_timeout,
    })
}

pub fn load_config() -> Result<Config, Box<dyn std::error::Error>> {
    // Retrieve env variable
    let config_path = env::var("NOTIFIER_CONFIG").unwrap_or_else(|_| "config.yaml".to_string());

    // Try env path
    if Path::new(&config_path).exists() {
        return from_yaml(&fs::read_to_string(&config_path)?);
    }

    // Fallback to config.yaml
    if Path::new("config.yaml").exists() {
        tracing::warn!(
            "Config file '{}' not found, falling back to 'config.yaml'",
            config_path
        );
        return from_yaml(&fs::read_to_string("config.yaml")?);
    }

    // Fallback to config.example.yaml
    if Path::new("config.example.yaml").exists() {
        tracing::warn!(
            "Config file '{}' and 'config.yaml' not found, falling back to 'config.example.yaml'\
             \n This file should not be used and should be replaced with actual data",
            config_path
        );
        return from_yaml(&fs::read_to_string("config.example.yaml")?);
    }

    // Fallback to environment variables
    tracing::info!(
        "No config file found, attempting to load configuration from environment variables"
    );
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Successfully loaded configuration from environment variables");
            Ok(config)
        }
        Err(e) => Err(format!(
            "Config file not found and environment variables are incomplete. \
             Tried: '{config_path}', 'config.yaml', 'config.example.yaml', and environment variables. \
             Error: {e}"
        )
        .into()),
    }
}
