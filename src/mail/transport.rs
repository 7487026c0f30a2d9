//! Mail delivery backends.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use super::message::{Email, Mailbox};
use crate::config::MailConfig;

/// Connection timeout for the mail API.
const CONNECT_TIMEOUT_SECS: u64 = 10;
/// Read timeout for the mail API.
const READ_TIMEOUT_SECS: u64 = 30;
/// Total request timeout for the mail API.
const TOTAL_TIMEOUT_SECS: u64 = 30;

/// Mail delivery errors.
#[derive(Error, Debug)]
pub enum MailError {
    /// The transport is missing settings.
    #[error("mail transport not configured: {0}")]
    NotConfigured(String),

    /// The request could not be sent.
    #[error("mail request failed: {0}")]
    Request(String),

    /// The mail API answered with an error status.
    #[error("mail API rejected message (status={status}): {body}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },
}

/// A mail delivery backend.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Deliver one message.
    async fn deliver(&self, email: &Email) -> Result<(), MailError>;
}

/// Writes messages to the log instead of sending them.
#[derive(Debug, Default)]
pub struct LogTransport;

#[async_trait]
impl MailTransport for LogTransport {
    async fn deliver(&self, email: &Email) -> Result<(), MailError> {
        info!(to = %email.to, subject = %email.subject, "Mail (not sent)\n{}", email.text_body);
        Ok(())
    }
}

/// Keeps every delivered message in memory.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<Email>>,
}

impl RecordingTransport {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages delivered so far.
    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn deliver(&self, email: &Email) -> Result<(), MailError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(email.clone());
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiAddress {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiSendBody<'a> {
    sender: ApiAddress,
    to: Vec<ApiAddress>,
    subject: &'a str,
    html_content: &'a str,
    text_content: &'a str,
}

/// Sends messages through a transactional mail JSON API.
///
/// The payload follows the common `sender`/`to`/`subject`/`htmlContent`
/// shape and the key goes in an `api-key` header.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    api_url: String,
    api_key: Option<String>,
    sender: Mailbox,
}

impl HttpTransport {
    /// Create an HTTP transport from the mail settings.
    pub fn new(config: &MailConfig) -> Result<Self, MailError> {
        Self::with_timeout(config, Duration::from_secs(TOTAL_TIMEOUT_SECS))
    }

    /// Create an HTTP transport whose requests give up after `timeout`.
    ///
    /// Connect and read timeouts never exceed the total.
    pub fn with_timeout(config: &MailConfig, timeout: Duration) -> Result<Self, MailError> {
        let api_url = config
            .api_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| MailError::NotConfigured("mail.api_url is required".to_string()))?;

        let client = Client::builder()
            .connect_timeout(timeout.min(Duration::from_secs(CONNECT_TIMEOUT_SECS)))
            .read_timeout(timeout.min(Duration::from_secs(READ_TIMEOUT_SECS)))
            .timeout(timeout)
            .build()
            .map_err(|e| MailError::NotConfigured(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: api_url.to_string(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            sender: Mailbox::parse(&config.sender),
        })
    }
}

#[async_trait]
impl MailTransport for HttpTransport {
    async fn deliver(&self, email: &Email) -> Result<(), MailError> {
        let body = ApiSendBody {
            sender: ApiAddress {
                email: self.sender.email.clone(),
                name: self.sender.name.clone(),
            },
            to: vec![ApiAddress {
                email: email.to.clone(),
                name: None,
            }],
            subject: &email.subject,
            html_content: &email.html_body,
            text_content: &email.text_body,
        };

        let mut request = self
            .client
            .post(&self.api_url)
            .header("Accept", "application/json")
            .json(&body);
        if let Some(ref key) = self.api_key {
            request = request.header("api-key", key);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| MailError::Request(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let body = resp.text().await.unwrap_or_default();
        Err(MailError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
