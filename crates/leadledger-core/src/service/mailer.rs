//! Mail sender contract and HTTP transport.
//!
//! The core only talks to [`MailSender`]. [`HttpMailer`] delivers through a
//! transactional email API that accepts a JSON message at `<api_url>/emails`
//! with a bearer API key.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

/// Errors that can occur while sending mail.
///
/// All of these are reported, never fatal: callers decide whether to retry,
/// log or surface them.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// Connection, TLS or timeout failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The provider refused the message.
    #[error("Rejected by provider ({status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body or reason.
        message: String,
    },

    /// Invalid address.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

impl From<reqwest::Error> for SendError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// An email message to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain text body.
    pub text: String,
    /// HTML body.
    pub html: Option<String>,
    /// Reply-To address.
    pub reply_to: Option<String>,
}

impl OutgoingEmail {
    /// Creates a new plain text message.
    #[must_use]
    pub fn new(
        to: impl Into<String>,
        subject: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            text: text.into(),
            html: None,
            reply_to: None,
        }
    }

    /// Adds an HTML alternative.
    #[must_use]
    pub fn html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    /// Sets the Reply-To address.
    #[must_use]
    pub fn reply_to(mut self, address: impl Into<String>) -> Self {
        self.reply_to = Some(address.into());
        self
    }
}

/// Outbound email transport.
#[async_trait]
pub trait MailSender: Send + Sync {
    /// Send one message. `Ok` means the transport confirmed acceptance.
    async fn send(&self, email: &OutgoingEmail) -> Result<(), SendError>;
}

/// Settings for [`HttpMailer`].
#[derive(Debug, Clone)]
pub struct HttpMailerConfig {
    /// API base URL, e.g. `https://api.resend.com`.
    pub api_url: String,
    /// Bearer API key.
    pub api_key: String,
    /// From header, e.g. `Acme Buyers <hello@acme.example>`.
    pub from: String,
    /// Request timeout.
    pub timeout: Duration,
}

/// JSON body accepted by the email API.
#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

/// Mail sender that posts to a transactional email HTTP API.
#[derive(Debug, Clone)]
pub struct HttpMailer {
    config: HttpMailerConfig,
    http_client: Client,
}

impl HttpMailer {
    /// Creates a new mailer.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: HttpMailerConfig) -> Result<Self, SendError> {
        let http_client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            config,
            http_client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/emails", self.config.api_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl MailSender for HttpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), SendError> {
        if !email.to.contains('@') {
            return Err(SendError::InvalidAddress(email.to.clone()));
        }

        let body = ApiMessage {
            from: &self.config.from,
            to: [&email.to],
            subject: &email.subject,
            text: &email.text,
            html: email.html.as_deref(),
            reply_to: email.reply_to.as_deref(),
        };

        let response = self
            .http_client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SendError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        debug!(to = %email.to, subject = %email.subject, "Email accepted");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-process mail sender for tests.

    use std::collections::HashSet;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::{MailSender, OutgoingEmail, SendError};

    /// Records every message; fails for chosen recipients.
    #[derive(Debug, Default)]
    pub struct RecordingMailer {
        sent: Mutex<Vec<OutgoingEmail>>,
        failing: Mutex<HashSet<String>>,
        attempts: Mutex<u32>,
    }

    #[allow(clippy::unwrap_used)]
    impl RecordingMailer {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make sends to this address fail.
        pub fn fail_for(&self, address: &str) {
            self.failing.lock().unwrap().insert(address.to_string());
        }

        /// Let sends to this address succeed again.
        pub fn recover(&self, address: &str) {
            self.failing.lock().unwrap().remove(address);
        }

        pub fn sent(&self) -> Vec<OutgoingEmail> {
            self.sent.lock().unwrap().clone()
        }

        pub fn sent_to(&self, address: &str) -> usize {
            self.sent().iter().filter(|m| m.to == address).count()
        }

        pub fn attempts(&self) -> u32 {
            *self.attempts.lock().unwrap()
        }
    }

    #[async_trait]
    #[allow(clippy::unwrap_used)]
    impl MailSender for RecordingMailer {
        async fn send(&self, email: &OutgoingEmail) -> Result<(), SendError> {
            *self.attempts.lock().unwrap() += 1;
            if self.failing.lock().unwrap().contains(&email.to) {
                return Err(SendError::Transport("connection reset".to_string()));
            }
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }
}
