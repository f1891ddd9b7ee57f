//! Transactional email gateway
//!
//! Content/templates are out of scope; the trigger points are the contract.
//! Every send is dispatched best-effort by the calling service; a failed
//! email never rolls back a booking.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid address: {0}")]
    Address(String),

    #[error("SMTP error: {0}")]
    Smtp(String),
}

/// Email side channel consumed by the booking and admin services
#[async_trait]
pub trait Mailer: Send + Sync + fmt::Debug {
    /// Deliver a single message
    async fn deliver(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError>;

    async fn booking_confirmation(&self, to: &str, number: &str) -> Result<(), MailError> {
        self.deliver(
            to,
            "Your appointment is confirmed",
            &format!("Your booking {number} has been confirmed."),
        )
        .await
    }

    async fn booking_cancelled(&self, to: &str, number: &str) -> Result<(), MailError> {
        self.deliver(
            to,
            "Your appointment was cancelled",
            &format!("Your booking {number} has been cancelled."),
        )
        .await
    }

    async fn provider_new_booking(&self, to: &str, number: &str) -> Result<(), MailError> {
        self.deliver(
            to,
            "New appointment booked",
            &format!("A new booking {number} was made against one of your slots."),
        )
        .await
    }
}

/// SMTP configuration
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
}

/// Production mailer over SMTP
#[derive(Clone)]
pub struct SmtpMailer {
    config: SmtpConfig,
    credentials: Credentials,
}

impl fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("server", &self.config.server)
            .field("from", &self.config.from_email)
            .finish()
    }
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Self {
        let credentials = Credentials::new(config.username.clone(), config.password.clone());
        Self {
            config,
            credentials,
        }
    }

    /// A fresh transport per send avoids stale pooled connections
    fn build_transport(&self) -> Result<SmtpTransport, MailError> {
        Ok(SmtpTransport::relay(&self.config.server)
            .map_err(|e| MailError::Smtp(format!("SMTP relay error: {e}")))?
            .port(self.config.port)
            .credentials(self.credentials.clone())
            .build())
    }

    fn from_header(&self) -> String {
        format!("{} <{}>", self.config.from_name, self.config.from_email)
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn deliver(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        let email = Message::builder()
            .from(
                self.from_header()
                    .parse()
                    .map_err(|e| MailError::Address(format!("Invalid from address: {e}")))?,
            )
            .to(to
                .parse()
                .map_err(|e| MailError::Address(format!("Invalid to address: {e}")))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| MailError::Smtp(format!("Failed to build email: {e}")))?;

        let transport = self.build_transport()?;

        tokio::task::spawn_blocking(move || {
            transport
                .send(&email)
                .map(|_| ())
                .map_err(|e| MailError::Smtp(format!("Failed to send email: {e}")))
        })
        .await
        .map_err(|e| MailError::Smtp(format!("Email task failed: {e}")))?
    }
}

/// Mailer that drops everything (tests, local development without SMTP)
#[derive(Debug, Default, Clone)]
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn deliver(&self, to: &str, subject: &str, _body: &str) -> Result<(), MailError> {
        tracing::debug!(to, subject, "noop mailer: dropping email");
        Ok(())
    }
}
