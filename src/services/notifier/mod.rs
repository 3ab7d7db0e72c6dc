// src/services/notifier/mod.rs

//! Change notification service.
//!
//! Renders a [`ChangeSet`] into a two-part (plain text + HTML) email and
//! sends it over SMTP with implicit TLS.

pub mod render;

use std::fmt;

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::error::Result;
use crate::models::{ChangeSet, Config, EmailConfig, State, TrackedPage};

pub use render::{EmailContent, Renderer};

/// Sink for change reports.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Report the changes of a run.
    ///
    /// Returns `Ok(true)` if a notification was sent and `Ok(false)` when
    /// there was nothing to report or delivery is not configured.
    async fn notify(&self, changes: &ChangeSet, state: &State) -> Result<bool>;
}

/// SMTP login and recipient, sourced from the environment.
#[derive(Clone)]
pub struct EmailCredentials {
    pub sender: String,
    pub password: String,
    pub recipient: String,
}

impl EmailCredentials {
    pub const SENDER_VAR: &'static str = "SENDER_EMAIL";
    pub const PASSWORD_VAR: &'static str = "SENDER_PASSWORD";
    pub const RECIPIENT_VAR: &'static str = "RECIPIENT_EMAIL";

    /// Read credentials from `SENDER_EMAIL`, `SENDER_PASSWORD`, and `RECIPIENT_EMAIL`.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read credentials through `lookup`; all three values must be non-empty.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Some(Self {
            sender: get(Self::SENDER_VAR)?,
            password: get(Self::PASSWORD_VAR)?,
            recipient: get(Self::RECIPIENT_VAR)?,
        })
    }
}

impl fmt::Debug for EmailCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailCredentials")
            .field("sender", &self.sender)
            .field("password", &"<redacted>")
            .field("recipient", &self.recipient)
            .finish()
    }
}

/// Notifier that emails change reports.
pub struct EmailNotifier {
    config: EmailConfig,
    pages: Vec<TrackedPage>,
    credentials: Option<EmailCredentials>,
}

impl EmailNotifier {
    pub fn new(config: &Config, credentials: Option<EmailCredentials>) -> Self {
        Self {
            config: config.email.clone(),
            pages: config.pages.clone(),
            credentials,
        }
    }

    /// Render the notification for a run, if there is anything to report.
    pub fn render(&self, changes: &ChangeSet, state: &State) -> Option<EmailContent> {
        Renderer::new(&self.pages, self.config.preview_count).render(changes, state)
    }

    /// Build the MIME message for rendered content.
    pub fn build_message(
        &self,
        credentials: &EmailCredentials,
        content: EmailContent,
    ) -> Result<Message> {
        let from: Mailbox = credentials.sender.parse()?;
        let to: Mailbox = credentials.recipient.parse()?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(content.subject)
            .multipart(MultiPart::alternative_plain_html(content.text, content.html))?;
        Ok(message)
    }

    async fn send(&self, credentials: &EmailCredentials, message: Message) -> Result<()> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)?
            .port(self.config.smtp_port)
            .credentials(Credentials::new(
                credentials.sender.clone(),
                credentials.password.clone(),
            ))
            .build();

        transport.send(message).await?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, changes: &ChangeSet, state: &State) -> Result<bool> {
        let Some(content) = self.render(changes, state) else {
            log::debug!("Nothing to report; no email sent");
            return Ok(false);
        };

        let Some(credentials) = &self.credentials else {
            log::warn!("Email credentials not configured. Skipping email notification.");
            return Ok(false);
        };

        let message = self.build_message(credentials, content)?;
        self.send(credentials, message).await?;

        log::info!("Email sent to {}", credentials.recipient);
        Ok(true)
    }
}
