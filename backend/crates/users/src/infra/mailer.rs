//! Mailers
//!
//! SMTP delivery via lettre with askama templates, a logging mailer for
//! deployments without SMTP, and an in-memory outbox for tests.

use std::sync::Arc;

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;

use crate::domain::gateway::{ActivationEmail, Mailer};
use crate::error::{UsersError, UsersResult};

#[derive(Template)]
#[template(path = "email/activation.html")]
struct ActivationEmailHtml<'a> {
    name: &'a str,
    activation_url: &'a str,
    site_name: &'a str,
}

#[derive(Template)]
#[template(path = "email/activation.txt")]
struct ActivationEmailText<'a> {
    name: &'a str,
    activation_url: &'a str,
    site_name: &'a str,
}

/// SMTP connection settings
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub from_address: String,
}

#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings) -> UsersResult<Self> {
        let credentials = Credentials::new(
            settings.username.clone(),
            settings.password.expose_secret().to_string(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
            .map_err(|e| UsersError::Mail(format!("SMTP setup failed: {e}")))?
            .port(settings.port)
            .credentials(credentials)
            .build();

        let from = settings
            .from_address
            .parse()
            .map_err(|_| UsersError::Mail(format!("Invalid from address: {}", settings.from_address)))?;

        Ok(Self { transport, from })
    }

    fn build_message(&self, email: &ActivationEmail) -> UsersResult<Message> {
        let html = ActivationEmailHtml {
            name: &email.recipient_name,
            activation_url: &email.activation_url,
            site_name: &email.site_name,
        }
        .render()
        .map_err(|e| UsersError::Mail(format!("Template error: {e}")))?;
        let text = ActivationEmailText {
            name: &email.recipient_name,
            activation_url: &email.activation_url,
            site_name: &email.site_name,
        }
        .render()
        .map_err(|e| UsersError::Mail(format!("Template error: {e}")))?;

        let to: Mailbox = email
            .to
            .as_str()
            .parse()
            .map_err(|_| UsersError::Mail(format!("Invalid recipient: {}", email.to)))?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(format!("Account activation on {}", email.site_name))
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html),
                    ),
            )
            .map_err(|e| UsersError::Mail(format!("Failed to build message: {e}")))
    }
}

impl Mailer for SmtpMailer {
    async fn send_activation(&self, email: &ActivationEmail) -> UsersResult<()> {
        let message = self.build_message(email)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| UsersError::Mail(e.to_string()))?;
        Ok(())
    }
}

/// Writes activation links to the log instead of sending them
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    async fn send_activation(&self, email: &ActivationEmail) -> UsersResult<()> {
        tracing::info!(
            to = %email.to,
            activation_url = %email.activation_url,
            "Activation email (not delivered, SMTP not configured)"
        );
        Ok(())
    }
}

/// Collects sent emails in memory
#[derive(Debug, Clone, Default)]
pub struct OutboxMailer {
    sent: Arc<Mutex<Vec<ActivationEmail>>>,
}

impl OutboxMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<ActivationEmail> {
        self.sent.lock().await.clone()
    }
}

impl Mailer for OutboxMailer {
    async fn send_activation(&self, email: &ActivationEmail) -> UsersResult<()> {
        self.sent.lock().await.push(email.clone());
        Ok(())
    }
}

/// Mailer selected at startup
#[derive(Clone)]
pub enum AppMailer {
    Smtp(SmtpMailer),
    Log(LogMailer),
}

impl Mailer for AppMailer {
    async fn send_activation(&self, email: &ActivationEmail) -> UsersResult<()> {
        match self {
            AppMailer::Smtp(mailer) => mailer.send_activation(email).await,
            AppMailer::Log(mailer) => mailer.send_activation(email).await,
        }
    }
}
