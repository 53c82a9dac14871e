use anyhow::Context;
use async_trait::async_trait;
use lettre::message::{header, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;
use std::time::Duration;

use crate::shared::config::EmailConfig;

/// Outgoing mail used by alerts and digests
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &[String], subject: &str, text_body: &str) -> anyhow::Result<()>;

    /// Default recipients of operational mail
    fn admin_recipients(&self) -> Vec<String>;
}

/// Mailer for installations without an `[email]` section
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send(&self, to: &[String], subject: &str, _text_body: &str) -> anyhow::Result<()> {
        tracing::info!(
            "Email not configured, skipping '{}' to {} recipient(s)",
            subject,
            to.len()
        );
        Ok(())
    }

    fn admin_recipients(&self) -> Vec<String> {
        Vec::new()
    }
}

pub struct SmtpMailer {
    config: EmailConfig,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: EmailConfig) -> anyhow::Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .with_context(|| format!("Failed to create SMTP transport for {}", config.smtp_host))?
            .port(config.smtp_port)
            .timeout(Some(Duration::from_secs(30)));

        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            config,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &[String], subject: &str, text_body: &str) -> anyhow::Result<()> {
        for recipient in to {
            let message = build_message(&self.config.from, recipient, subject, text_body)?;
            self.transport
                .send(message)
                .await
                .with_context(|| format!("Failed to send email to {}", recipient))?;
            tracing::info!(to = %recipient, subject = %subject, "Email sent");
        }
        Ok(())
    }

    fn admin_recipients(&self) -> Vec<String> {
        self.config.admin_recipients.clone()
    }
}

fn build_message(from: &str, to: &str, subject: &str, text_body: &str) -> anyhow::Result<Message> {
    let from: Mailbox = from
        .parse()
        .with_context(|| format!("Invalid from address: {}", from))?;
    let to: Mailbox = to
        .parse()
        .with_context(|| format!("Invalid to address: {}", to))?;

    let body = MultiPart::alternative().singlepart(
        SinglePart::builder()
            .header(header::ContentType::TEXT_PLAIN)
            .body(text_body.to_string()),
    );

    Message::builder()
        .from(from)
        .to(to)
        .subject(subject)
        .multipart(body)
        .context("Failed to build message")
}

/// SMTP mailer when `[email]` is configured, otherwise the no-op one
pub fn from_config(email: Option<&EmailConfig>) -> anyhow::Result<Arc<dyn Mailer>> {
    match email {
        Some(cfg) => Ok(Arc::new(SmtpMailer::new(cfg.clone())?)),
        None => Ok(Arc::new(NoopMailer)),
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Mailer that keeps every message in memory
    #[derive(Default)]
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<(Vec<String>, String, String)>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, to: &[String], subject: &str, text_body: &str) -> anyhow::Result<()> {
            if let Ok(mut sent) = self.sent.lock() {
                sent.push((to.to_vec(), subject.to_string(), text_body.to_string()));
            }
            Ok(())
        }

        fn admin_recipients(&self) -> Vec<String> {
            vec!["ops@example.com".to_string()]
        }
    }
}
