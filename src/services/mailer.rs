//! Notification mail dispatch
//!
//! Three drivers: `log` (development default, nothing leaves the process),
//! `sendgrid` (HTTP API) and `smtp` (lettre relay).

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{MailConfig, MailDriver};

/// A plain-text notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<()>;
}

pub type DynMailer = Arc<dyn Mailer>;

/// Build the configured mail driver
pub fn create_mailer(config: &MailConfig) -> Result<DynMailer> {
    match config.driver {
        MailDriver::Log => Ok(Arc::new(LogMailer)),
        MailDriver::Sendgrid => {
            let api_key = config
                .sendgrid_api_key
                .clone()
                .filter(|k| !k.is_empty())
                .ok_or_else(|| anyhow!("mail.driver is sendgrid but no API key is configured"))?;
            Ok(Arc::new(SendGridMailer::new(
                api_key,
                &config.sendgrid_url,
                &config.sender,
                &config.sender_name,
            )?))
        }
        MailDriver::Smtp => Ok(Arc::new(SmtpMailer::from_config(config)?)),
    }
}

/// Writes mail to the log instead of sending it
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<()> {
        tracing::info!(
            to = %mail.to,
            subject = %mail.subject,
            "Mock email sent (no mail driver configured):\n{}",
            mail.body
        );
        Ok(())
    }
}

/// SendGrid v3 `mail/send`
pub struct SendGridMailer {
    client: reqwest::Client,
    api_key: String,
    url: String,
    sender: String,
    sender_name: String,
}

impl SendGridMailer {
    pub fn new(api_key: String, url: &str, sender: &str, sender_name: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            api_key,
            url: url.to_string(),
            sender: sender.to_string(),
            sender_name: sender_name.to_string(),
        })
    }

    fn payload(&self, mail: &OutgoingMail) -> serde_json::Value {
        json!({
            "personalizations": [{ "to": [{ "email": mail.to }] }],
            "from": { "email": self.sender, "name": self.sender_name },
            "subject": mail.subject,
            "content": [{ "type": "text/plain", "value": mail.body }],
        })
    }
}

#[async_trait]
impl Mailer for SendGridMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&self.payload(&mail))
            .send()
            .await
            .context("Failed to reach SendGrid")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("SendGrid error {}: {}", status, text));
        }
        Ok(())
    }
}

/// SMTP relay with credentials
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn from_config(config: &MailConfig) -> Result<Self> {
        let host = config
            .smtp_host
            .as_deref()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| anyhow!("mail.driver is smtp but no smtp_host is configured"))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .map_err(|e| anyhow!("Failed to create SMTP transport: {}", e))?
            .port(config.smtp_port);
        if let (Some(user), Some(pass)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from: format!("{} <{}>", config.sender_name, config.sender),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<()> {
        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| anyhow!("Invalid from address: {}", e))?,
            )
            .to(mail
                .to
                .parse()
                .map_err(|e| anyhow!("Invalid to address: {}", e))?)
            .subject(mail.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body)
            .map_err(|e| anyhow!("Failed to build email: {}", e))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| anyhow!("Failed to send email: {}", e))?;
        Ok(())
    }
}
