use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::Settings;

#[derive(Debug, Clone, PartialEq)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Sent { id: Option<String> },
    /// Nothing went out; the string says why.
    Skipped(String),
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("mail provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("mail provider rejected the message: {status} {body}")]
    Rejected { status: u16, body: String },
}

/// Outbound mail capability handed to the notifier at startup.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutboundEmail) -> Result<Delivery, MailError>;
}

/// Picks the Resend client when an API key is configured, the no-op one
/// otherwise.
pub fn from_settings(settings: &Settings) -> Arc<dyn Mailer> {
    if settings.resend_api_key.trim().is_empty() {
        tracing::warn!("RESEND_API_KEY is not set; alert emails will only be logged");
        return Arc::new(DisabledMailer);
    }

    Arc::new(ResendMailer::new(
        settings.resend_api_url.clone(),
        settings.resend_api_key.clone(),
        settings.mail_from.clone(),
        settings.notify_timeout,
    ))
}

pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send(&self, email: OutboundEmail) -> Result<Delivery, MailError> {
        tracing::warn!(
            to = %email.to,
            subject = %email.subject,
            body = %email.html,
            "mail provider not configured; email not sent"
        );
        Ok(Delivery::Skipped(
            "Email service not configured (RESEND_API_KEY missing); notification logged only"
                .to_string(),
        ))
    }
}

#[derive(Clone)]
pub struct ResendMailer {
    http: Client,
    base_url: String,
    api_key: String,
    from: String,
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

#[derive(Deserialize)]
struct SendEmailResponse {
    #[serde(default)]
    id: Option<String>,
}

impl ResendMailer {
    pub fn new(base_url: String, api_key: String, from: String, timeout: Duration) -> Self {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            from,
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: OutboundEmail) -> Result<Delivery, MailError> {
        let url = format!("{}/emails", self.base_url);
        let body = SendEmailRequest {
            from: &self.from,
            to: [email.to.as_str()],
            subject: &email.subject,
            html: &email.html,
        };

        let res = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(MailError::Rejected { status, body });
        }

        let sent = res.json::<SendEmailResponse>().await.unwrap_or(SendEmailResponse { id: None });
        tracing::debug!(to = %email.to, email_id = ?sent.id, "alert email sent");

        Ok(Delivery::Sent { id: sent.id })
    }
}
