//! Human notification collaborator.
//!
//! Notifications are fire-and-forget emails through the Resend API: no
//! retry, no queuing. The pipeline only sees the [`Notifier`] trait.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Delivers a message to a human.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<()>;
}

/// Email notifier backed by the Resend API.
pub struct ResendNotifier {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    from: String,
}

#[derive(Debug, Serialize)]
struct EmailRequest<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    html: String,
}

impl ResendNotifier {
    pub fn new(api_base: String, api_key: String, from: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build notifier HTTP client")?;
        Ok(Self {
            client,
            api_base,
            api_key,
            from,
        })
    }
}

/// Plain-text body to minimal HTML, the way the alert mail is rendered.
fn to_html(body: &str) -> String {
    format!("<p>{}</p>", body.replace('\n', "<br>"))
}

#[async_trait]
impl Notifier for ResendNotifier {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<()> {
        let url = format!("{}/emails", self.api_base);
        let request = EmailRequest {
            from: &self.from,
            to: vec![recipient],
            subject,
            html: to_html(body),
        };

        debug!("Sending notification to {}: {}", recipient, subject);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("notifier unreachable")?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("email send failed: HTTP {}: {}", status, text));
        }

        debug!("Notification accepted for {}", recipient);
        Ok(())
    }
}
