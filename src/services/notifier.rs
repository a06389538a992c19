//! Outbound webhook client for chat notifications.
//!
//! Posts Discord-compatible JSON messages with a bounded timeout.
//! Fire-and-forget: no retries, no state beyond the outbound call.

use crate::catalog::format_amount;
use crate::config::WebhookConfig;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("webhook URL is not configured")]
    NotConfigured,

    #[error("webhook request timed out")]
    Timeout,

    #[error("could not reach the webhook endpoint: {0}")]
    Transport(reqwest::Error),

    #[error("webhook returned status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
}

#[derive(Debug, Serialize)]
struct WebhookMessage<'a> {
    content: &'a str,
}

/// Webhook notification client.
#[derive(Clone)]
pub struct Notifier {
    client: Client,
    url: Option<String>,
    timeout: Duration,
}

impl Notifier {
    pub fn new(config: WebhookConfig) -> Self {
        Self {
            client: Client::new(),
            url: config.url,
            timeout: config.timeout,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.url.is_some()
    }

    /// POST a pre-formatted message to the webhook. Success is a 200
    /// or 204 response; anything else is surfaced as an error for the
    /// caller to decide on.
    pub async fn notify(&self, content: &str) -> Result<(), NotifyError> {
        let url = self.url.as_ref().ok_or(NotifyError::NotConfigured)?;

        let response = self
            .client
            .post(url)
            .json(&WebhookMessage { content })
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    NotifyError::Timeout
                } else {
                    NotifyError::Transport(err)
                }
            })?;

        let status = response.status();
        if status.as_u16() == 200 || status.as_u16() == 204 {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(NotifyError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            })
        }
    }
}

/// Message announcing a manually reported purchase.
pub fn purchase_message(username: &str, item: &str, price: Decimal) -> String {
    format!(
        "🛒 **Purchase Made!**\n👤 **Username:** {}\n📦 **Item:** {}\n💰 **Price:** ${}",
        username,
        item,
        format_amount(price)
    )
}

/// Message announcing a completed provider payment.
pub fn payment_success_message(
    username: &str,
    product_name: &str,
    amount: Decimal,
    transaction_id: &str,
) -> String {
    format!(
        "💰 **Payment Successful!**\n👤 **Username:** {}\n📦 **Product:** {}\n💳 **Amount:** ${}\n🆔 **PayPal Transaction:** {}",
        username,
        product_name,
        format_amount(amount),
        transaction_id
    )
}
