//! Manual purchase-report endpoint.
//!
//! Validates the reported purchase and announces it on the webhook.
//! Unlike the payment-execution flow, a missing or failing webhook is
//! fatal here: the whole point of the endpoint is the notification.

use axum::extract::rejection::JsonRejection;
use axum::{extract::State, Json};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::catalog::format_amount;
use crate::error::AppError;
use crate::services::notifier::{purchase_message, NotifyError};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    pub username: Option<String>,
    pub item: Option<String>,
    /// Accepts a JSON number or a numeric string.
    pub price: Option<Value>,
}

/// A validated purchase report. Constructed per request, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseNotification {
    pub username: String,
    pub item: String,
    pub price: Decimal,
}

/// Validate field presence, trim text fields, and coerce the price to
/// a non-negative decimal. Error messages are part of the endpoint's
/// contract.
fn validate(payload: &PurchaseRequest) -> Result<PurchaseNotification, AppError> {
    let mut missing = Vec::new();
    if payload.username.is_none() {
        missing.push("username");
    }
    if payload.item.is_none() {
        missing.push("item");
    }
    if payload.price.is_none() || matches!(payload.price, Some(Value::Null)) {
        missing.push("price");
    }
    if !missing.is_empty() {
        return Err(AppError::Validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }

    let username = payload.username.as_deref().unwrap_or_default().trim();
    if username.is_empty() {
        return Err(AppError::Validation("Username cannot be empty".to_string()));
    }

    let item = payload.item.as_deref().unwrap_or_default().trim();
    if item.is_empty() {
        return Err(AppError::Validation("Item cannot be empty".to_string()));
    }

    let price = parse_price(payload.price.as_ref().unwrap_or(&Value::Null))
        .ok_or_else(|| AppError::Validation("Price must be a valid number".to_string()))?;
    if price.is_sign_negative() {
        return Err(AppError::Validation("Price cannot be negative".to_string()));
    }

    Ok(PurchaseNotification {
        username: username.to_string(),
        item: item.to_string(),
        price,
    })
}

fn parse_price(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(number) => number.to_string().parse().ok(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

pub async fn handle_purchase(
    State(state): State<AppState>,
    payload: Result<Json<PurchaseRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(payload) = payload.map_err(super::invalid_json)?;
    let purchase = validate(&payload)?;

    let message = purchase_message(&purchase.username, &purchase.item, purchase.price);
    state.notifier.notify(&message).await.map_err(|err| {
        tracing::error!(error = %err, "Discord webhook notification failed");
        match err {
            NotifyError::NotConfigured => AppError::NotConfigured {
                error: "Discord webhook not configured".to_string(),
                message: "Please set DISCORD_WEBHOOK_URL environment variable".to_string(),
            },
            NotifyError::Timeout => AppError::UpstreamUnavailable {
                error: "Discord notification timeout".to_string(),
                message: "The Discord webhook request timed out".to_string(),
            },
            NotifyError::Transport(_) => AppError::UpstreamUnavailable {
                error: "Failed to send Discord notification".to_string(),
                message: "Could not connect to Discord webhook".to_string(),
            },
            NotifyError::UnexpectedStatus { status, .. } => AppError::UpstreamRejected {
                error: "Failed to send Discord notification".to_string(),
                message: Some(format!("Discord API returned status {}", status)),
            },
        }
    })?;

    tracing::info!(
        username = %purchase.username,
        item = %purchase.item,
        price = %purchase.price,
        "Purchase notification sent successfully"
    );

    Ok(Json(json!({
        "status": "success",
        "message": "Purchase recorded and Discord notification sent!",
        "data": {
            "username": purchase.username,
            "item": purchase.item,
            "price": format_amount(purchase.price),
        }
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request(username: Option<&str>, item: Option<&str>, price: Option<Value>) -> PurchaseRequest {
        PurchaseRequest {
            username: username.map(str::to_string),
            item: item.map(str::to_string),
            price,
        }
    }

    #[test]
    fn accepts_numeric_price() {
        let purchase =
            validate(&request(Some("alice"), Some("Mod"), Some(json!(3)))).unwrap();
        assert_eq!(purchase.price, dec!(3));
        assert_eq!(purchase.username, "alice");
    }

    #[test]
    fn accepts_price_as_numeric_string() {
        let purchase =
            validate(&request(Some("alice"), Some("Mod"), Some(json!("3.50")))).unwrap();
        assert_eq!(purchase.price, dec!(3.50));
    }

    #[test]
    fn trims_whitespace_from_text_fields() {
        let purchase =
            validate(&request(Some("  alice "), Some(" Mod "), Some(json!(3)))).unwrap();
        assert_eq!(purchase.username, "alice");
        assert_eq!(purchase.item, "Mod");
    }

    #[test]
    fn rejects_missing_fields() {
        let err = validate(&request(None, Some("Mod"), None)).unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(message) if message == "Missing required fields: username, price"
        ));
    }

    #[test]
    fn rejects_empty_username() {
        let err = validate(&request(Some("  "), Some("Mod"), Some(json!(3)))).unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(message) if message == "Username cannot be empty"
        ));
    }

    #[test]
    fn rejects_non_numeric_price() {
        let err = validate(&request(Some("bob"), Some("Mod"), Some(json!("abc")))).unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(message) if message == "Price must be a valid number"
        ));
    }

    #[test]
    fn rejects_negative_price() {
        let err = validate(&request(Some("bob"), Some("Mod"), Some(json!(-1)))).unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(message) if message == "Price cannot be negative"
        ));
    }

    #[test]
    fn zero_price_is_valid() {
        let purchase = validate(&request(Some("bob"), Some("Mod"), Some(json!(0)))).unwrap();
        assert_eq!(purchase.price, dec!(0));
    }
}
