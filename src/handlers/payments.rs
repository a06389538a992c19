//! Checkout flow handlers.
//!
//! `create_payment` builds a provider payment intent for a catalog
//! product and hands the approval URL back to the client;
//! `execute_payment` completes the payment after the provider redirects
//! the payer back, then announces it on the webhook.

use axum::extract::rejection::JsonRejection;
use axum::{
    extract::{Query, State},
    response::Html,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::format_amount;
use crate::error::AppError;
use crate::services::notifier::{payment_success_message, NotifyError};
use crate::services::paypal::{NewPayment, PayPalError, PurchaseContext, METADATA_DELIMITER};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    pub product: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatePaymentResponse {
    pub approval_url: String,
}

#[derive(Debug, Deserialize)]
pub struct ExecutePaymentQuery {
    #[serde(rename = "paymentId")]
    pub payment_id: Option<String>,
    #[serde(rename = "PayerID")]
    pub payer_id: Option<String>,
}

pub async fn create_payment(
    State(state): State<AppState>,
    payload: Result<Json<CreatePaymentRequest>, JsonRejection>,
) -> Result<Json<CreatePaymentResponse>, AppError> {
    let Json(payload) = payload.map_err(super::invalid_json)?;
    let product_name = payload.product.unwrap_or_default();
    let username = payload
        .username
        .unwrap_or_else(|| "Anonymous".to_string());

    let product = state
        .catalog
        .get(&product_name)
        .ok_or_else(|| AppError::Validation("Invalid product".to_string()))?;

    if username.contains(METADATA_DELIMITER) {
        return Err(AppError::Validation(format!(
            "Username must not contain '{}'",
            METADATA_DELIMITER
        )));
    }

    if !state.paypal.is_configured() {
        return Err(AppError::NotConfigured {
            error: "Payment provider not configured".to_string(),
            message: "Please set PAYPAL_CLIENT_ID and PAYPAL_CLIENT_SECRET environment variables"
                .to_string(),
        });
    }

    tracing::info!(
        product = %product_name,
        username = %username,
        "Creating PayPal payment"
    );

    let draft = NewPayment::for_purchase(
        &product_name,
        product,
        &username,
        &state.config.public_base_url,
    );

    let payment = state
        .paypal
        .create_payment(&draft)
        .await
        .map_err(|err| provider_error(err, "Payment creation failed"))?;

    let approval_url = payment.approval_url().ok_or_else(|| {
        tracing::error!(payment_id = %payment.id, "PayPal response contained no approval link");
        AppError::UpstreamRejected {
            error: "Payment creation failed".to_string(),
            message: Some("Payment provider returned no approval link".to_string()),
        }
    })?;

    Ok(Json(CreatePaymentResponse {
        approval_url: approval_url.to_string(),
    }))
}

pub async fn execute_payment(
    State(state): State<AppState>,
    Query(query): Query<ExecutePaymentQuery>,
) -> Result<Html<String>, AppError> {
    let (Some(payment_id), Some(payer_id)) = (query.payment_id, query.payer_id) else {
        return Err(AppError::Validation(
            "Payment execution failed: Missing payment information".to_string(),
        ));
    };

    let payment = state
        .paypal
        .find_payment(&payment_id)
        .await
        .map_err(|err| provider_error(err, "Payment execution failed"))?;

    let executed = state
        .paypal
        .execute_payment(&payment.id, &payer_id)
        .await
        .map_err(|err| provider_error(err, "Payment execution failed"))?;

    let record = executed.transactions.first().ok_or_else(|| {
        AppError::MalformedMetadata("executed payment carries no transactions".to_string())
    })?;
    let custom = record.custom.as_deref().ok_or_else(|| {
        AppError::MalformedMetadata("executed payment carries no custom metadata".to_string())
    })?;
    let context = PurchaseContext::decode(custom).ok_or_else(|| {
        AppError::MalformedMetadata(format!("no delimiter in custom metadata {:?}", custom))
    })?;
    let amount: Decimal = record.amount.total.parse().map_err(|_| {
        AppError::MalformedMetadata(format!("unparseable total {:?}", record.amount.total))
    })?;

    // First execution wins the notification; replays complete without
    // notifying again.
    if state.notified_payments.insert(payment_id.clone()) {
        let message = payment_success_message(
            &context.username,
            &context.product_name,
            amount,
            &executed.id,
        );
        match state.notifier.notify(&message).await {
            Ok(()) => tracing::info!(
                payment_id = %payment_id,
                username = %context.username,
                "Payment success notification sent"
            ),
            Err(NotifyError::NotConfigured) => tracing::debug!(
                payment_id = %payment_id,
                "Webhook not configured; skipping payment notification"
            ),
            Err(err) => tracing::warn!(
                payment_id = %payment_id,
                error = %err,
                "Payment succeeded but webhook notification failed"
            ),
        }
    } else {
        tracing::debug!(
            payment_id = %payment_id,
            "Payment already notified; skipping duplicate notification"
        );
    }

    Ok(Html(confirmation_page(
        &context.username,
        &context.product_name,
        amount,
    )))
}

pub async fn cancel_payment() -> Html<&'static str> {
    Html(CANCEL_PAGE)
}

fn provider_error(err: PayPalError, error: &str) -> AppError {
    tracing::error!(error = %err, "PayPal request failed");
    match err {
        PayPalError::NotConfigured => AppError::NotConfigured {
            error: "Payment provider not configured".to_string(),
            message: "Please set PAYPAL_CLIENT_ID and PAYPAL_CLIENT_SECRET environment variables"
                .to_string(),
        },
        PayPalError::Transport(_) => AppError::UpstreamUnavailable {
            error: error.to_string(),
            message: "Could not reach the payment provider".to_string(),
        },
        PayPalError::Rejected { .. } | PayPalError::UnexpectedBody(_) => {
            AppError::UpstreamRejected {
                error: error.to_string(),
                message: None,
            }
        }
    }
}

fn confirmation_page(username: &str, product_name: &str, amount: Decimal) -> String {
    format!(
        r#"<html>
<head><title>Payment Successful - The Scrap Shop</title></head>
<body style="font-family: Arial, sans-serif; text-align: center; padding: 50px; background: #1a1a1a; color: white;">
    <h1 style="color: #28a745;">✅ Payment Successful!</h1>
    <p>Thank you <strong>{}</strong>!</p>
    <p>Your purchase of <strong>{}</strong> for <strong>${}</strong> has been processed.</p>
    <p>You will receive your items in-game shortly.</p>
    <a href="/" style="color: #007bff; text-decoration: none;">← Back to Shop</a>
</body>
</html>
"#,
        username,
        product_name,
        format_amount(amount)
    )
}

const CANCEL_PAGE: &str = r#"<html>
<head><title>Payment Cancelled - The Scrap Shop</title></head>
<body style="font-family: Arial, sans-serif; text-align: center; padding: 50px; background: #1a1a1a; color: white;">
    <h1 style="color: #ffc107;">⚠️ Payment Cancelled</h1>
    <p>Your payment was cancelled. No charges were made.</p>
    <a href="/" style="color: #007bff; text-decoration: none;">← Back to Shop</a>
</body>
</html>
"#;
