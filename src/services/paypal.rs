//! PayPal payment provider client.
//!
//! Implements the REST payments API used for checkout: OAuth2
//! client-credentials token, payment creation, lookup and execution,
//! plus the purchase-context codec smuggled through the provider's
//! `custom` transaction field.

use crate::catalog::{format_amount, Product};
use crate::config::PayPalConfig;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const CURRENCY: &str = "USD";

/// Upper bound on any single provider call so a stalled upstream
/// cannot hang a request worker.
const PROVIDER_TIMEOUT: Duration = Duration::from_secs(30);

/// Separator between username and product name in the provider's
/// `custom` field. Usernames containing it are rejected at payment
/// creation so every accepted encoding decodes uniquely.
pub const METADATA_DELIMITER: char = '|';

/// PayPal client for interacting with the REST payments API.
#[derive(Clone)]
pub struct PayPalClient {
    client: Client,
    config: PayPalConfig,
}

#[derive(Debug, Error)]
pub enum PayPalError {
    #[error("PayPal credentials not configured")]
    NotConfigured,

    #[error("PayPal request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("PayPal rejected the request: {name}: {message}")]
    Rejected { name: String, message: String },

    #[error("unexpected PayPal response body: {0}")]
    UnexpectedBody(#[from] serde_json::Error),
}

/// Order context carried through the provider round-trip in the
/// `custom` field. This is the only place purchase state survives
/// between payment creation and execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseContext {
    pub username: String,
    pub product_name: String,
}

impl PurchaseContext {
    pub fn new(username: &str, product_name: &str) -> Self {
        Self {
            username: username.to_string(),
            product_name: product_name.to_string(),
        }
    }

    pub fn encode(&self) -> String {
        format!(
            "{}{}{}",
            self.username, METADATA_DELIMITER, self.product_name
        )
    }

    /// Decode a `custom` field by splitting on the first delimiter.
    /// Product names may contain the delimiter; usernames may not.
    pub fn decode(custom: &str) -> Option<Self> {
        let (username, product_name) = custom.split_once(METADATA_DELIMITER)?;
        Some(Self::new(username, product_name))
    }
}

/// Payment draft submitted to the provider.
#[derive(Debug, Serialize)]
pub struct NewPayment {
    pub intent: String,
    pub payer: Payer,
    pub redirect_urls: RedirectUrls,
    pub transactions: Vec<TransactionDraft>,
}

#[derive(Debug, Serialize)]
pub struct Payer {
    pub payment_method: String,
}

#[derive(Debug, Serialize)]
pub struct RedirectUrls {
    pub return_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Serialize)]
pub struct TransactionDraft {
    pub item_list: ItemList,
    pub amount: Amount,
    pub description: String,
    pub custom: String,
}

#[derive(Debug, Serialize)]
pub struct ItemList {
    pub items: Vec<Item>,
}

#[derive(Debug, Serialize)]
pub struct Item {
    pub name: String,
    pub sku: String,
    pub price: String,
    pub currency: String,
    pub quantity: u32,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Amount {
    pub total: String,
    pub currency: String,
}

/// Payment entity returned by the provider.
#[derive(Debug, Deserialize)]
pub struct Payment {
    pub id: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub transactions: Vec<TransactionRecord>,
}

#[derive(Debug, Deserialize)]
pub struct Link {
    pub href: String,
    pub rel: String,
    #[serde(default)]
    pub method: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TransactionRecord {
    pub amount: Amount,
    #[serde(default)]
    pub custom: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    name: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Serialize)]
struct ExecuteRequest {
    payer_id: String,
}

impl Payment {
    /// URL the payer must be redirected to for approval, if the
    /// provider returned one.
    pub fn approval_url(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|link| link.rel == "approval_url")
            .map(|link| link.href.as_str())
    }
}

impl NewPayment {
    /// Build the single-item sale intent for a catalog purchase.
    pub fn for_purchase(
        product_name: &str,
        product: &Product,
        username: &str,
        public_base_url: &str,
    ) -> Self {
        let price = format_amount(product.price);
        let base = public_base_url.trim_end_matches('/');

        Self {
            intent: "sale".to_string(),
            payer: Payer {
                payment_method: "paypal".to_string(),
            },
            redirect_urls: RedirectUrls {
                return_url: format!("{}/execute-payment", base),
                cancel_url: format!("{}/cancel-payment", base),
            },
            transactions: vec![TransactionDraft {
                item_list: ItemList {
                    items: vec![Item {
                        name: product_name.to_string(),
                        sku: sku_for(product_name),
                        price: price.clone(),
                        currency: CURRENCY.to_string(),
                        quantity: 1,
                        description: product.description.clone(),
                    }],
                },
                amount: Amount {
                    total: price,
                    currency: CURRENCY.to_string(),
                },
                description: format!("{} purchase for {}", product_name, username),
                custom: PurchaseContext::new(username, product_name).encode(),
            }],
        }
    }
}

fn sku_for(product_name: &str) -> String {
    product_name.to_lowercase().replace(' ', "_")
}

impl PayPalClient {
    pub fn new(config: PayPalConfig) -> Self {
        let client = Client::builder()
            .timeout(PROVIDER_TIMEOUT)
            .build()
            .expect("failed to build HTTP client");
        Self { client, config }
    }

    /// Check if PayPal is configured (credentials are set).
    pub fn is_configured(&self) -> bool {
        !self.config.client_id.is_empty() && !self.config.client_secret.expose_secret().is_empty()
    }

    /// Submit a payment draft to the provider.
    pub async fn create_payment(&self, draft: &NewPayment) -> Result<Payment, PayPalError> {
        let token = self.access_token().await?;
        let url = format!("{}/payments/payment", self.config.api_base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .json(draft)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        tracing::debug!(status = %status, body = %body, "PayPal create payment response");

        if status.is_success() {
            let payment: Payment = serde_json::from_str(&body)?;
            tracing::info!(payment_id = %payment.id, "PayPal payment created");
            Ok(payment)
        } else {
            Err(rejected(&body))
        }
    }

    /// Fetch an existing payment by id.
    pub async fn find_payment(&self, payment_id: &str) -> Result<Payment, PayPalError> {
        let token = self.access_token().await?;
        let url = format!("{}/payments/payment/{}", self.config.api_base_url, payment_id);

        let response = self.client.get(&url).bearer_auth(&token).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            Ok(serde_json::from_str(&body)?)
        } else {
            Err(rejected(&body))
        }
    }

    /// Execute an approved payment with the payer id from the
    /// provider's redirect callback.
    pub async fn execute_payment(
        &self,
        payment_id: &str,
        payer_id: &str,
    ) -> Result<Payment, PayPalError> {
        let token = self.access_token().await?;
        let url = format!(
            "{}/payments/payment/{}/execute",
            self.config.api_base_url, payment_id
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .json(&ExecuteRequest {
                payer_id: payer_id.to_string(),
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        tracing::debug!(status = %status, body = %body, "PayPal execute payment response");

        if status.is_success() {
            let payment: Payment = serde_json::from_str(&body)?;
            tracing::info!(payment_id = %payment.id, "PayPal payment executed");
            Ok(payment)
        } else {
            Err(rejected(&body))
        }
    }

    /// Obtain an OAuth2 access token via the client-credentials grant.
    async fn access_token(&self) -> Result<String, PayPalError> {
        if !self.is_configured() {
            return Err(PayPalError::NotConfigured);
        }

        let url = format!("{}/oauth2/token", self.config.api_base_url);

        let response = self
            .client
            .post(&url)
            .basic_auth(
                &self.config.client_id,
                Some(self.config.client_secret.expose_secret()),
            )
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            let token: TokenResponse = serde_json::from_str(&body)?;
            Ok(token.access_token)
        } else {
            Err(rejected(&body))
        }
    }
}

fn rejected(body: &str) -> PayPalError {
    let detail: ApiError = serde_json::from_str(body).unwrap_or_else(|_| ApiError {
        name: "UNKNOWN".to_string(),
        message: body.to_string(),
    });
    PayPalError::Rejected {
        name: detail.name,
        message: detail.message,
    }
}
