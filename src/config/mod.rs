use anyhow::Result;
use dotenvy::dotenv;
use secrecy::Secret;
use std::env;
use std::time::Duration;

const SANDBOX_API_BASE_URL: &str = "https://api.sandbox.paypal.com/v1";
const LIVE_API_BASE_URL: &str = "https://api.paypal.com/v1";

/// Immutable service configuration, loaded once at startup and passed
/// into the components that need it.
#[derive(Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    /// Externally reachable base URL, used to build the provider's
    /// return/cancel redirect URLs.
    pub public_base_url: String,
    pub webhook: WebhookConfig,
    pub paypal: PayPalConfig,
    pub session_secret: Secret<String>,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct WebhookConfig {
    /// Discord-compatible webhook URL. Optional: purchase notifications
    /// are disabled when unset.
    pub url: Option<String>,
    pub timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct PayPalConfig {
    pub client_id: String,
    pub client_secret: Secret<String>,
    pub mode: PayPalMode,
    pub api_base_url: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayPalMode {
    Sandbox,
    Live,
}

impl PayPalMode {
    fn api_base_url(self) -> &'static str {
        match self {
            PayPalMode::Sandbox => SANDBOX_API_BASE_URL,
            PayPalMode::Live => LIVE_API_BASE_URL,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse()?;

        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{}", port));

        let webhook_url = env::var("DISCORD_WEBHOOK_URL")
            .ok()
            .filter(|url| !url.is_empty());

        let mode = match env::var("PAYPAL_MODE").as_deref() {
            Ok("live") => PayPalMode::Live,
            _ => PayPalMode::Sandbox,
        };

        let client_id = env::var("PAYPAL_CLIENT_ID").unwrap_or_default();
        let client_secret = env::var("PAYPAL_CLIENT_SECRET").unwrap_or_default();

        let session_secret = env::var("SESSION_SECRET")
            .unwrap_or_else(|_| "dev-secret-key-change-in-production".to_string());

        Ok(Self {
            server: ServerConfig { host, port },
            public_base_url,
            webhook: WebhookConfig {
                url: webhook_url,
                timeout: Duration::from_secs(10),
            },
            paypal: PayPalConfig {
                client_id,
                client_secret: Secret::new(client_secret),
                mode,
                api_base_url: mode.api_base_url().to_string(),
            },
            session_secret: Secret::new(session_secret),
        })
    }
}
