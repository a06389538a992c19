use std::time::Duration;

use scrap_shop::config::{Config, PayPalConfig, PayPalMode, ServerConfig, WebhookConfig};
use scrap_shop::Application;
use secrecy::Secret;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub struct TestApp {
    pub address: String,
    /// Mock payment provider; the app talks to `{uri}/v1`.
    pub paypal: MockServer,
    /// Mock Discord webhook; the app posts to its root path.
    pub webhook: MockServer,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_inner(true, Duration::from_secs(10)).await
    }

    /// Spawn with no webhook URL configured.
    pub async fn spawn_without_webhook() -> Self {
        Self::spawn_inner(false, Duration::from_secs(10)).await
    }

    /// Spawn with a short webhook timeout so slow-webhook behavior can
    /// be exercised without waiting out the production bound.
    pub async fn spawn_with_webhook_timeout(timeout: Duration) -> Self {
        Self::spawn_inner(true, timeout).await
    }

    async fn spawn_inner(webhook_configured: bool, webhook_timeout: Duration) -> Self {
        let paypal = MockServer::start().await;
        let webhook = MockServer::start().await;

        // Token endpoint is hit before every provider call.
        Mock::given(method("POST"))
            .and(path("/v1/oauth2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "test-access-token",
                "token_type": "Bearer",
                "expires_in": 32400
            })))
            .mount(&paypal)
            .await;

        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            public_base_url: "http://shop.test".to_string(),
            webhook: WebhookConfig {
                url: webhook_configured.then(|| webhook.uri()),
                timeout: webhook_timeout,
            },
            paypal: PayPalConfig {
                client_id: "test-client".to_string(),
                client_secret: Secret::new("test-secret".to_string()),
                mode: PayPalMode::Sandbox,
                api_base_url: format!("{}/v1", paypal.uri()),
            },
            session_secret: Secret::new("test-session-secret".to_string()),
        };

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");
        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to be ready by polling the health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            paypal,
            webhook,
        }
    }

    /// Bodies of the messages the webhook received, in order.
    pub async fn webhook_messages(&self) -> Vec<String> {
        self.webhook
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|request| {
                let body: serde_json::Value =
                    serde_json::from_slice(&request.body).expect("webhook body was not JSON");
                body["content"]
                    .as_str()
                    .expect("webhook body had no content field")
                    .to_string()
            })
            .collect()
    }
}
