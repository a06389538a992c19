pub mod catalog;
pub mod config;
pub mod error;
pub mod handlers;
pub mod services;

use axum::{
    routing::{get, post},
    Router,
};
use dashmap::DashSet;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use catalog::Catalog;
use config::Config;
use services::{Notifier, PayPalClient};

/// Shared application state. Everything here is read-only after startup
/// except the notified-payments set, which guards against duplicate
/// notifications when an execute callback is replayed.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub catalog: Arc<Catalog>,
    pub paypal: PayPalClient,
    pub notifier: Notifier,
    pub notified_payments: Arc<DashSet<String>>,
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the given configuration. The listener
    /// is bound here so callers (and tests) can read the actual port.
    pub async fn build(config: Config) -> anyhow::Result<Self> {
        let paypal = PayPalClient::new(config.paypal.clone());
        if paypal.is_configured() {
            tracing::info!(mode = ?config.paypal.mode, "PayPal client initialized");
        } else {
            tracing::warn!("PayPal credentials not configured - checkout will be unavailable");
        }

        let notifier = Notifier::new(config.webhook.clone());
        if notifier.is_configured() {
            tracing::info!("Discord webhook configured");
        } else {
            tracing::warn!(
                "DISCORD_WEBHOOK_URL not set - purchase notifications will not work until this is configured"
            );
        }

        let state = AppState {
            config: config.clone(),
            catalog: Arc::new(Catalog::default()),
            paypal,
            notifier,
            notified_payments: Arc::new(DashSet::new()),
        };

        let router = Router::new()
            .route(
                "/",
                get(handlers::index).fallback(handlers::method_not_allowed),
            )
            .route(
                "/health",
                get(handlers::health_check).fallback(handlers::method_not_allowed),
            )
            .route(
                "/purchase",
                post(handlers::purchase::handle_purchase).fallback(handlers::method_not_allowed),
            )
            .route(
                "/create-payment",
                post(handlers::payments::create_payment).fallback(handlers::method_not_allowed),
            )
            .route(
                "/execute-payment",
                get(handlers::payments::execute_payment).fallback(handlers::method_not_allowed),
            )
            .route(
                "/cancel-payment",
                get(handlers::payments::cancel_payment).fallback(handlers::method_not_allowed),
            )
            .fallback(handlers::not_found)
            .layer(CorsLayer::permissive())
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        version = ?request.version(),
                    )
                }),
            )
            .with_state(state);

        let listener =
            TcpListener::bind(format!("{}:{}", config.server.host, config.server.port)).await?;
        let port = listener.local_addr()?.port();

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    pub async fn run_until_stopped(self) -> anyhow::Result<()> {
        tracing::info!("Listening on {}", self.listener.local_addr()?);
        axum::serve(self.listener, self.router).await?;
        Ok(())
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}
