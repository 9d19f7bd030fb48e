//! Checkout HTTP Server
//!
//! Axum-based server brokering the two-phase checkout: preference creation,
//! payment execution and status reconciliation against the payment gateway.

mod config;
mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use checkout_core::{Gateway, MockGateway};
use checkout_gateway::MercadoPagoClient;

use crate::config::ServerConfig;
use crate::handlers::{
    create_preference, health_check, payment_status, process_payment, reconcile_payment,
};
use crate::state::AppState;

fn router(state: AppState) -> Router {
    // CORS stays permissive: the widget frontend runs on its own origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/create_preference", post(create_preference))
        .route("/process_payment", post(process_payment))
        .route("/payments/{id}", get(payment_status))
        .route("/payments/{id}/reconcile", post(reconcile_payment))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    let config = ServerConfig::from_env();

    // Gateway client with injected credentials; fall back to the mock so
    // the flow stays demonstrable without credentials.
    let gateway: Arc<dyn Gateway> = match MercadoPagoClient::from_env() {
        Ok(client) => {
            tracing::info!("✓ MercadoPago gateway configured");
            Arc::new(client)
        }
        Err(e) => {
            tracing::warn!("⚠ Gateway not configured ({e}) - using mock gateway");
            tracing::warn!("  Set MP_ACCESS_TOKEN in .env for real payments");
            Arc::new(MockGateway::new())
        }
    };

    let state = AppState::new(gateway, config.back_urls.clone());
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("🚀 checkout server running on http://{}", config.bind_addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                    - Health check");
    tracing::info!("  POST /create_preference         - Register a payment intent");
    tracing::info!("  POST /process_payment           - Execute a payment form");
    tracing::info!("  GET  /payments/:id              - Attempt status + display state");
    tracing::info!("  POST /payments/:id/reconcile    - Reconcile an ambiguous failure");

    axum::serve(listener, app).await?;

    Ok(())
}
