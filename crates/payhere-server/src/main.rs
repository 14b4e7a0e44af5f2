//! PayHere reference server
//!
//! Axum-based service exposing checkout request signing and the PayHere
//! notification endpoint.

mod handlers;
mod render;
mod state;

use axum::{
    Router,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use payhere_sdk::PayhereClient;

use crate::handlers::{checkout_form, create_checkout, health_check, payhere_notify};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Initialize payments
    let payhere = match PayhereClient::from_env() {
        Ok(client) => {
            tracing::info!(
                merchant_id = client.config().merchant_id(),
                environment = %client.config().environment(),
                "✓ PayHere configured"
            );
            Some(client)
        }
        Err(e) => {
            tracing::warn!("⚠ PayHere not configured - payments disabled ({})", e);
            tracing::warn!("  Set PAYHERE_MERCHANT_ID and PAYHERE_MERCHANT_SECRET in .env");
            None
        }
    };

    let state = AppState::new(payhere);

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        .route("/health", get(health_check))
        // Checkout
        .route("/api/checkout", post(create_checkout))
        .route("/checkout/form", post(checkout_form))
        // Gateway callbacks
        .route("/webhook/payhere", post(payhere_notify))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state);

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("payhere-server running on http://{}", addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health           - Health check");
    tracing::info!("  POST /api/checkout     - Signed checkout fields (JSON)");
    tracing::info!("  POST /checkout/form    - Auto-submitting checkout page");
    tracing::info!("  POST /webhook/payhere  - PayHere payment notifications");

    axum::serve(listener, app).await?;

    Ok(())
}
