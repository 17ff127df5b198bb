//! Axum router configuration for the webhook service.

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use super::handlers::{handle_stripe_webhook, health, WebhookAppState};

/// Create the Stripe webhook router.
///
/// # Routes
/// - `POST /stripe` - Handle Stripe webhooks (no auth, signature verified)
pub fn webhook_routes() -> Router<WebhookAppState> {
    Router::new().route("/stripe", post(handle_stripe_webhook))
}

/// Create the complete service router.
///
/// # Routes
/// - `GET /health` - Liveness probe
/// - `POST /api/webhooks/stripe` - Handle Stripe webhooks
pub fn app_router(state: WebhookAppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/webhooks", webhook_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
