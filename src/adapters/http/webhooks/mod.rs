//! HTTP adapter for the Stripe webhook endpoint.
//!
//! - `POST /api/webhooks/stripe` - Handle Stripe webhooks (always 200)
//! - `GET /health` - Liveness probe

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::{HealthResponse, WebhookAck};
pub use handlers::{WebhookAppState, STRIPE_SIGNATURE_HEADER};
pub use routes::{app_router, webhook_routes};
