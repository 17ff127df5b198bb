//! HTTP handlers for the Stripe webhook and health endpoints.
//!
//! The webhook handler never answers with anything but 200. Stripe retries
//! any other status indefinitely, so configuration gaps, bad signatures,
//! failing branches, timeouts and panics are all logged here and folded
//! into the `error` field of the acknowledgement.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Json, State};
use axum::http::HeaderMap;
use futures::FutureExt;

use crate::application::handlers::membership::{
    HandlePaymentWebhookCommand, HandlePaymentWebhookHandler,
};
use crate::domain::membership::WebhookError;

use super::dto::{HealthResponse, WebhookAck};

/// Header Stripe signs deliveries with.
pub const STRIPE_SIGNATURE_HEADER: &str = "Stripe-Signature";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for the webhook routes.
///
/// `handler` is `None` when a secret or client is missing; deliveries are
/// then acknowledged without processing.
#[derive(Clone)]
pub struct WebhookAppState {
    pub handler: Option<Arc<HandlePaymentWebhookHandler>>,
    pub missing: Vec<&'static str>,
    pub processing_timeout: Duration,
}

impl WebhookAppState {
    pub fn new(handler: Arc<HandlePaymentWebhookHandler>) -> Self {
        Self {
            handler: Some(handler),
            missing: Vec::new(),
            processing_timeout: Duration::from_secs(30),
        }
    }

    /// State for a process started without the settings webhooks need.
    pub fn unconfigured(missing: Vec<&'static str>) -> Self {
        Self {
            handler: None,
            missing,
            processing_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_processing_timeout(mut self, timeout: Duration) -> Self {
        self.processing_timeout = timeout;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.handler.is_some()
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhook Handler
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/webhooks/stripe - Handle Stripe webhooks.
///
/// The body is taken as raw bytes: the signature covers the exact wire
/// payload.
pub async fn handle_stripe_webhook(
    State(state): State<WebhookAppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Json<WebhookAck> {
    let Some(handler) = state.handler.clone() else {
        let err = WebhookError::NotConfigured(
            state.missing.first().copied().unwrap_or("webhook handler"),
        );
        tracing::warn!(missing = ?state.missing, "Stripe webhook received but webhooks are not configured");
        return Json(WebhookAck::with_error(err.to_string()));
    };

    let payload = match body {
        Ok(bytes) => bytes.to_vec(),
        Err(rejection) => {
            tracing::warn!(error = %rejection, "Could not read Stripe webhook body");
            return Json(WebhookAck::with_error(
                WebhookError::ParseError(rejection.body_text()).to_string(),
            ));
        }
    };

    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let cmd = HandlePaymentWebhookCommand { payload, signature };
    let processing = AssertUnwindSafe(handler.handle(cmd)).catch_unwind();

    let ack = match tokio::time::timeout(state.processing_timeout, processing).await {
        Ok(Ok(Ok(report))) => match report.first_failure() {
            Some(failure) => WebhookAck::with_error(failure),
            None => WebhookAck::received(),
        },
        Ok(Ok(Err(err))) => {
            log_rejection(&err);
            WebhookAck::with_error(err.to_string())
        }
        Ok(Err(_)) => {
            tracing::error!("Stripe webhook processing panicked");
            WebhookAck::with_error("Internal error")
        }
        Err(_) => {
            tracing::error!(
                timeout_secs = state.processing_timeout.as_secs(),
                "Stripe webhook processing timed out"
            );
            WebhookAck::with_error("Processing timed out")
        }
    };

    Json(ack)
}

fn log_rejection(err: &WebhookError) {
    match err {
        WebhookError::Ignored(reason) => {
            tracing::info!(reason = %reason, "Stripe webhook ignored")
        }
        err if err.is_rejection() => {
            tracing::warn!(error = %err, "Stripe webhook rejected")
        }
        err => tracing::error!(error = %err, "Stripe webhook failed"),
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Health
// ════════════════════════════════════════════════════════════════════════════════

/// GET /health - Liveness probe.
pub async fn health(State(state): State<WebhookAppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        webhooks_configured: state.is_configured(),
    })
}
