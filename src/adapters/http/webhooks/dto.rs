//! HTTP DTOs for the webhook and health endpoints.

use serde::Serialize;

/// Acknowledgement returned for every webhook delivery.
///
/// `received` is always true. `error` is informational: it never changes
/// the status code, which is always 200.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookAck {
    pub received: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WebhookAck {
    pub fn received() -> Self {
        Self {
            received: true,
            error: None,
        }
    }

    pub fn with_error(error: impl Into<String>) -> Self {
        Self {
            received: true,
            error: Some(error.into()),
        }
    }
}

/// Liveness probe response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub webhooks_configured: bool,
}
