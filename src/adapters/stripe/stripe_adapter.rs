//! Stripe payment provider adapter.
//!
//! Implements the `PaymentProvider` trait against the Stripe REST API.
//! Only lookups are needed by the webhook flow: events are trusted for
//! their type and ids, and the current object state is fetched when a
//! handler needs more than the payload carries.
//!
//! # Configuration
//!
//! ```ignore
//! let config = StripeConfig::new(api_key);
//! let adapter = StripePaymentAdapter::new(config)?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::domain::membership::{CustomerObject, SubscriptionObject};
use crate::ports::{Customer, PaymentError, PaymentProvider, Subscription};

const DEFAULT_API_BASE_URL: &str = "https://api.stripe.com";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Base URL for Stripe API (default: https://api.stripe.com).
    api_base_url: String,

    /// Per-request timeout.
    timeout: Duration,
}

impl StripeConfig {
    /// Create a new Stripe configuration.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Stripe's error envelope: `{"error": {"type", "code", "message"}}`.
#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Stripe payment provider adapter.
pub struct StripePaymentAdapter {
    config: StripeConfig,
    base_url: reqwest::Url,
    http_client: reqwest::Client,
}

impl StripePaymentAdapter {
    /// Create a new Stripe adapter with the given configuration.
    pub fn new(config: StripeConfig) -> Result<Self, PaymentError> {
        let base_url = reqwest::Url::parse(&config.api_base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| {
                PaymentError::Misconfigured(format!("invalid api base url: {}", config.api_base_url))
            })?;

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PaymentError::Network(format!("could not build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            base_url,
            http_client,
        })
    }

    /// `{base}/v1/{resource}/{id}` with the id as a single percent-encoded
    /// segment. `None` for ids that cannot name a Stripe object.
    fn object_url(&self, resource: &str, id: &str) -> Result<Option<reqwest::Url>, PaymentError> {
        if id.is_empty() || matches!(id, "." | "..") {
            return Ok(None);
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                PaymentError::Misconfigured(format!("invalid api base url: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(["v1", resource, id]);
        Ok(Some(url))
    }

    /// GET a Stripe object, mapping 404 to `None`.
    async fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        resource: &str,
        id: &str,
    ) -> Result<Option<T>, PaymentError> {
        let Some(url) = self.object_url(resource, id)? else {
            return Ok(None);
        };

        let response = self
            .http_client
            .get(url)
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .send()
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let err = map_error_response(status, &error_text);
            tracing::warn!(
                resource,
                id,
                status = status.as_u16(),
                retryable = err.is_retryable(),
                error = %err,
                "Stripe lookup failed"
            );
            return Err(err);
        }

        response
            .json::<T>()
            .await
            .map(Some)
            .map_err(|e| PaymentError::InvalidResponse(e.to_string()))
    }
}

fn map_error_response(status: reqwest::StatusCode, body: &str) -> PaymentError {
    let detail = serde_json::from_str::<StripeErrorBody>(body)
        .ok()
        .map(|b| b.error);
    let (code, message) = match detail {
        Some(d) => (d.code, d.message),
        None => (None, None),
    };
    let message = message.unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

    match status {
        reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
            PaymentError::Unauthorized(message)
        }
        reqwest::StatusCode::TOO_MANY_REQUESTS => PaymentError::RateLimited(message),
        _ => PaymentError::Api {
            status: status.as_u16(),
            code,
            message,
        },
    }
}

#[async_trait]
impl PaymentProvider for StripePaymentAdapter {
    async fn get_customer(&self, customer_id: &str) -> Result<Option<Customer>, PaymentError> {
        let customer: Option<CustomerObject> = self.fetch("customers", customer_id).await?;

        match customer {
            Some(c) if c.deleted => {
                tracing::debug!(customer_id, "Stripe customer is deleted");
                Ok(None)
            }
            Some(c) => Ok(Some(c.into())),
            None => Ok(None),
        }
    }

    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<Subscription>, PaymentError> {
        let subscription: Option<SubscriptionObject> =
            self.fetch("subscriptions", subscription_id).await?;

        Ok(subscription.map(Subscription::from))
    }
}
