//! `payment.*` settings: Stripe credentials.

use std::time::Duration;

use serde::Deserialize;

use super::error::ValidationError;

const DEFAULT_STRIPE_API: &str = "https://api.stripe.com";

/// Per-request limit on calls to Stripe and Supabase.
pub(super) const DEFAULT_OUTBOUND_TIMEOUT_SECS: u64 = 10;
pub(super) const MAX_OUTBOUND_TIMEOUT_SECS: u64 = 60;

/// Stripe credentials and API location.
///
/// Both secrets may be empty: the service still starts, acknowledges
/// deliveries and reports what is missing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaymentConfig {
    /// Secret (`sk_`) or restricted (`rk_`) API key used to retrieve
    /// subscriptions and customers.
    pub stripe_secret_key: String,

    /// Endpoint signing secret (`whsec_`).
    pub stripe_webhook_secret: String,

    pub stripe_api_base_url: String,

    /// Drop events with `livemode: false`.
    pub require_livemode: bool,

    pub stripe_timeout_secs: u64,
}

/// Which Stripe environment the API key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripeMode {
    Test,
    Live,
    Unknown,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            stripe_secret_key: String::new(),
            stripe_webhook_secret: String::new(),
            stripe_api_base_url: DEFAULT_STRIPE_API.to_string(),
            require_livemode: false,
            stripe_timeout_secs: DEFAULT_OUTBOUND_TIMEOUT_SECS,
        }
    }
}

impl PaymentConfig {
    pub fn mode(&self) -> StripeMode {
        let key = self.stripe_secret_key.as_str();
        if key.starts_with("sk_test_") || key.starts_with("rk_test_") {
            StripeMode::Test
        } else if key.starts_with("sk_live_") || key.starts_with("rk_live_") {
            StripeMode::Live
        } else {
            StripeMode::Unknown
        }
    }

    pub fn stripe_timeout(&self) -> Duration {
        Duration::from_secs(self.stripe_timeout_secs)
    }

    /// Names of unset settings webhook processing needs.
    pub fn missing(&self) -> Vec<&'static str> {
        [
            (self.stripe_secret_key.is_empty(), "stripe secret key"),
            (self.stripe_webhook_secret.is_empty(), "stripe webhook secret"),
        ]
        .into_iter()
        .filter_map(|(absent, name)| absent.then_some(name))
        .collect()
    }

    /// Checks the format of whatever is set. Absence is reported by
    /// [`missing`](Self::missing) instead.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let key = self.stripe_secret_key.as_str();
        if !key.is_empty() && !(key.starts_with("sk_") || key.starts_with("rk_")) {
            return Err(ValidationError::InvalidStripeKey);
        }

        let secret = self.stripe_webhook_secret.as_str();
        if !secret.is_empty() && !secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidStripeWebhookSecret);
        }

        if !is_http_url(&self.stripe_api_base_url) {
            return Err(ValidationError::InvalidStripeApiUrl);
        }
        if !(1..=MAX_OUTBOUND_TIMEOUT_SECS).contains(&self.stripe_timeout_secs) {
            return Err(ValidationError::InvalidStripeTimeout);
        }
        Ok(())
    }
}

pub(super) fn is_http_url(url: &str) -> bool {
    url.strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .is_some_and(|rest| !rest.is_empty())
}
