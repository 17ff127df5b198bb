//! Configuration errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// A setting is present but unusable.
///
/// Absent secrets are not validation errors; see
/// [`AppConfig::missing_for_webhooks`](super::AppConfig::missing_for_webhooks).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("server.port must be non-zero")]
    InvalidPort,

    #[error("server bind address {0:?} does not parse")]
    InvalidBindAddress(String),

    #[error("server.request_timeout_secs must be between 1 and 300")]
    InvalidTimeout,

    #[error("payment.stripe_secret_key must start with sk_ or rk_")]
    InvalidStripeKey,

    #[error("payment.stripe_webhook_secret must start with whsec_")]
    InvalidStripeWebhookSecret,

    #[error("payment.stripe_api_base_url must be an http(s) URL")]
    InvalidStripeApiUrl,

    #[error("payment.stripe_timeout_secs must be between 1 and 60")]
    InvalidStripeTimeout,

    #[error("identity.supabase_url must be an http(s) URL")]
    InvalidSupabaseUrl,

    #[error("identity.supabase_url must use https in production")]
    SupabaseUrlMustBeHttps,

    #[error("identity.supabase_timeout_secs must be between 1 and 60")]
    InvalidSupabaseTimeout,
}
