//! Payment provider port for external payment processing.
//!
//! Defines the read-only contract the webhook handlers need from the
//! payment gateway (Stripe): looking up the subscription or customer an
//! event refers to.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::UserId;
use crate::domain::membership::{
    metadata_user_id, CustomerObject, StripeMetadata, SubscriptionObject, SubscriptionStatus,
    WebhookError,
};

/// Lookups into the payment gateway.
///
/// A missing or deleted object is `Ok(None)`, not an error. Transient
/// failures report [`PaymentError::is_retryable`].
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn get_customer(&self, customer_id: &str) -> Result<Option<Customer>, PaymentError>;

    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<Subscription>, PaymentError>;
}

/// Stripe customer, reduced to what user resolution reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    /// `cus_...`
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,

    /// Provider-side metadata (the checkout flow stores `userId` here).
    pub metadata: StripeMetadata,
}

impl Customer {
    pub fn user_id(&self) -> Option<UserId> {
        metadata_user_id(&self.metadata)
    }
}

impl From<CustomerObject> for Customer {
    fn from(obj: CustomerObject) -> Self {
        Self {
            id: obj.id,
            email: obj.email,
            name: obj.name,
            metadata: obj.metadata,
        }
    }
}

/// Stripe subscription as fetched during checkout completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    /// `sub_...`
    pub id: String,
    pub customer_id: Option<String>,
    pub status: SubscriptionStatus,

    /// Whether subscription will cancel at period end.
    pub cancel_at_period_end: bool,

    /// Current billing period end (Unix timestamp).
    pub current_period_end: Option<i64>,

    /// Provider-side metadata (the checkout flow stores `userId` here).
    pub metadata: StripeMetadata,
}

impl Subscription {
    pub fn user_id(&self) -> Option<UserId> {
        metadata_user_id(&self.metadata)
    }
}

impl From<SubscriptionObject> for Subscription {
    fn from(obj: SubscriptionObject) -> Self {
        Self {
            id: obj.id,
            customer_id: obj.customer,
            status: obj.status,
            cancel_at_period_end: obj.cancel_at_period_end,
            current_period_end: obj.current_period_end,
            metadata: obj.metadata,
        }
    }
}

/// Errors from Stripe lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    /// Connection failed or timed out.
    #[error("Stripe unreachable: {0}")]
    Network(String),

    /// API key missing, revoked or lacking permission.
    #[error("Stripe rejected the API key: {0}")]
    Unauthorized(String),

    #[error("Stripe rate limit exceeded: {0}")]
    RateLimited(String),

    /// Any other non-success status. `code` is Stripe's `error.code`.
    #[error("Stripe API error {status}: {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// Success status, but the body is not the expected object.
    #[error("Unexpected Stripe response: {0}")]
    InvalidResponse(String),

    /// The adapter cannot build requests, e.g. an unusable base URL.
    #[error("Stripe client misconfigured: {0}")]
    Misconfigured(String),
}

impl PaymentError {
    /// A later attempt could succeed without any change on our side.
    pub fn is_retryable(&self) -> bool {
        match self {
            PaymentError::Network(_) | PaymentError::RateLimited(_) => true,
            PaymentError::Api { status, .. } => *status >= 500,
            PaymentError::Unauthorized(_)
            | PaymentError::InvalidResponse(_)
            | PaymentError::Misconfigured(_) => false,
        }
    }
}

impl From<PaymentError> for WebhookError {
    fn from(err: PaymentError) -> Self {
        WebhookError::PaymentProvider(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payment_provider_is_object_safe() {
        fn _accepts_dyn(_provider: &dyn PaymentProvider) {}
    }

    #[test]
    fn subscription_from_event_object_keeps_metadata() {
        let obj: SubscriptionObject = serde_json::from_value(json!({
            "id": "sub_1",
            "customer": "cus_1",
            "status": "active",
            "metadata": { "userId": "u1" }
        }))
        .unwrap();

        let sub = Subscription::from(obj);

        assert_eq!(sub.customer_id.as_deref(), Some("cus_1"));
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert_eq!(sub.user_id(), Some(UserId::new("u1").unwrap()));
    }

    #[test]
    fn customer_without_user_metadata_has_no_user() {
        let obj: CustomerObject =
            serde_json::from_value(json!({ "id": "cus_1", "email": "a@b.c" })).unwrap();

        assert!(Customer::from(obj).user_id().is_none());
    }

    #[test]
    fn retryability_follows_failure_kind() {
        let api = |status| PaymentError::Api {
            status,
            code: None,
            message: "boom".into(),
        };

        assert!(PaymentError::Network("reset".into()).is_retryable());
        assert!(PaymentError::RateLimited("slow down".into()).is_retryable());
        assert!(api(502).is_retryable());
        assert!(!api(400).is_retryable());
        assert!(!PaymentError::Unauthorized("bad key".into()).is_retryable());
    }

    #[test]
    fn converts_into_webhook_error() {
        let err: WebhookError = PaymentError::Network("reset".into()).into();
        assert_eq!(
            err,
            WebhookError::PaymentProvider("Stripe unreachable: reset".into())
        );
    }
}
