//! Errors raised while verifying or acting on a Stripe delivery.
//!
//! None of them change the HTTP response: deliveries are always
//! acknowledged. They drive logging and the informational `error` field.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookError {
    /// A secret or client webhooks need is not configured.
    #[error("Not configured: {0}")]
    NotConfigured(&'static str),

    #[error("Missing signature")]
    MissingSignature,

    #[error("Invalid signature")]
    InvalidSignature,

    /// Signed longer ago than the replay window.
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Signed too far in the future.
    #[error("Invalid timestamp")]
    InvalidTimestamp,

    /// Unreadable body, header or `data.object`.
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Missing metadata: {0}")]
    MissingMetadata(&'static str),

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// The event is valid but nothing in it concerns this handler.
    #[error("Event ignored: {0}")]
    Ignored(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Payment provider error: {0}")]
    PaymentProvider(String),

    #[error("Identity provider error: {0}")]
    IdentityProvider(String),
}

impl WebhookError {
    /// The delivery itself was unusable, as opposed to a failure while
    /// acting on an authentic event.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            WebhookError::MissingSignature
                | WebhookError::InvalidSignature
                | WebhookError::TimestampOutOfRange
                | WebhookError::InvalidTimestamp
                | WebhookError::ParseError(_)
        )
    }

    /// A redelivery of the same event could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WebhookError::PaymentProvider(_) | WebhookError::IdentityProvider(_)
        )
    }
}
