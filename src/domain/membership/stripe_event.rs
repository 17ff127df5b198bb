//! Stripe event envelope.
//!
//! Only the envelope is typed here. `data.object` stays raw JSON until a
//! handler reads it as the object it expects, so unknown event types and
//! unfamiliar object shapes never fail parsing.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::webhook_errors::WebhookError;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEvent {
    /// `evt_...`
    pub id: String,

    /// Raw type string, e.g. `checkout.session.completed`.
    #[serde(rename = "type")]
    pub event_type: String,

    /// Unix seconds.
    pub created: i64,

    pub data: StripeEventData,

    #[serde(default)]
    pub livemode: bool,

    /// Null on some legacy events.
    #[serde(default)]
    pub api_version: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEventData {
    pub object: serde_json::Value,
}

impl StripeEvent {
    pub fn is_live(&self) -> bool {
        self.livemode
    }

    pub fn parsed_type(&self) -> StripeEventType {
        StripeEventType::parse(&self.event_type)
    }

    /// Reads `data.object` as `T`.
    pub fn object<T: DeserializeOwned>(&self) -> Result<T, WebhookError> {
        T::deserialize(&self.data.object).map_err(|e| {
            WebhookError::ParseError(format!("{} data.object: {}", self.event_type, e))
        })
    }

    /// Test-mode event created now, with a fixed id.
    #[cfg(test)]
    pub fn fixture(event_type: &str, object: serde_json::Value) -> Self {
        Self {
            id: "evt_fixture".to_string(),
            event_type: event_type.to_string(),
            created: chrono::Utc::now().timestamp(),
            data: StripeEventData { object },
            livemode: false,
            api_version: Some("2024-06-20".to_string()),
        }
    }
}

/// Event types that drive membership changes. Everything else is `Unknown`
/// and acknowledged without processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StripeEventType {
    CheckoutSessionCompleted,
    CustomerSubscriptionCreated,
    CustomerSubscriptionUpdated,
    CustomerSubscriptionDeleted,
    InvoicePaymentSucceeded,
    InvoicePaymentFailed,
    CustomerCreated,
    CustomerDeleted,
    /// One-off membership purchases from before subscriptions existed.
    PaymentIntentSucceeded,
    Unknown,
}

const KNOWN_TYPES: [(&str, StripeEventType); 9] = [
    ("checkout.session.completed", StripeEventType::CheckoutSessionCompleted),
    ("customer.subscription.created", StripeEventType::CustomerSubscriptionCreated),
    ("customer.subscription.updated", StripeEventType::CustomerSubscriptionUpdated),
    ("customer.subscription.deleted", StripeEventType::CustomerSubscriptionDeleted),
    ("invoice.payment_succeeded", StripeEventType::InvoicePaymentSucceeded),
    ("invoice.payment_failed", StripeEventType::InvoicePaymentFailed),
    ("customer.created", StripeEventType::CustomerCreated),
    ("customer.deleted", StripeEventType::CustomerDeleted),
    ("payment_intent.succeeded", StripeEventType::PaymentIntentSucceeded),
];

impl StripeEventType {
    pub fn parse(raw: &str) -> Self {
        KNOWN_TYPES
            .iter()
            .find(|(name, _)| *name == raw)
            .map(|(_, t)| *t)
            .unwrap_or(Self::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        KNOWN_TYPES
            .iter()
            .find(|(_, t)| t == self)
            .map(|(name, _)| *name)
            .unwrap_or("unknown")
    }
}

impl fmt::Display for StripeEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
