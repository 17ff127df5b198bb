//! Typed views of the `data.object` payloads we act on.
//!
//! Each struct captures just the fields the reconciliation handlers read.
//! Expandable references (`customer`, `subscription`, `invoice`) arrive
//! as plain ids in webhook payloads and are modelled that way.

use std::collections::HashMap;

use serde::Deserialize;

use crate::domain::foundation::UserId;

use super::status::SubscriptionStatus;

/// Stripe object metadata (string to string).
pub type StripeMetadata = HashMap<String, String>;

/// Metadata key the checkout flow writes the identity provider user id into.
pub const METADATA_USER_ID: &str = "userId";

/// Metadata key tagging what a payment is for.
pub const METADATA_PURCHASE_TYPE: &str = "type";

/// `type` value for membership purchases.
pub const MEMBERSHIP_PURCHASE: &str = "membership";

/// Reads `metadata.userId`, treating blank values as absent.
pub fn metadata_user_id(metadata: &StripeMetadata) -> Option<UserId> {
    metadata
        .get(METADATA_USER_ID)
        .and_then(|raw| UserId::new(raw.as_str()).ok())
}

fn is_membership_purchase(metadata: &StripeMetadata) -> bool {
    metadata.get(METADATA_PURCHASE_TYPE).map(String::as_str) == Some(MEMBERSHIP_PURCHASE)
}

/// `checkout.session` object.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSessionObject {
    pub id: String,

    /// `payment`, `setup` or `subscription`.
    #[serde(default)]
    pub mode: Option<String>,

    #[serde(default)]
    pub customer: Option<String>,

    #[serde(default)]
    pub subscription: Option<String>,

    #[serde(default)]
    pub metadata: StripeMetadata,
}

impl CheckoutSessionObject {
    pub fn is_subscription_mode(&self) -> bool {
        self.mode.as_deref() == Some("subscription")
    }

    pub fn is_membership_purchase(&self) -> bool {
        is_membership_purchase(&self.metadata)
    }

    pub fn user_id(&self) -> Option<UserId> {
        metadata_user_id(&self.metadata)
    }
}

/// `subscription` object.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionObject {
    pub id: String,

    #[serde(default)]
    pub customer: Option<String>,

    pub status: SubscriptionStatus,

    #[serde(default)]
    pub cancel_at_period_end: bool,

    #[serde(default)]
    pub current_period_end: Option<i64>,

    #[serde(default)]
    pub metadata: StripeMetadata,
}

/// `customer` object. Deleted customers come back as a stub with
/// `deleted: true`.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomerObject {
    pub id: String,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub metadata: StripeMetadata,

    #[serde(default)]
    pub deleted: bool,
}

impl CustomerObject {
    pub fn user_id(&self) -> Option<UserId> {
        metadata_user_id(&self.metadata)
    }
}

/// `invoice` object.
#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceObject {
    pub id: String,

    #[serde(default)]
    pub customer: Option<String>,

    /// Present on API versions before the `parent` restructuring.
    #[serde(default)]
    pub subscription: Option<String>,

    #[serde(default)]
    pub subscription_details: Option<InvoiceSubscriptionDetails>,

    #[serde(default)]
    pub parent: Option<InvoiceParent>,

    #[serde(default)]
    pub billing_reason: Option<String>,
}

/// Newer API versions nest the subscription reference under `parent`.
#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceParent {
    #[serde(default)]
    pub subscription_details: Option<InvoiceSubscriptionDetails>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceSubscriptionDetails {
    #[serde(default)]
    pub subscription: Option<String>,

    #[serde(default)]
    pub metadata: StripeMetadata,
}

impl InvoiceObject {
    fn details(&self) -> impl Iterator<Item = &InvoiceSubscriptionDetails> {
        self.subscription_details.iter().chain(
            self.parent
                .as_ref()
                .and_then(|p| p.subscription_details.as_ref()),
        )
    }

    /// Subscription the invoice bills for, wherever the API version put it.
    pub fn subscription_id(&self) -> Option<&str> {
        self.subscription
            .as_deref()
            .or_else(|| self.details().find_map(|d| d.subscription.as_deref()))
            .filter(|id| !id.is_empty())
    }

    /// `userId` from the subscription metadata snapshot carried on the invoice.
    pub fn snapshot_user_id(&self) -> Option<UserId> {
        self.details().find_map(|d| metadata_user_id(&d.metadata))
    }
}

/// `payment_intent` object.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntentObject {
    pub id: String,

    #[serde(default)]
    pub customer: Option<String>,

    /// Set when the intent pays an invoice (i.e. belongs to a subscription).
    #[serde(default)]
    pub invoice: Option<String>,

    #[serde(default)]
    pub amount: Option<i64>,

    #[serde(default)]
    pub currency: Option<String>,

    #[serde(default)]
    pub metadata: StripeMetadata,
}

impl PaymentIntentObject {
    pub fn has_invoice(&self) -> bool {
        self.invoice.as_deref().is_some_and(|id| !id.is_empty())
    }

    pub fn is_membership_purchase(&self) -> bool {
        is_membership_purchase(&self.metadata)
    }

    pub fn user_id(&self) -> Option<UserId> {
        metadata_user_id(&self.metadata)
    }
}
