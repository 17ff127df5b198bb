//! UserResolver - Finds the identity provider user a Stripe object belongs to.
//!
//! The checkout flow writes `metadata.userId` onto the session, the
//! subscription and the customer. Lookups fall back in that order of
//! closeness: the object itself, then its customer.

use std::sync::Arc;

use crate::domain::foundation::UserId;
use crate::domain::membership::{
    metadata_user_id, InvoiceObject, StripeMetadata, WebhookError, METADATA_USER_ID,
};
use crate::ports::PaymentProvider;

#[derive(Clone)]
pub struct UserResolver {
    payments: Arc<dyn PaymentProvider>,
}

impl UserResolver {
    pub fn new(payments: Arc<dyn PaymentProvider>) -> Self {
        Self { payments }
    }

    /// `metadata.userId` on the object, else on its customer.
    pub async fn resolve(
        &self,
        metadata: &StripeMetadata,
        customer_id: Option<&str>,
    ) -> Result<UserId, WebhookError> {
        if let Some(user_id) = metadata_user_id(metadata) {
            return Ok(user_id);
        }
        self.from_customer(customer_id).await
    }

    /// Resolves through the invoice's subscription as Stripe reports it now,
    /// then the subscription snapshot carried on the invoice, then the
    /// customer.
    pub async fn resolve_invoice(
        &self,
        invoice: &InvoiceObject,
        subscription_id: &str,
    ) -> Result<UserId, WebhookError> {
        let subscription = self.payments.get_subscription(subscription_id).await?;

        if let Some(user_id) = subscription.as_ref().and_then(|s| s.user_id()) {
            return Ok(user_id);
        }
        if let Some(user_id) = invoice.snapshot_user_id() {
            return Ok(user_id);
        }

        let customer_id = subscription
            .and_then(|s| s.customer_id)
            .or_else(|| invoice.customer.clone());
        self.from_customer(customer_id.as_deref()).await
    }

    async fn from_customer(&self, customer_id: Option<&str>) -> Result<UserId, WebhookError> {
        let Some(customer_id) = customer_id.filter(|id| !id.is_empty()) else {
            return Err(WebhookError::MissingMetadata(METADATA_USER_ID));
        };

        tracing::debug!(customer_id, "Resolving user through customer metadata");

        self.payments
            .get_customer(customer_id)
            .await?
            .and_then(|customer| customer.user_id())
            .ok_or(WebhookError::MissingMetadata(METADATA_USER_ID))
    }
}
