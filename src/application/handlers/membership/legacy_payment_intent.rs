//! LegacyPaymentIntentHandler - One-time membership purchases.
//!
//! Before subscriptions, membership was sold as a single payment tagged
//! `type=membership`. Intents that pay an invoice belong to a subscription
//! and are left to the invoice handler.
//!
//! The invoice check is a heuristic, not a structural distinction. A bare
//! `payment_intent.succeeded` for a subscription's first charge would be
//! applied here as well as by the subscription handlers.

use async_trait::async_trait;

use crate::domain::foundation::Timestamp;
use crate::domain::membership::{
    MembershipPatch, PaymentIntentObject, StripeEvent, StripeEventType, WebhookError,
    WebhookEventHandler, METADATA_USER_ID,
};

use super::MembershipReconciler;

pub struct LegacyPaymentIntentHandler {
    reconciler: MembershipReconciler,
}

impl LegacyPaymentIntentHandler {
    pub fn new(reconciler: MembershipReconciler) -> Self {
        Self { reconciler }
    }
}

#[async_trait]
impl WebhookEventHandler for LegacyPaymentIntentHandler {
    fn name(&self) -> &'static str {
        "legacy_payment_intent"
    }

    fn handles(&self) -> Vec<StripeEventType> {
        vec![StripeEventType::PaymentIntentSucceeded]
    }

    async fn handle(&self, event: &StripeEvent) -> Result<(), WebhookError> {
        let intent: PaymentIntentObject = event.object()?;

        if intent.has_invoice() {
            return Err(WebhookError::Ignored(format!(
                "payment intent {} pays an invoice",
                intent.id
            )));
        }
        if !intent.is_membership_purchase() {
            return Err(WebhookError::Ignored(format!(
                "payment intent {} is not a membership purchase",
                intent.id
            )));
        }

        let user_id = intent
            .user_id()
            .ok_or(WebhookError::MissingMetadata(METADATA_USER_ID))?;

        tracing::info!(
            event_id = %event.id,
            payment_intent_id = %intent.id,
            amount = ?intent.amount,
            currency = ?intent.currency,
            "One-time membership purchase"
        );

        let patch = MembershipPatch::one_time_purchase(Timestamp::now(), intent.customer);
        self.reconciler.reconcile(&user_id, &patch).await?;
        Ok(())
    }
}
