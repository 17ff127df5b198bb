//! InvoicePaymentHandler - Recurring payment confirmations and failures.
//!
//! A paid invoice forces the member active and clears any failure flag.
//! A failed invoice only sets the failure flag: Stripe keeps retrying the
//! charge, and if it gives up the subscription is deleted, which is what
//! ends access.

use async_trait::async_trait;

use crate::domain::foundation::Timestamp;
use crate::domain::membership::{
    InvoiceObject, MembershipPatch, StripeEvent, StripeEventType, WebhookError,
    WebhookEventHandler,
};

use super::{MembershipReconciler, UserResolver};

pub struct InvoicePaymentHandler {
    resolver: UserResolver,
    reconciler: MembershipReconciler,
}

impl InvoicePaymentHandler {
    pub fn new(resolver: UserResolver, reconciler: MembershipReconciler) -> Self {
        Self {
            resolver,
            reconciler,
        }
    }
}

#[async_trait]
impl WebhookEventHandler for InvoicePaymentHandler {
    fn name(&self) -> &'static str {
        "invoice_payment"
    }

    fn handles(&self) -> Vec<StripeEventType> {
        vec![
            StripeEventType::InvoicePaymentSucceeded,
            StripeEventType::InvoicePaymentFailed,
        ]
    }

    async fn handle(&self, event: &StripeEvent) -> Result<(), WebhookError> {
        let invoice: InvoiceObject = event.object()?;

        let Some(subscription_id) = invoice.subscription_id() else {
            return Err(WebhookError::Ignored(format!(
                "invoice {} is not for a subscription",
                invoice.id
            )));
        };

        let user_id = self
            .resolver
            .resolve_invoice(&invoice, subscription_id)
            .await?;

        let patch = match event.parsed_type() {
            StripeEventType::InvoicePaymentSucceeded => MembershipPatch::payment_succeeded(),
            _ => {
                tracing::warn!(
                    event_id = %event.id,
                    invoice_id = %invoice.id,
                    user_id = %user_id,
                    billing_reason = invoice.billing_reason.as_deref().unwrap_or("unknown"),
                    "Invoice payment failed, membership left active for the retry window"
                );
                MembershipPatch::payment_failed(Timestamp::now())
            }
        };

        self.reconciler.reconcile(&user_id, &patch).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::identity::InMemoryIdentityProvider;
    use crate::adapters::stripe::{MockPaymentProvider, StripeLookup};
    use crate::domain::membership::{MembershipStatus, SubscriptionStatus};
    use crate::ports::PaymentError;
    use serde_json::json;
    use std::sync::Arc;

    // ══════════════════════════════════════════════════════════════
    // Test Infrastructure
    // ══════════════════════════════════════════════════════════════

    fn setup(
        existing: serde_json::Value,
    ) -> (
        Arc<InMemoryIdentityProvider>,
        MockPaymentProvider,
        InvoicePaymentHandler,
    ) {
        let payments = MockPaymentProvider::new();
        let mut sub = MockPaymentProvider::subscription("sub_1", SubscriptionStatus::Active);
        sub.metadata.insert("userId".into(), "u1".into());
        payments.add_subscription(sub);

        let identity = Arc::new(InMemoryIdentityProvider::new().with_user("u1", existing));
        let handler = InvoicePaymentHandler::new(
            UserResolver::new(Arc::new(payments.clone())),
            MembershipReconciler::new(identity.clone()),
        );
        (identity, payments, handler)
    }

    fn invoice_event(event_type: &str, object: serde_json::Value) -> StripeEvent {
        StripeEvent::fixture(event_type, object)
    }

    fn active_member() -> serde_json::Value {
        json!({
            "membership_status": "active",
            "has_paid_membership": true,
            "stripe_subscription_id": "sub_1"
        })
    }

    // ══════════════════════════════════════════════════════════════
    // Payment Failed
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn payment_failure_does_not_deactivate() {
        let (identity, _, handler) = setup(active_member());

        handler
            .handle(&invoice_event(
                "invoice.payment_failed",
                json!({ "id": "in_1", "customer": "cus_1", "subscription": "sub_1" }),
            ))
            .await
            .unwrap();

        let record = identity.membership("u1").unwrap();
        assert_eq!(record.membership_status, Some(MembershipStatus::Active));
        assert!(record.has_paid_membership);
        assert!(record.payment_failed);
        assert!(record.payment_failed_at.is_some());
    }

    // ══════════════════════════════════════════════════════════════
    // Payment Succeeded
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn payment_success_reactivates_and_clears_failure() {
        let (identity, _, handler) = setup(json!({
            "membership_status": "past_due",
            "has_paid_membership": false,
            "payment_failed": true,
            "payment_failed_at": "2024-01-01T00:00:00.000Z"
        }));

        handler
            .handle(&invoice_event(
                "invoice.payment_succeeded",
                json!({ "id": "in_2", "subscription": "sub_1" }),
            ))
            .await
            .unwrap();

        let record = identity.membership("u1").unwrap();
        assert_eq!(record.membership_status, Some(MembershipStatus::Active));
        assert!(record.has_paid_membership);
        assert!(!record.payment_failed);
    }

    #[tokio::test]
    async fn reads_subscription_from_parent_on_newer_api_versions() {
        let (identity, payments, handler) = setup(json!({}));

        handler
            .handle(&invoice_event(
                "invoice.payment_succeeded",
                json!({
                    "id": "in_3",
                    "parent": { "subscription_details": { "subscription": "sub_1" } }
                }),
            ))
            .await
            .unwrap();

        assert!(identity.membership("u1").unwrap().has_access());
        assert_eq!(payments.lookups(StripeLookup::Subscription), 1);
    }

    // ══════════════════════════════════════════════════════════════
    // Guards and Failures
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn one_off_invoice_is_ignored() {
        let (identity, payments, handler) = setup(json!({}));

        let err = handler
            .handle(&invoice_event(
                "invoice.payment_succeeded",
                json!({ "id": "in_4", "customer": "cus_1" }),
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, WebhookError::Ignored(_)));
        assert!(payments.calls().is_empty());
        assert_eq!(identity.update_count(), 0);
    }

    #[tokio::test]
    async fn stripe_outage_is_reported() {
        let (identity, payments, handler) = setup(active_member());
        payments.fail_next(PaymentError::Network("connection reset".into()));

        let err = handler
            .handle(&invoice_event(
                "invoice.payment_failed",
                json!({ "id": "in_5", "subscription": "sub_1" }),
            ))
            .await
            .unwrap_err();

        assert!(err.is_retryable());
        assert!(!identity.membership("u1").unwrap().payment_failed);
    }
}
