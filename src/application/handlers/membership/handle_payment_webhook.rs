//! HandlePaymentWebhookHandler - Command handler for Stripe webhook deliveries.
//!
//! Verifies the delivery, then fans the event out to every registered
//! reconciliation handler. Branch failures are logged here and summarized
//! in the returned [`DispatchReport`]; only verification failures surface
//! as `Err`.

use std::sync::Arc;

use crate::domain::membership::{
    DispatchReport, HandlerOutcome, HandlerRegistry, StripeWebhookVerifier, WebhookDispatcher,
    WebhookError,
};
use crate::ports::{IdentityProvider, PaymentProvider};

use super::{
    CheckoutCompletedHandler, CustomerLifecycleHandler, InvoicePaymentHandler,
    LegacyPaymentIntentHandler, MembershipReconciler, SubscriptionDeletedHandler,
    SubscriptionSyncHandler, UserResolver,
};

/// Command to handle a payment webhook.
#[derive(Debug, Clone)]
pub struct HandlePaymentWebhookCommand {
    /// Raw webhook payload, exactly as received.
    pub payload: Vec<u8>,
    /// `Stripe-Signature` header, if the request carried one.
    pub signature: Option<String>,
}

/// Handler for processing payment provider webhooks.
pub struct HandlePaymentWebhookHandler {
    verifier: StripeWebhookVerifier,
    dispatcher: Arc<dyn WebhookDispatcher>,
}

impl HandlePaymentWebhookHandler {
    pub fn new(verifier: StripeWebhookVerifier, dispatcher: Arc<dyn WebhookDispatcher>) -> Self {
        Self {
            verifier,
            dispatcher,
        }
    }

    /// Wires the full set of membership handlers over the given clients.
    pub fn standard(
        verifier: StripeWebhookVerifier,
        payments: Arc<dyn PaymentProvider>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        let reconciler = MembershipReconciler::new(identity);
        let resolver = UserResolver::new(payments.clone());

        let registry = HandlerRegistry::new()
            .register(Arc::new(CheckoutCompletedHandler::new(
                payments,
                reconciler.clone(),
            )))
            .register(Arc::new(SubscriptionSyncHandler::new(
                resolver.clone(),
                reconciler.clone(),
            )))
            .register(Arc::new(SubscriptionDeletedHandler::new(
                resolver.clone(),
                reconciler.clone(),
            )))
            .register(Arc::new(InvoicePaymentHandler::new(
                resolver,
                reconciler.clone(),
            )))
            .register(Arc::new(CustomerLifecycleHandler::new(reconciler.clone())))
            .register(Arc::new(LegacyPaymentIntentHandler::new(reconciler)));

        Self::new(verifier, Arc::new(registry))
    }

    pub async fn handle(
        &self,
        cmd: HandlePaymentWebhookCommand,
    ) -> Result<DispatchReport, WebhookError> {
        // 1. Verify signature and parse the event
        let signature = cmd.signature.ok_or(WebhookError::MissingSignature)?;
        let event = self.verifier.verify_and_parse(&cmd.payload, &signature)?;

        tracing::info!(
            event_id = %event.id,
            event_type = %event.event_type,
            livemode = event.livemode,
            "Processing Stripe webhook"
        );

        // 2. Run every matching handler
        let report = self.dispatcher.dispatch(&event).await;

        // 3. Log per-branch outcomes
        if report.is_unhandled() {
            tracing::debug!(
                event_id = %report.event_id,
                event_type = %report.event_type,
                "No handler for event type"
            );
        }
        for entry in &report.handlers {
            match &entry.outcome {
                HandlerOutcome::Applied => {}
                HandlerOutcome::Ignored(reason) => tracing::debug!(
                    event_id = %report.event_id,
                    handler = entry.handler,
                    reason = %reason,
                    "Event ignored by handler"
                ),
                HandlerOutcome::Failed { error, retryable } => tracing::error!(
                    event_id = %report.event_id,
                    event_type = %report.event_type,
                    handler = entry.handler,
                    error = %error,
                    retryable,
                    "Webhook handler failed"
                ),
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::identity::InMemoryIdentityProvider;
    use crate::adapters::stripe::MockPaymentProvider;
    use crate::domain::membership::{MembershipStatus, SubscriptionStatus};
    use serde_json::json;

    const SECRET: &str = "whsec_test_secret";

    // ══════════════════════════════════════════════════════════════
    // Test Infrastructure
    // ══════════════════════════════════════════════════════════════

    struct Fixture {
        payments: MockPaymentProvider,
        identity: Arc<InMemoryIdentityProvider>,
        handler: HandlePaymentWebhookHandler,
    }

    fn fixture() -> Fixture {
        let payments = MockPaymentProvider::new();
        let identity = Arc::new(
            InMemoryIdentityProvider::new()
                .with_user("u1", json!({ "display_name": "Ada" }))
                .with_user("u2", json!({ "membership_status": "active", "has_paid_membership": true })),
        );
        let handler = HandlePaymentWebhookHandler::standard(
            StripeWebhookVerifier::new(SECRET),
            Arc::new(payments.clone()),
            identity.clone(),
        );
        Fixture {
            payments,
            identity,
            handler,
        }
    }

    fn signed(event: serde_json::Value) -> HandlePaymentWebhookCommand {
        let payload = event.to_string().into_bytes();
        let signature = StripeWebhookVerifier::new(SECRET)
            .signature_header_for(chrono::Utc::now().timestamp(), &payload)
            .unwrap();
        HandlePaymentWebhookCommand {
            payload,
            signature: Some(signature),
        }
    }

    fn event(event_type: &str, object: serde_json::Value) -> serde_json::Value {
        json!({
            "id": "evt_1",
            "object": "event",
            "type": event_type,
            "created": chrono::Utc::now().timestamp(),
            "livemode": false,
            "data": { "object": object }
        })
    }

    // ══════════════════════════════════════════════════════════════
    // Verification
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn missing_signature_is_rejected() {
        let f = fixture();

        let err = f
            .handler
            .handle(HandlePaymentWebhookCommand {
                payload: b"{}".to_vec(),
                signature: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, WebhookError::MissingSignature));
    }

    #[tokio::test]
    async fn tampered_payload_is_rejected_before_dispatch() {
        let f = fixture();
        let mut cmd = signed(event(
            "customer.subscription.deleted",
            json!({ "id": "sub_1", "status": "canceled", "metadata": { "userId": "u2" } }),
        ));
        cmd.payload = cmd
            .payload
            .iter()
            .map(|b| if *b == b'2' { b'1' } else { *b })
            .collect();

        let err = f.handler.handle(cmd).await.unwrap_err();

        assert!(matches!(err, WebhookError::InvalidSignature));
        assert_eq!(f.identity.update_count(), 0);
    }

    // ══════════════════════════════════════════════════════════════
    // Dispatch
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn checkout_completed_activates_membership() {
        let f = fixture();
        f.payments.add_subscription(MockPaymentProvider::subscription(
            "sub_123",
            SubscriptionStatus::Active,
        ));

        let report = f
            .handler
            .handle(signed(event(
                "checkout.session.completed",
                json!({
                    "id": "cs_1",
                    "mode": "subscription",
                    "subscription": "sub_123",
                    "metadata": { "type": "membership", "userId": "u1" }
                }),
            )))
            .await
            .unwrap();

        assert_eq!(report.applied(), 1);
        let record = f.identity.membership("u1").unwrap();
        assert_eq!(record.membership_status, Some(MembershipStatus::Active));
        assert!(record.has_paid_membership);
        assert_eq!(record.stripe_subscription_id.as_deref(), Some("sub_123"));
    }

    #[tokio::test]
    async fn subscription_deleted_cancels_membership() {
        let f = fixture();

        f.handler
            .handle(signed(event(
                "customer.subscription.deleted",
                json!({ "id": "sub_9", "status": "canceled", "metadata": { "userId": "u2" } }),
            )))
            .await
            .unwrap();

        let record = f.identity.membership("u2").unwrap();
        assert_eq!(record.membership_status, Some(MembershipStatus::Cancelled));
        assert!(!record.has_paid_membership);
    }

    #[tokio::test]
    async fn unknown_event_type_changes_nothing() {
        let f = fixture();

        let report = f
            .handler
            .handle(signed(event("charge.refunded", json!({ "id": "ch_1" }))))
            .await
            .unwrap();

        assert!(report.is_unhandled());
        assert_eq!(f.identity.update_count(), 0);
        assert!(f.payments.calls().is_empty());
    }

    #[tokio::test]
    async fn branch_failure_is_reported_not_raised() {
        let f = fixture();

        let report = f
            .handler
            .handle(signed(event(
                "customer.subscription.updated",
                json!({ "id": "sub_1", "status": "active", "metadata": { "userId": "ghost" } }),
            )))
            .await
            .unwrap();

        assert_eq!(report.applied(), 0);
        assert_eq!(report.first_failure(), Some("User not found: ghost"));
    }

    #[tokio::test]
    async fn each_event_type_reaches_one_handler() {
        let f = fixture();

        let report = f
            .handler
            .handle(signed(event(
                "customer.created",
                json!({ "id": "cus_1", "metadata": { "userId": "u1" } }),
            )))
            .await
            .unwrap();

        assert_eq!(report.handlers.len(), 1);
        assert_eq!(report.handlers[0].handler, "customer_lifecycle");
        assert_eq!(
            f.identity.membership("u1").unwrap().stripe_customer_id.as_deref(),
            Some("cus_1")
        );
    }
}
