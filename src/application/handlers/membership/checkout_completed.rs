//! CheckoutCompletedHandler - First activation after a membership checkout.
//!
//! Only subscription-mode sessions tagged `type=membership` are acted on.
//! The session carries the subscription id but not its status, so the
//! subscription is retrieved and mirrored like a `customer.subscription.*`
//! event, plus the purchase time.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::foundation::Timestamp;
use crate::domain::membership::{
    CheckoutSessionObject, MembershipPatch, StripeEvent, StripeEventType, WebhookError,
    WebhookEventHandler, METADATA_USER_ID,
};
use crate::ports::PaymentProvider;

use super::MembershipReconciler;

pub struct CheckoutCompletedHandler {
    payments: Arc<dyn PaymentProvider>,
    reconciler: MembershipReconciler,
}

impl CheckoutCompletedHandler {
    pub fn new(payments: Arc<dyn PaymentProvider>, reconciler: MembershipReconciler) -> Self {
        Self {
            payments,
            reconciler,
        }
    }
}

#[async_trait]
impl WebhookEventHandler for CheckoutCompletedHandler {
    fn name(&self) -> &'static str {
        "checkout_completed"
    }

    fn handles(&self) -> Vec<StripeEventType> {
        vec![StripeEventType::CheckoutSessionCompleted]
    }

    async fn handle(&self, event: &StripeEvent) -> Result<(), WebhookError> {
        let session: CheckoutSessionObject = event.object()?;

        if !session.is_subscription_mode() {
            return Err(WebhookError::Ignored(format!(
                "checkout {} is not in subscription mode",
                session.id
            )));
        }
        if !session.is_membership_purchase() {
            return Err(WebhookError::Ignored(format!(
                "checkout {} is not a membership purchase",
                session.id
            )));
        }

        let user_id = session
            .user_id()
            .ok_or(WebhookError::MissingMetadata(METADATA_USER_ID))?;
        let subscription_id = session
            .subscription
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or(WebhookError::MissingField("subscription"))?;

        let subscription = self
            .payments
            .get_subscription(subscription_id)
            .await?
            .ok_or_else(|| {
                WebhookError::PaymentProvider(format!(
                    "subscription {} not found",
                    subscription_id
                ))
            })?;

        tracing::debug!(
            event_id = %event.id,
            session_id = %session.id,
            subscription_id = %subscription.id,
            status = %subscription.status,
            period_end = ?subscription.current_period_end.and_then(Timestamp::from_unix),
            "Activating membership from checkout"
        );

        let customer_id = subscription.customer_id.clone().or(session.customer);
        let patch =
            MembershipPatch::from_subscription(&subscription.status, &subscription.id, customer_id)
                .with_purchased_at(Timestamp::now());

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
    use serde_json::json;

    // ══════════════════════════════════════════════════════════════
    // Test Infrastructure
    // ══════════════════════════════════════════════════════════════

    struct Fixture {
        payments: MockPaymentProvider,
        identity: Arc<InMemoryIdentityProvider>,
        handler: CheckoutCompletedHandler,
    }

    fn fixture(status: SubscriptionStatus) -> Fixture {
        let payments = MockPaymentProvider::new();
        let mut sub = MockPaymentProvider::subscription("sub_123", status);
        sub.customer_id = Some("cus_456".into());
        payments.add_subscription(sub);

        let identity = Arc::new(
            InMemoryIdentityProvider::new().with_user("u1", json!({ "display_name": "Ada" })),
        );
        let handler = CheckoutCompletedHandler::new(
            Arc::new(payments.clone()),
            MembershipReconciler::new(identity.clone()),
        );

        Fixture {
            payments,
            identity,
            handler,
        }
    }

    fn checkout(object: serde_json::Value) -> StripeEvent {
        StripeEvent::fixture("checkout.session.completed", object)
    }

    fn membership_session() -> serde_json::Value {
        json!({
            "id": "cs_1",
            "object": "checkout.session",
            "mode": "subscription",
            "customer": "cus_456",
            "subscription": "sub_123",
            "metadata": { "type": "membership", "userId": "u1" }
        })
    }

    // ══════════════════════════════════════════════════════════════
    // Activation
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn activates_membership_from_retrieved_subscription() {
        let f = fixture(SubscriptionStatus::Active);

        f.handler.handle(&checkout(membership_session())).await.unwrap();

        let record = f.identity.membership("u1").unwrap();
        assert_eq!(record.membership_status, Some(MembershipStatus::Active));
        assert!(record.has_paid_membership);
        assert_eq!(record.stripe_subscription_id.as_deref(), Some("sub_123"));
        assert_eq!(record.stripe_customer_id.as_deref(), Some("cus_456"));
        assert!(record.membership_purchased_at.is_some());
        assert_eq!(
            f.identity.metadata("u1").unwrap().get_str("display_name"),
            Some("Ada")
        );
        assert_eq!(f.payments.lookups(StripeLookup::Subscription), 1);
    }

    #[tokio::test]
    async fn incomplete_subscription_is_stored_without_access() {
        let f = fixture(SubscriptionStatus::Incomplete);

        f.handler.handle(&checkout(membership_session())).await.unwrap();

        let record = f.identity.membership("u1").unwrap();
        assert_eq!(
            record.membership_status,
            Some(MembershipStatus::Provider("incomplete".into()))
        );
        assert!(!record.has_paid_membership);
    }

    // ══════════════════════════════════════════════════════════════
    // Guards
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn payment_mode_checkout_is_ignored() {
        let f = fixture(SubscriptionStatus::Active);
        let mut session = membership_session();
        session["mode"] = json!("payment");

        let err = f.handler.handle(&checkout(session)).await.unwrap_err();

        assert!(matches!(err, WebhookError::Ignored(_)));
        assert!(f.payments.calls().is_empty());
        assert_eq!(f.identity.update_count(), 0);
    }

    #[tokio::test]
    async fn non_membership_checkout_is_ignored() {
        let f = fixture(SubscriptionStatus::Active);
        let mut session = membership_session();
        session["metadata"] = json!({ "type": "print", "userId": "u1" });

        let err = f.handler.handle(&checkout(session)).await.unwrap_err();

        assert!(matches!(err, WebhookError::Ignored(_)));
    }

    #[tokio::test]
    async fn missing_user_id_is_an_error() {
        let f = fixture(SubscriptionStatus::Active);
        let mut session = membership_session();
        session["metadata"] = json!({ "type": "membership" });

        let err = f.handler.handle(&checkout(session)).await.unwrap_err();

        assert!(matches!(err, WebhookError::MissingMetadata("userId")));
    }

    #[tokio::test]
    async fn missing_subscription_id_is_an_error() {
        let f = fixture(SubscriptionStatus::Active);
        let mut session = membership_session();
        session["subscription"] = serde_json::Value::Null;

        let err = f.handler.handle(&checkout(session)).await.unwrap_err();

        assert!(matches!(err, WebhookError::MissingField("subscription")));
    }

    #[tokio::test]
    async fn subscription_unknown_to_stripe_is_an_error() {
        let f = fixture(SubscriptionStatus::Active);
        let mut session = membership_session();
        session["subscription"] = json!("sub_missing");

        let err = f.handler.handle(&checkout(session)).await.unwrap_err();

        assert!(matches!(err, WebhookError::PaymentProvider(_)));
        assert_eq!(f.identity.update_count(), 0);
    }
}
