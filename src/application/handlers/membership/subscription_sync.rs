//! SubscriptionSyncHandler - Mirrors `customer.subscription.created/updated`.

use async_trait::async_trait;

use crate::domain::foundation::Timestamp;
use crate::domain::membership::{
    MembershipPatch, StripeEvent, StripeEventType, SubscriptionObject, WebhookError,
    WebhookEventHandler,
};

use super::{MembershipReconciler, UserResolver};

pub struct SubscriptionSyncHandler {
    resolver: UserResolver,
    reconciler: MembershipReconciler,
}

impl SubscriptionSyncHandler {
    pub fn new(resolver: UserResolver, reconciler: MembershipReconciler) -> Self {
        Self {
            resolver,
            reconciler,
        }
    }
}

#[async_trait]
impl WebhookEventHandler for SubscriptionSyncHandler {
    fn name(&self) -> &'static str {
        "subscription_sync"
    }

    fn handles(&self) -> Vec<StripeEventType> {
        vec![
            StripeEventType::CustomerSubscriptionCreated,
            StripeEventType::CustomerSubscriptionUpdated,
        ]
    }

    async fn handle(&self, event: &StripeEvent) -> Result<(), WebhookError> {
        let subscription: SubscriptionObject = event.object()?;
        let user_id = self
            .resolver
            .resolve(&subscription.metadata, subscription.customer.as_deref())
            .await?;

        tracing::debug!(
            event_id = %event.id,
            subscription_id = %subscription.id,
            status = %subscription.status,
            cancel_at_period_end = subscription.cancel_at_period_end,
            period_end = ?subscription.current_period_end.and_then(Timestamp::from_unix),
            "Syncing subscription state"
        );

        let patch = MembershipPatch::from_subscription(
            &subscription.status,
            subscription.id,
            subscription.customer,
        );
        self.reconciler.reconcile(&user_id, &patch).await?;
        Ok(())
    }
}
