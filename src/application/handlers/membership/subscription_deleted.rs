//! SubscriptionDeletedHandler - Ends paid access when Stripe deletes a subscription.
//!
//! The record is kept; only status and access change.

use async_trait::async_trait;

use crate::domain::membership::{
    MembershipPatch, StripeEvent, StripeEventType, SubscriptionObject, WebhookError,
    WebhookEventHandler,
};

use super::{MembershipReconciler, UserResolver};

pub struct SubscriptionDeletedHandler {
    resolver: UserResolver,
    reconciler: MembershipReconciler,
}

impl SubscriptionDeletedHandler {
    pub fn new(resolver: UserResolver, reconciler: MembershipReconciler) -> Self {
        Self {
            resolver,
            reconciler,
        }
    }
}

#[async_trait]
impl WebhookEventHandler for SubscriptionDeletedHandler {
    fn name(&self) -> &'static str {
        "subscription_deleted"
    }

    fn handles(&self) -> Vec<StripeEventType> {
        vec![StripeEventType::CustomerSubscriptionDeleted]
    }

    async fn handle(&self, event: &StripeEvent) -> Result<(), WebhookError> {
        let subscription: SubscriptionObject = event.object()?;
        let user_id = self
            .resolver
            .resolve(&subscription.metadata, subscription.customer.as_deref())
            .await?;

        self.reconciler
            .reconcile(&user_id, &MembershipPatch::cancelled())
            .await?;
        Ok(())
    }
}
