//! CustomerLifecycleHandler - Bookkeeping for the Stripe customer reference.
//!
//! `customer.created` links the customer id to the user named in its
//! metadata. `customer.deleted` is logged only; membership state is driven
//! by subscription events, never by customer deletion.

use async_trait::async_trait;

use crate::domain::membership::{
    CustomerObject, MembershipPatch, StripeEvent, StripeEventType, WebhookError,
    WebhookEventHandler,
};

use super::MembershipReconciler;

pub struct CustomerLifecycleHandler {
    reconciler: MembershipReconciler,
}

impl CustomerLifecycleHandler {
    pub fn new(reconciler: MembershipReconciler) -> Self {
        Self { reconciler }
    }
}

#[async_trait]
impl WebhookEventHandler for CustomerLifecycleHandler {
    fn name(&self) -> &'static str {
        "customer_lifecycle"
    }

    fn handles(&self) -> Vec<StripeEventType> {
        vec![
            StripeEventType::CustomerCreated,
            StripeEventType::CustomerDeleted,
        ]
    }

    async fn handle(&self, event: &StripeEvent) -> Result<(), WebhookError> {
        let customer: CustomerObject = event.object()?;

        if event.parsed_type() == StripeEventType::CustomerDeleted {
            tracing::info!(
                event_id = %event.id,
                customer_id = %customer.id,
                user_id = ?customer.user_id().map(|u| u.to_string()),
                "Stripe customer deleted"
            );
            return Err(WebhookError::Ignored(
                "customer deletion does not change membership".to_string(),
            ));
        }

        let Some(user_id) = customer.user_id() else {
            return Err(WebhookError::Ignored(format!(
                "customer {} has no userId",
                customer.id
            )));
        };

        self.reconciler
            .reconcile(&user_id, &MembershipPatch::customer_linked(customer.id))
            .await?;
        Ok(())
    }
}
