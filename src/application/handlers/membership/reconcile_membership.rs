//! MembershipReconciler - Merges a membership patch into a user's metadata.
//!
//! Read the whole bag, shallow-merge the patch over it, write the whole bag
//! back. Keys the patch does not name are preserved. There is no version
//! check: two deliveries racing for the same user resolve last write wins.

use std::sync::Arc;

use crate::domain::foundation::UserId;
use crate::domain::membership::{MembershipPatch, MembershipRecord, WebhookError};
use crate::ports::IdentityProvider;

#[derive(Clone)]
pub struct MembershipReconciler {
    identity: Arc<dyn IdentityProvider>,
}

impl MembershipReconciler {
    pub fn new(identity: Arc<dyn IdentityProvider>) -> Self {
        Self { identity }
    }

    /// Applies `patch` to the user's metadata and returns the resulting record.
    pub async fn reconcile(
        &self,
        user_id: &UserId,
        patch: &MembershipPatch,
    ) -> Result<MembershipRecord, WebhookError> {
        let user = self.identity.get_user(user_id).await?;
        let metadata = user.metadata.merged(patch.to_metadata());
        let record = MembershipRecord::from_metadata(&metadata);

        self.identity.update_user_metadata(user_id, metadata).await?;

        tracing::info!(
            user_id = %user_id,
            membership_status = ?record.membership_status.as_ref().map(|s| s.as_str()),
            has_paid_membership = record.has_paid_membership,
            payment_failed = record.payment_failed,
            "Membership metadata reconciled"
        );

        Ok(record)
    }
}
