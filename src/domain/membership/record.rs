//! Membership projection stored in the user's metadata bag.
//!
//! Stripe is the source of truth for billing. What lives on the user is a
//! cached projection that the application reads to gate Pro features, kept
//! current by webhook deliveries. Writes are expressed as a
//! [`MembershipPatch`]; reads go through [`MembershipRecord`].

use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::foundation::Timestamp;

use super::metadata::UserMetadata;
use super::status::{MembershipStatus, SubscriptionStatus};

/// Metadata keys owned by the membership flow.
pub mod keys {
    pub const MEMBERSHIP_STATUS: &str = "membership_status";
    pub const HAS_PAID_MEMBERSHIP: &str = "has_paid_membership";
    pub const MEMBERSHIP_PURCHASED_AT: &str = "membership_purchased_at";
    pub const STRIPE_SUBSCRIPTION_ID: &str = "stripe_subscription_id";
    pub const STRIPE_CUSTOMER_ID: &str = "stripe_customer_id";
    pub const PAYMENT_FAILED: &str = "payment_failed";
    pub const PAYMENT_FAILED_AT: &str = "payment_failed_at";
}

/// A partial update to the membership keys.
///
/// Only `Some` fields are written; the rest of the bag is left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MembershipPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub membership_status: Option<MembershipStatus>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_paid_membership: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub membership_purchased_at: Option<Timestamp>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stripe_subscription_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stripe_customer_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_failed: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_failed_at: Option<Timestamp>,
}

impl MembershipPatch {
    /// Mirror a subscription's current state.
    ///
    /// The raw provider status is stored and `has_paid_membership` follows
    /// it, so replaying the same subscription always yields the same record.
    pub fn from_subscription(
        status: &SubscriptionStatus,
        subscription_id: impl Into<String>,
        customer_id: Option<String>,
    ) -> Self {
        Self {
            membership_status: Some(MembershipStatus::from(status)),
            has_paid_membership: Some(status.grants_paid_access()),
            stripe_subscription_id: Some(subscription_id.into()),
            stripe_customer_id: customer_id,
            ..Self::default()
        }
    }

    /// Subscription deleted at the provider.
    pub fn cancelled() -> Self {
        Self {
            membership_status: Some(MembershipStatus::Cancelled),
            has_paid_membership: Some(false),
            ..Self::default()
        }
    }

    /// An invoice was paid: the member is active and any earlier failure flag
    /// is cleared.
    pub fn payment_succeeded() -> Self {
        Self {
            membership_status: Some(MembershipStatus::Active),
            has_paid_membership: Some(true),
            payment_failed: Some(false),
            ..Self::default()
        }
    }

    /// An invoice payment failed. Access is untouched; Stripe's retry
    /// schedule acts as the grace period and a later subscription update
    /// carries the real status.
    pub fn payment_failed(at: Timestamp) -> Self {
        Self {
            payment_failed: Some(true),
            payment_failed_at: Some(at),
            ..Self::default()
        }
    }

    /// One-time membership purchase outside of a subscription.
    pub fn one_time_purchase(at: Timestamp, customer_id: Option<String>) -> Self {
        Self {
            membership_status: Some(MembershipStatus::Active),
            has_paid_membership: Some(true),
            membership_purchased_at: Some(at),
            stripe_customer_id: customer_id,
            ..Self::default()
        }
    }

    /// Associate a Stripe customer with the user.
    pub fn customer_linked(customer_id: impl Into<String>) -> Self {
        Self {
            stripe_customer_id: Some(customer_id.into()),
            ..Self::default()
        }
    }

    pub fn with_purchased_at(mut self, at: Timestamp) -> Self {
        self.membership_purchased_at = Some(at);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// The metadata entries this patch writes.
    pub fn to_metadata(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// Typed read view over the membership keys of a metadata bag.
///
/// Missing or mistyped entries read as absent, so a bag written by older
/// code or edited by hand never fails to load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MembershipRecord {
    pub membership_status: Option<MembershipStatus>,
    pub has_paid_membership: bool,
    pub membership_purchased_at: Option<Timestamp>,
    pub stripe_subscription_id: Option<String>,
    pub stripe_customer_id: Option<String>,
    pub payment_failed: bool,
    pub payment_failed_at: Option<Timestamp>,
}

impl MembershipRecord {
    pub fn from_metadata(metadata: &UserMetadata) -> Self {
        let timestamp = |key: &str| {
            metadata
                .get_str(key)
                .and_then(|raw| Timestamp::parse_rfc3339(raw).ok())
        };
        let string = |key: &str| metadata.get_str(key).map(str::to_string);

        Self {
            membership_status: metadata
                .get_str(keys::MEMBERSHIP_STATUS)
                .map(MembershipStatus::parse),
            has_paid_membership: metadata
                .get_bool(keys::HAS_PAID_MEMBERSHIP)
                .unwrap_or(false),
            membership_purchased_at: timestamp(keys::MEMBERSHIP_PURCHASED_AT),
            stripe_subscription_id: string(keys::STRIPE_SUBSCRIPTION_ID),
            stripe_customer_id: string(keys::STRIPE_CUSTOMER_ID),
            payment_failed: metadata.get_bool(keys::PAYMENT_FAILED).unwrap_or(false),
            payment_failed_at: timestamp(keys::PAYMENT_FAILED_AT),
        }
    }

    /// Whether the application should unlock Pro features.
    pub fn has_access(&self) -> bool {
        self.has_paid_membership
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ══════════════════════════════════════════════════════════════
    // Patch Constructors
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn active_subscription_patch_grants_access() {
        let patch = MembershipPatch::from_subscription(
            &SubscriptionStatus::Active,
            "sub_123",
            Some("cus_456".into()),
        );

        assert_eq!(
            Value::Object(patch.to_metadata()),
            json!({
                "membership_status": "active",
                "has_paid_membership": true,
                "stripe_subscription_id": "sub_123",
                "stripe_customer_id": "cus_456"
            })
        );
    }

    #[test]
    fn trialing_subscription_patch_keeps_raw_status_and_grants_access() {
        let patch =
            MembershipPatch::from_subscription(&SubscriptionStatus::Trialing, "sub_1", None);

        let map = patch.to_metadata();
        assert_eq!(map["membership_status"], json!("trialing"));
        assert_eq!(map["has_paid_membership"], json!(true));
        assert!(!map.contains_key("stripe_customer_id"));
    }

    #[test]
    fn past_due_subscription_patch_revokes_access() {
        let patch = MembershipPatch::from_subscription(&SubscriptionStatus::PastDue, "sub_1", None);

        let map = patch.to_metadata();
        assert_eq!(map["membership_status"], json!("past_due"));
        assert_eq!(map["has_paid_membership"], json!(false));
    }

    #[test]
    fn cancelled_patch_writes_only_status_and_access() {
        assert_eq!(
            Value::Object(MembershipPatch::cancelled().to_metadata()),
            json!({ "membership_status": "cancelled", "has_paid_membership": false })
        );
    }

    #[test]
    fn payment_failed_patch_does_not_touch_status() {
        let at = Timestamp::from_unix(1_704_067_200).unwrap();
        assert_eq!(
            Value::Object(MembershipPatch::payment_failed(at).to_metadata()),
            json!({
                "payment_failed": true,
                "payment_failed_at": "2024-01-01T00:00:00.000Z"
            })
        );
    }

    #[test]
    fn payment_succeeded_patch_clears_failure_flag() {
        let map = MembershipPatch::payment_succeeded().to_metadata();
        assert_eq!(map["membership_status"], json!("active"));
        assert_eq!(map["has_paid_membership"], json!(true));
        assert_eq!(map["payment_failed"], json!(false));
        assert!(!map.contains_key("payment_failed_at"));
    }

    #[test]
    fn one_time_purchase_records_purchase_time() {
        let at = Timestamp::from_unix(1_704_067_200).unwrap();
        let map = MembershipPatch::one_time_purchase(at, None).to_metadata();
        assert_eq!(map["membership_purchased_at"], json!("2024-01-01T00:00:00.000Z"));
        assert_eq!(map["has_paid_membership"], json!(true));
    }

    #[test]
    fn default_patch_is_empty() {
        assert!(MembershipPatch::default().is_empty());
        assert!(MembershipPatch::default().to_metadata().is_empty());
        assert!(!MembershipPatch::cancelled().is_empty());
    }

    // ══════════════════════════════════════════════════════════════
    // Record Reads
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn record_reads_back_an_applied_patch() {
        let at = Timestamp::from_unix(1_704_067_200).unwrap();
        let patch = MembershipPatch::from_subscription(
            &SubscriptionStatus::Active,
            "sub_1",
            Some("cus_1".into()),
        )
        .with_purchased_at(at);

        let bag = UserMetadata::new().merged(patch.to_metadata());
        let record = MembershipRecord::from_metadata(&bag);

        assert_eq!(record.membership_status, Some(MembershipStatus::Active));
        assert!(record.has_access());
        assert_eq!(record.membership_purchased_at, Some(at));
        assert_eq!(record.stripe_subscription_id.as_deref(), Some("sub_1"));
        assert_eq!(record.stripe_customer_id.as_deref(), Some("cus_1"));
        assert!(!record.payment_failed);
    }

    #[test]
    fn record_tolerates_mistyped_entries() {
        let bag = UserMetadata::from_value(json!({
            "has_paid_membership": "yes",
            "membership_purchased_at": "last tuesday",
            "stripe_customer_id": 42
        }));

        let record = MembershipRecord::from_metadata(&bag);

        assert!(!record.has_paid_membership);
        assert!(record.membership_purchased_at.is_none());
        assert!(record.stripe_customer_id.is_none());
    }

    #[test]
    fn record_of_empty_bag_has_no_access() {
        let record = MembershipRecord::from_metadata(&UserMetadata::new());
        assert_eq!(record, MembershipRecord::default());
        assert!(!record.has_access());
    }
}
