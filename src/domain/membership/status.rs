//! Membership and subscription status values.
//!
//! `SubscriptionStatus` is what Stripe reports for a subscription.
//! `MembershipStatus` is what gets written to the user's metadata under
//! `membership_status`: one of our own values, or the provider's raw
//! status passed through unchanged.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stripe subscription status.
///
/// Unrecognized values are preserved in `Other` so they can be stored
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SubscriptionStatus {
    Active,
    Trialing,
    PastDue,
    Canceled,
    Unpaid,
    Incomplete,
    IncompleteExpired,
    Paused,
    Other(String),
}

impl SubscriptionStatus {
    /// Parses Stripe's status string.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "active" => Self::Active,
            "trialing" => Self::Trialing,
            "past_due" => Self::PastDue,
            "canceled" => Self::Canceled,
            "unpaid" => Self::Unpaid,
            "incomplete" => Self::Incomplete,
            "incomplete_expired" => Self::IncompleteExpired,
            "paused" => Self::Paused,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns Stripe's string for this status.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "active",
            Self::Trialing => "trialing",
            Self::PastDue => "past_due",
            Self::Canceled => "canceled",
            Self::Unpaid => "unpaid",
            Self::Incomplete => "incomplete",
            Self::IncompleteExpired => "incomplete_expired",
            Self::Paused => "paused",
            Self::Other(raw) => raw,
        }
    }

    /// Only `active` and `trialing` subscriptions grant paid membership.
    pub fn grants_paid_access(&self) -> bool {
        matches!(self, Self::Active | Self::Trialing)
    }
}

impl From<String> for SubscriptionStatus {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<SubscriptionStatus> for String {
    fn from(status: SubscriptionStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of the `membership_status` metadata key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MembershipStatus {
    /// Paid membership in good standing.
    Active,
    /// No membership yet, or one that lapsed.
    Inactive,
    /// Subscription deleted at the provider.
    Cancelled,
    /// Raw provider status stored as-is (`trialing`, `past_due`, ...).
    Provider(String),
}

impl MembershipStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "active" => Self::Active,
            "inactive" => Self::Inactive,
            "cancelled" => Self::Cancelled,
            other => Self::Provider(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Cancelled => "cancelled",
            Self::Provider(raw) => raw,
        }
    }
}

/// A subscription's status is recorded verbatim; `active` maps onto our own
/// `Active` since the strings coincide.
impl From<&SubscriptionStatus> for MembershipStatus {
    fn from(status: &SubscriptionStatus) -> Self {
        Self::parse(status.as_str())
    }
}

impl From<String> for MembershipStatus {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<MembershipStatus> for String {
    fn from(status: MembershipStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
