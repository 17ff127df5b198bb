//! Membership domain module.
//!
//! Keeps the paid membership projection on each user in line with
//! Stripe's view of their subscription.
//!
//! # Module Structure
//!
//! - `status` - Subscription and membership status values
//! - `metadata` - The identity provider's per-user metadata bag
//! - `record` - Membership patch (writes) and record (reads)
//! - `stripe_event` / `stripe_objects` - Webhook payload types
//! - `webhook_verifier` - Stripe-Signature verification
//! - `webhook_processor` - Routing of verified events to handlers

mod metadata;
mod record;
mod status;
mod stripe_event;
mod stripe_objects;
mod webhook_errors;
mod webhook_processor;
mod webhook_verifier;

pub use metadata::UserMetadata;
pub use record::{keys, MembershipPatch, MembershipRecord};
pub use status::{MembershipStatus, SubscriptionStatus};
pub use stripe_event::{StripeEvent, StripeEventData, StripeEventType};
pub use stripe_objects::{
    metadata_user_id, CheckoutSessionObject, CustomerObject, InvoiceObject,
    InvoiceSubscriptionDetails, PaymentIntentObject, StripeMetadata, SubscriptionObject,
    MEMBERSHIP_PURCHASE, METADATA_PURCHASE_TYPE, METADATA_USER_ID,
};
pub use webhook_errors::WebhookError;
pub use webhook_processor::{
    DispatchReport, HandlerOutcome, HandlerRegistry, HandlerReport, WebhookDispatcher,
    WebhookEventHandler,
};
pub use webhook_verifier::{SignatureHeader, StripeWebhookVerifier};

