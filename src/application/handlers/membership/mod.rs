//! Membership handlers.
//!
//! Keep each user's membership metadata in line with Stripe:
//!
//! ## Command
//! - `HandlePaymentWebhookHandler` - verify a delivery and dispatch it
//!
//! ## Event handlers
//! - `CheckoutCompletedHandler` - `checkout.session.completed`
//! - `SubscriptionSyncHandler` - `customer.subscription.created/updated`
//! - `SubscriptionDeletedHandler` - `customer.subscription.deleted`
//! - `InvoicePaymentHandler` - `invoice.payment_succeeded/failed`
//! - `CustomerLifecycleHandler` - `customer.created/deleted`
//! - `LegacyPaymentIntentHandler` - `payment_intent.succeeded`
//!
//! ## Shared
//! - `MembershipReconciler` - merge a patch into the user's metadata
//! - `UserResolver` - find the user a Stripe object belongs to

mod checkout_completed;
mod customer_lifecycle;
mod handle_payment_webhook;
mod invoice_payment;
mod legacy_payment_intent;
mod reconcile_membership;
mod subscription_deleted;
mod subscription_sync;
mod user_resolution;

// Command
pub use handle_payment_webhook::{HandlePaymentWebhookCommand, HandlePaymentWebhookHandler};

// Event handlers
pub use checkout_completed::CheckoutCompletedHandler;
pub use customer_lifecycle::CustomerLifecycleHandler;
pub use invoice_payment::InvoicePaymentHandler;
pub use legacy_payment_intent::LegacyPaymentIntentHandler;
pub use subscription_deleted::SubscriptionDeletedHandler;
pub use subscription_sync::SubscriptionSyncHandler;

// Shared
pub use reconcile_membership::MembershipReconciler;
pub use user_resolution::UserResolver;
