//! Application handlers.
//!
//! Command handlers that orchestrate domain operations over the ports.

pub mod membership;

pub use membership::{
    CheckoutCompletedHandler, CustomerLifecycleHandler, HandlePaymentWebhookCommand,
    HandlePaymentWebhookHandler, InvoicePaymentHandler, LegacyPaymentIntentHandler,
    MembershipReconciler, SubscriptionDeletedHandler, SubscriptionSyncHandler, UserResolver,
};
