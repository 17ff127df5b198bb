//! Webhook processor - Routes verified events to reconciliation handlers.
//!
//! ## Design
//!
//! Every handler registered for an event type runs, in registration order.
//! A handler failing (or panicking) is recorded in the [`DispatchReport`]
//! and does not stop the handlers after it. Event types nobody handles
//! produce an empty report; they are acknowledged like any other.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;

use crate::domain::membership::{StripeEvent, StripeEventType, WebhookError};

/// Handler for a specific type of Stripe webhook event.
///
/// Implementations should be stateless apart from injected clients and
/// focus on a single concern.
#[async_trait]
pub trait WebhookEventHandler: Send + Sync {
    /// Short stable name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Returns the event type(s) this handler processes.
    fn handles(&self) -> Vec<StripeEventType>;

    /// Handles the webhook event.
    ///
    /// Returns `Ok(())` on success.
    /// Returns `Err(WebhookError::Ignored(_))` if the event matched the type
    /// but not the handler's guard.
    /// Returns other `Err` variants for actual failures.
    async fn handle(&self, event: &StripeEvent) -> Result<(), WebhookError>;
}

/// What happened when one handler saw one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerOutcome {
    Applied,
    Ignored(String),
    /// `retryable` is set when a redelivery could succeed.
    Failed { error: String, retryable: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerReport {
    pub handler: &'static str,
    pub outcome: HandlerOutcome,
}

/// Per-event summary of every handler that ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub event_id: String,
    pub event_type: String,
    pub handlers: Vec<HandlerReport>,
}

impl DispatchReport {
    /// No handler was registered for the event type.
    pub fn is_unhandled(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn applied(&self) -> usize {
        self.handlers
            .iter()
            .filter(|r| r.outcome == HandlerOutcome::Applied)
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &HandlerReport> {
        self.handlers
            .iter()
            .filter(|r| matches!(r.outcome, HandlerOutcome::Failed { .. }))
    }

    /// Message of the first failed handler, if any.
    pub fn first_failure(&self) -> Option<&str> {
        self.failures().find_map(|r| match &r.outcome {
            HandlerOutcome::Failed { error, .. } => Some(error.as_str()),
            _ => None,
        })
    }
}

/// Dispatches webhook events to the appropriate handlers.
#[async_trait]
pub trait WebhookDispatcher: Send + Sync {
    /// Handlers registered for the given event type, in order.
    fn handlers_for(&self, event_type: StripeEventType) -> Vec<&dyn WebhookEventHandler>;

    /// Run every matching handler, isolating failures and panics.
    async fn dispatch(&self, event: &StripeEvent) -> DispatchReport {
        let event_type = event.parsed_type();
        let mut handlers = Vec::new();

        if event_type != StripeEventType::Unknown {
            for handler in self.handlers_for(event_type) {
                let outcome = match AssertUnwindSafe(handler.handle(event))
                    .catch_unwind()
                    .await
                {
                    Ok(Ok(())) => HandlerOutcome::Applied,
                    Ok(Err(WebhookError::Ignored(reason))) => HandlerOutcome::Ignored(reason),
                    Ok(Err(e)) => HandlerOutcome::Failed {
                        error: e.to_string(),
                        retryable: e.is_retryable(),
                    },
                    Err(_) => HandlerOutcome::Failed {
                        error: format!("{} panicked", handler.name()),
                        retryable: false,
                    },
                };
                handlers.push(HandlerReport {
                    handler: handler.name(),
                    outcome,
                });
            }
        }

        DispatchReport {
            event_id: event.id.clone(),
            event_type: event.event_type.clone(),
            handlers,
        }
    }
}

/// Handler list built at startup.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: Vec<Arc<dyn WebhookEventHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, handler: Arc<dyn WebhookEventHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

}

impl WebhookDispatcher for HandlerRegistry {
    fn handlers_for(&self, event_type: StripeEventType) -> Vec<&dyn WebhookEventHandler> {
        self.handlers
            .iter()
            .filter(|h| h.handles().contains(&event_type))
            .map(|h| h.as_ref())
            .collect()
    }
}
