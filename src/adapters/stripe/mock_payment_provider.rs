//! In-memory stand-in for the Stripe API.
//!
//! Holds fixture customers and subscriptions, records every lookup, and can
//! be told to fail the next lookup or every lookup of one kind.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::membership::SubscriptionStatus;
use crate::ports::{Customer, PaymentError, PaymentProvider, Subscription};

/// Kind of object a lookup retrieves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StripeLookup {
    Customer,
    Subscription,
}

/// One recorded lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StripeCall {
    pub lookup: StripeLookup,
    pub id: String,
}

/// Clones share fixtures, failures and the call log.
#[derive(Default, Clone)]
pub struct MockPaymentProvider {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    customers: HashMap<String, Customer>,
    subscriptions: HashMap<String, Subscription>,
    fail_next: Option<PaymentError>,
    fail_always: HashMap<StripeLookup, PaymentError>,
    calls: Vec<StripeCall>,
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscription fixture with no customer and no metadata.
    pub fn subscription(id: &str, status: SubscriptionStatus) -> Subscription {
        Subscription {
            id: id.to_string(),
            customer_id: None,
            status,
            cancel_at_period_end: false,
            current_period_end: None,
            metadata: HashMap::new(),
        }
    }

    /// Customer fixture with no metadata.
    pub fn customer(id: &str) -> Customer {
        Customer {
            id: id.to_string(),
            email: None,
            name: None,
            metadata: HashMap::new(),
        }
    }

    pub fn add_customer(&self, customer: Customer) {
        let mut state = self.inner.lock().unwrap();
        state.customers.insert(customer.id.clone(), customer);
    }

    pub fn add_subscription(&self, subscription: Subscription) {
        let mut state = self.inner.lock().unwrap();
        state
            .subscriptions
            .insert(subscription.id.clone(), subscription);
    }

    /// The next lookup of any kind fails with `error`.
    pub fn fail_next(&self, error: PaymentError) {
        self.inner.lock().unwrap().fail_next = Some(error);
    }

    /// Every lookup of `lookup` kind fails with `error` until [`recover`](Self::recover).
    pub fn fail_always(&self, lookup: StripeLookup, error: PaymentError) {
        self.inner.lock().unwrap().fail_always.insert(lookup, error);
    }

    pub fn recover(&self) {
        let mut state = self.inner.lock().unwrap();
        state.fail_next = None;
        state.fail_always.clear();
    }

    pub fn calls(&self) -> Vec<StripeCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Number of lookups of the given kind so far.
    pub fn lookups(&self, lookup: StripeLookup) -> usize {
        self.inner
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| c.lookup == lookup)
            .count()
    }

    /// Records the call, then applies any configured failure.
    fn begin(&self, lookup: StripeLookup, id: &str) -> Result<(), PaymentError> {
        let mut state = self.inner.lock().unwrap();
        state.calls.push(StripeCall {
            lookup,
            id: id.to_string(),
        });

        if let Some(error) = state.fail_always.get(&lookup) {
            return Err(error.clone());
        }
        match state.fail_next.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn get_customer(&self, customer_id: &str) -> Result<Option<Customer>, PaymentError> {
        self.begin(StripeLookup::Customer, customer_id)?;
        Ok(self.inner.lock().unwrap().customers.get(customer_id).cloned())
    }

    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<Subscription>, PaymentError> {
        self.begin(StripeLookup::Subscription, subscription_id)?;
        Ok(self
            .inner
            .lock()
            .unwrap()
            .subscriptions
            .get(subscription_id)
            .cloned())
    }
}
