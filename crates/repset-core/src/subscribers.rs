//! Subscriber registry with opaque unsubscribe handles.
//!
//! Every observable surface in the crate (timer updates, connection state,
//! inbound companion messages) fans out through a [`Subscribers`] set.
//! Removal is synchronous: once `remove` returns, the callback is gone from
//! the registry and will never be invoked again. A panicking callback is
//! caught and logged so one bad subscriber cannot take down the engine.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use uuid::Uuid;

/// Opaque handle identifying a single subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

type Callback<E> = Box<dyn Fn(&E) + Send>;

/// A set of callbacks keyed by subscription id.
pub struct Subscribers<E> {
    callbacks: HashMap<SubscriptionId, Callback<E>>,
}

impl<E> Subscribers<E> {
    pub fn new() -> Self {
        Self {
            callbacks: HashMap::new(),
        }
    }

    pub fn insert(&mut self, callback: Callback<E>) -> SubscriptionId {
        let id = SubscriptionId(Uuid::new_v4());
        self.callbacks.insert(id, callback);
        id
    }

    /// Remove a subscription. Idempotent; returns whether it existed.
    pub fn remove(&mut self, id: SubscriptionId) -> bool {
        self.callbacks.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Deliver `event` to every subscriber by reference.
    pub fn notify(&self, event: &E) {
        for (id, callback) in &self.callbacks {
            if catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
                tracing::warn!(subscription = ?id, "subscriber callback panicked; notification dropped");
            }
        }
    }
}

impl<E> Default for Subscribers<E> {
    fn default() -> Self {
        Self::new()
    }
}
