#![forbid(unsafe_code)]

//! Stateless multicast channel.
//!
//! A [`Signal<T>`] carries events, not state: subscribers receive only what
//! is sent after they subscribed.

use std::fmt;
use std::sync::{Arc, Mutex};

use super::binding::{Binding, Handler};
use super::fanout::{Observers, unregister_on_cancel};
use super::lifecycle::Subscription;
use crate::executor::ExecutionContext;
use crate::sync::lock;

struct SignalState<T> {
    observers: Observers<T>,
}

/// Broadcast channel without a current value.
pub struct Signal<T> {
    inner: Arc<Mutex<SignalState<T>>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + 'static> Signal<T> {
    /// A signal with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SignalState {
                observers: Observers::new(),
            })),
        }
    }

    /// Deliver `value` to every current subscriber.
    pub fn send(&self, value: T) {
        let observers = lock(&self.inner).observers.snapshot();
        let Some((last, rest)) = observers.split_last() else {
            return;
        };
        for observer in rest {
            observer.deliver(value.clone());
        }
        last.deliver(value);
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        lock(&self.inner).observers.len()
    }
}

impl<T: Clone + Send + 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + 'static> Binding for Signal<T> {
    type Value = T;

    fn observe_with(&self, ctx: ExecutionContext, handler: Handler<T>) -> Subscription {
        let observer = lock(&self.inner).observers.insert(ctx, handler);
        unregister_on_cancel(Arc::downgrade(&self.inner), &observer, |state| {
            &mut state.observers
        })
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("subscribers", &lock(&self.inner).observers.len())
            .finish()
    }
}
