#![forbid(unsafe_code)]

//! The [`Binding`] abstraction: anything that can be observed.
//!
//! A binding delivers a sequence of values to handlers registered through
//! [`Binding::observe`]. Concrete sources are [`Property`](super::Property)
//! (stateful, replays its current value) and [`Signal`](super::Signal)
//! (stateless). [`AnyBinding<T>`] type-erases any of them, and the
//! [`BindingExt`](super::BindingExt) operators build derived bindings.
//!
//! # Usage
//!
//! ```ignore
//! use ktui_runtime::reactive::{Binding, BindingExt, Property};
//! use ktui_runtime::ExecutionContext;
//!
//! let count = Property::new(0);
//! let label = count.clone().map(|c| format!("Count: {c}"));
//!
//! let _sub = label.observe(ExecutionContext::Immediate, |text| println!("{text}"));
//! // prints "Count: 0"
//! count.set(5);
//! // prints "Count: 5"
//! ```
//!
//! # Invariants
//!
//! 1. Each `observe` call creates an independent subscription; derived
//!    bindings keep per-subscription state (scan accumulators, debounce
//!    timers), never shared state.
//! 2. Handlers run on the [`ExecutionContext`] given to `observe`.
//! 3. Once the returned [`Subscription`] is cancelled, the handler is not
//!    invoked again.
//!
//! # Failure Modes
//!
//! - Handler panic: propagates to whoever runs the delivery (the sender for
//!   inline contexts, the main-queue drain otherwise).

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::lifecycle::Subscription;
use crate::executor::ExecutionContext;

/// Shared event handler.
pub type Handler<T> = Arc<dyn Fn(T) + Send + Sync>;

/// A source of values that handlers can subscribe to.
pub trait Binding: Send + Sync + 'static {
    /// Type of the delivered values.
    type Value: Send + 'static;

    /// Register `handler` to run on `ctx` for every delivered value.
    fn observe_with(&self, ctx: ExecutionContext, handler: Handler<Self::Value>) -> Subscription;

    /// Register a closure to run on `ctx` for every delivered value.
    fn observe<F>(&self, ctx: ExecutionContext, handler: F) -> Subscription
    where
        Self: Sized,
        F: Fn(Self::Value) + Send + Sync + 'static,
    {
        self.observe_with(ctx, Arc::new(handler))
    }
}

type ObserveFn<T> = dyn Fn(ExecutionContext, Handler<T>) -> Subscription + Send + Sync;

/// Type-erased binding.
///
/// Cloning is cheap and every clone observes the same underlying source.
pub struct AnyBinding<T> {
    observe: Arc<ObserveFn<T>>,
}

impl<T> Clone for AnyBinding<T> {
    fn clone(&self) -> Self {
        Self {
            observe: Arc::clone(&self.observe),
        }
    }
}

impl<T> fmt::Debug for AnyBinding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyBinding").finish_non_exhaustive()
    }
}

impl<T: Send + 'static> AnyBinding<T> {
    /// Build a binding from its subscribe function.
    pub fn new(
        observe: impl Fn(ExecutionContext, Handler<T>) -> Subscription + Send + Sync + 'static,
    ) -> Self {
        Self {
            observe: Arc::new(observe),
        }
    }

    /// A binding that delivers `value` once to every subscriber.
    pub fn just(value: T) -> Self
    where
        T: Clone + Sync,
    {
        just(value)
    }
}

impl<T: Send + 'static> Binding for AnyBinding<T> {
    type Value = T;

    fn observe_with(&self, ctx: ExecutionContext, handler: Handler<T>) -> Subscription {
        (self.observe)(ctx, handler)
    }
}

/// A binding that replays `value` to each subscriber and never emits again.
pub fn just<T: Clone + Send + Sync + 'static>(value: T) -> AnyBinding<T> {
    AnyBinding::new(move |ctx, handler| {
        let value = value.clone();
        if ctx.is_inline() {
            handler(value);
            return Subscription::empty();
        }
        let live = Arc::new(AtomicBool::new(true));
        let task_live = Arc::clone(&live);
        ctx.dispatch(move || {
            if task_live.load(Ordering::SeqCst) {
                handler(value);
            }
        });
        Subscription::new(move || live.store(false, Ordering::SeqCst))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{MainQueue, main_queue_guard};
    use std::sync::Mutex;

    fn collect<B: Binding>(binding: &B) -> (Arc<Mutex<Vec<B::Value>>>, Subscription) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        let sub = binding.observe(ExecutionContext::Immediate, move |v| s.lock().unwrap().push(v));
        (seen, sub)
    }

    #[test]
    fn just_replays_to_each_subscriber() {
        let b = just(7);
        let (first, _s1) = collect(&b);
        let (second, _s2) = collect(&b);
        assert_eq!(*first.lock().unwrap(), vec![7]);
        assert_eq!(*second.lock().unwrap(), vec![7]);
    }

    #[test]
    fn just_inline_token_is_empty() {
        let sub = just("x").observe(ExecutionContext::Immediate, |_| {});
        assert!(!sub.is_active());
    }

    #[test]
    fn just_queued_delivery_respects_cancel() {
        let _serial = main_queue_guard();
        std::thread::spawn(|| {
            MainQueue::unmark_current_thread();
            let hits = Arc::new(Mutex::new(0));
            let h = Arc::clone(&hits);
            let mut sub = just(1).observe(ExecutionContext::Main, move |_| {
                *h.lock().unwrap() += 1;
            });
            sub.cancel();
            MainQueue::drain();
            assert_eq!(*hits.lock().unwrap(), 0);
        })
        .join()
        .unwrap();
    }

    #[test]
    fn any_binding_clone_shares_source() {
        let calls = Arc::new(Mutex::new(0));
        let c = Arc::clone(&calls);
        let b: AnyBinding<u8> = AnyBinding::new(move |_, handler| {
            *c.lock().unwrap() += 1;
            handler(1);
            Subscription::empty()
        });
        let b2 = b.clone();
        let (_a, _sa) = collect(&b);
        let (_b, _sb) = collect(&b2);
        assert_eq!(*calls.lock().unwrap(), 2);
        assert!(format!("{b:?}").starts_with("AnyBinding"));
    }
}
