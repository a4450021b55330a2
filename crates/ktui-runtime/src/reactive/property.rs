#![forbid(unsafe_code)]

//! Stateful, thread-safe observable value.
//!
//! [`Property<T>`] holds exactly one current value. New subscribers receive
//! that value right away (replay of one) and then every later mutation.
//!
//! # Invariants
//!
//! 1. The first value a subscriber receives is the value current at
//!    subscription time, or a newer one.
//! 2. Each subscriber sees mutations in version order; an older value is
//!    never delivered after a newer one.
//! 3. Handlers run outside the internal lock, so a handler may read or
//!    mutate the property it observes.
//! 4. `version()` increments exactly once per `set`/`update`.
//! 5. Clones share state.

use std::fmt;
use std::sync::{Arc, Mutex};

use super::binding::{Binding, Handler};
use super::fanout::{Observer, Observers, unregister_on_cancel};
use super::lifecycle::Subscription;
use crate::executor::ExecutionContext;
use crate::sync::lock;

struct PropertyState<T> {
    value: T,
    version: u64,
    observers: Observers<T>,
}

/// A shared value cell with change notification.
pub struct Property<T> {
    inner: Arc<Mutex<PropertyState<T>>>,
}

impl<T> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + 'static> Property<T> {
    /// A property holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(PropertyState {
                value,
                version: 0,
                observers: Observers::new(),
            })),
        }
    }

    /// Clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        lock(&self.inner).value.clone()
    }

    /// Borrow the current value without cloning.
    ///
    /// The internal lock is held while `f` runs; `f` must not touch this
    /// property.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&lock(&self.inner).value)
    }

    /// Replace the value and notify every subscriber.
    pub fn set(&self, value: T) {
        self.mutate(|slot| *slot = value);
    }

    /// Modify the value in place and notify every subscriber.
    ///
    /// The internal lock is held while `f` runs; `f` must not touch this
    /// property.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.mutate(f);
    }

    /// Number of mutations since creation.
    #[must_use]
    pub fn version(&self) -> u64 {
        lock(&self.inner).version
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        lock(&self.inner).observers.len()
    }

    fn mutate(&self, f: impl FnOnce(&mut T)) {
        let (observers, value, version) = {
            let mut state = lock(&self.inner);
            f(&mut state.value);
            state.version += 1;
            (state.observers.snapshot(), state.value.clone(), state.version)
        };
        fan_out(&observers, value, version);
    }
}

fn fan_out<T: Clone + Send + 'static>(observers: &[Observer<T>], value: T, version: u64) {
    let Some((last, rest)) = observers.split_last() else {
        return;
    };
    for observer in rest {
        observer.deliver_seq(value.clone(), version + 1);
    }
    last.deliver_seq(value, version + 1);
}

impl<T: Clone + Send + 'static> Binding for Property<T> {
    type Value = T;

    fn observe_with(&self, ctx: ExecutionContext, handler: Handler<T>) -> Subscription {
        let (observer, current, version) = {
            let mut state = lock(&self.inner);
            let observer = state.observers.insert(ctx, handler);
            (observer, state.value.clone(), state.version)
        };
        observer.deliver_seq(current, version + 1);
        unregister_on_cancel(Arc::downgrade(&self.inner), &observer, |state| {
            &mut state.observers
        })
    }
}

impl<T: Default + Clone + Send + 'static> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.inner);
        f.debug_struct("Property")
            .field("value", &state.value)
            .field("version", &state.version)
            .field("subscribers", &state.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{MainQueue, main_queue_guard};

    fn record<T: Clone + Send + 'static>(
        prop: &Property<T>,
        ctx: ExecutionContext,
    ) -> (Arc<Mutex<Vec<T>>>, Subscription) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        let sub = prop.observe(ctx, move |v| s.lock().unwrap().push(v));
        (seen, sub)
    }

    #[test]
    fn replays_current_value_then_updates() {
        let prop = Property::new(1);
        prop.set(2);
        let (seen, _sub) = record(&prop, ExecutionContext::Immediate);
        prop.set(3);
        assert_eq!(*seen.lock().unwrap(), vec![2, 3]);
    }

    #[test]
    fn get_set_update_with() {
        let prop = Property::new(vec![1]);
        prop.update(|v| v.push(2));
        assert_eq!(prop.get(), vec![1, 2]);
        assert_eq!(prop.with(Vec::len), 2);
        prop.set(Vec::new());
        assert!(prop.get().is_empty());
        assert_eq!(prop.version(), 2);
    }

    #[test]
    fn no_equality_check_on_set() {
        let prop = Property::new(5);
        let (seen, _sub) = record(&prop, ExecutionContext::Immediate);
        prop.set(5);
        prop.set(5);
        assert_eq!(*seen.lock().unwrap(), vec![5, 5, 5]);
    }

    #[test]
    fn clones_share_state() {
        let a = Property::new("a".to_string());
        let b = a.clone();
        b.set("b".to_string());
        assert_eq!(a.get(), "b");
    }

    #[test]
    fn cancel_stops_delivery_and_unregisters() {
        let prop = Property::new(0);
        let (seen, mut sub) = record(&prop, ExecutionContext::Immediate);
        assert_eq!(prop.subscriber_count(), 1);
        sub.cancel();
        sub.cancel();
        assert_eq!(prop.subscriber_count(), 0);
        prop.set(1);
        assert_eq!(*seen.lock().unwrap(), vec![0]);
    }

    #[test]
    fn handler_may_read_the_property() {
        let prop = Property::new(1);
        let reader = prop.clone();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        let _sub = prop.observe(ExecutionContext::Immediate, move |_| {
            s.lock().unwrap().push(reader.get());
        });
        prop.set(2);
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn main_context_queues_off_main_thread() {
        let _serial = main_queue_guard();
        std::thread::spawn(|| {
            MainQueue::unmark_current_thread();
            let prop = Property::new(10);
            let (seen, _sub) = record(&prop, ExecutionContext::Main);
            prop.set(11);
            assert!(seen.lock().unwrap().is_empty());
            assert_eq!(MainQueue::drain(), 2);
            assert_eq!(*seen.lock().unwrap(), vec![10, 11]);
        })
        .join()
        .unwrap();
    }

    #[test]
    fn queued_delivery_after_cancel_is_dropped() {
        let _serial = main_queue_guard();
        std::thread::spawn(|| {
            MainQueue::unmark_current_thread();
            let prop = Property::new(0);
            let (seen, mut sub) = record(&prop, ExecutionContext::Main);
            prop.set(1);
            sub.cancel();
            MainQueue::drain();
            assert!(seen.lock().unwrap().is_empty());
        })
        .join()
        .unwrap();
    }

    #[test]
    fn stale_replay_never_overtakes_update() {
        use crate::executor::{Executor, Task};

        #[derive(Default)]
        struct Deferred(Mutex<Vec<Task>>);
        impl Executor for Deferred {
            fn execute(&self, task: Task) {
                self.0.lock().unwrap().push(task);
            }
        }

        let exec = Arc::new(Deferred::default());
        let prop = Property::new(1);
        let (seen, _sub) = record(&prop, ExecutionContext::Executor(exec.clone()));
        prop.set(2);
        // Run the update before the replay.
        let mut tasks = std::mem::take(&mut *exec.0.lock().unwrap());
        tasks.reverse();
        for task in tasks {
            task();
        }
        assert_eq!(*seen.lock().unwrap(), vec![2]);
    }

    #[test]
    fn debug_shows_value_and_version() {
        let prop = Property::new(3u8);
        prop.set(4);
        let dbg = format!("{prop:?}");
        assert!(dbg.contains("value: 4"));
        assert!(dbg.contains("version: 1"));
    }
}
