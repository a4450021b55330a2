#![forbid(unsafe_code)]

//! Subscriber registry shared by [`Property`](super::Property) and
//! [`Signal`](super::Signal).

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use super::binding::Handler;
use super::lifecycle::Subscription;
use crate::executor::ExecutionContext;
use crate::sync::lock;

/// One registered observer.
pub(crate) struct Observer<T> {
    id: u64,
    ctx: ExecutionContext,
    handler: Handler<T>,
    live: Arc<AtomicBool>,
    seen: Arc<AtomicU64>,
}

impl<T> Clone for Observer<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            ctx: self.ctx.clone(),
            handler: Arc::clone(&self.handler),
            live: Arc::clone(&self.live),
            seen: Arc::clone(&self.seen),
        }
    }
}

impl<T: Send + 'static> Observer<T> {
    /// Deliver `value` on the observer's context, unless it was cancelled by
    /// the time the context runs the task.
    pub(crate) fn deliver(&self, value: T) {
        let handler = Arc::clone(&self.handler);
        let live = Arc::clone(&self.live);
        self.ctx.dispatch(move || {
            if live.load(Ordering::SeqCst) {
                handler(value);
            }
        });
    }

    /// Like [`deliver`](Self::deliver), but drops `value` if a delivery with a
    /// higher `seq` already reached the handler. Keeps a replayed value from
    /// overtaking a concurrent update.
    pub(crate) fn deliver_seq(&self, value: T, seq: u64) {
        let handler = Arc::clone(&self.handler);
        let live = Arc::clone(&self.live);
        let seen = Arc::clone(&self.seen);
        self.ctx.dispatch(move || {
            if live.load(Ordering::SeqCst) && seen.fetch_max(seq, Ordering::SeqCst) < seq {
                handler(value);
            }
        });
    }
}

/// Observers in registration order.
pub(crate) struct Observers<T> {
    next_id: u64,
    entries: Vec<Observer<T>>,
}

impl<T> Observers<T> {
    pub(crate) fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    pub(crate) fn insert(&mut self, ctx: ExecutionContext, handler: Handler<T>) -> Observer<T> {
        let observer = Observer {
            id: self.next_id,
            ctx,
            handler,
            live: Arc::new(AtomicBool::new(true)),
            seen: Arc::new(AtomicU64::new(0)),
        };
        self.next_id += 1;
        self.entries.push(observer.clone());
        observer
    }

    pub(crate) fn remove(&mut self, id: u64) {
        self.entries.retain(|o| o.id != id);
    }

    /// Copy of the current observers, so delivery can run without the lock.
    pub(crate) fn snapshot(&self) -> Vec<Observer<T>> {
        self.entries.clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Token that marks `observer` dead and unregisters it from the state behind
/// `owner`, if the owner still exists.
pub(crate) fn unregister_on_cancel<S, T>(
    owner: Weak<Mutex<S>>,
    observer: &Observer<T>,
    observers: fn(&mut S) -> &mut Observers<T>,
) -> Subscription
where
    S: Send + 'static,
    T: 'static,
{
    let id = observer.id;
    let live = Arc::clone(&observer.live);
    Subscription::new(move || {
        live.store(false, Ordering::SeqCst);
        if let Some(owner) = owner.upgrade() {
            observers(&mut lock(&owner)).remove(id);
        }
    })
}
