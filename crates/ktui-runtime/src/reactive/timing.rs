#![forbid(unsafe_code)]

//! Time-based operators: debounce and throttle.
//!
//! Both observe upstream immediately, keep their timers on a [`Scheduler`]
//! and redispatch deliveries onto the subscriber's [`ExecutionContext`].
//!
//! # Invariants
//!
//! 1. Debounce: every new value cancels the pending timer and starts a new
//!    one, so only the last value of a burst is delivered.
//! 2. Throttle: a value is delivered immediately iff at least `interval`
//!    has passed since the last delivery. In `latest` mode at most one
//!    trailing delivery is pending at a time.
//! 3. After the subscription is cancelled no timer delivers, even one that
//!    already fired and is waiting on the subscriber's context.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use web_time::Instant;

use super::binding::{AnyBinding, Binding, Handler};
use super::lifecycle::Subscription;
use crate::executor::ExecutionContext;
use crate::sync::lock;
use crate::timer::{Scheduler, TimerHandle};

/// Subscriber-side delivery target shared by timer callbacks.
struct Sink<T> {
    ctx: ExecutionContext,
    handler: Handler<T>,
    live: Arc<AtomicBool>,
}

impl<T> Clone for Sink<T> {
    fn clone(&self) -> Self {
        Self {
            ctx: self.ctx.clone(),
            handler: Arc::clone(&self.handler),
            live: Arc::clone(&self.live),
        }
    }
}

impl<T: Send + 'static> Sink<T> {
    fn new(ctx: ExecutionContext, handler: Handler<T>) -> Self {
        Self {
            ctx,
            handler,
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    fn deliver(&self, value: T) {
        let handler = Arc::clone(&self.handler);
        let live = Arc::clone(&self.live);
        self.ctx.dispatch(move || {
            if live.load(Ordering::SeqCst) {
                handler(value);
            }
        });
    }

    fn close(&self) {
        self.live.store(false, Ordering::SeqCst);
    }
}

pub(super) fn debounce<B: Binding>(
    source: B,
    interval: Duration,
    scheduler: Arc<dyn Scheduler>,
) -> AnyBinding<B::Value> {
    AnyBinding::new(move |ctx, handler| {
        let sink = Sink::new(ctx, handler);
        let pending: Arc<Mutex<Option<TimerHandle>>> = Arc::new(Mutex::new(None));

        let upstream = {
            let sink = sink.clone();
            let pending = Arc::clone(&pending);
            let scheduler = Arc::clone(&scheduler);
            source.observe_with(
                ExecutionContext::Immediate,
                Arc::new(move |value: B::Value| {
                    let sink = sink.clone();
                    let mut slot = lock(&pending);
                    if let Some(previous) = slot.take() {
                        previous.cancel();
                    }
                    *slot = Some(scheduler.schedule(interval, Box::new(move || sink.deliver(value))));
                }),
            )
        };

        Subscription::compound([
            upstream,
            Subscription::new(move || {
                sink.close();
                if let Some(timer) = lock(&pending).take() {
                    timer.cancel();
                }
            }),
        ])
    })
}

struct ThrottleState<T> {
    last_emit: Option<Instant>,
    pending: Option<T>,
    timer: Option<TimerHandle>,
}

pub(super) fn throttle<B: Binding>(
    source: B,
    interval: Duration,
    latest: bool,
    scheduler: Arc<dyn Scheduler>,
) -> AnyBinding<B::Value> {
    AnyBinding::new(move |ctx, handler| {
        let sink = Sink::new(ctx, handler);
        let state = Arc::new(Mutex::new(ThrottleState {
            last_emit: None,
            pending: None,
            timer: None,
        }));

        let upstream = {
            let sink = sink.clone();
            let state = Arc::clone(&state);
            let scheduler = Arc::clone(&scheduler);
            source.observe_with(
                ExecutionContext::Immediate,
                Arc::new(move |value: B::Value| {
                    let now = scheduler.now();
                    let mut st = lock(&state);
                    let since_last = st.last_emit.map(|last| now.saturating_duration_since(last));
                    match since_last {
                        Some(elapsed) if elapsed < interval => {
                            if !latest {
                                return;
                            }
                            st.pending = Some(value);
                            if st.timer.is_none() {
                                let trailing = trailing_task(&state, &scheduler, &sink);
                                st.timer = Some(scheduler.schedule(interval - elapsed, trailing));
                            }
                        }
                        _ => {
                            st.last_emit = Some(now);
                            st.pending = None;
                            if let Some(timer) = st.timer.take() {
                                timer.cancel();
                            }
                            drop(st);
                            sink.deliver(value);
                        }
                    }
                }),
            )
        };

        Subscription::compound([
            upstream,
            Subscription::new(move || {
                sink.close();
                let mut st = lock(&state);
                st.pending = None;
                if let Some(timer) = st.timer.take() {
                    timer.cancel();
                }
            }),
        ])
    })
}

/// Timer callback delivering the most recent silenced value at window end.
fn trailing_task<T: Send + 'static>(
    state: &Arc<Mutex<ThrottleState<T>>>,
    scheduler: &Arc<dyn Scheduler>,
    sink: &Sink<T>,
) -> Box<dyn FnOnce() + Send> {
    let state = Arc::clone(state);
    let scheduler = Arc::clone(scheduler);
    let sink = sink.clone();
    Box::new(move || {
        let value = {
            let mut st = lock(&state);
            st.timer = None;
            let Some(value) = st.pending.take() else {
                return;
            };
            st.last_emit = Some(scheduler.now());
            value
        };
        sink.deliver(value);
    })
}
