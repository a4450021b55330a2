#![forbid(unsafe_code)]

//! Binding operators.
//!
//! [`BindingExt`] is implemented for every [`Binding`] and returns type-erased
//! [`AnyBinding`]s, so operator chains compose without nested generic types.
//! [`combine_latest`] and [`combine_latest_all`] join several sources.
//!
//! Operators never fail at runtime. Any per-stream state (accumulators, the
//! previously delivered value, skip counters) is created per subscription.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::binding::{AnyBinding, Binding, Handler, just};
use super::lifecycle::Subscription;
use super::timing;
use crate::executor::ExecutionContext;
use crate::sync::lock;
use crate::timer::{Scheduler, TimerThread};

/// Operators available on every binding.
pub trait BindingExt: Binding + Sized {
    /// Transform each value.
    fn map<U, F>(self, transform: F) -> AnyBinding<U>
    where
        U: Send + 'static,
        F: Fn(Self::Value) -> U + Send + Sync + 'static,
    {
        let transform = Arc::new(transform);
        AnyBinding::new(move |ctx, handler: Handler<U>| {
            let transform = Arc::clone(&transform);
            self.observe_with(ctx, Arc::new(move |value: Self::Value| handler(transform(value))))
        })
    }

    /// Keep only values matching `predicate`.
    fn filter<F>(self, predicate: F) -> AnyBinding<Self::Value>
    where
        F: Fn(&Self::Value) -> bool + Send + Sync + 'static,
    {
        let predicate = Arc::new(predicate);
        AnyBinding::new(move |ctx, handler: Handler<Self::Value>| {
            let predicate = Arc::clone(&predicate);
            self.observe_with(
                ctx,
                Arc::new(move |value: Self::Value| {
                    if predicate(&value) {
                        handler(value);
                    }
                }),
            )
        })
    }

    /// Transform each value, dropping `None` results.
    fn compact_map<U, F>(self, transform: F) -> AnyBinding<U>
    where
        U: Send + 'static,
        F: Fn(Self::Value) -> Option<U> + Send + Sync + 'static,
    {
        let transform = Arc::new(transform);
        AnyBinding::new(move |ctx, handler: Handler<U>| {
            let transform = Arc::clone(&transform);
            self.observe_with(
                ctx,
                Arc::new(move |value: Self::Value| {
                    if let Some(out) = transform(value) {
                        handler(out);
                    }
                }),
            )
        })
    }

    /// Emit the running accumulator after each value. The seed itself is not
    /// emitted.
    fn scan<R, F>(self, seed: R, combine: F) -> AnyBinding<R>
    where
        R: Clone + Send + Sync + 'static,
        F: Fn(R, Self::Value) -> R + Send + Sync + 'static,
    {
        let combine = Arc::new(combine);
        AnyBinding::new(move |ctx, handler: Handler<R>| {
            let combine = Arc::clone(&combine);
            let acc = Mutex::new(seed.clone());
            self.observe_with(
                ctx,
                Arc::new(move |value: Self::Value| {
                    let next = {
                        let mut acc = lock(&acc);
                        let next = combine(acc.clone(), value);
                        *acc = next.clone();
                        next
                    };
                    handler(next);
                }),
            )
        })
    }

    /// Drop the first `count` values. A property's replayed value counts.
    fn skip(self, count: usize) -> AnyBinding<Self::Value> {
        AnyBinding::new(move |ctx, handler: Handler<Self::Value>| {
            let seen = AtomicUsize::new(0);
            self.observe_with(
                ctx,
                Arc::new(move |value: Self::Value| {
                    if seen.fetch_add(1, Ordering::SeqCst) >= count {
                        handler(value);
                    }
                }),
            )
        })
    }

    /// Suppress values that `same` considers equal to the last delivered one.
    fn remove_duplicates<F>(self, same: F) -> AnyBinding<Self::Value>
    where
        Self::Value: Clone,
        F: Fn(&Self::Value, &Self::Value) -> bool + Send + Sync + 'static,
    {
        let same = Arc::new(same);
        AnyBinding::new(move |ctx, handler: Handler<Self::Value>| {
            let same = Arc::clone(&same);
            let last: Mutex<Option<Self::Value>> = Mutex::new(None);
            self.observe_with(
                ctx,
                Arc::new(move |value: Self::Value| {
                    {
                        let mut last = lock(&last);
                        if last.as_ref().is_some_and(|prev| same(prev, &value)) {
                            return;
                        }
                        *last = Some(value.clone());
                    }
                    handler(value);
                }),
            )
        })
    }

    /// Suppress values equal to the last delivered one.
    fn distinct_until_changed(self) -> AnyBinding<Self::Value>
    where
        Self::Value: Clone + PartialEq,
    {
        self.remove_duplicates(|a, b| a == b)
    }

    /// Interleave values from `self` and `other` in arrival order.
    fn merge<B>(self, other: B) -> AnyBinding<Self::Value>
    where
        B: Binding<Value = Self::Value>,
    {
        AnyBinding::new(move |ctx: ExecutionContext, handler: Handler<Self::Value>| {
            Subscription::compound([
                self.observe_with(ctx.clone(), Arc::clone(&handler)),
                other.observe_with(ctx, handler),
            ])
        })
    }

    /// Pair the latest values of `self` and `other`.
    fn combine_latest<B>(self, other: B) -> AnyBinding<(Self::Value, B::Value)>
    where
        B: Binding,
        Self::Value: Clone,
        B::Value: Clone,
    {
        combine_latest(self, other)
    }

    /// Deliver only the last value of each burst, once `interval` passes
    /// without a new value. Timed on the shared [`TimerThread`].
    fn debounce(self, interval: Duration) -> AnyBinding<Self::Value> {
        self.debounce_on(interval, TimerThread::shared())
    }

    /// [`debounce`](Self::debounce) on an explicit scheduler.
    fn debounce_on(self, interval: Duration, scheduler: Arc<dyn Scheduler>) -> AnyBinding<Self::Value> {
        timing::debounce(self, interval, scheduler)
    }

    /// Let the first value of each `interval` window through.
    ///
    /// With `latest` the most recent silenced value is delivered when the
    /// window closes; otherwise silenced values are dropped. Windows are
    /// measured from the last delivered value. Timed on the shared
    /// [`TimerThread`].
    fn throttle(self, interval: Duration, latest: bool) -> AnyBinding<Self::Value> {
        self.throttle_on(interval, latest, TimerThread::shared())
    }

    /// [`throttle`](Self::throttle) on an explicit scheduler.
    fn throttle_on(
        self,
        interval: Duration,
        latest: bool,
        scheduler: Arc<dyn Scheduler>,
    ) -> AnyBinding<Self::Value> {
        timing::throttle(self, interval, latest, scheduler)
    }

    /// Observe upstream on `ctx`, whatever context the subscriber asks for.
    fn receive_on(self, ctx: ExecutionContext) -> AnyBinding<Self::Value> {
        AnyBinding::new(move |_, handler| self.observe_with(ctx.clone(), handler))
    }

    /// Erase the concrete binding type.
    fn boxed(self) -> AnyBinding<Self::Value> {
        AnyBinding::new(move |ctx, handler| self.observe_with(ctx, handler))
    }
}

impl<B: Binding> BindingExt for B {}

/// Emit `(a, b)` whenever either source emits, once both have emitted.
pub fn combine_latest<A, B>(a: A, b: B) -> AnyBinding<(A::Value, B::Value)>
where
    A: Binding,
    B: Binding,
    A::Value: Clone,
    B::Value: Clone,
{
    AnyBinding::new(
        move |ctx: ExecutionContext, handler: Handler<(A::Value, B::Value)>| {
            let latest = Arc::new(Mutex::new((None, None)));

            let left = {
                let latest = Arc::clone(&latest);
                let handler = Arc::clone(&handler);
                a.observe_with(
                    ctx.clone(),
                    Arc::new(move |value: A::Value| {
                        let pair = {
                            let mut latest = lock(&latest);
                            latest.0 = Some(value);
                            pair_of(&*latest)
                        };
                        if let Some(pair) = pair {
                            handler(pair);
                        }
                    }),
                )
            };
            let right = b.observe_with(
                ctx,
                Arc::new(move |value: B::Value| {
                    let pair = {
                        let mut latest = lock(&latest);
                        latest.1 = Some(value);
                        pair_of(&*latest)
                    };
                    if let Some(pair) = pair {
                        handler(pair);
                    }
                }),
            );
            Subscription::compound([left, right])
        },
    )
}

fn pair_of<A: Clone, B: Clone>(latest: &(Option<A>, Option<B>)) -> Option<(A, B)> {
    match latest {
        (Some(a), Some(b)) => Some((a.clone(), b.clone())),
        _ => None,
    }
}

/// Combine collection sources into one flattened collection.
///
/// Emits whenever any source emits, once all have emitted, concatenating
/// the latest collections in source order. No sources behaves as
/// `just(vec![])`; a single source is returned unchanged.
pub fn combine_latest_all<U>(sources: impl IntoIterator<Item = AnyBinding<Vec<U>>>) -> AnyBinding<Vec<U>>
where
    U: Clone + Send + Sync + 'static,
{
    let mut sources: Vec<AnyBinding<Vec<U>>> = sources.into_iter().collect();
    if sources.len() <= 1 {
        return sources.pop().unwrap_or_else(|| just(Vec::new()));
    }
    let sources = Arc::new(sources);
    AnyBinding::new(move |ctx: ExecutionContext, handler: Handler<Vec<U>>| {
        let slots: Arc<Mutex<Vec<Option<Vec<U>>>>> = Arc::new(Mutex::new(vec![None; sources.len()]));
        let tokens = sources.iter().enumerate().map(|(index, source)| {
            let slots = Arc::clone(&slots);
            let handler = Arc::clone(&handler);
            source.observe_with(
                ctx.clone(),
                Arc::new(move |items: Vec<U>| {
                    let flat = {
                        let mut slots = lock(&slots);
                        slots[index] = Some(items);
                        flatten(&slots[..])
                    };
                    if let Some(flat) = flat {
                        handler(flat);
                    }
                }),
            )
        });
        Subscription::compound(tokens.collect::<Vec<_>>())
    })
}

fn flatten<U: Clone>(slots: &[Option<Vec<U>>]) -> Option<Vec<U>> {
    let mut out = Vec::new();
    for slot in slots {
        out.extend(slot.as_ref()?.iter().cloned());
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{Property, Signal};

    fn record<B: Binding>(binding: &B) -> (Arc<Mutex<Vec<B::Value>>>, Subscription) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        let sub = binding.observe(ExecutionContext::Immediate, move |v| s.lock().unwrap().push(v));
        (seen, sub)
    }

    #[test]
    fn map_filter_compact_map() {
        let src = Signal::<i32>::new();
        let (mapped, _a) = record(&src.clone().map(|v| v * 2));
        let (even, _b) = record(&src.clone().filter(|v| v % 2 == 0));
        let (parsed, _c) = record(&src.clone().compact_map(|v| u8::try_from(v).ok()));
        for v in [1, 2, -3, 4] {
            src.send(v);
        }
        assert_eq!(*mapped.lock().unwrap(), vec![2, 4, -6, 8]);
        assert_eq!(*even.lock().unwrap(), vec![2, 4]);
        assert_eq!(*parsed.lock().unwrap(), vec![1, 2, 4]);
    }

    #[test]
    fn scan_emits_running_total_without_seed() {
        let src = Signal::<i32>::new();
        let (totals, _sub) = record(&src.clone().scan(0, |acc, v| acc + v));
        for v in [1, 2, 3] {
            src.send(v);
        }
        assert_eq!(*totals.lock().unwrap(), vec![1, 3, 6]);
    }

    #[test]
    fn scan_state_is_per_subscription() {
        let src = Signal::<i32>::new();
        let totals = src.clone().scan(0, |acc, v| acc + v);
        let (first, _a) = record(&totals);
        src.send(5);
        let (second, _b) = record(&totals);
        src.send(1);
        assert_eq!(*first.lock().unwrap(), vec![5, 6]);
        assert_eq!(*second.lock().unwrap(), vec![1]);
    }

    #[test]
    fn skip_counts_property_replay() {
        let prop = Property::new(0);
        let (seen, _sub) = record(&prop.clone().skip(1));
        prop.set(1);
        prop.set(2);
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn distinct_until_changed_suppresses_repeats() {
        let src = Signal::new();
        let (seen, _sub) = record(&src.clone().distinct_until_changed());
        for v in [1, 1, 2, 2, 1, 3, 3] {
            src.send(v);
        }
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 1, 3]);
    }

    #[test]
    fn remove_duplicates_with_custom_predicate() {
        let src = Signal::<String>::new();
        let (seen, _sub) = record(
            &src.clone()
                .remove_duplicates(|a, b| a.eq_ignore_ascii_case(b)),
        );
        for v in ["a", "A", "b"] {
            src.send(v.to_string());
        }
        assert_eq!(*seen.lock().unwrap(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn merge_interleaves_in_arrival_order() {
        let left = Signal::new();
        let right = Signal::new();
        let (seen, mut sub) = record(&left.clone().merge(right.clone()));
        left.send(1);
        right.send(2);
        left.send(3);
        sub.cancel();
        right.send(4);
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
        assert_eq!(left.subscriber_count(), 0);
        assert_eq!(right.subscriber_count(), 0);
    }

    #[test]
    fn combine_latest_emits_once_both_sides_have_values() {
        let num = Property::new(1);
        let text = Property::new("x".to_string());
        let (seen, _sub) = record(&combine_latest(num.clone(), text.clone()));
        num.set(2);
        text.set("y".to_string());
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                (1, "x".to_string()),
                (2, "x".to_string()),
                (2, "y".to_string())
            ]
        );
    }

    #[test]
    fn combine_latest_waits_for_signal() {
        let prop = Property::new(1);
        let sig = Signal::new();
        let (seen, _sub) = record(&prop.clone().combine_latest(sig.clone()));
        prop.set(2);
        assert!(seen.lock().unwrap().is_empty());
        sig.send('a');
        assert_eq!(*seen.lock().unwrap(), vec![(2, 'a')]);
    }

    #[test]
    fn combine_latest_all_flattens_in_source_order() {
        let a = Property::new(vec![1, 2]);
        let b = Property::new(vec![3]);
        let c = Signal::<Vec<i32>>::new();
        let combined = combine_latest_all([a.clone().boxed(), b.clone().boxed(), c.clone().boxed()]);
        let (seen, _sub) = record(&combined);
        assert!(seen.lock().unwrap().is_empty());
        c.send(vec![4]);
        b.set(Vec::new());
        assert_eq!(*seen.lock().unwrap(), vec![vec![1, 2, 3, 4], vec![1, 2, 4]]);
    }

    #[test]
    fn combine_latest_all_edge_cases() {
        let (empty, _a) = record(&combine_latest_all(Vec::<AnyBinding<Vec<u8>>>::new()));
        assert_eq!(*empty.lock().unwrap(), vec![Vec::<u8>::new()]);

        let only = Property::new(vec![7u8]);
        let (single, _b) = record(&combine_latest_all([only.clone().boxed()]));
        only.set(vec![8]);
        assert_eq!(*single.lock().unwrap(), vec![vec![7], vec![8]]);
    }

    #[test]
    fn receive_on_overrides_subscriber_context() {
        let _serial = crate::executor::main_queue_guard();
        std::thread::spawn(|| {
            crate::executor::MainQueue::unmark_current_thread();
            let prop = Property::new(1);
            let seen = Arc::new(Mutex::new(Vec::new()));
            let s = Arc::clone(&seen);
            let _sub = prop
                .clone()
                .receive_on(ExecutionContext::Immediate)
                .observe(ExecutionContext::Main, move |v| s.lock().unwrap().push(v));
            assert_eq!(*seen.lock().unwrap(), vec![1]);
        })
        .join()
        .unwrap();
    }

    #[test]
    fn cancelled_chain_stops_delivery() {
        let prop = Property::new(0);
        let (seen, mut sub) = record(&prop.clone().map(|v| v + 100).filter(|v| *v > 0));
        sub.cancel();
        prop.set(1);
        assert_eq!(*seen.lock().unwrap(), vec![100]);
        assert_eq!(prop.subscriber_count(), 0);
    }
}
