#![forbid(unsafe_code)]

//! Routing of host interaction events to item callbacks.
//!
//! The host reports selections and prefetch requests by position. The
//! [`DispatchAdapter`] resolves them against the engine's current snapshot
//! and calls the item's own callbacks. Selections are debounced so that a
//! double tap selects once; prefetch requests are forwarded immediately.
//! Positions that no longer resolve are dropped silently.

use std::sync::Arc;

use arc_swap::ArcSwap;
use ktui_runtime::{
    Binding, BindingExt, ExecutionContext, InteractionConfig, Scheduler, Signal, Subscription,
    TimerThread,
};

use super::engine::ListEngine;
use super::host::{IndexPath, ListHost};
use super::snapshot::Snapshot;

/// Turns host position events into item callbacks.
pub struct DispatchAdapter<H: ListHost> {
    snapshot: Arc<ArcSwap<Snapshot<H>>>,
    selections: Signal<IndexPath>,
    _selection: Subscription,
}

impl<H: ListHost> DispatchAdapter<H> {
    /// An adapter reading `engine`'s snapshot, with selections debounced on
    /// the shared timer thread and delivered on the main context.
    pub fn new(engine: &ListEngine<H>, config: &InteractionConfig) -> Self {
        Self::with_scheduler(engine, config, TimerThread::shared(), ExecutionContext::Main)
    }

    /// An adapter with an explicit scheduler and delivery context.
    ///
    /// A zero selection debounce forwards selections without a timer.
    pub fn with_scheduler(
        engine: &ListEngine<H>,
        config: &InteractionConfig,
        scheduler: Arc<dyn Scheduler>,
        ctx: ExecutionContext,
    ) -> Self {
        let snapshot = engine.shared_snapshot();
        let selections = Signal::new();

        let resolve = {
            let snapshot = Arc::clone(&snapshot);
            move |position: IndexPath| {
                #[cfg(feature = "tracing")]
                let _span = tracing::debug_span!("list_select", %position).entered();
                match snapshot.load().item(position) {
                    Some(item) => item.select(position),
                    None => {
                        #[cfg(feature = "tracing")]
                        tracing::trace!(%position, "selection dropped: stale position");
                    }
                }
            }
        };
        let selection = if config.selection_debounce.is_zero() {
            selections.observe(ctx, resolve)
        } else {
            selections
                .clone()
                .debounce_on(config.selection_debounce, scheduler)
                .observe(ctx, resolve)
        };

        Self {
            snapshot,
            selections,
            _selection: selection,
        }
    }

    /// Report a selection at `position`.
    pub fn select(&self, position: IndexPath) {
        self.selections.send(position);
    }

    /// Ask the items at `positions` to prefetch.
    pub fn prefetch(&self, positions: &[IndexPath]) {
        let snapshot = self.snapshot.load();
        for &position in positions {
            match snapshot.item(position) {
                Some(item) => item.prefetch(position),
                None => {
                    #[cfg(feature = "tracing")]
                    tracing::trace!(%position, "prefetch dropped: stale position");
                }
            }
        }
    }

    /// Tell the items at `positions` their prefetch is no longer needed.
    pub fn cancel_prefetch(&self, positions: &[IndexPath]) {
        let snapshot = self.snapshot.load();
        for &position in positions {
            if let Some(item) = snapshot.item(position) {
                item.cancel_prefetch(position);
            }
        }
    }
}

impl<H: ListHost> std::fmt::Debug for DispatchAdapter<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchAdapter")
            .field("selections", &self.selections)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::item::{Item, ItemKey};
    use crate::collection::section::Section;
    use crate::collection::testing::TestHost;
    use ktui_runtime::ManualScheduler;
    use std::sync::Mutex;
    use std::time::Duration;

    type Log = Arc<Mutex<Vec<String>>>;

    fn logged(id: &str, log: &Log) -> Item<TestHost> {
        let (a, b, c) = (Arc::clone(log), Arc::clone(log), Arc::clone(log));
        Item::new(id, id.to_string(), |_: &TestHost, _, m: &String| m.clone())
            .on_select(move |m: &String| a.lock().unwrap().push(format!("select {m}")))
            .on_prefetch(move |m: &String| b.lock().unwrap().push(format!("prefetch {m}")))
            .on_cancel_prefetch(move |m: &String| c.lock().unwrap().push(format!("cancel {m}")))
    }

    fn fixture(
        debounce: Duration,
    ) -> (Arc<TestHost>, ListEngine<TestHost>, DispatchAdapter<TestHost>, Arc<ManualScheduler>, Log) {
        let host = Arc::new(TestHost::new());
        let engine = ListEngine::new(&host);
        let log: Log = Arc::default();
        engine
            .display(vec![Section::new("s", [logged("a", &log), logged("b", &log)])])
            .unwrap();
        let clock = Arc::new(ManualScheduler::new());
        let config = InteractionConfig::default().with_selection_debounce(debounce);
        let adapter =
            DispatchAdapter::with_scheduler(&engine, &config, clock.clone(), ExecutionContext::Immediate);
        (host, engine, adapter, clock, log)
    }

    #[test]
    fn selection_is_debounced() {
        let (_host, _engine, adapter, clock, log) = fixture(Duration::from_millis(500));
        adapter.select(IndexPath::new(0, 0));
        adapter.select(IndexPath::new(0, 1));
        clock.advance(Duration::from_millis(499));
        assert!(log.lock().unwrap().is_empty());
        clock.advance(Duration::from_millis(1));
        assert_eq!(*log.lock().unwrap(), vec!["select b"]);
    }

    #[test]
    fn zero_debounce_selects_immediately() {
        let (_host, _engine, adapter, _clock, log) = fixture(Duration::ZERO);
        adapter.select(IndexPath::new(0, 0));
        assert_eq!(*log.lock().unwrap(), vec!["select a"]);
    }

    #[test]
    fn selection_resolves_against_snapshot_at_fire_time() {
        let (_host, engine, adapter, clock, log) = fixture(Duration::from_millis(100));
        adapter.select(IndexPath::new(0, 1));
        engine.delete_items(&[ItemKey::from("b")]);
        clock.advance(Duration::from_millis(100));
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn prefetch_and_cancel_are_immediate() {
        let (_host, _engine, adapter, _clock, log) = fixture(Duration::from_millis(500));
        adapter.prefetch(&[IndexPath::new(0, 0), IndexPath::new(0, 1), IndexPath::new(3, 3)]);
        adapter.cancel_prefetch(&[IndexPath::new(0, 1), IndexPath::new(0, 9)]);
        assert_eq!(*log.lock().unwrap(), vec!["prefetch a", "prefetch b", "cancel b"]);
    }

    #[test]
    fn stale_selection_is_noop() {
        let (_host, _engine, adapter, clock, log) = fixture(Duration::from_millis(10));
        adapter.select(IndexPath::new(7, 0));
        clock.advance(Duration::from_millis(10));
        assert!(log.lock().unwrap().is_empty());
    }
}
