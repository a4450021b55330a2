#![forbid(unsafe_code)]

//! Glue between bindings and the engine.
//!
//! A [`ListController`] owns an engine, a dispatch adapter and the
//! subscriptions feeding the engine. Dropping it tears every binding down.

use std::sync::{Arc, Mutex, PoisonError};

use ktui_runtime::{
    Binding, CancelBag, ExecutionContext, InteractionConfig, Scheduler, TimerThread,
};

use super::dispatch::DispatchAdapter;
use super::engine::ListEngine;
use super::error::ListError;
use super::host::ListHost;
use super::item::ItemKey;
use super::section::Section;

/// Binds reactive section lists to a [`ListHost`].
pub struct ListController<H: ListHost> {
    engine: Arc<ListEngine<H>>,
    adapter: DispatchAdapter<H>,
    ctx: ExecutionContext,
    bindings: CancelBag,
    last_error: Arc<Mutex<Option<ListError>>>,
}

impl<H: ListHost> ListController<H> {
    /// A controller with the default interaction policy.
    pub fn new(host: &Arc<H>) -> Self {
        Self::with_config(host, &InteractionConfig::default())
    }

    /// A controller with a custom interaction policy, delivering on the
    /// main context and timing on the shared timer thread.
    pub fn with_config(host: &Arc<H>, config: &InteractionConfig) -> Self {
        Self::with_parts(host, config, TimerThread::shared(), ExecutionContext::Main)
    }

    /// A controller with every collaborator explicit.
    pub fn with_parts(
        host: &Arc<H>,
        config: &InteractionConfig,
        scheduler: Arc<dyn Scheduler>,
        ctx: ExecutionContext,
    ) -> Self {
        let engine = Arc::new(ListEngine::new(host));
        let adapter = DispatchAdapter::with_scheduler(&engine, config, scheduler, ctx.clone());
        Self {
            engine,
            adapter,
            ctx,
            bindings: CancelBag::new(),
            last_error: Arc::default(),
        }
    }

    /// Display every emission of `sections` with [`ListEngine::display`].
    pub fn bind<B>(&mut self, sections: B)
    where
        B: Binding<Value = Vec<Section<H>>>,
    {
        let engine = Arc::clone(&self.engine);
        let last_error = Arc::clone(&self.last_error);
        sections
            .observe(self.ctx.clone(), move |sections: Vec<Section<H>>| {
                record(&last_error, engine.display(sections).err());
            })
            .store_in(&mut self.bindings);
    }

    /// Reconcile every emission of `sections` with
    /// [`ListEngine::update_sections`], inserting before `before` when it is
    /// present.
    pub fn bind_incremental<B>(&mut self, sections: B, before: Option<ItemKey>)
    where
        B: Binding<Value = Vec<Section<H>>>,
    {
        let engine = Arc::clone(&self.engine);
        let last_error = Arc::clone(&self.last_error);
        sections
            .observe(self.ctx.clone(), move |sections: Vec<Section<H>>| {
                record(&last_error, engine.update_sections(sections, before.as_ref()).err());
            })
            .store_in(&mut self.bindings);
    }

    /// The most recent rejected emission, cleared on read.
    pub fn take_error(&self) -> Option<ListError> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Stop observing every bound source. The snapshot stays displayed.
    pub fn unbind(&mut self) {
        self.bindings.cancel();
    }

    /// Number of live bindings.
    #[must_use]
    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// The engine, for provider queries and direct edits.
    #[must_use]
    pub fn engine(&self) -> &Arc<ListEngine<H>> {
        &self.engine
    }

    /// The interaction adapter.
    #[must_use]
    pub fn adapter(&self) -> &DispatchAdapter<H> {
        &self.adapter
    }
}

impl<H: ListHost> std::fmt::Debug for ListController<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListController")
            .field("engine", &self.engine)
            .field("ctx", &self.ctx)
            .field("bindings", &self.bindings)
            .finish_non_exhaustive()
    }
}

fn record(slot: &Mutex<Option<ListError>>, error: Option<ListError>) {
    let Some(error) = error else {
        return;
    };
    #[cfg(feature = "tracing")]
    tracing::warn!(%error, "list emission rejected");
    *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(error);
}
