#![forbid(unsafe_code)]

//! Item controllers: the addressable unit of list content.
//!
//! An [`Item`] pairs a stable [`ItemKey`] with an opaque payload, a render
//! function and optional interaction callbacks. Items are value-like: they
//! are cheap to clone, never mutated in place, and an "update" is a new item
//! that happens to reuse an old id.
//!
//! # Invariants
//!
//! 1. Equality and hashing consider only the id. Two items with the same id
//!    and different payloads are the same list entry.
//! 2. Callbacks registered with a model type only fire when the payload is
//!    of that type; otherwise they are silent no-ops.
//! 3. A lookup item ([`Item::lookup`]) carries no payload and no render
//!    function. Rendering one panics.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::host::{IndexPath, ListHost};

/// Global counter for generated item keys.
static AUTO_KEY_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identity of an item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemKey {
    /// Numeric id, typically a database key.
    Int(i64),
    /// Textual id.
    Text(Arc<str>),
    /// Generated id, unique within the process.
    Auto(u64),
}

impl ItemKey {
    /// A new process-unique key.
    #[must_use]
    pub fn auto() -> Self {
        Self::Auto(AUTO_KEY_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The text of a [`ItemKey::Text`] key.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::Auto(n) => write!(f, "#{n}"),
        }
    }
}

impl From<i64> for ItemKey {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for ItemKey {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<u32> for ItemKey {
    fn from(n: u32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<&str> for ItemKey {
    fn from(s: &str) -> Self {
        Self::Text(Arc::from(s))
    }
}

impl From<String> for ItemKey {
    fn from(s: String) -> Self {
        Self::Text(Arc::from(s))
    }
}

impl From<&ItemKey> for ItemKey {
    fn from(key: &ItemKey) -> Self {
        key.clone()
    }
}

pub(crate) type RenderFn<H> = Arc<dyn Fn(&H, IndexPath) -> <H as ListHost>::View + Send + Sync>;
type Action = Arc<dyn Fn(IndexPath) + Send + Sync>;
type Payload = Arc<dyn Any + Send + Sync>;

/// One entry of a list section.
pub struct Item<H: ListHost> {
    id: ItemKey,
    reuse_id: Arc<str>,
    payload: Option<Payload>,
    content_hash: Option<u64>,
    render: Option<RenderFn<H>>,
    on_select: Option<Action>,
    on_prefetch: Option<Action>,
    on_cancel_prefetch: Option<Action>,
}

impl<H: ListHost> Item<H> {
    /// An item showing `model` through `render`.
    ///
    /// The reuse identifier defaults to the model's type name.
    pub fn new<M, F>(id: impl Into<ItemKey>, model: M, render: F) -> Self
    where
        M: Any + Send + Sync,
        F: Fn(&H, IndexPath, &M) -> H::View + Send + Sync + 'static,
    {
        let model = Arc::new(model);
        let captured = Arc::clone(&model);
        Self {
            id: id.into(),
            reuse_id: Arc::from(std::any::type_name::<M>()),
            payload: Some(model as Payload),
            content_hash: None,
            render: Some(Arc::new(move |host: &H, position| render(host, position, &captured))),
            on_select: None,
            on_prefetch: None,
            on_cancel_prefetch: None,
        }
    }

    /// [`Item::new`] with a generated id.
    pub fn with_auto_id<M, F>(model: M, render: F) -> Self
    where
        M: Any + Send + Sync,
        F: Fn(&H, IndexPath, &M) -> H::View + Send + Sync + 'static,
    {
        Self::new(ItemKey::auto(), model, render)
    }

    /// An item without a model, rendered by `render` alone.
    pub fn from_render<F>(id: impl Into<ItemKey>, render: F) -> Self
    where
        F: Fn(&H, IndexPath) -> H::View + Send + Sync + 'static,
    {
        Self::new(id, (), move |host: &H, position, _: &()| render(host, position))
    }

    /// An id-only item for probing snapshots. Never render it.
    pub fn lookup(id: impl Into<ItemKey>) -> Self {
        Self {
            id: id.into(),
            reuse_id: Arc::from("lookup"),
            payload: None,
            content_hash: None,
            render: None,
            on_select: None,
            on_prefetch: None,
            on_cancel_prefetch: None,
        }
    }

    /// Override the reuse identifier passed to [`ListHost::dequeue`].
    #[must_use]
    pub fn with_reuse_id(mut self, reuse_id: impl AsRef<str>) -> Self {
        self.reuse_id = Arc::from(reuse_id.as_ref());
        self
    }

    /// Same item under another id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<ItemKey>) -> Self {
        self.id = id.into();
        self
    }

    /// Fingerprint the visible content so unchanged items skip reloads.
    #[must_use]
    pub fn with_content_hash<T: Hash + ?Sized>(mut self, content: &T) -> Self {
        let mut hasher = ahash::AHasher::default();
        content.hash(&mut hasher);
        self.content_hash = Some(hasher.finish());
        self
    }

    /// Set a precomputed content fingerprint.
    #[must_use]
    pub fn with_raw_content_hash(mut self, hash: u64) -> Self {
        self.content_hash = Some(hash);
        self
    }

    /// Run `handler` with the model when the item is selected.
    #[must_use]
    pub fn on_select<M: Any + Send + Sync>(
        mut self,
        handler: impl Fn(&M) + Send + Sync + 'static,
    ) -> Self {
        self.on_select = self.narrowed(handler);
        self
    }

    /// Run `handler` with the model when the host asks to prefetch the item.
    #[must_use]
    pub fn on_prefetch<M: Any + Send + Sync>(
        mut self,
        handler: impl Fn(&M) + Send + Sync + 'static,
    ) -> Self {
        self.on_prefetch = self.narrowed(handler);
        self
    }

    /// Run `handler` with the model when a prefetch is cancelled.
    #[must_use]
    pub fn on_cancel_prefetch<M: Any + Send + Sync>(
        mut self,
        handler: impl Fn(&M) + Send + Sync + 'static,
    ) -> Self {
        self.on_cancel_prefetch = self.narrowed(handler);
        self
    }

    fn narrowed<M: Any + Send + Sync>(
        &self,
        handler: impl Fn(&M) + Send + Sync + 'static,
    ) -> Option<Action> {
        let payload = self.payload.clone()?;
        Some(Arc::new(move |_| {
            if let Some(model) = payload.downcast_ref::<M>() {
                handler(model);
            }
        }))
    }

    /// The item's identity.
    #[must_use]
    pub fn id(&self) -> &ItemKey {
        &self.id
    }

    /// Reuse identifier for dequeuing.
    #[must_use]
    pub fn reuse_id(&self) -> &str {
        &self.reuse_id
    }

    /// Content fingerprint, if any.
    #[must_use]
    pub fn content_hash(&self) -> Option<u64> {
        self.content_hash
    }

    /// The payload, if it is an `M`.
    #[must_use]
    pub fn payload<M: Any>(&self) -> Option<&M> {
        self.payload.as_deref()?.downcast_ref::<M>()
    }

    /// Whether this is an id-only lookup item.
    #[must_use]
    pub fn is_lookup(&self) -> bool {
        self.render.is_none()
    }

    /// Render the item for `host` at `position`.
    ///
    /// # Panics
    ///
    /// Panics if the item was built with [`Item::lookup`].
    pub fn render(&self, host: &H, position: IndexPath) -> H::View {
        match &self.render {
            Some(render) => render(host, position),
            None => panic!("item {} is lookup-only and cannot be rendered", self.id),
        }
    }

    /// Invoke the selection callback.
    pub fn select(&self, position: IndexPath) {
        if let Some(action) = &self.on_select {
            action(position);
        }
    }

    /// Invoke the prefetch callback.
    pub fn prefetch(&self, position: IndexPath) {
        if let Some(action) = &self.on_prefetch {
            action(position);
        }
    }

    /// Invoke the cancel-prefetch callback.
    pub fn cancel_prefetch(&self, position: IndexPath) {
        if let Some(action) = &self.on_cancel_prefetch {
            action(position);
        }
    }
}

impl<H: ListHost> Clone for Item<H> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            reuse_id: Arc::clone(&self.reuse_id),
            payload: self.payload.clone(),
            content_hash: self.content_hash,
            render: self.render.clone(),
            on_select: self.on_select.clone(),
            on_prefetch: self.on_prefetch.clone(),
            on_cancel_prefetch: self.on_cancel_prefetch.clone(),
        }
    }
}

impl<H: ListHost> PartialEq for Item<H> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<H: ListHost> Eq for Item<H> {}

impl<H: ListHost> Hash for Item<H> {
    fn hash<S: Hasher>(&self, state: &mut S) {
        self.id.hash(state);
    }
}

impl<H: ListHost> fmt::Debug for Item<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Item")
            .field("id", &self.id)
            .field("reuse_id", &self.reuse_id)
            .field("content_hash", &self.content_hash)
            .field("lookup", &self.is_lookup())
            .finish()
    }
}
