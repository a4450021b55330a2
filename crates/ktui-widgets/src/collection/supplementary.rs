#![forbid(unsafe_code)]

//! Section header and footer descriptors.

use std::fmt;
use std::sync::Arc;

use super::host::{IndexPath, ListHost, SupplementaryKind};
use super::item::{ItemKey, RenderFn};
use super::section::SectionId;

/// A header or footer attached to a [`Section`](super::Section).
///
/// The host re-renders a supplementary view when its identity changes, so
/// [`regenerate`](Self::regenerate) is how callers force a refresh. Without
/// [`with_id`](Self::with_id) the identity is derived from the owning
/// section and the kind, so redeclaring the same header is not a change.
pub struct Supplementary<H: ListHost> {
    id: ItemKey,
    keyed: bool,
    kind: SupplementaryKind,
    reuse_id: Arc<str>,
    render: RenderFn<H>,
    hidden: bool,
}

impl<H: ListHost> Supplementary<H> {
    fn with_kind<F>(kind: SupplementaryKind, render: F) -> Self
    where
        F: Fn(&H, IndexPath) -> H::View + Send + Sync + 'static,
    {
        Self {
            id: ItemKey::from(kind.as_str()),
            keyed: false,
            kind,
            reuse_id: Arc::from(kind.as_str()),
            render: Arc::new(render),
            hidden: false,
        }
    }

    /// A section header.
    pub fn header<F>(render: F) -> Self
    where
        F: Fn(&H, IndexPath) -> H::View + Send + Sync + 'static,
    {
        Self::with_kind(SupplementaryKind::Header, render)
    }

    /// A section footer.
    pub fn footer<F>(render: F) -> Self
    where
        F: Fn(&H, IndexPath) -> H::View + Send + Sync + 'static,
    {
        Self::with_kind(SupplementaryKind::Footer, render)
    }

    /// Use a caller-chosen identity.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<ItemKey>) -> Self {
        self.id = id.into();
        self.keyed = true;
        self
    }

    /// Derive the default identity from `section` unless one was chosen.
    pub(crate) fn keyed_for(mut self, section: &SectionId) -> Self {
        if !self.keyed {
            self.id = ItemKey::from(format!("{section}_{}", self.kind.as_str()));
            self.keyed = true;
        }
        self
    }

    /// Override the reuse identifier.
    #[must_use]
    pub fn with_reuse_id(mut self, reuse_id: impl AsRef<str>) -> Self {
        self.reuse_id = Arc::from(reuse_id.as_ref());
        self
    }

    /// Hide or show the view. A hidden descriptor stays in the model but
    /// the engine reports no view and strips it from the section layout.
    #[must_use]
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Same descriptor under a fresh identity.
    #[must_use]
    pub fn regenerate(&self) -> Self {
        Self {
            id: ItemKey::auto(),
            keyed: true,
            ..self.clone()
        }
    }

    /// A loading placeholder of this descriptor: fresh identity, same
    /// render, followed by the host shimmer.
    #[must_use]
    pub fn shimmering(&self) -> Self {
        let render = Arc::clone(&self.render);
        Self {
            id: ItemKey::auto(),
            keyed: true,
            kind: self.kind,
            reuse_id: Arc::clone(&self.reuse_id),
            render: Arc::new(move |host: &H, position| {
                let mut view = render(host, position);
                host.apply_shimmer(&mut view);
                view
            }),
            hidden: self.hidden,
        }
    }

    /// Identity.
    #[must_use]
    pub fn id(&self) -> &ItemKey {
        &self.id
    }

    /// Header or footer.
    #[must_use]
    pub fn kind(&self) -> SupplementaryKind {
        self.kind
    }

    /// Reuse identifier.
    #[must_use]
    pub fn reuse_id(&self) -> &str {
        &self.reuse_id
    }

    /// Whether the view is hidden.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Render for the section at `position.section`.
    pub fn render(&self, host: &H, position: IndexPath) -> H::View {
        (self.render)(host, position)
    }
}

impl<H: ListHost> Clone for Supplementary<H> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            keyed: self.keyed,
            kind: self.kind,
            reuse_id: Arc::clone(&self.reuse_id),
            render: Arc::clone(&self.render),
            hidden: self.hidden,
        }
    }
}

impl<H: ListHost> fmt::Debug for Supplementary<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supplementary")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("hidden", &self.hidden)
            .finish()
    }
}
