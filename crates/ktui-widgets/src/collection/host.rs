#![forbid(unsafe_code)]

//! Boundary between the list engine and the native list widget.
//!
//! The engine never renders or lays anything out itself. It drives a
//! [`ListHost`], which owns the real widget, through a handful of
//! primitives: dequeue a view for an item, replace or diff the displayed
//! snapshot, and decorate a view as a loading placeholder.

use std::fmt;

use super::snapshot::{Changeset, Snapshot};

/// Position of an item in the displayed snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexPath {
    /// Section index.
    pub section: usize,
    /// Item index within the section.
    pub item: usize,
}

impl IndexPath {
    /// Create a position.
    #[inline]
    #[must_use]
    pub const fn new(section: usize, item: usize) -> Self {
        Self { section, item }
    }
}

impl fmt::Display for IndexPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.section, self.item)
    }
}

/// Kind of a supplementary (boundary) view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupplementaryKind {
    /// Section header.
    Header,
    /// Section footer.
    Footer,
}

impl SupplementaryKind {
    /// Element kind string as reported by hosts.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Footer => "footer",
        }
    }
}

/// Layout descriptor for one section, as understood by the host.
pub trait SectionLayout {
    /// Zero the insets and drop decorations and boundary supplementary items.
    /// Applied to sections that currently have no items.
    fn collapse(&mut self);

    /// Drop the boundary item of `kind`, if any.
    fn remove_supplementary(&mut self, kind: SupplementaryKind);
}

/// Native list widget driven by a [`ListEngine`](super::ListEngine).
///
/// All methods take `&self`: the engine only keeps a weak reference to the
/// host and the host owns whatever mutable widget state it needs.
pub trait ListHost: Send + Sync + Sized + 'static {
    /// A rendered, reusable cell or supplementary view.
    type View;
    /// Section layout descriptor.
    type Layout: SectionLayout;

    /// Produce a view for `reuse_id` at `position`, recycling if possible.
    fn dequeue(&self, reuse_id: &str, position: IndexPath) -> Self::View;

    /// Show `snapshot` wholesale, without animation.
    fn replace_snapshot(&self, snapshot: &Snapshot<Self>);

    /// Move from `old` to `new` using the precomputed `changes`.
    fn apply_changes(&self, old: &Snapshot<Self>, new: &Snapshot<Self>, changes: &Changeset);

    /// Turn `view` into an animated loading placeholder.
    fn apply_shimmer(&self, view: &mut Self::View);
}
