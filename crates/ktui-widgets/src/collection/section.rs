#![forbid(unsafe_code)]

//! Section controllers.
//!
//! A [`Section`] is an identified, ordered run of items with optional
//! header, footer and layout. Like items, sections are values: equality
//! and hashing look only at the id, and edits build a new section.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use ahash::AHashSet;

use super::error::ListError;
use super::host::{ListHost, SupplementaryKind};
use super::item::Item;
use super::supplementary::Supplementary;

/// Identity of a section.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionId(Arc<str>);

impl SectionId {
    /// The id text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SectionId {
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<String> for SectionId {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl From<&SectionId> for SectionId {
    fn from(id: &SectionId) -> Self {
        id.clone()
    }
}

pub(crate) type LayoutFn<H> =
    Arc<dyn Fn(&str) -> Option<<H as ListHost>::Layout> + Send + Sync>;

/// A section of a list.
pub struct Section<H: ListHost> {
    id: SectionId,
    items: Vec<Item<H>>,
    header: Option<Supplementary<H>>,
    footer: Option<Supplementary<H>>,
    layout: Option<LayoutFn<H>>,
}

impl<H: ListHost> Section<H> {
    /// A section holding `items`.
    pub fn new(id: impl Into<SectionId>, items: impl IntoIterator<Item = Item<H>>) -> Self {
        Self {
            id: id.into(),
            items: items.into_iter().collect(),
            header: None,
            footer: None,
            layout: None,
        }
    }

    /// Replace the items.
    #[must_use]
    pub fn with_items(mut self, items: impl IntoIterator<Item = Item<H>>) -> Self {
        self.items = items.into_iter().collect();
        self
    }

    /// Append one item.
    #[must_use]
    pub fn with_item(mut self, item: Item<H>) -> Self {
        self.items.push(item);
        self
    }

    /// Attach a header.
    #[must_use]
    pub fn with_header(mut self, header: Supplementary<H>) -> Self {
        self.header = Some(header.keyed_for(&self.id));
        self
    }

    /// Attach a footer.
    #[must_use]
    pub fn with_footer(mut self, footer: Supplementary<H>) -> Self {
        self.footer = Some(footer.keyed_for(&self.id));
        self
    }

    /// Provide the section layout for a given environment.
    #[must_use]
    pub fn with_layout<F>(mut self, layout: F) -> Self
    where
        F: Fn(&str) -> Option<H::Layout> + Send + Sync + 'static,
    {
        self.layout = Some(Arc::new(layout));
        self
    }

    /// When the section has no items, show `placeholder` instead.
    ///
    /// The placeholder is re-keyed to `empty_{section id}` so that it stays
    /// addressable across updates.
    #[must_use]
    pub fn empty_state(self, placeholder: Item<H>) -> Self {
        if !self.items.is_empty() {
            return self;
        }
        let id = format!("empty_{}", self.id);
        Self {
            items: vec![placeholder.with_id(id)],
            ..self
        }
    }

    /// [`empty_state`](Self::empty_state) with a dedicated layout for the
    /// empty case.
    #[must_use]
    pub fn empty_state_with_layout<F>(self, placeholder: Item<H>, layout: F) -> Self
    where
        F: Fn(&str) -> Option<H::Layout> + Send + Sync + 'static,
    {
        if !self.items.is_empty() {
            return self;
        }
        self.with_layout(layout).empty_state(placeholder)
    }

    /// Attach `handler` as the selection callback of every item whose
    /// payload is an `M`. Other items keep their callbacks.
    #[must_use]
    pub fn on_select<M: Any + Send + Sync>(
        mut self,
        handler: impl Fn(&M) + Send + Sync + 'static,
    ) -> Self {
        let handler = Arc::new(handler);
        self.items = self
            .items
            .into_iter()
            .map(|item| {
                if item.payload::<M>().is_none() {
                    return item;
                }
                let handler = Arc::clone(&handler);
                item.on_select(move |model: &M| handler(model))
            })
            .collect();
        self
    }

    /// Identity.
    #[must_use]
    pub fn id(&self) -> &SectionId {
        &self.id
    }

    /// Items in display order.
    #[must_use]
    pub fn items(&self) -> &[Item<H>] {
        &self.items
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the section has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Header descriptor.
    #[must_use]
    pub fn header(&self) -> Option<&Supplementary<H>> {
        self.header.as_ref()
    }

    /// Footer descriptor.
    #[must_use]
    pub fn footer(&self) -> Option<&Supplementary<H>> {
        self.footer.as_ref()
    }

    /// Header or footer by kind.
    #[must_use]
    pub fn supplementary(&self, kind: SupplementaryKind) -> Option<&Supplementary<H>> {
        match kind {
            SupplementaryKind::Header => self.header.as_ref(),
            SupplementaryKind::Footer => self.footer.as_ref(),
        }
    }

    /// Layout for `environment`, as declared.
    #[must_use]
    pub fn layout(&self, environment: &str) -> Option<H::Layout> {
        self.layout.as_ref().and_then(|layout| layout(environment))
    }

    /// Check that item ids are unique within the section.
    pub fn validate(&self) -> Result<(), ListError> {
        let mut seen = AHashSet::with_capacity(self.items.len());
        for item in &self.items {
            if !seen.insert(item.id()) {
                return Err(ListError::DuplicateItem {
                    section: self.id.clone(),
                    item: item.id().clone(),
                });
            }
        }
        Ok(())
    }

    pub(crate) fn items_mut(&mut self) -> &mut Vec<Item<H>> {
        &mut self.items
    }

    pub(crate) fn set_header(&mut self, header: Option<Supplementary<H>>) {
        self.header = header.map(|h| h.keyed_for(&self.id));
    }

    pub(crate) fn set_footer(&mut self, footer: Option<Supplementary<H>>) {
        self.footer = footer.map(|f| f.keyed_for(&self.id));
    }
}

impl<H: ListHost> Clone for Section<H> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            items: self.items.clone(),
            header: self.header.clone(),
            footer: self.footer.clone(),
            layout: self.layout.clone(),
        }
    }
}

impl<H: ListHost> PartialEq for Section<H> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<H: ListHost> Eq for Section<H> {}

impl<H: ListHost> Hash for Section<H> {
    fn hash<S: Hasher>(&self, state: &mut S) {
        self.id.hash(state);
    }
}

impl<H: ListHost> fmt::Debug for Section<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Section")
            .field("id", &self.id)
            .field("items", &self.items)
            .field("header", &self.header)
            .field("footer", &self.footer)
            .field("has_layout", &self.layout.is_some())
            .finish()
    }
}
