#![forbid(unsafe_code)]

//! The reconciliation engine.
//!
//! [`ListEngine`] owns the displayed [`Snapshot`] and moves the host from
//! one snapshot to the next. It offers two paths:
//!
//! - [`display`](ListEngine::display) rebuilds from the declared sections,
//!   dropping empty ones. The first load replaces the host snapshot
//!   wholesale; later loads are diffed and every persisting item without a
//!   matching content hash is reloaded.
//! - [`update_sections`](ListEngine::update_sections) reconciles the
//!   declared sections into the current snapshot by id, keeping sections the
//!   declaration does not mention and reloading only items whose content
//!   hash changed.
//!
//! The engine also answers the host's provider queries (cells,
//! supplementary views, section layouts) from the current snapshot.
//!
//! # Invariants
//!
//! 1. Edits are serialized. A rejected edit leaves the snapshot unchanged.
//! 2. The published snapshot never holds two sections with the same id, nor
//!    two items with the same id in one section.
//! 3. If the host is gone, edits still update the snapshot and every host
//!    call is skipped.
//!
//! Hosts must not call back into editing methods from within
//! [`ListHost::replace_snapshot`] or [`ListHost::apply_changes`].

use std::sync::{Arc, Mutex, PoisonError, Weak};

use ahash::{AHashMap, AHashSet};
use arc_swap::ArcSwap;

use super::error::ListError;
use super::host::{IndexPath, ListHost, SectionLayout, SupplementaryKind};
use super::item::{Item, ItemKey};
use super::section::{Section, SectionId};
use super::snapshot::{Changeset, ReloadPolicy, Snapshot, diff};
use super::supplementary::Supplementary;

/// Drives a [`ListHost`] from declared sections.
pub struct ListEngine<H: ListHost> {
    host: Weak<H>,
    current: Arc<ArcSwap<Snapshot<H>>>,
    edit: Mutex<()>,
}

impl<H: ListHost> ListEngine<H> {
    /// An engine with an empty snapshot, driving `host`.
    pub fn new(host: &Arc<H>) -> Self {
        Self {
            host: Arc::downgrade(host),
            current: Arc::new(ArcSwap::from_pointee(Snapshot::new())),
            edit: Mutex::new(()),
        }
    }

    /// The host, if it is still alive.
    #[must_use]
    pub fn host(&self) -> Option<Arc<H>> {
        self.host.upgrade()
    }

    /// The currently displayed snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Snapshot<H>> {
        self.current.load_full()
    }

    pub(crate) fn shared_snapshot(&self) -> Arc<ArcSwap<Snapshot<H>>> {
        Arc::clone(&self.current)
    }

    /// Show `sections`, dropping the empty ones.
    pub fn display(&self, sections: Vec<Section<H>>) -> Result<Changeset, ListError> {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("list_display", sections = sections.len()).entered();

        let sections: Vec<_> = sections.into_iter().filter(|s| !s.is_empty()).collect();
        validate(&sections)?;

        let _guard = self.edit.lock().unwrap_or_else(PoisonError::into_inner);
        let old = self.current.load_full();
        let next = Arc::new(Snapshot::from_sections(sections));

        if old.is_empty() {
            self.current.store(Arc::clone(&next));
            if let Some(host) = self.host.upgrade() {
                host.replace_snapshot(&next);
            }
            return Ok(Changeset {
                inserted_sections: (0..next.len()).collect(),
                ..Changeset::default()
            });
        }

        let changes = diff(&old, &next, ReloadPolicy::MissingOrChanged);
        self.publish(&old, next, &changes);
        Ok(changes)
    }

    /// Reconcile `sections` into the current snapshot.
    ///
    /// Unknown sections are appended. Known sections get their old-only
    /// items deleted and their new-only items inserted at the end, or just
    /// before `before` when that item is present in the section. Sections
    /// not mentioned stay as they are.
    pub fn update_sections(
        &self,
        sections: Vec<Section<H>>,
        before: Option<&ItemKey>,
    ) -> Result<Changeset, ListError> {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("list_update_sections", sections = sections.len()).entered();

        validate(&sections)?;

        let _guard = self.edit.lock().unwrap_or_else(PoisonError::into_inner);
        let old = self.current.load_full();

        let by_id: AHashMap<SectionId, usize> = sections
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id().clone(), i))
            .collect();
        let mut incoming: Vec<Option<Section<H>>> = sections.into_iter().map(Some).collect();

        let mut next: Vec<Section<H>> = old
            .sections()
            .iter()
            .map(|current| {
                match by_id.get(current.id()).and_then(|&i| incoming[i].take()) {
                    Some(target) => reconcile(current, target, before),
                    None => current.clone(),
                }
            })
            .collect();
        next.extend(incoming.into_iter().flatten());

        let next = Arc::new(Snapshot::from_sections(next));
        let changes = diff(&old, &next, ReloadPolicy::Changed);
        self.publish(&old, next, &changes);
        Ok(changes)
    }

    /// Append `items` to the end of the section `section`.
    pub fn append_items(
        &self,
        items: impl IntoIterator<Item = Item<H>>,
        section: &SectionId,
    ) -> Result<Changeset, ListError> {
        let _guard = self.edit.lock().unwrap_or_else(PoisonError::into_inner);
        let old = self.current.load_full();
        let index = old
            .section_index(section)
            .ok_or_else(|| ListError::UnknownSection(section.clone()))?;

        let mut sections = old.sections().to_vec();
        sections[index].items_mut().extend(items);
        sections[index].validate()?;

        let next = Arc::new(Snapshot::from_sections(sections));
        let changes = diff(&old, &next, ReloadPolicy::Changed);
        self.publish(&old, next, &changes);
        Ok(changes)
    }

    /// Remove every item whose id is in `ids`, from any section. Unknown
    /// ids are ignored.
    pub fn delete_items(&self, ids: &[ItemKey]) -> Changeset {
        let doomed: AHashSet<&ItemKey> = ids.iter().collect();
        let _guard = self.edit.lock().unwrap_or_else(PoisonError::into_inner);
        let old = self.current.load_full();

        let mut sections = old.sections().to_vec();
        for section in &mut sections {
            section.items_mut().retain(|item| !doomed.contains(item.id()));
        }

        let next = Arc::new(Snapshot::from_sections(sections));
        let changes = diff(&old, &next, ReloadPolicy::Changed);
        self.publish(&old, next, &changes);
        changes
    }

    fn publish(&self, old: &Snapshot<H>, next: Arc<Snapshot<H>>, changes: &Changeset) {
        self.current.store(Arc::clone(&next));
        if changes.is_empty() {
            return;
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(
            deleted_sections = changes.deleted_sections.len(),
            inserted_sections = changes.inserted_sections.len(),
            deleted_items = changes.deleted_items.len(),
            inserted_items = changes.inserted_items.len(),
            reloaded_items = changes.reloaded_items.len(),
            reloaded_supplementaries = changes.reloaded_supplementaries.len(),
            "list changes"
        );
        if let Some(host) = self.host.upgrade() {
            host.apply_changes(old, &next, changes);
        }
    }

    /// Render the item at `position`.
    #[must_use]
    pub fn cell(&self, position: IndexPath) -> Option<H::View> {
        let host = self.host.upgrade()?;
        let snapshot = self.current.load();
        let item = snapshot.item(position)?;
        Some(item.render(&host, position))
    }

    /// Render the header or footer of `section`.
    ///
    /// Empty sections, hidden descriptors and missing descriptors yield
    /// `None`.
    #[must_use]
    pub fn supplementary(&self, kind: SupplementaryKind, section: usize) -> Option<H::View> {
        let host = self.host.upgrade()?;
        let snapshot = self.current.load();
        let current = snapshot.section(section)?;
        if current.is_empty() {
            return None;
        }
        let descriptor = current.supplementary(kind)?;
        if descriptor.is_hidden() {
            return None;
        }
        Some(descriptor.render(&host, IndexPath::new(section, 0)))
    }

    /// Layout of `section` for `environment`.
    ///
    /// Empty sections are collapsed; hidden headers and footers are
    /// removed from the layout.
    #[must_use]
    pub fn section_layout(&self, section: usize, environment: &str) -> Option<H::Layout> {
        let snapshot = self.current.load();
        let current = snapshot.section(section)?;
        let mut layout = current.layout(environment)?;
        if current.is_empty() {
            layout.collapse();
            return Some(layout);
        }
        for kind in [SupplementaryKind::Header, SupplementaryKind::Footer] {
            if current.supplementary(kind).is_some_and(Supplementary::is_hidden) {
                layout.remove_supplementary(kind);
            }
        }
        Some(layout)
    }
}

impl<H: ListHost> std::fmt::Debug for ListEngine<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListEngine")
            .field("host_alive", &(self.host.strong_count() > 0))
            .field("snapshot", &*self.current.load())
            .finish()
    }
}

fn validate<H: ListHost>(sections: &[Section<H>]) -> Result<(), ListError> {
    let mut seen = AHashSet::with_capacity(sections.len());
    for section in sections {
        if !seen.insert(section.id()) {
            return Err(ListError::DuplicateSection(section.id().clone()));
        }
        section.validate()?;
    }
    Ok(())
}

/// Merge `target` into `current`: retained items keep their old order but
/// take the new controllers, new items go at the end or before `before`.
fn reconcile<H: ListHost>(
    current: &Section<H>,
    target: Section<H>,
    before: Option<&ItemKey>,
) -> Section<H> {
    let items = {
        let wanted: AHashMap<&ItemKey, &Item<H>> =
            target.items().iter().map(|item| (item.id(), item)).collect();
        let existing: AHashSet<&ItemKey> = current.items().iter().map(Item::id).collect();

        let mut items: Vec<Item<H>> = current
            .items()
            .iter()
            .filter_map(|item| wanted.get(item.id()).map(|&fresh| fresh.clone()))
            .collect();
        let added: Vec<Item<H>> = target
            .items()
            .iter()
            .filter(|item| !existing.contains(item.id()))
            .cloned()
            .collect();
        let at = before
            .and_then(|anchor| items.iter().position(|item| item.id() == anchor))
            .unwrap_or(items.len());
        items.splice(at..at, added);
        items
    };
    target.with_items(items)
}
