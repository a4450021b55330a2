#![forbid(unsafe_code)]

//! Displayed snapshots and the diff between two of them.
//!
//! # Changeset coordinates
//!
//! A [`Changeset`] follows batch-update conventions: deletions are
//! positions in the old snapshot, insertions and reloads are positions in
//! the new one. Items of an inserted or deleted section are implied by the
//! section operation and never listed individually. Supplementary reloads
//! name a matched section by its new index.
//!
//! # Invariants
//!
//! 1. Applying the deletions to the old snapshot and then the insertions in
//!    ascending order yields exactly the item ids of the new snapshot.
//! 2. Matched sections and items that keep their relative order are never
//!    deleted and reinserted. Only those that moved against the longest
//!    order-preserving run are.
//! 3. A reload is only ever reported for an item present in both snapshots.
//! 4. A header or footer is reloaded when its identity differs between two
//!    matched sections, including when one side has none.

use std::fmt;

use ahash::AHashMap;

use super::host::{IndexPath, ListHost, SupplementaryKind};
use super::item::{Item, ItemKey};
use super::section::{Section, SectionId};
use super::supplementary::Supplementary;

/// An ordered list of sections as shown by the host.
pub struct Snapshot<H: ListHost> {
    sections: Vec<Section<H>>,
}

impl<H: ListHost> Snapshot<H> {
    /// An empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self { sections: Vec::new() }
    }

    pub(crate) fn from_sections(sections: Vec<Section<H>>) -> Self {
        Self { sections }
    }

    /// Sections in display order.
    #[must_use]
    pub fn sections(&self) -> &[Section<H>] {
        &self.sections
    }

    /// Section at `index`.
    #[must_use]
    pub fn section(&self, index: usize) -> Option<&Section<H>> {
        self.sections.get(index)
    }

    /// Index of the section with `id`.
    #[must_use]
    pub fn section_index(&self, id: &SectionId) -> Option<usize> {
        self.sections.iter().position(|s| s.id() == id)
    }

    /// Item at `position`.
    #[must_use]
    pub fn item(&self, position: IndexPath) -> Option<&Item<H>> {
        self.sections.get(position.section)?.items().get(position.item)
    }

    /// First position holding an item with `id`.
    #[must_use]
    pub fn position_of(&self, id: &ItemKey) -> Option<IndexPath> {
        self.sections.iter().enumerate().find_map(|(s, section)| {
            section
                .items()
                .iter()
                .position(|item| item.id() == id)
                .map(|i| IndexPath::new(s, i))
        })
    }

    /// Item ids of every section, in order.
    #[must_use]
    pub fn item_ids(&self) -> Vec<Vec<ItemKey>> {
        self.sections
            .iter()
            .map(|s| s.items().iter().map(|item| item.id().clone()).collect())
            .collect()
    }

    /// Number of sections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Whether there are no sections.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Number of items across all sections.
    #[must_use]
    pub fn total_items(&self) -> usize {
        self.sections.iter().map(Section::len).sum()
    }
}

impl<H: ListHost> Default for Snapshot<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: ListHost> Clone for Snapshot<H> {
    fn clone(&self) -> Self {
        Self {
            sections: self.sections.clone(),
        }
    }
}

impl<H: ListHost> fmt::Debug for Snapshot<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("sections", &self.sections)
            .finish()
    }
}

/// Operations moving the host from one snapshot to the next.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changeset {
    /// Old indices of removed sections.
    pub deleted_sections: Vec<usize>,
    /// New indices of added sections.
    pub inserted_sections: Vec<usize>,
    /// Old positions of removed items.
    pub deleted_items: Vec<IndexPath>,
    /// New positions of added items.
    pub inserted_items: Vec<IndexPath>,
    /// New positions of persisting items whose content must be re-rendered.
    pub reloaded_items: Vec<IndexPath>,
    /// New section indices and kinds of headers and footers whose identity
    /// changed.
    pub reloaded_supplementaries: Vec<(usize, SupplementaryKind)>,
}

impl Changeset {
    /// Whether nothing changes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operation_count() == 0
    }

    /// Total number of operations.
    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.deleted_sections.len()
            + self.inserted_sections.len()
            + self.deleted_items.len()
            + self.inserted_items.len()
            + self.reloaded_items.len()
            + self.reloaded_supplementaries.len()
    }
}

/// When a persisting item is reloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReloadPolicy {
    /// Reload unless both sides carry the same hash.
    MissingOrChanged,
    /// Reload only when the new side carries a hash that differs.
    Changed,
}

impl ReloadPolicy {
    fn requires_reload(self, old: Option<u64>, new: Option<u64>) -> bool {
        match self {
            Self::MissingOrChanged => match (old, new) {
                (Some(old), Some(new)) => old != new,
                _ => true,
            },
            Self::Changed => new.is_some() && new != old,
        }
    }
}

/// Compute the operations that turn `old` into `new`.
pub(crate) fn diff<H: ListHost>(
    old: &Snapshot<H>,
    new: &Snapshot<H>,
    policy: ReloadPolicy,
) -> Changeset {
    let mut changes = Changeset::default();

    let old_index: AHashMap<&SectionId, usize> = old
        .sections
        .iter()
        .enumerate()
        .map(|(i, s)| (s.id(), i))
        .collect();
    let matched: Vec<(usize, usize)> = new
        .sections
        .iter()
        .enumerate()
        .filter_map(|(n, s)| old_index.get(s.id()).map(|&o| (o, n)))
        .collect();
    let pairs = in_order(&matched);

    let mut kept_old = vec![false; old.len()];
    let mut kept_new = vec![false; new.len()];
    for &(o, n) in &pairs {
        kept_old[o] = true;
        kept_new[n] = true;
    }
    changes.deleted_sections = unkept(&kept_old);
    changes.inserted_sections = unkept(&kept_new);

    for (o, n) in pairs {
        diff_items(&old.sections[o], &new.sections[n], o, n, policy, &mut changes);
    }
    changes
}

fn diff_items<H: ListHost>(
    old: &Section<H>,
    new: &Section<H>,
    old_section: usize,
    new_section: usize,
    policy: ReloadPolicy,
    changes: &mut Changeset,
) {
    for kind in [SupplementaryKind::Header, SupplementaryKind::Footer] {
        let before = old.supplementary(kind).map(Supplementary::id);
        let after = new.supplementary(kind).map(Supplementary::id);
        if before != after {
            changes.reloaded_supplementaries.push((new_section, kind));
        }
    }

    let old_index: AHashMap<&ItemKey, usize> = old
        .items()
        .iter()
        .enumerate()
        .map(|(i, item)| (item.id(), i))
        .collect();
    let matched: Vec<(usize, usize)> = new
        .items()
        .iter()
        .enumerate()
        .filter_map(|(n, item)| old_index.get(item.id()).map(|&o| (o, n)))
        .collect();
    let pairs = in_order(&matched);

    let mut kept_old = vec![false; old.len()];
    let mut kept_new = vec![false; new.len()];
    for &(o, n) in &pairs {
        kept_old[o] = true;
        kept_new[n] = true;
        if policy.requires_reload(old.items()[o].content_hash(), new.items()[n].content_hash()) {
            changes.reloaded_items.push(IndexPath::new(new_section, n));
        }
    }
    changes.deleted_items.extend(
        unkept(&kept_old)
            .into_iter()
            .map(|i| IndexPath::new(old_section, i)),
    );
    changes.inserted_items.extend(
        unkept(&kept_new)
            .into_iter()
            .map(|i| IndexPath::new(new_section, i)),
    );
}

fn unkept(kept: &[bool]) -> Vec<usize> {
    kept.iter()
        .enumerate()
        .filter_map(|(i, &k)| (!k).then_some(i))
        .collect()
}

/// Keep the longest subsequence of `(old, new)` pairs (ordered by `new`)
/// whose old indices also increase.
fn in_order(pairs: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let mut tails: Vec<usize> = Vec::new();
    let mut prev: Vec<Option<usize>> = vec![None; pairs.len()];
    for (i, &(old, _)) in pairs.iter().enumerate() {
        let at = tails.partition_point(|&t| pairs[t].0 < old);
        if at > 0 {
            prev[i] = Some(tails[at - 1]);
        }
        if at == tails.len() {
            tails.push(i);
        } else {
            tails[at] = i;
        }
    }
    let mut run = Vec::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        run.push(pairs[i]);
        cursor = prev[i];
    }
    run.reverse();
    run
}
