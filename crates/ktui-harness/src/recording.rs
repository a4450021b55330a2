#![forbid(unsafe_code)]

use std::sync::{Mutex, MutexGuard, PoisonError};

use ktui_widgets::{
    Changeset, IndexPath, ItemKey, ListHost, SectionLayout, Snapshot, SupplementaryKind,
};
use serde_json::json;

/// A view produced by [`RecordingHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockView {
    /// Reuse identifier the view was dequeued with.
    pub reuse_id: String,
    /// Position it was dequeued for.
    pub position: IndexPath,
    /// Rendered text.
    pub text: String,
    /// Whether the loading shimmer was applied.
    pub shimmering: bool,
}

impl MockView {
    /// Set the rendered text.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }
}

/// A section layout with the parts the engine can strip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockLayout {
    /// Content insets, uniform.
    pub insets: u16,
    /// Decoration item names.
    pub decorations: Vec<String>,
    /// Boundary supplementary items.
    pub boundary: Vec<SupplementaryKind>,
}

impl MockLayout {
    /// A layout with `insets`, one background decoration and both boundary
    /// items.
    #[must_use]
    pub fn standard(insets: u16) -> Self {
        Self {
            insets,
            decorations: vec!["background".into()],
            boundary: vec![SupplementaryKind::Header, SupplementaryKind::Footer],
        }
    }
}

impl SectionLayout for MockLayout {
    fn collapse(&mut self) {
        self.insets = 0;
        self.decorations.clear();
        self.boundary.clear();
    }

    fn remove_supplementary(&mut self, kind: SupplementaryKind) {
        self.boundary.retain(|k| *k != kind);
    }
}

/// Something the engine asked the host to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// Wholesale replacement, with the new item ids.
    Replace(Vec<Vec<ItemKey>>),
    /// Batch update.
    Apply(Changeset),
}

#[derive(Debug, Default)]
struct State {
    events: Vec<HostEvent>,
    displayed: Vec<Vec<ItemKey>>,
    dequeued: usize,
}

/// A list host that records every call and tracks what it displays.
#[derive(Debug, Default)]
pub struct RecordingHost {
    state: Mutex<State>,
}

impl RecordingHost {
    /// A host displaying nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every call so far.
    #[must_use]
    pub fn events(&self) -> Vec<HostEvent> {
        self.state().events.clone()
    }

    /// Number of wholesale replacements.
    #[must_use]
    pub fn replace_count(&self) -> usize {
        self.state()
            .events
            .iter()
            .filter(|e| matches!(e, HostEvent::Replace(_)))
            .count()
    }

    /// The most recent changeset, if any.
    #[must_use]
    pub fn last_changes(&self) -> Option<Changeset> {
        self.state().events.iter().rev().find_map(|e| match e {
            HostEvent::Apply(changes) => Some(changes.clone()),
            HostEvent::Replace(_) => None,
        })
    }

    /// Item ids as the host believes they are displayed.
    #[must_use]
    pub fn displayed(&self) -> Vec<Vec<ItemKey>> {
        self.state().displayed.clone()
    }

    /// [`displayed`](Self::displayed) as strings, for terse assertions.
    #[must_use]
    pub fn displayed_text(&self) -> Vec<Vec<String>> {
        self.displayed()
            .into_iter()
            .map(|section| section.iter().map(ToString::to_string).collect())
            .collect()
    }

    /// Number of views dequeued.
    #[must_use]
    pub fn dequeued(&self) -> usize {
        self.state().dequeued
    }

    /// Forget recorded events, keeping the displayed state.
    pub fn clear_events(&self) {
        self.state().events.clear();
    }

    /// Recorded events as JSON lines, for CI artifacts.
    #[must_use]
    pub fn events_jsonl(&self) -> String {
        let paths = |v: &[IndexPath]| v.iter().map(|p| [p.section, p.item]).collect::<Vec<_>>();
        self.state()
            .events
            .iter()
            .map(|event| match event {
                HostEvent::Replace(sections) => json!({
                    "event": "replace",
                    "sections": sections
                        .iter()
                        .map(|s| s.iter().map(ToString::to_string).collect::<Vec<_>>())
                        .collect::<Vec<_>>(),
                }),
                HostEvent::Apply(changes) => json!({
                    "event": "apply",
                    "deleted_sections": changes.deleted_sections,
                    "inserted_sections": changes.inserted_sections,
                    "deleted_items": paths(&changes.deleted_items),
                    "inserted_items": paths(&changes.inserted_items),
                    "reloaded_items": paths(&changes.reloaded_items),
                    "reloaded_supplementaries": changes
                        .reloaded_supplementaries
                        .iter()
                        .map(|(section, kind)| json!([section, kind.as_str()]))
                        .collect::<Vec<_>>(),
                }),
            })
            .map(|value| value.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl ListHost for RecordingHost {
    type View = MockView;
    type Layout = MockLayout;

    fn dequeue(&self, reuse_id: &str, position: IndexPath) -> MockView {
        self.state().dequeued += 1;
        MockView {
            reuse_id: reuse_id.to_string(),
            position,
            text: String::new(),
            shimmering: false,
        }
    }

    fn replace_snapshot(&self, snapshot: &Snapshot<Self>) {
        let ids = snapshot.item_ids();
        let mut state = self.state();
        state.displayed = ids.clone();
        state.events.push(HostEvent::Replace(ids));
    }

    fn apply_changes(&self, _old: &Snapshot<Self>, new: &Snapshot<Self>, changes: &Changeset) {
        let mut state = self.state();
        state.displayed = replay(&state.displayed, new, changes);
        state.events.push(HostEvent::Apply(changes.clone()));
    }

    fn apply_shimmer(&self, view: &mut MockView) {
        view.shimmering = true;
    }
}

/// Apply `changes` to `displayed` the way a batch-updating widget does:
/// item deletions and section deletions in old coordinates, then section
/// insertions and item insertions in new coordinates, taking inserted ids
/// from `new`.
///
/// # Panics
///
/// Panics if the changeset does not fit `displayed` or `new`, which is
/// exactly what a native widget would reject.
#[must_use]
pub fn replay<H: ListHost>(
    displayed: &[Vec<ItemKey>],
    new: &Snapshot<H>,
    changes: &Changeset,
) -> Vec<Vec<ItemKey>> {
    let mut sections = displayed.to_vec();

    let mut deleted = changes.deleted_items.clone();
    deleted.sort_unstable();
    for path in deleted.iter().rev() {
        assert!(
            !changes.deleted_sections.contains(&path.section),
            "item delete {path} inside deleted section"
        );
        sections[path.section].remove(path.item);
    }
    let mut dropped = changes.deleted_sections.clone();
    dropped.sort_unstable();
    for &index in dropped.iter().rev() {
        sections.remove(index);
    }

    let mut added = changes.inserted_sections.clone();
    added.sort_unstable();
    let ids_of = |index: usize| -> Vec<ItemKey> {
        new.section(index)
            .map(|s| s.items().iter().map(|item| item.id().clone()).collect())
            .unwrap_or_else(|| panic!("inserted section {index} missing from new snapshot"))
    };
    for &index in &added {
        sections.insert(index, ids_of(index));
    }

    let mut inserted = changes.inserted_items.clone();
    inserted.sort_unstable();
    for path in inserted {
        let id = new
            .item(path)
            .unwrap_or_else(|| panic!("inserted item {path} missing from new snapshot"))
            .id()
            .clone();
        sections[path.section].insert(path.item, id);
    }

    for path in &changes.reloaded_items {
        assert!(new.item(*path).is_some(), "reload {path} missing from new snapshot");
    }
    for (index, kind) in &changes.reloaded_supplementaries {
        assert!(
            new.section(*index).is_some(),
            "{} reload for section {index} missing from new snapshot",
            kind.as_str()
        );
    }
    sections
}
