#![forbid(unsafe_code)]

//! In-crate host double for unit tests.

use std::sync::Mutex;

use super::host::{IndexPath, ListHost, SectionLayout, SupplementaryKind};
use super::item::{Item, ItemKey};
use super::section::Section;
use super::snapshot::{Changeset, Snapshot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HostCall {
    Replace(Vec<Vec<ItemKey>>),
    Apply(Changeset),
}

#[derive(Debug, Default)]
pub(crate) struct TestHost {
    calls: Mutex<Vec<HostCall>>,
}

impl TestHost {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TestLayout {
    pub(crate) insets: u16,
    pub(crate) collapsed: bool,
    pub(crate) boundary: Vec<SupplementaryKind>,
}

impl TestLayout {
    pub(crate) fn new(insets: u16) -> Self {
        Self {
            insets,
            collapsed: false,
            boundary: vec![SupplementaryKind::Header, SupplementaryKind::Footer],
        }
    }
}

impl SectionLayout for TestLayout {
    fn collapse(&mut self) {
        self.insets = 0;
        self.collapsed = true;
        self.boundary.clear();
    }

    fn remove_supplementary(&mut self, kind: SupplementaryKind) {
        self.boundary.retain(|k| *k != kind);
    }
}

impl ListHost for TestHost {
    type View = String;
    type Layout = TestLayout;

    fn dequeue(&self, reuse_id: &str, position: IndexPath) -> String {
        format!("{reuse_id}@{position}")
    }

    fn replace_snapshot(&self, snapshot: &Snapshot<Self>) {
        self.calls
            .lock()
            .unwrap()
            .push(HostCall::Replace(snapshot.item_ids()));
    }

    fn apply_changes(&self, _old: &Snapshot<Self>, _new: &Snapshot<Self>, changes: &Changeset) {
        self.calls.lock().unwrap().push(HostCall::Apply(changes.clone()));
    }

    fn apply_shimmer(&self, view: &mut String) {
        view.push_str("~shimmer");
    }
}

/// An item rendering its own id.
pub(crate) fn text_item(id: &str) -> Item<TestHost> {
    let text = id.to_string();
    Item::new(id, text, |_: &TestHost, _, text: &String| text.clone())
}

pub(crate) fn section(id: &str, items: &[&str]) -> Section<TestHost> {
    Section::new(id, items.iter().map(|i| text_item(i)))
}

pub(crate) fn ids(snapshot: &Snapshot<TestHost>) -> Vec<Vec<String>> {
    snapshot
        .item_ids()
        .into_iter()
        .map(|s| s.into_iter().map(|k| k.to_string()).collect())
        .collect()
}
