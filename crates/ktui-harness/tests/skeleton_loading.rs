#![forbid(unsafe_code)]

//! Integration tests: loading skeletons driven by reactive state.

use std::sync::Arc;

use ktui_harness::fixtures::{Movie, catalogue, movie_section, placeholder};
use ktui_harness::{HostEvent, RecordingHost};
use ktui_runtime::{
    BindingExt, ExecutionContext, InteractionConfig, LoadableState, ManualScheduler, Property,
};
use ktui_widgets::{
    IndexPath, ListController, Section, SkeletonOptions, SupplementaryKind, skeleton,
};

fn controller(host: &Arc<RecordingHost>) -> ListController<RecordingHost> {
    ListController::with_parts(
        host,
        &InteractionConfig::default(),
        Arc::new(ManualScheduler::new()),
        ExecutionContext::Immediate,
    )
}

fn sections_for(state: LoadableState<Vec<Movie>>) -> Vec<Section<RecordingHost>> {
    vec![movie_section("popular", state.loaded().map(Vec::as_slice).unwrap_or_default())]
}

fn all_placeholders(ids: &[Vec<String>]) -> bool {
    ids.iter().flatten().all(|id| id.contains("_SHIMMER_"))
}

#[test]
fn loading_shows_placeholders_then_real_items_in_one_update() {
    let host = Arc::new(RecordingHost::new());
    let mut list = controller(&host);
    let state = Property::new(LoadableState::<Vec<Movie>>::Loading);

    list.bind(skeleton(
        state.clone().map(sections_for),
        state.clone().map(|s| s.is_loading()),
        4,
        SkeletonOptions::default(),
        placeholder,
    ));

    let loading = host.displayed_text();
    assert_eq!(loading.len(), 1);
    assert_eq!(loading[0].len(), 4);
    assert!(all_placeholders(&loading));
    assert_eq!(loading[0][0], "popular_SHIMMER_1");
    let cell = list.engine().cell(IndexPath::new(0, 0)).unwrap();
    assert!(cell.shimmering);
    assert_eq!(cell.reuse_id, "placeholder");

    host.clear_events();
    state.set(LoadableState::Loaded(catalogue(1, 3)));

    // The data and the loading flag both derive from `state`, so two frames
    // arrive. Whichever one swaps content swaps all of it at once.
    assert_eq!(host.displayed_text(), vec![vec!["1", "2", "3"]]);
    let swaps: Vec<_> = host
        .events()
        .into_iter()
        .filter_map(|event| match event {
            HostEvent::Apply(changes) if !changes.deleted_items.is_empty() => Some(changes),
            _ => None,
        })
        .collect();
    assert_eq!(swaps.len(), 1);
    assert_eq!(swaps[0].deleted_items.len(), 4);
    assert_eq!(swaps[0].inserted_items.len(), 3);
    assert!(list.take_error().is_none());
}

#[test]
fn loading_frames_reconcile_to_nothing() {
    let host = Arc::new(RecordingHost::new());
    let mut list = controller(&host);
    let sections = Property::new(vec![movie_section("a", &catalogue(1, 2))]);
    let loading = Property::new(true);
    list.bind(skeleton(sections.clone(), loading.clone(), 3, SkeletonOptions::default(), placeholder));
    host.clear_events();

    // New data arriving while still loading keeps the same placeholder ids.
    sections.set(vec![movie_section("a", &catalogue(5, 9))]);
    let changes = host.last_changes();
    assert!(changes.is_none_or(|c| c.deleted_items.is_empty() && c.inserted_items.is_empty()));
    assert!(all_placeholders(&host.displayed_text()));

    loading.set(false);
    assert_eq!(host.displayed_text()[0].len(), 9);
}

#[test]
fn shimmering_header_while_loading() {
    let host = Arc::new(RecordingHost::new());
    let mut list = controller(&host);
    let sections = Property::new(vec![movie_section("a", &catalogue(1, 2))]);
    let loading = Property::new(true);
    list.bind(skeleton(
        sections.clone(),
        loading.clone(),
        2,
        SkeletonOptions::default().include_supplementary(true),
        placeholder,
    ));
    let header = list.engine().supplementary(SupplementaryKind::Header, 0).unwrap();
    assert!(header.shimmering);
    assert_eq!(header.text, "a");

    loading.set(false);
    let header = list.engine().supplementary(SupplementaryKind::Header, 0).unwrap();
    assert!(!header.shimmering);
}

#[test]
fn hidden_header_while_loading() {
    let host = Arc::new(RecordingHost::new());
    let mut list = controller(&host);
    let sections = Property::new(vec![movie_section("a", &catalogue(1, 2))]);
    list.bind(skeleton(
        sections,
        Property::new(true),
        2,
        SkeletonOptions::default().hide_supplementary(true),
        placeholder,
    ));
    assert!(list.engine().supplementary(SupplementaryKind::Header, 0).is_none());
}
