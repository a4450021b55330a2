#![forbid(unsafe_code)]

//! Loading placeholders ("skeletons").
//!
//! While a list is loading, every section shows a fixed number of
//! shimmering placeholder items instead of its real content. Placeholder
//! ids derive from the owning section id, so consecutive loading frames
//! reconcile to nothing and the switch back to real content happens in a
//! single emission.

use std::sync::Arc;

use ktui_runtime::{AnyBinding, Binding, BindingExt, combine_latest};

use super::host::{IndexPath, ListHost};
use super::item::{Item, RenderFn};
use super::section::Section;
use super::supplementary::Supplementary;

/// Builder for placeholder items.
#[derive(Debug, Clone, Copy, Default)]
pub struct Skeleton;

impl Skeleton {
    /// `count` placeholders with ids `{owner}_SHIMMER_{n}`, `n` from 1.
    ///
    /// Each placeholder renders through `configure` and then receives the
    /// host shimmer.
    ///
    /// # Panics
    ///
    /// Panics if `count` is zero.
    pub fn items<H, F>(count: usize, owner: &str, configure: F) -> Vec<Item<H>>
    where
        H: ListHost,
        F: Fn(&H, IndexPath) -> H::View + Send + Sync + 'static,
    {
        Self::items_with(count, owner, &(Arc::new(configure) as RenderFn<H>))
    }

    fn items_with<H: ListHost>(count: usize, owner: &str, configure: &RenderFn<H>) -> Vec<Item<H>> {
        assert!(count >= 1, "skeleton count must be at least 1, got {count}");
        (1..=count)
            .map(|n| {
                let configure = Arc::clone(configure);
                Item::from_render(format!("{owner}_SHIMMER_{n}"), move |host: &H, position| {
                    let mut view = configure(host, position);
                    host.apply_shimmer(&mut view);
                    view
                })
                .with_reuse_id("skeleton")
            })
            .collect()
    }
}

/// How headers and footers behave while loading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkeletonOptions {
    /// Show headers and footers as shimmering placeholders.
    pub include_supplementary: bool,
    /// Drop headers and footers. Wins over `include_supplementary`.
    pub hide_supplementary: bool,
}

impl SkeletonOptions {
    /// Shimmer headers and footers.
    #[must_use]
    pub const fn include_supplementary(mut self, include: bool) -> Self {
        self.include_supplementary = include;
        self
    }

    /// Drop headers and footers.
    #[must_use]
    pub const fn hide_supplementary(mut self, hide: bool) -> Self {
        self.hide_supplementary = hide;
        self
    }
}

impl<H: ListHost> Section<H> {
    /// The loading form of this section: `count` placeholders and headers
    /// and footers treated per `options`. The layout is kept.
    ///
    /// # Panics
    ///
    /// Panics if `count` is zero.
    pub fn skeleton<F>(&self, count: usize, options: SkeletonOptions, configure: F) -> Self
    where
        F: Fn(&H, IndexPath) -> H::View + Send + Sync + 'static,
    {
        self.skeleton_with(count, options, &(Arc::new(configure) as RenderFn<H>))
    }

    fn skeleton_with(&self, count: usize, options: SkeletonOptions, configure: &RenderFn<H>) -> Self {
        let mut section = self
            .clone()
            .with_items(Skeleton::items_with(count, self.id().as_str(), configure));
        let loading = |descriptor: Option<&Supplementary<H>>| {
            if options.hide_supplementary {
                None
            } else if options.include_supplementary {
                descriptor.map(Supplementary::shimmering)
            } else {
                descriptor.cloned()
            }
        };
        section.set_header(loading(self.header()));
        section.set_footer(loading(self.footer()));
        section
    }
}

/// Swap `sections` for their skeletons whenever `is_loading` is true.
///
/// Emits on every change of either source once both have emitted.
///
/// # Panics
///
/// Panics if `count` is zero, whether or not anything is ever loading.
pub fn skeleton<H, S, L, F>(
    sections: S,
    is_loading: L,
    count: usize,
    options: SkeletonOptions,
    configure: F,
) -> AnyBinding<Vec<Section<H>>>
where
    H: ListHost,
    S: Binding<Value = Vec<Section<H>>>,
    L: Binding<Value = bool>,
    F: Fn(&H, IndexPath) -> H::View + Send + Sync + 'static,
{
    assert!(count >= 1, "skeleton count must be at least 1, got {count}");
    let configure: RenderFn<H> = Arc::new(configure);
    combine_latest(sections, is_loading).map(move |(sections, loading): (Vec<Section<H>>, bool)| {
        if !loading {
            return sections;
        }
        sections
            .iter()
            .map(|section| section.skeleton_with(count, options, &configure))
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::item::ItemKey;
    use crate::collection::testing::{TestHost, section};
    use ktui_runtime::{ExecutionContext, Property};
    use std::sync::Mutex;

    fn placeholder(_: &TestHost, _: IndexPath) -> String {
        "bone".into()
    }

    #[test]
    fn placeholder_ids_and_shimmer() {
        let host = TestHost::new();
        let items = Skeleton::items(3, "movies", placeholder);
        let ids: Vec<_> = items.iter().map(|i| i.id().to_string()).collect();
        assert_eq!(ids, ["movies_SHIMMER_1", "movies_SHIMMER_2", "movies_SHIMMER_3"]);
        assert_eq!(items[0].render(&host, IndexPath::new(0, 0)), "bone~shimmer");
    }

    #[test]
    #[should_panic(expected = "at least 1")]
    fn zero_count_panics() {
        let _ = Skeleton::items(0, "s", placeholder);
    }

    #[test]
    #[should_panic(expected = "at least 1")]
    fn zero_count_panics_when_built() {
        let _ = skeleton(
            Property::new(vec![section("a", &["1"])]),
            Property::new(false),
            0,
            SkeletonOptions::default(),
            placeholder,
        );
    }

    fn with_supplementary() -> Section<TestHost> {
        section("s", &["a"])
            .with_header(Supplementary::header(|_: &TestHost, _| "H".into()).with_id("h"))
            .with_footer(Supplementary::footer(|_: &TestHost, _| "F".into()).with_id("f"))
    }

    #[test]
    fn supplementary_options() {
        let host = TestHost::new();
        let kept = with_supplementary().skeleton(2, SkeletonOptions::default(), placeholder);
        assert_eq!(kept.header().map(|h| h.id().clone()), Some(ItemKey::from("h")));
        assert_eq!(kept.len(), 2);

        let shimmer = with_supplementary().skeleton(
            1,
            SkeletonOptions::default().include_supplementary(true),
            placeholder,
        );
        let header = shimmer.header().unwrap();
        assert_ne!(header.id(), &ItemKey::from("h"));
        assert_eq!(header.render(&host, IndexPath::new(0, 0)), "H~shimmer");

        let hidden = with_supplementary().skeleton(
            1,
            SkeletonOptions::default().include_supplementary(true).hide_supplementary(true),
            placeholder,
        );
        assert!(hidden.header().is_none());
        assert!(hidden.footer().is_none());
    }

    #[test]
    fn loading_toggle_swaps_in_one_emission() {
        let sections = Property::new(vec![section("a", &["1", "2"]), section("b", &["3"])]);
        let loading = Property::new(true);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        let _sub = skeleton(sections.clone(), loading.clone(), 2, SkeletonOptions::default(), placeholder)
            .observe(ExecutionContext::Immediate, move |frame: Vec<Section<TestHost>>| {
                let ids: Vec<Vec<String>> = frame
                    .iter()
                    .map(|s| s.items().iter().map(|i| i.id().to_string()).collect())
                    .collect();
                s.lock().unwrap().push(ids);
            });

        loading.set(false);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(
            seen[0],
            vec![vec!["a_SHIMMER_1", "a_SHIMMER_2"], vec!["b_SHIMMER_1", "b_SHIMMER_2"]]
        );
        assert_eq!(seen[1], vec![vec!["1", "2"], vec!["3"]]);
    }
}
