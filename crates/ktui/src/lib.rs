#![forbid(unsafe_code)]

//! ktui public facade.
//!
//! Re-exports the reactive runtime and the list widgets under one crate and
//! offers a [`prelude`] for screens that declare lists.
//!
//! # Example
//!
//! ```ignore
//! use ktui::prelude::*;
//!
//! let movies = Property::new(LoadableState::<Vec<Movie>>::Loading);
//! let mut list = ListController::new(&host);
//! list.bind(skeleton(
//!     movies.clone().map(|state| vec![Section::new("popular", rows(&state))]),
//!     movies.clone().map(|state| state.is_loading()),
//!     6,
//!     SkeletonOptions::default(),
//!     placeholder_row,
//! ));
//! ```

pub use ktui_runtime as runtime;
pub use ktui_widgets as widgets;

pub use ktui_runtime::{
    AnyBinding, Binding, BindingExt, CancelBag, ExecutionContext, InteractionConfig,
    LoadableState, MainQueue, Property, Signal, Subscription,
};
pub use ktui_widgets::{
    Changeset, IndexPath, Item, ItemKey, ListController, ListEngine, ListError, ListHost,
    Pagination, Section, SectionId, Supplementary, skeleton,
};

/// Everything a screen needs to declare and bind a list.
pub mod prelude {
    pub use ktui_runtime::{
        AnyBinding, Binding, BindingExt, CancelBag, ExecutionContext, InteractionConfig,
        LoadableState, Property, Signal, Subscription, combine_latest, just,
    };
    pub use ktui_widgets::{
        IndexPath, Item, ItemKey, ListController, ListHost, Pagination, PaginationTrigger,
        Section, SectionLayout, SkeletonOptions, Supplementary, SupplementaryKind, skeleton,
    };
}
