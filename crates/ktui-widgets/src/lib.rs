#![forbid(unsafe_code)]

//! List widgets for ktui.
//!
//! The [`collection`] module holds the declarative list model (items,
//! sections, headers and footers), the reconciliation engine that keeps a
//! native list widget in sync with it, loading skeletons, interaction
//! dispatch and pagination.

pub mod collection;

pub use collection::{
    Changeset, DispatchAdapter, IndexPath, Item, ItemKey, ListController, ListEngine, ListError,
    ListHost, Pagination, PaginationTrigger, Section, SectionId, SectionLayout, Skeleton,
    SkeletonOptions, Snapshot, Supplementary, SupplementaryKind, skeleton,
};
