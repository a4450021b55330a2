#![forbid(unsafe_code)]

//! Declarative, reconciled lists.
//!
//! Screens declare their content as [`Section`]s of [`Item`]s. A
//! [`ListEngine`] turns successive declarations into snapshot edits for a
//! native [`ListHost`], a [`DispatchAdapter`] routes the host's interaction
//! events back to the items, and a [`ListController`] wires reactive
//! section bindings into both.
//!
//! # Example
//!
//! ```ignore
//! let mut list = ListController::new(&host);
//! list.bind(skeleton(
//!     movies.clone().map(|movies| vec![Section::new("movies", movies.iter().map(row))]),
//!     is_loading.clone(),
//!     6,
//!     SkeletonOptions::default(),
//!     placeholder_row,
//! ));
//! ```

mod controller;
mod dispatch;
mod engine;
mod error;
mod host;
mod item;
mod pagination;
mod section;
mod skeleton;
mod snapshot;
mod supplementary;

#[cfg(test)]
pub(crate) mod testing;

pub use controller::ListController;
pub use dispatch::DispatchAdapter;
pub use engine::ListEngine;
pub use error::ListError;
pub use host::{IndexPath, ListHost, SectionLayout, SupplementaryKind};
pub use item::{Item, ItemKey};
pub use pagination::{Pagination, PaginationTrigger};
pub use section::{Section, SectionId};
pub use skeleton::{Skeleton, SkeletonOptions, skeleton};
pub use snapshot::{Changeset, Snapshot};
pub use supplementary::Supplementary;
