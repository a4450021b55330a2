#![forbid(unsafe_code)]

//! Recoverable list errors.

use super::item::ItemKey;
use super::section::SectionId;

/// Error type for snapshot edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListError {
    /// Two items in the same section share an id.
    DuplicateItem {
        /// Section holding the duplicate.
        section: SectionId,
        /// The repeated item id.
        item: ItemKey,
    },
    /// Two sections in the same list share an id.
    DuplicateSection(SectionId),
    /// The section is not part of the displayed snapshot.
    UnknownSection(SectionId),
}

impl std::fmt::Display for ListError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateItem { section, item } => {
                write!(f, "item {item} appears more than once in section {section}")
            }
            Self::DuplicateSection(section) => {
                write!(f, "section {section} appears more than once")
            }
            Self::UnknownSection(section) => write!(f, "section {section} is not displayed"),
        }
    }
}

impl std::error::Error for ListError {}
