#![forbid(unsafe_code)]

//! Reference content for integration tests.

use ktui_widgets::{IndexPath, Item, ListHost, Section, Supplementary};

use crate::recording::{MockLayout, MockView, RecordingHost};

/// A catalogue entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Movie {
    /// Catalogue id.
    pub id: i64,
    /// Display title.
    pub title: String,
    /// Release year.
    pub year: u16,
}

impl Movie {
    /// A movie.
    pub fn new(id: i64, title: impl Into<String>, year: u16) -> Self {
        Self {
            id,
            title: title.into(),
            year,
        }
    }
}

/// `count` movies with ids starting at `first_id`.
#[must_use]
pub fn catalogue(first_id: i64, count: usize) -> Vec<Movie> {
    (first_id..)
        .take(count)
        .map(|id| Movie::new(id, format!("Movie {id}"), 1990 + (id % 30) as u16))
        .collect()
}

/// An item for `movie`, hashed on its visible fields.
#[must_use]
pub fn movie_item(movie: &Movie) -> Item<RecordingHost> {
    Item::new(movie.id, movie.clone(), |host: &RecordingHost, position, movie: &Movie| {
        host.dequeue("movie", position)
            .with_text(format!("{} ({})", movie.title, movie.year))
    })
    .with_content_hash(&(&movie.title, movie.year))
}

/// A section of movie items with a title header and a standard layout.
#[must_use]
pub fn movie_section(id: &str, movies: &[Movie]) -> Section<RecordingHost> {
    let title = id.to_string();
    Section::new(id, movies.iter().map(movie_item))
        .with_header(Supplementary::header(move |host: &RecordingHost, position| {
            host.dequeue("header", position).with_text(title.clone())
        }))
        .with_layout(|_| Some(MockLayout::standard(16)))
}

/// Render function for loading placeholders.
pub fn placeholder(host: &RecordingHost, position: IndexPath) -> MockView {
    host.dequeue("placeholder", position)
}
