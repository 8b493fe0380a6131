//! Test fixtures for definitions and library snapshots.

use crate::core::LibraryType;
use crate::library::{ExternalIds, LibraryItem, Person, SnapshotLibrary, Tag};

/// A movie snapshot with genres, two credited items and existing genre
/// collections.
pub const MOVIE_SNAPSHOT: &str = r#"
name: Movies
type: movie
items:
  - rating_key: "1"
    title: Pulp Fiction
    year: 1994
    actors: [{id: p1, tag: John Travolta}, {id: p2, tag: Uma Thurman}]
    directors: [{id: d1, tag: Quentin Tarantino}]
  - rating_key: "2"
    title: Face/Off
    year: 1997
    actors: [{id: p1, tag: John Travolta}, {id: p3, tag: Nicolas Cage}]
    directors: [{id: d2, tag: John Woo}]
tags:
  genre:
    - {key: "1", title: Action}
    - {key: "2", title: Crime}
    - {key: "3", title: Horror}
collections:
  Genres: [Top Horror movies, Top Western movies]
"#;

/// Genre templates shared by definition fixtures.
pub const GENRE_TEMPLATES: &str = r"
templates:
  genre:
    default:
      limit: 50
      sort: critic_rating.desc
    optional: [poster]
    summary: Top <<key_name>> <<library_type>>s
    url_poster: <<poster>>
    smart_filter:
      limit: <<limit>>
      sort_by: <<sort>>
      any:
        genre: <<value>>
";

/// Fluent builder for in-memory [`SnapshotLibrary`] instances.
#[derive(Debug)]
pub struct LibraryBuilder {
    library: SnapshotLibrary,
}

impl LibraryBuilder {
    /// Start a library of the given type.
    pub fn new(name: &str, library_type: LibraryType) -> Self {
        Self {
            library: SnapshotLibrary::new(name, library_type),
        }
    }

    /// Start a movie library named `Movies`.
    pub fn movies() -> Self {
        Self::new("Movies", LibraryType::Movie)
    }

    /// Mark the library as using the newer metadata agent.
    pub fn new_agent(mut self) -> Self {
        self.library.new_agent = true;
        self
    }

    /// Add a tag value to a field.
    pub fn tag(mut self, field: &str, key: &str, title: &str) -> Self {
        self.library.tags.entry(field.to_string()).or_default().push(Tag {
            key: key.to_string(),
            title: title.to_string(),
        });
        self
    }

    /// Add an item with a year and credited actors.
    pub fn item(mut self, title: &str, year: i64, actors: &[&str]) -> Self {
        let rating_key = (self.library.items.len() + 1).to_string();
        let actors = actors
            .iter()
            .map(|name| Person {
                id: name.to_lowercase().replace(' ', "-"),
                tag: (*name).to_string(),
            })
            .collect();
        self.library.items.push(LibraryItem {
            rating_key,
            title: title.to_string(),
            year: Some(year),
            ids: ExternalIds::default(),
            actors,
            ..LibraryItem::default()
        });
        self
    }

    /// Add an existing collection carrying `label`.
    pub fn collection(mut self, label: &str, title: &str) -> Self {
        self.library.collections.entry(label.to_string()).or_default().push(title.to_string());
        self
    }

    /// Finish building.
    pub fn build(self) -> SnapshotLibrary {
        self.library
    }
}
