//! Collaborator contracts for the media library and external data sources.
//!
//! The resolution engine never talks to a server directly. Everything it
//! needs from the outside world goes through three traits:
//!
//! - [`Library`] - items, tags, people and existing collections of one library
//! - [`MetadataProvider`] - per-item metadata lookups (collections, languages,
//!   countries)
//! - [`RankedListProvider`] - ranked user lists and people lists
//!
//! All methods are blocking and return [`anyhow::Result`]; failures are
//! wrapped with context by the caller. [`SnapshotLibrary`] implements all
//! three over a YAML document for the CLI and tests.

pub mod snapshot;

pub use snapshot::SnapshotLibrary;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use crate::core::{LibraryInfo, LibraryType};

/// A library item as seen by the generators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryItem {
    /// Server-side identifier
    pub rating_key: String,
    /// Display title
    pub title: String,
    /// Release year, when known
    #[serde(default)]
    pub year: Option<i64>,
    /// External identifiers
    #[serde(default)]
    pub ids: ExternalIds,
    /// Credited actors in billing order
    #[serde(default)]
    pub actors: Vec<Person>,
    /// Credited directors
    #[serde(default)]
    pub directors: Vec<Person>,
    /// Credited writers
    #[serde(default)]
    pub writers: Vec<Person>,
    /// Credited producers
    #[serde(default)]
    pub producers: Vec<Person>,
}

impl LibraryItem {
    /// People credited in `role`, in credit order.
    pub fn people(&self, role: PersonRole) -> &[Person] {
        match role {
            PersonRole::Actor => &self.actors,
            PersonRole::Director => &self.directors,
            PersonRole::Writer => &self.writers,
            PersonRole::Producer => &self.producers,
        }
    }
}

/// External identifiers of an item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIds {
    /// Movie database id
    #[serde(default)]
    pub tmdb_id: Option<i64>,
    /// TV database id
    #[serde(default)]
    pub tvdb_id: Option<i64>,
    /// IMDb id
    #[serde(default)]
    pub imdb_id: Option<String>,
}

/// A tag value and its server key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Server key (a language code, resolution id, ...)
    pub key: String,
    /// Display title
    pub title: String,
}

/// A credited person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Server-side person id
    pub id: String,
    /// Display name
    pub tag: String,
}

/// Credit role scanned by the people generators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PersonRole {
    /// Cast
    Actor,
    /// Directing credit
    Director,
    /// Writing credit
    Writer,
    /// Producing credit
    Producer,
}

impl PersonRole {
    /// Lowercase role name, also the generator kind name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Actor => "actor",
            Self::Director => "director",
            Self::Writer => "writer",
            Self::Producer => "producer",
        }
    }
}

impl fmt::Display for PersonRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata returned by a [`MetadataProvider`] lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalMetadata {
    /// Id of the franchise collection the item belongs to
    #[serde(default)]
    pub collection_id: Option<i64>,
    /// Name of that collection
    #[serde(default)]
    pub collection_name: Option<String>,
    /// ISO 639-1 code of the original language
    #[serde(default)]
    pub language_iso: Option<String>,
    /// English name of the original language
    #[serde(default)]
    pub language_name: Option<String>,
    /// Production or origin countries
    #[serde(default)]
    pub countries: Vec<Country>,
}

/// A country from a metadata lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    /// ISO 3166-1 alpha-2 code
    pub iso_3166_1: String,
    /// English name
    pub name: String,
}

/// An existing collection in the library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionHandle {
    /// Collection title
    pub title: String,
}

/// Read access to one library plus collection deletion.
pub trait Library {
    /// Library name and item type.
    fn info(&self) -> LibraryInfo;

    /// Whether the library uses the newer metadata agent.
    fn uses_new_agent(&self) -> bool;

    /// Every item in the library.
    fn get_all_items(&self) -> Result<Vec<LibraryItem>>;

    /// Every value of a tag field (`genre`, `contentRating`,
    /// `episode.resolution`, ...).
    fn get_tags(&self, field: &str) -> Result<Vec<Tag>>;

    /// External identifiers of an item.
    fn get_ids(&self, item: &LibraryItem) -> Result<ExternalIds>;

    /// A fully loaded copy of an item, including its credits.
    fn reload(&self, item: &LibraryItem) -> Result<LibraryItem>;

    /// Existing collections carrying `label`.
    fn get_all_collections(&self, label: &str) -> Result<Vec<CollectionHandle>>;

    /// Delete an existing collection.
    fn delete_collection(&self, collection: &CollectionHandle) -> Result<()>;
}

/// Per-item metadata lookups.
pub trait MetadataProvider {
    /// Look up an item; `Ok(None)` is a lookup miss.
    fn get_item(&self, item: &LibraryItem, ids: &ExternalIds, is_movie: bool) -> Result<Option<ExternalMetadata>>;

    /// English name for an ISO 639-1 language code.
    fn language_name(&self, iso: &str) -> Option<String>;
}

/// Ranked list sources. Every method returns ordered `(key, label)` pairs.
pub trait RankedListProvider {
    /// Lists owned by the user named in `user`.
    fn all_user_lists(&self, user: &str) -> Result<Vec<(String, String)>>;

    /// Lists liked by the authenticated user.
    fn all_liked_lists(&self) -> Result<Vec<(String, String)>>;

    /// The `count` most popular people.
    fn get_popular_people(&self, count: usize) -> Result<Vec<(String, String)>>;

    /// People on the list named by `list`.
    fn get_people(&self, list: &str) -> Result<Vec<(String, String)>>;
}
