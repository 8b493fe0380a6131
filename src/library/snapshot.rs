//! In-memory library loaded from a YAML snapshot.
//!
//! ```yaml
//! name: Movies
//! type: movie
//! new_agent: true
//! items:
//!   - rating_key: "1"
//!     title: Pulp Fiction
//!     year: 1994
//!     ids: {tmdb_id: 680}
//!     actors: [{id: "p1", tag: John Travolta}]
//! tags:
//!   genre: [{key: "1", title: Crime}]
//! collections:
//!   Genres: [Horror, Crime]
//! metadata:
//!   languages: {en: English}
//!   items:
//!     "1": {language_iso: en, language_name: English}
//! ranked_lists:
//!   popular_people: {"500": Tom Cruise}
//! ```
//!
//! `metadata` and `ranked_lists` are optional; when absent the snapshot does
//! not offer the matching collaborator. Deleted collections are recorded
//! and hidden from later queries.

use anyhow::{Context, Result, anyhow};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

use super::{
    CollectionHandle, ExternalIds, ExternalMetadata, Library, LibraryInfo, LibraryItem, LibraryType,
    MetadataProvider, RankedListProvider, Tag,
};

/// Ordered `key: label` pairs.
pub type RankedList = IndexMap<String, String>;

/// Metadata lookup tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    /// ISO 639-1 code to English name
    #[serde(default)]
    pub languages: IndexMap<String, String>,
    /// Lookup results keyed by rating key; missing keys are lookup misses
    #[serde(default)]
    pub items: IndexMap<String, ExternalMetadata>,
}

/// Ranked list tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRankedLists {
    /// User name to that user's lists
    #[serde(default)]
    pub user_lists: IndexMap<String, RankedList>,
    /// Liked lists
    #[serde(default)]
    pub liked_lists: RankedList,
    /// Most popular people, most popular first
    #[serde(default)]
    pub popular_people: RankedList,
    /// People list name to its people
    #[serde(default)]
    pub people_lists: IndexMap<String, RankedList>,
}

/// A library, metadata source and ranked list source backed by plain data.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SnapshotLibrary {
    /// Library name
    pub name: String,
    /// Item type
    #[serde(rename = "type")]
    pub library_type: Option<LibraryType>,
    /// Whether the newer metadata agent is in use
    #[serde(default)]
    pub new_agent: bool,
    /// Library items
    #[serde(default)]
    pub items: Vec<LibraryItem>,
    /// Tag field to values
    #[serde(default)]
    pub tags: IndexMap<String, Vec<Tag>>,
    /// Label to collection titles carrying it
    #[serde(default)]
    pub collections: IndexMap<String, Vec<String>>,
    /// Metadata lookups, when available
    #[serde(default)]
    pub metadata: Option<SnapshotMetadata>,
    /// Ranked lists, when available
    #[serde(default)]
    pub ranked_lists: Option<SnapshotRankedLists>,
    #[serde(skip)]
    deleted: Mutex<Vec<String>>,
}

impl SnapshotLibrary {
    /// Empty library of the given type.
    pub fn new(name: impl Into<String>, library_type: LibraryType) -> Self {
        Self {
            name: name.into(),
            library_type: Some(library_type),
            ..Self::default()
        }
    }

    /// Parse a snapshot document.
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("Failed to parse library snapshot")
    }

    /// Load a snapshot file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read library snapshot: {}", path.display()))?;
        serde_yaml::from_str(&text)
            .with_context(|| format!("Failed to parse library snapshot: {}", path.display()))
    }

    /// The snapshot as a metadata provider, when it carries metadata.
    pub fn metadata_provider(&self) -> Option<&dyn MetadataProvider> {
        self.metadata.as_ref().map(|_| self as &dyn MetadataProvider)
    }

    /// The snapshot as a ranked list provider, when it carries ranked lists.
    pub fn ranked_list_provider(&self) -> Option<&dyn RankedListProvider> {
        self.ranked_lists.as_ref().map(|_| self as &dyn RankedListProvider)
    }

    /// Titles deleted so far, in deletion order.
    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().map(|deleted| deleted.clone()).unwrap_or_default()
    }

    fn is_deleted(&self, title: &str) -> bool {
        self.deleted.lock().is_ok_and(|deleted| deleted.iter().any(|d| d == title))
    }

    fn ranked(&self) -> Result<&SnapshotRankedLists> {
        self.ranked_lists.as_ref().ok_or_else(|| anyhow!("No ranked lists in library snapshot {}", self.name))
    }
}

impl Library for SnapshotLibrary {
    fn info(&self) -> LibraryInfo {
        LibraryInfo::new(self.name.clone(), self.library_type.unwrap_or(LibraryType::Movie))
    }

    fn uses_new_agent(&self) -> bool {
        self.new_agent
    }

    fn get_all_items(&self) -> Result<Vec<LibraryItem>> {
        Ok(self.items.clone())
    }

    fn get_tags(&self, field: &str) -> Result<Vec<Tag>> {
        Ok(self.tags.get(field).cloned().unwrap_or_default())
    }

    fn get_ids(&self, item: &LibraryItem) -> Result<ExternalIds> {
        Ok(item.ids.clone())
    }

    fn reload(&self, item: &LibraryItem) -> Result<LibraryItem> {
        self.items
            .iter()
            .find(|candidate| candidate.rating_key == item.rating_key)
            .cloned()
            .ok_or_else(|| anyhow!("Item not found: {} ({})", item.title, item.rating_key))
    }

    fn get_all_collections(&self, label: &str) -> Result<Vec<CollectionHandle>> {
        Ok(self
            .collections
            .get(label)
            .into_iter()
            .flatten()
            .filter(|title| !self.is_deleted(title))
            .map(|title| CollectionHandle {
                title: title.clone(),
            })
            .collect())
    }

    fn delete_collection(&self, collection: &CollectionHandle) -> Result<()> {
        debug!("Deleting collection {}", collection.title);
        self.deleted
            .lock()
            .map_err(|_| anyhow!("Deletion log poisoned"))?
            .push(collection.title.clone());
        Ok(())
    }
}

impl MetadataProvider for SnapshotLibrary {
    fn get_item(&self, item: &LibraryItem, _ids: &ExternalIds, _is_movie: bool) -> Result<Option<ExternalMetadata>> {
        Ok(self.metadata.as_ref().and_then(|metadata| metadata.items.get(&item.rating_key).cloned()))
    }

    fn language_name(&self, iso: &str) -> Option<String> {
        self.metadata.as_ref().and_then(|metadata| metadata.languages.get(iso).cloned())
    }
}

fn pairs(list: &RankedList) -> Vec<(String, String)> {
    list.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
}

impl RankedListProvider for SnapshotLibrary {
    fn all_user_lists(&self, user: &str) -> Result<Vec<(String, String)>> {
        let lists = self.ranked()?.user_lists.get(user).ok_or_else(|| anyhow!("User {user} not found"))?;
        Ok(pairs(lists))
    }

    fn all_liked_lists(&self) -> Result<Vec<(String, String)>> {
        Ok(pairs(&self.ranked()?.liked_lists))
    }

    fn get_popular_people(&self, count: usize) -> Result<Vec<(String, String)>> {
        Ok(pairs(&self.ranked()?.popular_people).into_iter().take(count).collect())
    }

    fn get_people(&self, list: &str) -> Result<Vec<(String, String)>> {
        let people = self.ranked()?.people_lists.get(list).ok_or_else(|| anyhow!("List {list} not found"))?;
        Ok(pairs(people))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"
name: Movies
type: movie
items:
  - rating_key: "1"
    title: Pulp Fiction
    year: 1994
    actors: [{id: p1, tag: John Travolta}]
collections:
  Genres: [Horror, Crime]
metadata:
  languages: {en: English}
  items:
    "1": {language_iso: en, language_name: English}
"#;

    #[test]
    fn test_parse_snapshot() {
        let library = SnapshotLibrary::from_yaml(SNAPSHOT).unwrap();
        assert_eq!(library.info(), LibraryInfo::new("Movies", LibraryType::Movie));
        assert_eq!(library.get_all_items().unwrap().len(), 1);
        assert!(library.metadata_provider().is_some());
        assert!(library.ranked_list_provider().is_none());
        assert!(library.get_tags("genre").unwrap().is_empty());
    }

    #[test]
    fn test_deletions_are_recorded_and_hidden() {
        let library = SnapshotLibrary::from_yaml(SNAPSHOT).unwrap();
        let existing = library.get_all_collections("Genres").unwrap();
        assert_eq!(existing.len(), 2);

        library.delete_collection(&existing[0]).unwrap();
        assert_eq!(library.deleted(), vec!["Horror".to_string()]);
        let remaining = library.get_all_collections("Genres").unwrap();
        assert_eq!(remaining, vec![CollectionHandle { title: "Crime".to_string() }]);
    }

    #[test]
    fn test_metadata_lookup_miss() {
        let library = SnapshotLibrary::from_yaml(SNAPSHOT).unwrap();
        let item = LibraryItem {
            rating_key: "2".to_string(),
            title: "Unknown".to_string(),
            ..LibraryItem::default()
        };
        assert_eq!(library.get_item(&item, &item.ids, true).unwrap(), None);
        assert_eq!(library.language_name("en").as_deref(), Some("English"));
    }

    #[test]
    fn test_ranked_lists_unavailable() {
        let library = SnapshotLibrary::new("Movies", LibraryType::Movie);
        assert!(library.all_liked_lists().is_err());
    }
}
