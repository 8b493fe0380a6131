//! Case-insensitive view over a definition block.

use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};

use super::value_to_string;

/// Attributes of a definition keyed by lowercase name, in declaration order.
///
/// Keys are normalized once on construction; the spelling used in the file
/// is kept for messages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeMap {
    entries: IndexMap<String, (String, Value)>,
}

impl AttributeMap {
    /// Build from a raw mapping. Later keys that differ only in case replace
    /// earlier ones.
    pub fn from_mapping(mapping: &Mapping) -> Self {
        let entries = mapping
            .iter()
            .map(|(k, v)| {
                let original = value_to_string(k);
                (original.to_lowercase(), (original, v.clone()))
            })
            .collect();
        Self {
            entries,
        }
    }

    /// Value of an attribute by lowercase name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name).map(|(_, v)| v)
    }

    /// Whether an attribute is present.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Spelling of an attribute as written in the file.
    pub fn original(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(|(o, _)| o.as_str())
    }

    /// Rename `from` to `to`, replacing any existing `to`.
    pub fn alias(&mut self, from: &str, to: &str) {
        if let Some(entry) = self.entries.shift_remove(from) {
            self.entries.insert(to.to_string(), entry);
        }
    }

    /// Lowercase names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Whether there are no attributes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
