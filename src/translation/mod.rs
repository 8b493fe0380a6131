//! Language-keyed translation overlay.
//!
//! A translation bundle is one `default` document plus any number of
//! language documents. Each document may carry three tables:
//!
//! - `translations`: variable name to text; every entry must exist in the
//!   default document
//! - `variables`: variable name to a table keyed by library type, only the
//!   entry for the current library type is kept
//! - `key_names`: dynamic key name to its display form in that language
//!
//! At resolution time a variable takes the invocation's language entry when
//! present and falls back to `default`. Key names only apply for an exact
//! language match. The `library_type` key name is special: it relabels the
//! invocation's `library_type`/`library_typeU` variables.

use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};
use tracing::{debug, error};

use crate::core::MetaError;
use crate::templating::VariableMap;
use crate::utils::value_to_string;

/// Language code used when an invocation names none.
pub const DEFAULT_LANGUAGE: &str = "default";

/// Per-name table of language to value.
type LanguageTable = IndexMap<String, Value>;

/// Translations, translated variables and key names for one or more bundles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslationSet {
    translations: IndexMap<String, LanguageTable>,
    variables: IndexMap<String, LanguageTable>,
    key_names: IndexMap<String, LanguageTable>,
}

/// Key-name overlay for one language.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyNames {
    /// Relabelled library type, when the language provides one
    pub library_type: Option<String>,
    /// Key name to display name
    pub names: IndexMap<String, String>,
}

impl TranslationSet {
    /// Empty set; resolution yields no translation variables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a bundle from its default document and `(language, document)` pairs.
    ///
    /// `source` names the bundle in messages. `library_type` selects which
    /// entry of each `variables` table applies.
    pub fn from_documents(
        source: &str,
        default: &Value,
        languages: &[(String, Value)],
        library_type: &str,
    ) -> Result<Self, MetaError> {
        let Some(base) = default.get("translations").and_then(Value::as_mapping) else {
            return Err(MetaError::ConfigError {
                message: format!("Top Level translations attribute not found in {source}"),
            });
        };

        let mut set = Self::new();
        for (key, value) in base {
            let mut table = LanguageTable::new();
            table.insert(DEFAULT_LANGUAGE.to_string(), value.clone());
            set.translations.insert(value_to_string(key), table);
        }
        set.add_variables(default, DEFAULT_LANGUAGE, library_type);
        set.add_key_names(default, DEFAULT_LANGUAGE);
        debug!("Translations Loaded From: {source}");

        for (language, document) in languages {
            set.add_language(source, language, document, library_type);
        }
        Ok(set)
    }

    fn add_language(&mut self, source: &str, language: &str, document: &Value, library_type: &str) {
        self.add_variables(document, language, library_type);

        match document.get("translations").and_then(Value::as_mapping) {
            Some(entries) if !entries.is_empty() => {
                for (key, value) in entries {
                    let key = value_to_string(key);
                    match self.translations.get_mut(&key) {
                        Some(table) => {
                            table.insert(language.to_string(), value.clone());
                        }
                        None => error!("Config Error: {key} must have a default value in {source}/{language}"),
                    }
                }
            }
            _ => error!("Config Error: Top Level translations attribute not found in {source}/{language}"),
        }

        self.add_key_names(document, language);
    }

    fn add_variables(&mut self, document: &Value, language: &str, library_type: &str) {
        let Some(variables) = document.get("variables").and_then(Value::as_mapping) else {
            return;
        };
        for (key, per_type) in variables {
            if let Some(value) = per_type.get(library_type) {
                self.variables
                    .entry(value_to_string(key))
                    .or_default()
                    .insert(language.to_string(), value.clone());
            }
        }
    }

    fn add_key_names(&mut self, document: &Value, language: &str) {
        let Some(key_names) = document.get("key_names").and_then(Value::as_mapping) else {
            return;
        };
        for (key, value) in key_names {
            self.key_names
                .entry(value_to_string(key))
                .or_default()
                .insert(language.to_string(), value.clone());
        }
    }

    /// Merge another bundle; names already present keep their tables.
    pub fn merge(&mut self, other: Self) {
        fill_gaps(&mut self.translations, other.translations);
        fill_gaps(&mut self.variables, other.variables);
        fill_gaps(&mut self.key_names, other.key_names);
    }

    /// Whether no bundle has been loaded.
    pub fn is_empty(&self) -> bool {
        self.translations.is_empty() && self.variables.is_empty() && self.key_names.is_empty()
    }

    /// Translation variables for `language`, falling back to `default`.
    pub fn variables_for(&self, language: &str) -> VariableMap {
        self.translations
            .iter()
            .chain(&self.variables)
            .filter_map(|(name, table)| {
                table
                    .get(language)
                    .or_else(|| table.get(DEFAULT_LANGUAGE))
                    .map(|value| (name.clone(), value.clone()))
            })
            .collect()
    }

    /// Key-name overlay for exactly `language`.
    pub fn key_names_for(&self, language: &str) -> KeyNames {
        let mut overlay = KeyNames::default();
        for (key, table) in &self.key_names {
            let Some(value) = table.get(language) else {
                continue;
            };
            if key == "library_type" {
                overlay.library_type = Some(value_to_string(value));
            } else {
                overlay.names.insert(key.clone(), value_to_string(value));
            }
        }
        overlay
    }
}

fn fill_gaps(target: &mut IndexMap<String, LanguageTable>, source: IndexMap<String, LanguageTable>) {
    for (key, table) in source {
        target.entry(key).or_insert(table);
    }
}

/// Split a mapping of `language: document` into the default document and
/// the remaining languages, as stored in a single bundle file.
pub fn split_bundle(bundle: &Mapping) -> Option<(Value, Vec<(String, Value)>)> {
    let default = bundle.get(DEFAULT_LANGUAGE)?.clone();
    let languages = bundle
        .iter()
        .filter(|(k, _)| k.as_str() != Some(DEFAULT_LANGUAGE))
        .map(|(k, v)| (value_to_string(k), v.clone()))
        .collect();
    Some((default, languages))
}
