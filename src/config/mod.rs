//! Run configuration.
//!
//! A run is configured by a TOML file that supplies the config-level
//! variable bundle, optional file and collection filters, the library the
//! definitions resolve against, and whether progress bars are drawn.
//!
//! ```toml
//! requested_collections = ["Action Movies"]
//! progress = false
//!
//! [library]
//! name = "Movies"
//! type = "movie"
//!
//! [template_variables]
//! language = "fr"
//! limit = 50
//! append_exclude = ["Documentary"]
//! ```
//!
//! `template_variables` has the highest precedence during variable
//! resolution and also carries the overrides understood by dynamic
//! mappings (`exclude`, `append_exclude`, `addons`, `data`, `title_format`
//! and friends).

mod parser;

pub use parser::parse_config;

use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::core::LibraryType;
use crate::templating::VariableMap;

/// Library overrides applied on top of whatever the library reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibrarySettings {
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Item type
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub library_type: Option<LibraryType>,
    /// Whether the newer metadata agent is in use
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_agent: Option<bool>,
}

/// Settings for one run over a set of definition files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Config-level variables
    pub template_variables: VariableMap,
    /// Collection titles to process; empty means all
    pub requested_collections: Vec<String>,
    /// Definition file names to process; empty means all
    pub requested_files: Vec<String>,
    /// Library overrides
    pub library: LibrarySettings,
    /// Whether long scans draw progress bars
    pub progress: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            template_variables: VariableMap::new(),
            requested_collections: Vec::new(),
            requested_files: Vec::new(),
            library: LibrarySettings::default(),
            progress: true,
        }
    }
}

impl RunConfig {
    /// Load a run configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        parse_config(path)
    }

    /// Whether a definition file should be processed.
    ///
    /// `name` matches either a requested file name or its stem.
    pub fn is_scheduled(&self, name: &str) -> bool {
        if self.requested_files.is_empty() {
            return true;
        }
        let stem = Path::new(name).file_stem().map(|s| s.to_string_lossy().into_owned());
        self.requested_files
            .iter()
            .any(|requested| requested == name || stem.as_deref() == Some(requested.as_str()))
    }

    /// Set the `language` variable used to select translations.
    pub fn set_language(&mut self, language: impl Into<String>) {
        self.template_variables.insert("language".to_string(), Value::String(language.into()));
    }

    /// Add requested collection titles, skipping ones already requested.
    pub fn request_collections<I, S>(&mut self, titles: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for title in titles {
            let title = title.into();
            if !self.requested_collections.contains(&title) {
                self.requested_collections.push(title);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config: RunConfig = toml::from_str("").unwrap();
        assert!(config.progress);
        assert!(config.template_variables.is_empty());
        assert!(config.is_scheduled("movies.yml"));
    }

    #[test]
    fn test_load_full_config() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("run.toml");
        std::fs::write(
            &path,
            r#"
requested_collections = ["Action Movies"]
requested_files = ["movies"]
progress = false

[library]
name = "Films"
type = "show"
new_agent = true

[template_variables]
language = "fr"
limit = 50
append_exclude = ["Documentary"]
"#,
        )
        .unwrap();

        let config = RunConfig::load(&path).unwrap();
        assert!(!config.progress);
        assert_eq!(config.requested_collections, vec!["Action Movies"]);
        assert_eq!(config.library.library_type, Some(LibraryType::Show));
        assert_eq!(config.library.new_agent, Some(true));
        assert_eq!(config.template_variables["limit"], Value::from(50));
        assert_eq!(
            config.template_variables.keys().collect::<Vec<_>>(),
            vec!["language", "limit", "append_exclude"]
        );
        assert!(config.template_variables["append_exclude"].is_sequence());
    }

    #[test]
    fn test_is_scheduled_matches_name_or_stem() {
        let config = RunConfig {
            requested_files: vec!["movies".to_string()],
            ..RunConfig::default()
        };
        assert!(config.is_scheduled("movies.yml"));
        assert!(config.is_scheduled("movies"));
        assert!(!config.is_scheduled("shows.yml"));
    }

    #[test]
    fn test_language_and_requests() {
        let mut config = RunConfig::default();
        config.set_language("de");
        config.request_collections(["A", "B", "A"]);
        assert_eq!(config.template_variables["language"], Value::from("de"));
        assert_eq!(config.requested_collections, vec!["A", "B"]);
    }
}
