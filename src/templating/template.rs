//! Named templates and the ordered set they are looked up in.

use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};
use strsim::levenshtein;
use tracing::warn;

use super::VariableMap;
use super::error::TemplateError;
use crate::core::DataKind;

/// Maximum edit distance, as a percentage of the requested name, for a
/// template to be suggested.
const SIMILARITY_THRESHOLD_PERCENT: usize = 50;

/// A reusable attribute tree plus the variables captured when it was loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    /// Template name, unique within a [`TemplateSet`]
    pub name: String,
    /// Raw body; validated as a mapping when applied
    pub body: Value,
    /// Variables declared alongside the file the template came from
    pub external: VariableMap,
}

impl Template {
    /// Template without external variables.
    pub fn new(name: impl Into<String>, body: Value) -> Self {
        Self {
            name: name.into(),
            body,
            external: VariableMap::new(),
        }
    }

    /// Attach an external variable bundle.
    #[must_use]
    pub fn with_external(mut self, external: VariableMap) -> Self {
        self.external = external;
        self
    }

    /// The body as a mapping, or an error naming the template.
    pub fn mapping(&self, data_type: DataKind) -> Result<&Mapping, TemplateError> {
        self.body.as_mapping().ok_or_else(|| TemplateError::TemplateNotADictionary {
            data_type,
            name: self.name.clone(),
        })
    }
}

/// Templates keyed by name in load order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateSet {
    templates: IndexMap<String, Template>,
}

impl TemplateSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a `templates:` mapping; entries that are not mappings or
    /// that repeat an earlier name are skipped with a warning.
    pub fn from_mapping(section: &Mapping) -> Self {
        let mut set = Self::new();
        for (name, body) in section {
            let name = crate::utils::value_to_string(name);
            if body.is_null() {
                continue;
            }
            if !body.is_mapping() {
                warn!("Config Warning: template: {name} must be a dictionary");
                continue;
            }
            set.insert(Template::new(name, body.clone()));
        }
        set
    }

    /// Add a template; a name that already exists keeps the earlier one.
    ///
    /// Returns whether the template was added.
    pub fn insert(&mut self, template: Template) -> bool {
        if self.templates.contains_key(&template.name) {
            warn!("Config Warning: Skipping duplicate template: {}", template.name);
            return false;
        }
        self.templates.insert(template.name.clone(), template);
        true
    }

    /// Add or replace a template, keeping its position when it already exists.
    pub fn upsert(&mut self, template: Template) {
        self.templates.insert(template.name.clone(), template);
    }

    /// Add templates from an external document, filling gaps only.
    ///
    /// Every added template carries `external` as its captured variables.
    pub fn extend_external(&mut self, section: &Mapping, external: &VariableMap) -> usize {
        let mut added = 0;
        for (name, body) in section {
            let name = crate::utils::value_to_string(name);
            if self.templates.contains_key(&name) {
                continue;
            }
            self.templates
                .insert(name.clone(), Template::new(name, body.clone()).with_external(external.clone()));
            added += 1;
        }
        added
    }

    /// Look up a template by name.
    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    /// Look up a template, producing a not-found error with suggestions.
    pub fn require(&self, name: &str, data_type: DataKind) -> Result<&Template, TemplateError> {
        self.get(name).ok_or_else(|| TemplateError::TemplateNotFound {
            data_type,
            name: name.to_string(),
            suggestions: self.similar_names(name),
        })
    }

    /// Whether a template with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Number of templates.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Template names in load order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    /// Up to three known names close to `target`, closest first.
    fn similar_names(&self, target: &str) -> Vec<String> {
        let mut scored: Vec<_> = self.names().map(|name| (name, levenshtein(target, name))).collect();
        scored.sort_by_key(|(_, dist)| *dist);
        scored
            .into_iter()
            .filter(|(_, dist)| *dist <= target.len() * SIMILARITY_THRESHOLD_PERCENT / 100)
            .take(3)
            .map(|(name, _)| name.to_string())
            .collect()
    }
}
