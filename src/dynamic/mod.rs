//! Dynamic collection generation.
//!
//! A `dynamic_collections` entry names a generator kind and expands into one
//! collection definition per key the kind finds, each calling the mapping's
//! templates with the key bound to `value`, `key` and `key_name`.
//!
//! ```yaml
//! dynamic_collections:
//!   Genres:
//!     type: genre
//!     exclude: [Talk Show]
//!     addons:
//!       Thriller: [Suspense, Mystery]
//!     title_format: <<key_name>> Movies
//!     sync: true
//! ```
//!
//! # Modules
//!
//! - [`kinds`] - The generator kind catalog, defaults per kind
//! - [`mapping`] - Parsing and validating one mapping
//! - [`universe`] - Key universes built from the library and collaborators
//! - [`error`] - Failures that abort one mapping
//!
//! # Failure handling
//!
//! A failing mapping is logged and skipped; it never aborts the file. Sync
//! deletions only happen once the mapping has fully expanded.

pub mod error;
pub mod kinds;
pub mod mapping;
pub mod universe;

pub use error::DynamicError;
pub use kinds::GeneratorKind;
pub use mapping::{Capabilities, DynamicMapping};
pub use universe::{Sources, Universe, build_universe};

use mapping::template_calls;
use universe::describe;

use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};
use tracing::{debug, error, info, warn};

use crate::library::CollectionHandle;
use crate::templating::placeholder::unresolved_placeholders;
use crate::templating::{Template, TemplateSet, VariableMap};
use crate::utils::value_to_string;

/// Definitions produced by one dynamic mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expansion {
    /// Generated definitions keyed by title, in generation order
    pub collections: IndexMap<String, Mapping>,
    /// Synced collections deleted from the library
    pub deleted: Vec<String>,
}

/// Outcome of a whole `dynamic_collections` section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationReport {
    /// Number of definitions generated
    pub generated: usize,
    /// Mappings that failed and were skipped
    pub failed: Vec<String>,
    /// Synced collections deleted from the library
    pub deleted: Vec<String>,
}

/// Expands dynamic mappings against one library.
pub struct DynamicGenerator<'a> {
    sources: Sources<'a>,
    config: &'a VariableMap,
}

impl<'a> DynamicGenerator<'a> {
    /// Create a generator; `config` is the config-level variable bundle.
    pub fn new(sources: Sources<'a>, config: &'a VariableMap) -> Self {
        Self {
            sources,
            config,
        }
    }

    /// What the configured collaborators allow.
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            library_type: self.sources.library.info().library_type,
            new_agent: self.sources.library.uses_new_agent(),
            metadata: self.sources.metadata.is_some(),
            ranked_lists: self.sources.ranked_lists.is_some(),
        }
    }

    /// Expand every mapping of a section into `collections`.
    ///
    /// `known_titles` holds titles already taken; generated titles are added
    /// to it. Failing mappings are logged and listed in the report.
    pub fn generate(
        &self,
        section: &IndexMap<String, Value>,
        templates: &mut TemplateSet,
        collections: &mut IndexMap<String, Mapping>,
        known_titles: &mut Vec<String>,
    ) -> GenerationReport {
        let mut report = GenerationReport::default();
        for (map_name, raw) in section {
            info!("Building {map_name} Dynamic Collections");
            match self.expand(map_name, raw, templates, known_titles) {
                Ok(expansion) => {
                    report.generated += expansion.collections.len();
                    for (title, definition) in expansion.collections {
                        if !known_titles.contains(&title) {
                            known_titles.push(title.clone());
                        }
                        collections.insert(title, definition);
                    }
                    report.deleted.extend(expansion.deleted);
                }
                Err(e) => {
                    error!("{e}");
                    error!("{map_name} Dynamic Collection Failed");
                    report.failed.push(map_name.clone());
                }
            }
        }
        report
    }

    /// Expand one mapping.
    ///
    /// When the mapping names no template, the kind's default template is
    /// registered in `templates` under the mapping name.
    pub fn expand(
        &self,
        map_name: &str,
        raw: &Value,
        templates: &mut TemplateSet,
        known_titles: &[String],
    ) -> Result<Expansion, DynamicError> {
        let capabilities = self.capabilities();
        let mapping = DynamicMapping::parse(map_name, raw, self.config, capabilities)?;
        let universe = build_universe(&mapping, self.config, &self.sources)?;

        let mut auto_list = universe.auto_list;
        let mut addons = universe.addons.unwrap_or_else(|| mapping.addons.clone());
        fold_addons(&mapping, &universe.all_keys, &mut auto_list, &mut addons);

        let title_format = self.title_format(&mapping);
        let template_names = register_templates(&mapping, capabilities, templates)?;
        let other_templates = match &mapping.other_templates {
            Some(names) => {
                if let Some(missing) = names.iter().find(|name| !templates.contains(name)) {
                    return Err(DynamicError::OtherTemplateNotFound {
                        map_name: mapping.map_name.clone(),
                        template: missing.clone(),
                    });
                }
                names.clone()
            }
            None => template_names.clone(),
        };

        let mut sync: IndexMap<String, CollectionHandle> = if mapping.sync {
            self.sources
                .library
                .get_all_collections(map_name)
                .map_err(|e| DynamicError::collaborator("Library Error", &e))?
                .into_iter()
                .map(|handle| (handle.title.clone(), handle))
                .collect()
        } else {
            IndexMap::new()
        };

        debug!("Mapping Name: {map_name}");
        debug!("Type: {}", mapping.kind);
        debug!("Exclude: {:?}", mapping.og_exclude);
        debug!("Exclude Final: {:?}", mapping.exclude);
        debug!("Addons: {addons:?}");
        debug!("Template: {template_names:?}");
        debug!("Other Template: {other_templates:?}");
        debug!("Title Format: {title_format}");
        debug!("Custom Keys: {}", mapping.custom_keys);
        debug!("Include: {:?}", mapping.include);
        debug!("Keys (Title): {:?}", describe(&auto_list));

        let kind_name = mapping.kind.as_str();
        let mut expansion = Expansion::default();
        let mut other_keys: Vec<String> = Vec::new();
        let mut used_keys: Vec<String> = Vec::new();

        for (key, label) in &auto_list {
            if !mapping.include.is_empty() && !mapping.include.contains(key) {
                if !mapping.exclude.contains(key) {
                    other_keys.push(key.clone());
                }
                continue;
            }
            let key_name = mapping.key_name(key, label);
            let mut key_value: Vec<String> = Vec::new();
            if universe.all_keys.contains_key(key) {
                key_value.push(key.clone());
            }
            if let Some(members) = addons.get(key) {
                key_value.extend(
                    members
                        .iter()
                        .filter(|m| {
                            (universe.all_keys.contains_key(*m) || mapping.kind == GeneratorKind::Custom) && *m != key
                        })
                        .cloned(),
                );
            }
            used_keys.extend(key_value.iter().cloned());

            let mut call = Mapping::new();
            call.insert(Value::from("value"), string_list(&key_value));
            call.insert(Value::from(kind_name), string_list(&key_value));
            call.insert(Value::from("key_name"), Value::from(key_name.as_str()));
            call.insert(Value::from("key"), Value::from(key.as_str()));
            for (name, values) in &mapping.template_variables {
                if let Some(value) = values.get(key).or_else(|| values.get("default")) {
                    call.insert(Value::from(name.as_str()), value.clone());
                }
            }

            let title = match mapping.title_override.get(key) {
                Some(title) => title.clone(),
                None => title_format.replace("<<title>>", &key_name).replace("<<key_name>>", &key_name),
            };
            if known_titles.contains(&title) || expansion.collections.contains_key(&title) {
                warn!("Config Warning: Skipping duplicate collection: {title}");
                continue;
            }
            sync.shift_remove(&title);
            let definition = definition(template_calls(&template_names, &call), map_name, mapping.test);
            expansion.collections.insert(title, definition);
        }

        if let Some(other_name) = &mapping.other_name {
            if other_keys.is_empty() {
                warn!("Config Warning: Other Collection {other_name} not needed");
            } else {
                let mut call = Mapping::new();
                call.insert(Value::from("value"), string_list(&other_keys));
                call.insert(Value::from("included_keys"), string_list(&mapping.include));
                call.insert(Value::from("used_keys"), string_list(&used_keys));
                call.insert(Value::from(kind_name), string_list(&other_keys));
                call.insert(Value::from("key_name"), Value::from(other_name.as_str()));
                call.insert(Value::from("key"), Value::from("other"));
                for (name, values) in &mapping.template_variables {
                    if let Some(value) = values.get("other").or_else(|| values.get("default")) {
                        call.insert(Value::from(name.as_str()), value.clone());
                    }
                }
                sync.shift_remove(other_name);
                let definition = definition(template_calls(&other_templates, &call), map_name, mapping.test);
                expansion.collections.insert(other_name.clone(), definition);
            }
        }

        for (title, handle) in sync {
            match self.sources.library.delete_collection(&handle) {
                Ok(()) => {
                    info!("{map_name} Dynamic Collection: {title} Deleted");
                    expansion.deleted.push(title);
                }
                Err(e) => error!("Library Error: {e:#}"),
            }
        }
        Ok(expansion)
    }

    /// The mapping's title format with library placeholders filled in.
    fn title_format(&self, mapping: &DynamicMapping) -> String {
        let library_type = self.sources.library.info().library_type;
        let default = mapping.kind.default_title_format(library_type);
        let mut format = match &mapping.title_format {
            Some(format) if format.contains("<<key_name>>") || format.contains("<<title>>") => format.clone(),
            Some(format) => {
                error!("Config Error: <<key_name>> not in title_format: {format} using default: {default}");
                default.to_string()
            }
            None => default.to_string(),
        };
        format = format
            .replace("<<library_type>>", library_type.lower())
            .replace("<<library_typeU>>", library_type.label());
        if let Some(limit) = self.config.get("limit") {
            format = format.replace("<<limit>>", &value_to_string(limit));
        }
        format
    }
}

/// Apply addons: aggregate keys stand alone with `custom_keys`, otherwise
/// their members are put back into the list individually.
fn fold_addons(
    mapping: &DynamicMapping,
    all_keys: &IndexMap<String, String>,
    auto_list: &mut IndexMap<String, String>,
    addons: &mut IndexMap<String, Vec<String>>,
) {
    for (add_key, members) in addons.iter_mut() {
        if all_keys.contains_key(add_key) || mapping.og_exclude.contains(add_key) {
            continue;
        }
        let final_keys: Vec<String> = members.iter().filter(|k| all_keys.contains_key(*k)).cloned().collect();
        if mapping.custom_keys && !final_keys.is_empty() {
            auto_list.insert(add_key.clone(), add_key.clone());
            *members = final_keys;
        } else if mapping.custom_keys {
            warn!("Config Warning: {add_key} Custom Key must have at least one Key");
        } else {
            for key in final_keys {
                if let Some(label) = all_keys.get(&key) {
                    auto_list.insert(key, label.clone());
                }
            }
        }
    }
}

/// Check the mapping's templates, or register the kind's default under the
/// mapping name.
fn register_templates(
    mapping: &DynamicMapping,
    capabilities: Capabilities,
    templates: &mut TemplateSet,
) -> Result<Vec<String>, DynamicError> {
    let Some(names) = &mapping.templates else {
        let Some(body) = mapping.kind.default_template(capabilities.library_type) else {
            return Err(DynamicError::TemplateRequired {
                map_name: mapping.map_name.clone(),
                kind: mapping.kind.as_str().to_string(),
            });
        };
        templates.upsert(Template::new(mapping.map_name.clone(), body));
        return Ok(vec![mapping.map_name.clone()]);
    };

    let mut has_key = false;
    for name in names {
        let Some(template) = templates.get(name) else {
            return Err(DynamicError::TemplateNotFound {
                map_name: mapping.map_name.clone(),
                template: name.clone(),
            });
        };
        has_key |= unresolved_placeholders(&template.body)
            .iter()
            .any(|marker| marker == "value" || marker == "key" || marker == mapping.kind.as_str());
    }
    if !has_key {
        return Err(DynamicError::TemplateMissingValue {
            map_name: mapping.map_name.clone(),
            templates: names.join(", "),
        });
    }
    Ok(names.clone())
}

fn string_list(items: &[String]) -> Value {
    Value::Sequence(items.iter().map(|item| Value::from(item.as_str())).collect())
}

fn definition(calls: Value, label: &str, test: bool) -> Mapping {
    let mut definition = Mapping::new();
    definition.insert(Value::from("template"), calls);
    definition.insert(Value::from("label"), Value::from(label));
    if test {
        definition.insert(Value::from("test"), Value::Bool(true));
    }
    definition
}
