//! Variable resolution for one template invocation.
//!
//! Resolution turns a call site, the called template and the surrounding
//! variable bundles into the final [`ResolvedVariables`] the substitution
//! engine works against. The order of the steps matters:
//!
//! 1. call-site nulls become optional names, bookkeeping variables are injected
//! 2. external, definition and config bundles are layered in that order
//!    (config overwrites, the others only fill gaps)
//! 3. translations and key names for the invocation's language are applied
//! 4. template defaults are resolved (variables win over defaults)
//! 5. declared optional names are recorded
//! 6. conditionals are evaluated
//! 7. the sort variable is derived from `move_prefix`
//! 8. variable keys containing markers are rewritten, `_encoded` twins added
//! 9. defaults and optional names shadowed by variables are pruned

use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};
use tracing::{debug, trace, warn};

use super::VariableMap;
use super::conditionals::resolve_conditionals;
use super::error::{TemplateError, VariableSource};
use super::placeholder::{replace_once, replace_str};
use super::template::Template;
use crate::core::{DataKind, LibraryInfo};
use crate::translation::{DEFAULT_LANGUAGE, TranslationSet};
use crate::utils::{encode, encoded_key, get_str_list, value_to_string};

/// Template keys that configure resolution instead of producing attributes.
pub const RESERVED_TEMPLATE_KEYS: [&str; 5] =
    ["default", "optional", "conditionals", "move_collection_prefix", "move_prefix"];

/// File-level context shared by every invocation in one definition file.
#[derive(Debug, Clone, Copy)]
pub struct ResolutionContext<'a> {
    /// Definition family of the file
    pub data_type: DataKind,
    /// Library the file is resolved against; playlists have none
    pub library: Option<&'a LibraryInfo>,
    /// Config-level variables, highest precedence
    pub config_variables: &'a VariableMap,
    /// Translation bundles loaded by the file
    pub translations: &'a TranslationSet,
}

/// Final variable sets for one invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedVariables {
    /// Explicit and computed variables, including `_encoded` twins
    pub variables: VariableMap,
    /// Defaults not shadowed by a variable
    pub defaults: VariableMap,
    /// Names allowed to stay unresolved
    pub optional: Vec<String>,
    /// Translation variables for the invocation's language
    pub translations: VariableMap,
    /// Conditional table after layering, in evaluation order
    pub conditionals: IndexMap<String, Value>,
}

impl ResolvedVariables {
    /// Variable, translation and default layers in substitution order.
    pub fn layers(&self) -> Vec<&VariableMap> {
        vec![&self.variables, &self.translations, &self.defaults]
    }
}

/// Read a `default`/`conditionals` block, rejecting blank or non-mapping values.
fn reserved_block(
    data_type: DataKind,
    attribute: &str,
    origin: VariableSource,
    value: &Value,
) -> Result<IndexMap<String, Value>, TemplateError> {
    match value {
        Value::Mapping(map) if !map.is_empty() => {
            Ok(map.iter().map(|(k, v)| (value_to_string(k), v.clone())).collect())
        }
        Value::Mapping(_) | Value::Null => Err(TemplateError::BlankAttribute {
            data_type,
            attribute: attribute.to_string(),
            origin,
        }),
        Value::String(s) if s.is_empty() => Err(TemplateError::BlankAttribute {
            data_type,
            attribute: attribute.to_string(),
            origin,
        }),
        _ => Err(TemplateError::NotADictionary {
            data_type,
            attribute: attribute.to_string(),
            origin,
        }),
    }
}

/// Resolve the variables of one invocation.
///
/// `call` holds the call-site variables and must contain `name`. The
/// definition name written to `<kind>_name` is `call_name` when given, else
/// the template's own `name` attribute, else `mapping_name`.
pub fn resolve_variables(
    ctx: &ResolutionContext<'_>,
    call: &VariableMap,
    template: &Template,
    body: &Mapping,
    call_name: Option<&str>,
    mapping_name: &str,
    extra_variables: &VariableMap,
) -> Result<ResolvedVariables, TemplateError> {
    let data_type = ctx.data_type;
    trace!("Call: {call:?}");

    let mut optional: Vec<String> = Vec::new();
    let mut variables = VariableMap::new();
    for (key, value) in call {
        if value.is_null() {
            optional.push(key.clone());
        } else {
            variables.insert(key.clone(), value.clone());
        }
    }

    let name = match (call_name, body.get("name")) {
        (Some(call_name), _) => call_name.to_string(),
        (None, Some(template_name)) => value_to_string(template_name),
        (None, None) => mapping_name.to_string(),
    };
    let name_var = data_type.name_variable();
    variables.insert(name_var.clone(), Value::String(name));
    variables.insert("mapping_name".to_string(), Value::from(mapping_name));
    let (library_type, library_type_upper, library_name) = match ctx.library {
        Some(info) => (info.library_type.lower(), info.library_type.label(), info.name.as_str()),
        None => ("item", "Item", "playlist"),
    };
    variables.insert("library_type".to_string(), Value::from(library_type));
    variables.insert("library_typeU".to_string(), Value::from(library_type_upper));
    variables.insert("library_name".to_string(), Value::from(library_name));

    let mut conditionals = match body.get("conditionals") {
        Some(block) => reserved_block(data_type, "conditionals", VariableSource::Template, block)?,
        None => IndexMap::new(),
    };
    let template_defaults = match body.get("default") {
        Some(block) => reserved_block(data_type, "default", VariableSource::Template, block)?,
        None => IndexMap::new(),
    };
    let mut all_defaults = template_defaults.clone();

    let mut added = VariableMap::new();
    let mut source_conditionals = IndexMap::new();
    for (source, bundle) in [
        (VariableSource::External, &template.external),
        (VariableSource::Definition, extra_variables),
        (VariableSource::Config, ctx.config_variables),
    ] {
        trace!("{source}: {bundle:?}");
        for (key, value) in bundle {
            match key.as_str() {
                "conditionals" => source_conditionals.extend(reserved_block(data_type, key, source, value)?),
                "default" => all_defaults.extend(reserved_block(data_type, key, source, value)?),
                _ if value.is_null() => {
                    optional.push(key.clone());
                    variables.shift_remove(key);
                    added.shift_remove(key);
                }
                _ if source.overwrites() => {
                    variables.insert(key.clone(), value.clone());
                }
                _ => {
                    added.insert(key.clone(), value.clone());
                }
            }
        }
    }
    for (key, value) in added {
        variables.entry(key).or_insert(value);
    }
    for (key, value) in source_conditionals {
        if !variables.contains_key(&key) {
            conditionals.insert(key, value);
        }
    }

    let language = variables
        .get("language")
        .map(value_to_string)
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
    let translations = ctx.translations.variables_for(&language);
    let key_names = ctx.translations.key_names_for(&language);
    if let Some(label) = &key_names.library_type {
        variables.insert("library_type".to_string(), Value::String(label.to_lowercase()));
        variables.insert("library_typeU".to_string(), Value::String(label.clone()));
    }
    if let Some(key_name) = variables.get("key_name").cloned() {
        let original = value_to_string(&key_name);
        variables.insert("original_key_name".to_string(), key_name.clone());
        variables.insert("key_name_first_letter".to_string(), Value::String(first_letter(&original)));
        let translated = match key_names.names.get(&original) {
            Some(mapped) => Value::String(mapped.clone()),
            None => key_name,
        };
        variables.insert("key_name".to_string(), translated.clone());
        variables.insert("translated_key_name".to_string(), translated);
    }

    let mut defaults = VariableMap::new();
    if !all_defaults.is_empty() {
        let first_pass: VariableMap = all_defaults
            .iter()
            .filter(|(key, _)| !variables.contains_key(*key))
            .map(|(key, value)| (replace_str(key, &[&variables]), replace_once(value, &[&variables])))
            .collect();
        for (key, value) in &first_pass {
            let final_key = replace_str(key, &[&first_pass]);
            let final_value = replace_once(value, &[&first_pass]);
            if optional.contains(&final_key)
                || variables.contains_key(&final_key)
                || conditionals.contains_key(&final_key)
            {
                continue;
            }
            defaults.insert(encoded_key(&final_key), Value::String(encode(&value_to_string(&final_value))));
            defaults.insert(final_key, final_value);
        }
    }

    if let Some(declared) = body.get("optional") {
        let names = get_str_list(declared, true);
        if names.is_empty() {
            return Err(TemplateError::BlankAttribute {
                data_type,
                attribute: "optional".to_string(),
                origin: VariableSource::Template,
            });
        }
        for op in names {
            let op = replace_str(&op, &[&variables]);
            if !defaults.contains_key(&op) && !conditionals.contains_key(&op) {
                optional.push(encoded_key(&op));
                optional.push(op);
            } else if template_defaults.contains_key(&op) {
                warn!("Template Warning: variable {op} cannot be optional if it has a default");
            }
        }
    }

    resolve_conditionals(data_type, &conditionals, &mut variables, &defaults, &mut optional)?;

    let definition_name = variables.get(&name_var).cloned().unwrap_or(Value::Null);
    let sort_name = move_prefix(data_type, body, &value_to_string(&definition_name))?;
    let sort_value = sort_name.map_or(definition_name, Value::String);
    variables.insert(data_type.sort_variable(), sort_value);

    let keys_with_markers: Vec<(String, Value)> = variables
        .iter()
        .filter(|(key, _)| key.contains("<<") && key.contains(">>"))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    for (key, value) in keys_with_markers {
        let rewritten = replace_str(&replace_str(&key, &[&variables]), &[&defaults]);
        variables.insert(rewritten, value);
    }
    let twins: Vec<(String, Value)> = variables
        .iter()
        .map(|(key, value)| (encoded_key(key), Value::String(encode(&value_to_string(value)))))
        .collect();
    variables.extend(twins);

    defaults.retain(|key, _| !variables.contains_key(key));
    optional.retain(|name| !variables.contains_key(name) && !defaults.contains_key(name));

    trace!("Variables: {variables:?}");
    trace!("Defaults: {defaults:?}");
    trace!("Optional: {optional:?}");
    trace!("Translation: {translations:?}");

    Ok(ResolvedVariables {
        variables,
        defaults,
        optional,
        translations,
        conditionals,
    })
}

/// First character uppercased when alphabetic, otherwise `#`.
pub fn first_letter(key_name: &str) -> String {
    match key_name.chars().next() {
        Some(c) if c.is_alphabetic() => c.to_uppercase().collect(),
        _ => "#".to_string(),
    }
}

/// Sort name with a leading prefix token moved to the end (`"The Matrix"`
/// with prefix `The` gives `"Matrix, The"`).
fn move_prefix(data_type: DataKind, body: &Mapping, name: &str) -> Result<Option<String>, TemplateError> {
    let prefixes = match (body.get("move_prefix"), body.get("move_collection_prefix")) {
        (Some(prefixes), _) => prefixes,
        (None, Some(prefixes)) => {
            debug!("{data_type} Warning: template sub-attribute move_collection_prefix will run as move_prefix");
            prefixes
        }
        (None, None) => return Ok(None),
    };
    let prefixes = get_str_list(prefixes, true);
    if prefixes.is_empty() {
        return Err(TemplateError::BlankAttribute {
            data_type,
            attribute: "move_prefix".to_string(),
            origin: VariableSource::Template,
        });
    }
    Ok(prefixes.iter().find_map(|prefix| {
        name.strip_prefix(&format!("{prefix} "))
            .map(|rest| format!("{}, {prefix}", rest.trim()))
    }))
}
