//! Parsing one `dynamic_collections` entry.
//!
//! Most filtering and labelling attributes can also be supplied as
//! config-level template variables, which take precedence over the mapping
//! itself. `append_*` variables extend instead of replacing.

use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};
use tracing::warn;

use super::error::DynamicError;
use super::kinds::GeneratorKind;
use crate::core::LibraryType;
use crate::templating::VariableMap;
use crate::utils::AttributeMap;
use crate::utils::parse::{
    ParseError, parse_bool, parse_comma_list, parse_dict_dict, parse_dict_list_str, parse_str, parse_str_dict,
    parse_str_list,
};

/// Attributes a dynamic mapping understands.
pub const DYNAMIC_ATTRIBUTES: [&str; 19] = [
    "type",
    "data",
    "exclude",
    "addons",
    "template",
    "template_variables",
    "other_template",
    "remove_suffix",
    "remove_prefix",
    "title_format",
    "key_name_override",
    "title_override",
    "pre_format_override",
    "post_format_override",
    "custom_keys",
    "test",
    "sync",
    "include",
    "other_name",
];

/// Parent name used in messages for config-level values.
const CONFIG_PARENT: &str = "template_variable";

/// What the surrounding run can offer a generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Item type of the library
    pub library_type: LibraryType,
    /// Whether the newer metadata agent is in use
    pub new_agent: bool,
    /// Whether a metadata source is configured
    pub metadata: bool,
    /// Whether a ranked list source is configured
    pub ranked_lists: bool,
}

/// A validated dynamic mapping, before its key universe is built.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicMapping {
    /// Mapping name, also the label put on generated collections
    pub map_name: String,
    /// Generator kind
    pub kind: GeneratorKind,
    /// The mapping's attributes
    pub attributes: AttributeMap,
    /// Excludes as written (config `exclude` or the mapping's, plus `append_exclude`)
    pub og_exclude: Vec<String>,
    /// Excludes including every addon member
    pub exclude: Vec<String>,
    /// Allow-list of keys; empty means every key
    pub include: Vec<String>,
    /// Aggregate key to the keys it subsumes
    pub addons: IndexMap<String, Vec<String>>,
    /// Whether addon keys stand alone instead of exploding into members
    pub custom_keys: bool,
    /// Title format, when one was given
    pub title_format: Option<String>,
    /// Key to display name, applied before formatting
    pub key_name_override: IndexMap<String, String>,
    /// Key to literal collection title
    pub title_override: IndexMap<String, String>,
    /// Whether generated collections are marked as tests
    pub test: bool,
    /// Whether stale collections with this label are deleted
    pub sync: bool,
    /// Variable name to per-key values (`default` and `other` fallbacks)
    pub template_variables: IndexMap<String, IndexMap<String, Value>>,
    /// Templates to call per key; `None` uses the kind's default template
    pub templates: Option<Vec<String>>,
    /// Prefixes stripped from display names
    pub remove_prefix: Vec<String>,
    /// Suffixes stripped from display names
    pub remove_suffix: Vec<String>,
    /// Title of the aggregated collection of keys failing `include`
    pub other_name: Option<String>,
    /// Templates for the aggregated collection; `None` reuses `templates`
    pub other_templates: Option<Vec<String>>,
}

impl DynamicMapping {
    /// Validate and parse one mapping.
    pub fn parse(
        map_name: &str,
        raw: &Value,
        config: &VariableMap,
        capabilities: Capabilities,
    ) -> Result<Self, DynamicError> {
        let Some(raw) = raw.as_mapping() else {
            return Err(DynamicError::NotADictionary {
                map_name: map_name.to_string(),
            });
        };
        let mut attributes = AttributeMap::from_mapping(raw);
        warn_invalid_attributes(&attributes);

        let kind = parse_kind(map_name, &attributes, capabilities)?;
        let at_map = |e: ParseError| DynamicError::parse(map_name, e);
        let at_config = |e: ParseError| DynamicError::parse(CONFIG_PARENT, e);

        let mut og_exclude = match (config.get("exclude"), attributes.get("exclude")) {
            (Some(value), _) => parse_str_list("exclude", value).map_err(at_config)?,
            (None, Some(value)) => parse_str_list("exclude", value).map_err(at_map)?,
            (None, None) => Vec::new(),
        };
        if let Some(value) = config.get("append_exclude") {
            og_exclude.extend(parse_str_list("append_exclude", value).map_err(at_config)?);
        }

        let mut include = match (config.get("include"), attributes.get("include")) {
            (Some(value), _) => parse_str_list("include", value).map_err(at_config)?,
            (None, Some(value)) => parse_str_list("include", value)
                .map_err(at_map)?
                .into_iter()
                .filter(|i| !og_exclude.contains(i))
                .collect(),
            (None, None) => Vec::new(),
        };
        if let Some(value) = config.get("append_include") {
            include.extend(parse_str_list("append_include", value).map_err(at_config)?);
        }

        let mut addons = match (config.get("addons"), attributes.get("addons")) {
            (Some(value), _) => parse_dict_list_str("addons", value).map_err(at_config)?,
            (None, Some(value)) => parse_dict_list_str("addons", value).map_err(at_map)?,
            (None, None) => IndexMap::new(),
        };
        if let Some(value) = config.get("append_addons") {
            for (key, members) in parse_dict_list_str("append_addons", value).map_err(at_config)? {
                addons.entry(key).or_default().extend(members);
            }
        }

        let mut exclude = og_exclude.clone();
        for (key, members) in &mut addons {
            if members.contains(key) {
                warn!("Config Warning: {key} cannot be an addon for itself");
                members.retain(|member| member != key);
            }
            for member in members.iter() {
                if !exclude.contains(member) {
                    exclude.push(member.clone());
                }
            }
        }

        let custom_keys = match (config.get("custom_keys"), attributes.get("custom_keys")) {
            (Some(value), _) => parse_bool("custom_keys", value).unwrap_or(true),
            (None, Some(value)) => parse_bool("custom_keys", value).unwrap_or(true),
            (None, None) => true,
        };

        let title_format = match (config.get("title_format"), attributes.get("title_format")) {
            (Some(value), _) => parse_str("title_format", value).ok(),
            (None, Some(value)) => parse_str("title_format", value).ok(),
            (None, None) => None,
        };

        attributes.alias("post_format_override", "title_override");
        attributes.alias("pre_format_override", "key_name_override");
        let title_override = match attributes.get("title_override") {
            Some(value) => parse_str_dict("title_override", value).map_err(at_map)?,
            None => IndexMap::new(),
        };
        let mut key_name_override = match attributes.get("key_name_override") {
            Some(value) => parse_str_dict("key_name_override", value).map_err(at_map)?,
            None => IndexMap::new(),
        };
        let mut seen: Vec<String> = Vec::new();
        key_name_override.retain(|key, name| {
            if seen.contains(name) {
                warn!("Config Warning: {name} can only be used once skipping {key}: {name}");
                false
            } else {
                seen.push(name.clone());
                true
            }
        });

        let test = match attributes.get("test") {
            Some(value) => parse_bool("test", value).unwrap_or(false),
            None => false,
        };
        let sync = match attributes.get("sync") {
            Some(value) => parse_bool("sync", value).unwrap_or(false),
            None => false,
        };

        let template_variables = match attributes.get("template_variables") {
            Some(value) => parse_dict_dict("template_variables", value).map_err(at_map)?,
            None => IndexMap::new(),
        };
        let templates = match attributes.get("template") {
            Some(value) => Some(parse_str_list("template", value).map_err(at_map)?),
            None => None,
        };

        let remove_prefix = match (config.get("remove_prefix"), attributes.get("remove_prefix")) {
            (Some(value), _) => parse_comma_list("remove_prefix", value).map_err(at_config)?,
            (None, Some(value)) => parse_comma_list("remove_prefix", value).map_err(at_map)?,
            (None, None) => Vec::new(),
        };
        let remove_suffix = match (config.get("remove_suffix"), attributes.get("remove_suffix")) {
            (Some(value), _) => parse_comma_list("remove_suffix", value).map_err(at_config)?,
            (None, Some(value)) => parse_comma_list("remove_suffix", value).map_err(at_map)?,
            (None, None) => Vec::new(),
        };

        let other_name = if include.is_empty() {
            None
        } else {
            match (config.get("other_name"), attributes.get("other_name")) {
                (Some(value), _) => Some(parse_str("other_name", value).map_err(at_config)?),
                (None, Some(value)) => Some(parse_str("other_name", value).map_err(at_map)?),
                (None, None) => None,
            }
        };
        let other_templates = match attributes.get("other_template") {
            Some(value) if !include.is_empty() => Some(parse_str_list("other_template", value).map_err(at_map)?),
            _ => None,
        };

        Ok(Self {
            map_name: map_name.to_string(),
            kind,
            attributes,
            og_exclude,
            exclude,
            include,
            addons,
            custom_keys,
            title_format,
            key_name_override,
            title_override,
            test,
            sync,
            template_variables,
            templates,
            remove_prefix,
            remove_suffix,
            other_name,
            other_templates,
        })
    }

    /// The mapping's `data`, with config-level `data` taking precedence.
    ///
    /// The mapping itself must declare `data` even when config overrides it.
    pub fn data<'a>(&'a self, config: &'a VariableMap, allow_config: bool) -> Result<&'a Value, DynamicError> {
        let Some(own) = self.attributes.get("data") else {
            return Err(DynamicError::MissingData {
                map_name: self.map_name.clone(),
            });
        };
        match config.get("data") {
            Some(value) if allow_config => Ok(value),
            _ => Ok(own),
        }
    }

    /// Display name for a key: override, else the label with prefixes and
    /// suffixes stripped.
    pub fn key_name(&self, key: &str, label: &str) -> String {
        if let Some(name) = self.key_name_override.get(key) {
            return name.clone();
        }
        let mut key_name = label.to_string();
        for prefix in &self.remove_prefix {
            if let Some(rest) = key_name.strip_prefix(prefix.as_str()) {
                key_name = rest.trim().to_string();
            }
        }
        for suffix in &self.remove_suffix {
            if let Some(rest) = key_name.strip_suffix(suffix.as_str()) {
                key_name = rest.trim().to_string();
            }
        }
        key_name
    }

    /// Whether any excluded name matches one of `candidates`.
    pub fn is_excluded<S: AsRef<str>>(&self, candidates: &[S]) -> bool {
        candidates.iter().any(|c| self.exclude.iter().any(|e| e == c.as_ref()))
    }
}

fn warn_invalid_attributes(attributes: &AttributeMap) {
    for name in attributes.names() {
        if !DYNAMIC_ATTRIBUTES.contains(&name) {
            warn!(
                "Config Warning: {} attribute is invalid. Options: {}",
                attributes.original(name).unwrap_or(name),
                DYNAMIC_ATTRIBUTES.join(", ")
            );
        }
    }
}

fn parse_kind(
    map_name: &str,
    attributes: &AttributeMap,
    capabilities: Capabilities,
) -> Result<GeneratorKind, DynamicError> {
    let Some(raw) = attributes.get("type") else {
        return Err(DynamicError::MissingType {
            map_name: map_name.to_string(),
        });
    };
    let requested = crate::utils::value_to_string(raw);
    if requested.is_empty() {
        return Err(DynamicError::BlankType {
            map_name: map_name.to_string(),
        });
    }
    let allowed = GeneratorKind::allowed_for(capabilities.library_type);
    let invalid = |kind: String| DynamicError::InvalidType {
        map_name: map_name.to_string(),
        kind,
        options: GeneratorKind::join(&allowed),
    };
    let kind: GeneratorKind = requested.parse().map_err(invalid)?;
    if !allowed.contains(&kind) {
        return Err(invalid(kind.as_str().to_string()));
    }
    if kind == GeneratorKind::Network && !capabilities.new_agent {
        return Err(DynamicError::NetworkNeedsNewAgent {
            map_name: map_name.to_string(),
        });
    }
    if kind.needs_ranked_lists() && !capabilities.ranked_lists {
        return Err(DynamicError::RankedListsUnavailable {
            map_name: map_name.to_string(),
            kind: kind.as_str().to_string(),
        });
    }
    if kind.needs_metadata() && !capabilities.metadata {
        return Err(DynamicError::MetadataUnavailable {
            map_name: map_name.to_string(),
            kind: kind.as_str().to_string(),
        });
    }
    Ok(kind)
}

/// Mapping with one `name` entry per template, sharing the call-site variables.
pub fn template_calls(names: &[String], call: &Mapping) -> Value {
    Value::Sequence(
        names
            .iter()
            .map(|name| {
                let mut entry = call.clone();
                entry.insert(Value::from("name"), Value::from(name.as_str()));
                Value::Mapping(entry)
            })
            .collect(),
    )
}
