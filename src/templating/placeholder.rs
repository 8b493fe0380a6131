//! `<<name>>` placeholder substitution.
//!
//! Substitution rewrites a value tree against a ranked list of variable
//! layers (variables, then translations, then defaults). A string that is
//! exactly `<<name>>` takes the variable's value with its original type; a
//! marker embedded in longer text is replaced by the value's string form.
//! Each scalar is rescanned up to [`MAX_SUBSTITUTION_PASSES`] times so values
//! that themselves contain markers get expanded.
//!
//! Optional variables that are still unresolved make the enclosing key or
//! list element disappear. That is reported as [`Substituted::Dropped`]
//! rather than an error, and a container emptied by drops is dropped too.

use std::sync::LazyLock;

use regex::Regex;
use serde_yaml::{Mapping, Value};

use super::VariableMap;
use crate::utils::{placeholder, value_to_string};

/// Upper bound on rescans of a single scalar.
///
/// Placeholder chains deeper than this are left partially resolved without
/// an error.
pub const MAX_SUBSTITUTION_PASSES: usize = 8;

/// Variable never substituted while resolving attributes; it holds the
/// template name of the call.
const RESERVED_VARIABLE: &str = "name";

/// Attributes whose values must not contain commas from the definition name.
const COMMA_FREE_ATTRIBUTES: [&str; 4] = ["radarr_tag", "item_radarr_tag", "sonarr_tag", "item_sonarr_tag"];

/// Name variables stripped of commas inside [`COMMA_FREE_ATTRIBUTES`].
const COMMA_FREE_VARIABLES: [&str; 2] = ["collection_name", "playlist_name"];

/// Outcome of substituting one fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum Substituted<T> {
    /// The fragment survives with this value
    Kept(T),
    /// The fragment referenced an unresolved optional variable
    Dropped,
}

impl<T> Substituted<T> {
    /// The kept value, if any.
    pub fn kept(self) -> Option<T> {
        match self {
            Self::Kept(value) => Some(value),
            Self::Dropped => None,
        }
    }

    /// Whether the fragment was dropped.
    pub const fn is_dropped(&self) -> bool {
        matches!(self, Self::Dropped)
    }
}

/// A configured substitution: ranked layers plus optional names.
#[derive(Debug, Clone)]
pub struct Substitution<'a> {
    layers: Vec<&'a VariableMap>,
    optional: &'a [String],
}

impl<'a> Substitution<'a> {
    /// Substitute against `layers`, earlier layers first.
    pub fn new(layers: Vec<&'a VariableMap>) -> Self {
        Self {
            layers,
            optional: &[],
        }
    }

    /// Names whose unresolved markers drop the fragment instead of staying.
    pub fn with_optional(mut self, optional: &'a [String]) -> Self {
        self.optional = optional;
        self
    }

    fn is_defined(&self, name: &str) -> bool {
        self.layers.iter().any(|layer| layer.contains_key(name))
    }

    /// Substitute a whole tree.
    ///
    /// `attribute` is the resolved name of the top-level attribute being
    /// processed; a few attributes adjust how name variables are rendered.
    pub fn substitute(&self, attribute: &str, data: &Value) -> Substituted<Value> {
        match data {
            Value::Mapping(map) if !map.is_empty() => {
                let mut out = Mapping::new();
                for (key, value) in map {
                    let Substituted::Kept(key) = self.substitute_scalar(attribute, key.clone()) else {
                        continue;
                    };
                    let Substituted::Kept(value) = self.substitute(attribute, value) else {
                        continue;
                    };
                    out.insert(key, value);
                }
                if out.is_empty() {
                    Substituted::Dropped
                } else {
                    Substituted::Kept(Value::Mapping(out))
                }
            }
            Value::Sequence(seq) if !seq.is_empty() => {
                let out: Vec<Value> =
                    seq.iter().filter_map(|item| self.substitute(attribute, item).kept()).collect();
                if out.is_empty() {
                    Substituted::Dropped
                } else {
                    Substituted::Kept(Value::Sequence(out))
                }
            }
            other => self.substitute_scalar(attribute, other.clone()),
        }
    }

    /// Substitute a single scalar (or mapping key) to a bounded fixed point.
    pub fn substitute_scalar(&self, attribute: &str, mut data: Value) -> Substituted<Value> {
        let strip_commas = COMMA_FREE_ATTRIBUTES.contains(&attribute);
        for _ in 0..MAX_SUBSTITUTION_PASSES {
            if self.holds_unresolved_optional(&data) {
                return Substituted::Dropped;
            }
            if !data.is_string() {
                break;
            }

            let before = data.clone();
            for layer in &self.layers {
                for (name, value) in layer.iter() {
                    if name == RESERVED_VARIABLE {
                        continue;
                    }
                    data = if strip_commas && COMMA_FREE_VARIABLES.contains(&name.as_str()) {
                        let stripped = Value::String(value_to_string(value).replace(',', ""));
                        scan_text(data, name, &stripped)
                    } else {
                        scan_text(data, name, value)
                    };
                }
            }
            if data == before {
                break;
            }
        }
        if self.holds_unresolved_optional(&data) {
            return Substituted::Dropped;
        }
        Substituted::Kept(data)
    }

    /// Whether the string form of `data` still names an undefined optional
    /// variable. Exact replacements can leave the marker inside a list.
    fn holds_unresolved_optional(&self, data: &Value) -> bool {
        if self.optional.is_empty() {
            return false;
        }
        let text = value_to_string(data);
        self.optional
            .iter()
            .any(|name| !self.is_defined(name) && text.contains(&placeholder(name)))
    }
}

/// Replace one variable's marker inside `data`.
fn scan_text(data: Value, name: &str, value: &Value) -> Value {
    let Value::String(text) = &data else {
        return data;
    };
    let marker = placeholder(name);
    if *text == marker {
        value.clone()
    } else if text.contains(&marker) {
        Value::String(text.replace(&marker, &value_to_string(value)))
    } else {
        data
    }
}

/// Single-pass replacement used while resolving variables themselves.
///
/// Every layer is applied once in order. Containers are walked so only their
/// string leaves change.
pub fn replace_once(data: &Value, layers: &[&VariableMap]) -> Value {
    match data {
        Value::Sequence(seq) => Value::Sequence(seq.iter().map(|v| replace_once(v, layers)).collect()),
        Value::Mapping(map) => Value::Mapping(
            map.iter().map(|(k, v)| (replace_once(k, layers), replace_once(v, layers))).collect(),
        ),
        scalar => {
            let mut out = scalar.clone();
            for layer in layers {
                for (name, value) in layer.iter() {
                    out = scan_text(out, name, value);
                }
            }
            out
        }
    }
}

/// [`replace_once`] on a string, returning the string form of the result.
pub fn replace_str(text: &str, layers: &[&VariableMap]) -> String {
    value_to_string(&replace_once(&Value::String(text.to_string()), layers))
}

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<<([^<>]+)>>").expect("placeholder pattern is valid"));

/// Names of every `<<name>>` marker left anywhere in a tree.
pub fn unresolved_placeholders(data: &Value) -> Vec<String> {
    let mut found = Vec::new();
    collect_placeholders(&PLACEHOLDER_RE, data, &mut found);
    found
}

fn collect_placeholders(re: &Regex, data: &Value, found: &mut Vec<String>) {
    match data {
        Value::String(text) => {
            for cap in re.captures_iter(text) {
                let name = cap[1].to_string();
                if !found.contains(&name) {
                    found.push(name);
                }
            }
        }
        Value::Sequence(seq) => seq.iter().for_each(|v| collect_placeholders(re, v, found)),
        Value::Mapping(map) => map.iter().for_each(|(k, v)| {
            collect_placeholders(re, k, found);
            collect_placeholders(re, v, found);
        }),
        Value::Tagged(tagged) => collect_placeholders(re, &tagged.value, found),
        _ => {}
    }
}
