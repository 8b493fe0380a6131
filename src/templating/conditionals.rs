//! Conditional variables.
//!
//! A conditional computes a variable from an ordered list of conditions.
//! Each condition is a mapping with a result `value` and predicates keyed by
//! variable name:
//!
//! ```yaml
//! conditionals:
//!   sort:
//!     default: title.asc
//!     conditions:
//!       - library_type: show
//!         collection_mode.exists: true
//!         value: year.desc
//!       - key_name.not: [Other, Unknown]
//!         value: rating.desc
//! ```
//!
//! The first condition whose predicates all pass wins. Without a winner the
//! conditional's `default` applies, and without a default the variable is
//! marked optional.

use indexmap::IndexMap;
use serde_yaml::Value;
use tracing::{debug, trace};

use super::VariableMap;
use super::error::TemplateError;
use super::placeholder::{replace_once, replace_str};
use crate::core::DataKind;
use crate::utils::parse::parse_bool;
use crate::utils::{encode, encoded_key, is_truthy, value_to_string};

/// One predicate of a condition.
#[derive(Debug, Clone, PartialEq)]
enum Predicate<'a> {
    /// `key.exists: bool`
    Exists(&'a str, bool),
    /// `key.not: value`
    Not(&'a str, &'a Value),
    /// `key: value`
    Is(&'a str, &'a Value),
}

impl<'a> Predicate<'a> {
    fn parse(key: &'a str, value: &'a Value) -> Self {
        if let Some(stripped) = key.strip_suffix(".exists") {
            Self::Exists(stripped, parse_bool(key, value).unwrap_or(false))
        } else if let Some(stripped) = key.strip_suffix(".not") {
            Self::Not(stripped, value)
        } else {
            Self::Is(key, value)
        }
    }

    fn passes(&self, variables: &VariableMap, defaults: &VariableMap) -> bool {
        let lookup = |name: &str| variables.get(name).or_else(|| defaults.get(name));
        match self {
            Self::Exists(name, expected) => {
                let exists = variables.get(*name).is_some_and(is_truthy);
                exists == *expected
            }
            Self::Not(name, expected) => lookup(*name).is_some_and(|actual| !matches_value(actual, expected)),
            Self::Is(name, expected) => lookup(*name).is_some_and(|actual| matches_value(actual, expected)),
        }
    }
}

/// Equality by string form, or membership when `expected` is a list.
fn matches_value(actual: &Value, expected: &Value) -> bool {
    let actual = value_to_string(actual);
    match expected {
        Value::Sequence(options) => options.iter().any(|option| value_to_string(option) == actual),
        other => value_to_string(other) == actual,
    }
}

/// Evaluate every conditional in declaration order.
///
/// Winners are written into `variables` with their `_encoded` twins; names
/// without a winner or default are appended to `optional`.
pub(crate) fn resolve_conditionals(
    data_type: DataKind,
    conditionals: &IndexMap<String, Value>,
    variables: &mut VariableMap,
    defaults: &VariableMap,
    optional: &mut Vec<String>,
) -> Result<(), TemplateError> {
    for (name, conditional) in conditionals {
        debug!("Conditional: {name}");
        let Some(conditional) = conditional.as_mapping() else {
            return Err(TemplateError::ConditionalNotADictionary {
                data_type,
                name: name.clone(),
            });
        };

        let final_name = replace_str(name, &[&*variables, defaults]);
        if final_name != *name {
            trace!("Variable: {final_name}");
        }
        if let Some(existing) = variables.get(&final_name) {
            debug!("Conditional Variable: {final_name} overwritten to \"{}\"", value_to_string(existing));
            continue;
        }

        let conditions = match conditional.get("conditions") {
            None => {
                return Err(TemplateError::MissingConditions {
                    data_type,
                    name: final_name,
                });
            }
            Some(Value::Mapping(single)) => vec![Value::Mapping(single.clone())],
            Some(Value::Sequence(list)) => list.clone(),
            Some(_) => {
                return Err(TemplateError::InvalidConditions {
                    data_type,
                    name: final_name,
                });
            }
        };

        let mut winner = None;
        for (i, condition) in conditions.iter().enumerate() {
            let Some(condition) = condition.as_mapping() else {
                return Err(TemplateError::ConditionNotADictionary {
                    data_type,
                    name: final_name,
                });
            };
            let Some(result) = condition.get("value") else {
                return Err(TemplateError::MissingConditionValue {
                    data_type,
                    name: final_name,
                });
            };

            let mut passed = true;
            for (key, expected) in condition {
                let key = value_to_string(key);
                if key == "value" {
                    continue;
                }
                let key = replace_str(&key, &[&*variables, defaults]);
                let expected = replace_once(expected, &[&*variables, defaults]);
                if !Predicate::parse(&key, &expected).passes(variables, defaults) {
                    trace!("Condition {} Failed: {key}: {}", i + 1, value_to_string(&expected));
                    passed = false;
                    break;
                }
            }
            if passed {
                winner = Some(replace_once(result, &[&*variables, defaults]));
                break;
            }
        }

        let resolved = match winner {
            Some(value) => Some(value),
            None => conditional.get("default").map(|value| replace_once(value, &[&*variables, defaults])),
        };
        match resolved {
            Some(value) => {
                debug!("Conditional Variable: {final_name} is \"{}\"", value_to_string(&value));
                variables.insert(encoded_key(&final_name), Value::String(encode(&value_to_string(&value))));
                variables.insert(final_name, value);
            }
            None => {
                debug!("Conditional Variable: {final_name} added as optional variable");
                optional.push(final_name.clone());
                optional.push(encoded_key(&final_name));
            }
        }
    }
    Ok(())
}
