//! Typed parsers for definition attributes.
//!
//! Each parser takes the attribute name (used in messages) and the raw value,
//! and either returns the typed value or a [`ParseError`] naming the attribute.

use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};
use thiserror::Error;

use super::{get_list, get_str_list, value_to_string};

/// Failure to interpret a raw attribute value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The attribute is present but empty
    #[error("{attribute} attribute is blank")]
    Blank {
        /// Attribute name
        attribute: String,
    },

    /// The attribute has the wrong shape
    #[error("{attribute} attribute must be {expected}, got: {value}")]
    WrongType {
        /// Attribute name
        attribute: String,
        /// Human description of the expected shape
        expected: &'static str,
        /// Display form of the offending value
        value: String,
    },

    /// The attribute is an integer below the allowed minimum
    #[error("{attribute} attribute must be an integer greater than or equal to {minimum}, got: {value}")]
    BelowMinimum {
        /// Attribute name
        attribute: String,
        /// Smallest accepted value
        minimum: i64,
        /// The value that was supplied
        value: i64,
    },
}

fn wrong_type(attribute: &str, expected: &'static str, value: &Value) -> ParseError {
    ParseError::WrongType {
        attribute: attribute.to_string(),
        expected,
        value: value_to_string(value),
    }
}

fn blank(attribute: &str) -> ParseError {
    ParseError::Blank {
        attribute: attribute.to_string(),
    }
}

/// Parse a boolean; accepts YAML booleans and the strings `true`/`false`.
pub fn parse_bool(attribute: &str, value: &Value) -> Result<bool, ParseError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(false),
        Value::Null => Err(blank(attribute)),
        other => Err(wrong_type(attribute, "true or false", other)),
    }
}

/// Parse an integer (number or numeric string) no smaller than `minimum`.
pub fn parse_int(attribute: &str, value: &Value, minimum: i64) -> Result<i64, ParseError> {
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Null => return Err(blank(attribute)),
        _ => None,
    };
    let parsed = parsed.ok_or_else(|| wrong_type(attribute, "an integer", value))?;
    if parsed < minimum {
        return Err(ParseError::BelowMinimum {
            attribute: attribute.to_string(),
            minimum,
            value: parsed,
        });
    }
    Ok(parsed)
}

/// Parse a non-blank string.
pub fn parse_str(attribute: &str, value: &Value) -> Result<String, ParseError> {
    match value {
        Value::Null => Err(blank(attribute)),
        Value::Sequence(_) | Value::Mapping(_) => Err(wrong_type(attribute, "a string", value)),
        other => {
            let text = value_to_string(other);
            if text.is_empty() {
                Err(blank(attribute))
            } else {
                Ok(text)
            }
        }
    }
}

/// Parse a list of strings; a scalar becomes a one-element list.
pub fn parse_str_list(attribute: &str, value: &Value) -> Result<Vec<String>, ParseError> {
    if value.is_null() {
        return Err(blank(attribute));
    }
    if value.is_mapping() {
        return Err(wrong_type(attribute, "a list", value));
    }
    Ok(get_str_list(value, false))
}

/// Parse a list of strings where plain strings are split on commas.
pub fn parse_comma_list(attribute: &str, value: &Value) -> Result<Vec<String>, ParseError> {
    if value.is_null() {
        return Err(blank(attribute));
    }
    if value.is_mapping() {
        return Err(wrong_type(attribute, "a list", value));
    }
    Ok(get_str_list(value, true))
}

/// Parse a mapping.
pub fn parse_dict(attribute: &str, value: &Value) -> Result<Mapping, ParseError> {
    match value {
        Value::Mapping(map) if map.is_empty() => Err(blank(attribute)),
        Value::Mapping(map) => Ok(map.clone()),
        Value::Null => Err(blank(attribute)),
        other => Err(wrong_type(attribute, "a dictionary", other)),
    }
}

/// Parse a mapping of strings to strings.
pub fn parse_str_dict(attribute: &str, value: &Value) -> Result<IndexMap<String, String>, ParseError> {
    Ok(parse_dict(attribute, value)?
        .iter()
        .map(|(k, v)| (value_to_string(k), value_to_string(v)))
        .collect())
}

/// Parse a mapping of strings to string lists (`key: [a, b]` or `key: "a, b"`).
pub fn parse_dict_list_str(
    attribute: &str,
    value: &Value,
) -> Result<IndexMap<String, Vec<String>>, ParseError> {
    Ok(parse_dict(attribute, value)?
        .iter()
        .map(|(k, v)| (value_to_string(k), get_list(v, true).iter().map(value_to_string).collect()))
        .collect())
}

/// Parse a mapping of mappings (`variable: {key: value}`).
pub fn parse_dict_dict(
    attribute: &str,
    value: &Value,
) -> Result<IndexMap<String, IndexMap<String, Value>>, ParseError> {
    let outer = parse_dict(attribute, value)?;
    let mut result = IndexMap::new();
    for (k, v) in &outer {
        let name = value_to_string(k);
        let inner = match v {
            Value::Mapping(map) => {
                map.iter().map(|(ik, iv)| (value_to_string(ik), iv.clone())).collect()
            }
            other => return Err(wrong_type(&format!("{attribute} {name}"), "a dictionary", other)),
        };
        result.insert(name, inner);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int_accepts_numeric_strings() {
        assert_eq!(parse_int("depth", &Value::from("5"), 1), Ok(5));
        assert_eq!(parse_int("depth", &Value::from(3), 1), Ok(3));
    }

    #[test]
    fn test_parse_int_enforces_minimum() {
        let err = parse_int("increment", &Value::from(0), 1).unwrap_err();
        assert!(matches!(err, ParseError::BelowMinimum { minimum: 1, value: 0, .. }));
        assert!(parse_int("increment", &Value::from("abc"), 1).is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("sync", &Value::from("True")), Ok(true));
        assert_eq!(parse_bool("sync", &Value::from(false)), Ok(false));
        assert!(parse_bool("sync", &Value::from(7)).is_err());
    }

    #[test]
    fn test_parse_dict_list_str_splits_strings() {
        let value: Value = serde_yaml::from_str("Horror: Slasher, Zombie\nDrama: [Crime]").unwrap();
        let addons = parse_dict_list_str("addons", &value).unwrap();
        assert_eq!(addons["Horror"], vec!["Slasher", "Zombie"]);
        assert_eq!(addons["Drama"], vec!["Crime"]);
    }

    #[test]
    fn test_parse_dict_rejects_scalars() {
        let err = parse_dict("data", &Value::from("x")).unwrap_err();
        assert_eq!(err.to_string(), "data attribute must be a dictionary, got: x");
    }
}
