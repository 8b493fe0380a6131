//! Shared helpers for loosely typed definition data
//!
//! Definition files are user-authored YAML, so almost every layer needs the same
//! handful of conversions: the display form of a value, truthiness,
//! splitting "a, b" strings into lists, and URL encoding for `_encoded` twins.
//!
//! # Modules
//!
//! - [`attributes`] - Case-insensitive view over definition blocks
//! - [`parse`] - Typed attribute parsers that turn raw values into validated settings
//! - [`progress`] - Progress bars for long-running library scans

pub mod attributes;
pub mod parse;
pub mod progress;

pub use attributes::AttributeMap;
pub use progress::ProgressBar;

use serde_yaml::Value;

/// Render a value the way it appears when embedded in text.
///
/// Strings are returned verbatim, numbers and booleans use their literal
/// spelling, null renders empty, sequences and mappings are comma-space
/// joined.
///
/// ```rust
/// use meta_templater::utils::value_to_string;
/// use serde_yaml::Value;
///
/// assert_eq!(value_to_string(&Value::from(1994)), "1994");
/// let list = Value::Sequence(vec![Value::from("a"), Value::from(2)]);
/// assert_eq!(value_to_string(&list), "a, 2");
/// ```
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Sequence(seq) => seq.iter().map(value_to_string).collect::<Vec<_>>().join(", "),
        Value::Mapping(map) => map
            .iter()
            .map(|(k, v)| format!("{}: {}", value_to_string(k), value_to_string(v)))
            .collect::<Vec<_>>()
            .join(", "),
        Value::Tagged(tagged) => value_to_string(&tagged.value),
    }
}

/// Truthiness of a value: empty strings, zero, false, null and empty
/// containers are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Sequence(seq) => !seq.is_empty(),
        Value::Mapping(map) => !map.is_empty(),
        Value::Tagged(tagged) => is_truthy(&tagged.value),
    }
}

/// Normalize a value into a list.
///
/// Sequences are returned as-is, null becomes empty, and with `split` a
/// string is split on commas with surrounding whitespace trimmed.
pub fn get_list(value: &Value, split: bool) -> Vec<Value> {
    match value {
        Value::Null => Vec::new(),
        Value::Sequence(seq) => seq.clone(),
        Value::String(s) if split => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Value::String(s.to_string()))
            .collect(),
        other => vec![other.clone()],
    }
}

/// [`get_list`] followed by [`value_to_string`] on every element.
pub fn get_str_list(value: &Value, split: bool) -> Vec<String> {
    get_list(value, split).iter().map(value_to_string).collect()
}

/// Percent-encode text for use inside URLs.
///
/// Unreserved characters and `/` are left as-is, everything else is encoded,
/// so `"a b"` becomes `"a%20b"`.
pub fn encode(text: &str) -> String {
    urlencoding::encode(text).replace("%2F", "/")
}

/// The `<<name>>` marker for a variable.
pub fn placeholder(name: &str) -> String {
    format!("<<{name}>>")
}

/// Key of the `_encoded` twin of a variable.
pub fn encoded_key(name: &str) -> String {
    format!("{name}_encoded")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_to_string_scalars() {
        assert_eq!(value_to_string(&Value::from("Action")), "Action");
        assert_eq!(value_to_string(&Value::from(true)), "true");
        assert_eq!(value_to_string(&Value::Null), "");
        assert_eq!(value_to_string(&Value::from(2.5)), "2.5");
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&Value::from("")));
        assert!(!is_truthy(&Value::from(0)));
        assert!(!is_truthy(&Value::Sequence(vec![])));
        assert!(is_truthy(&Value::from("x")));
        assert!(is_truthy(&Value::from(3)));
    }

    #[test]
    fn test_get_list_splits_strings() {
        let list = get_str_list(&Value::from("The, A ,An"), true);
        assert_eq!(list, vec!["The", "A", "An"]);

        let unsplit = get_str_list(&Value::from("The, A"), false);
        assert_eq!(unsplit, vec!["The, A"]);
    }

    #[test]
    fn test_encode_matches_url_quoting() {
        assert_eq!(encode("a b"), "a%20b");
        assert_eq!(encode("sci-fi/fantasy"), "sci-fi/fantasy");
        assert_eq!(encode("R&B"), "R%26B");
    }
}
