//! Top-level section extraction from definition documents.

use indexmap::IndexMap;
use serde_yaml::Value;
use tracing::{error, warn};

use crate::utils::{is_truthy, value_to_string};

/// Singular form of a section name for messages (`collections` -> `collection`).
fn singular(attribute: &str) -> &str {
    attribute.strip_suffix('s').unwrap_or(attribute)
}

/// Read the `attribute` section of a document as named entries.
///
/// Names already in `check_list` are warned about and skipped, null entries
/// are skipped silently and non-mapping entries are skipped with a warning.
/// A section that is blank or not a mapping logs an error and yields nothing.
pub fn extract_section(attribute: &str, document: &Value, check_list: &[String]) -> IndexMap<String, Value> {
    let mut entries = IndexMap::new();
    let Some(section) = document.as_mapping().and_then(|doc| doc.get(attribute)) else {
        return entries;
    };
    if !is_truthy(section) {
        error!("Config Error: {attribute} attribute is blank");
        return entries;
    }
    let Some(section) = section.as_mapping() else {
        error!("Config Error: {attribute} must be a dictionary");
        return entries;
    };
    for (name, data) in section {
        let name = value_to_string(name);
        if check_list.contains(&name) {
            warn!("Config Warning: Skipping duplicate {}: {name}", singular(attribute));
        } else if data.is_null() {
            continue;
        } else if !data.is_mapping() {
            warn!("Config Warning: {}: {name} must be a dictionary", singular(attribute));
        } else {
            entries.insert(name, data.clone());
        }
    }
    entries
}
