//! Key universes for each generator kind.
//!
//! A universe is two ordered maps of key to label: `all_keys`, every key the
//! kind knows about, and `auto_list`, the keys that survive the exclude
//! filter. Show decades additionally produce their own addon table.

use chrono::{Datelike, Local};
use indexmap::IndexMap;
use tracing::{debug, error, warn};

use super::error::DynamicError;
use super::kinds::GeneratorKind;
use super::mapping::DynamicMapping;
use crate::library::{Library, LibraryItem, MetadataProvider, PersonRole, RankedListProvider};
use crate::templating::VariableMap;
use crate::utils::AttributeMap;
use crate::utils::parse::{ParseError, parse_dict, parse_int, parse_str_dict, parse_str_list};
use crate::utils::progress::progress_iterator;
use crate::utils::value_to_string;

/// Collaborators a generator may consult.
#[derive(Clone, Copy)]
pub struct Sources<'a> {
    /// The library being generated for
    pub library: &'a dyn Library,
    /// Per-item metadata lookups, when configured
    pub metadata: Option<&'a dyn MetadataProvider>,
    /// Ranked lists, when configured
    pub ranked_lists: Option<&'a dyn RankedListProvider>,
    /// Whether scans draw progress bars
    pub progress: bool,
}

/// Candidate keys of one dynamic mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Universe {
    /// Every known key and its label
    pub all_keys: IndexMap<String, String>,
    /// Keys surviving the exclude filter
    pub auto_list: IndexMap<String, String>,
    /// Addons computed by the generator, replacing the mapping's own
    pub addons: Option<IndexMap<String, Vec<String>>>,
}

impl Universe {
    fn insert(&mut self, key: String, label: String, excluded: bool) {
        if !excluded {
            self.auto_list.insert(key.clone(), label.clone());
        }
        self.all_keys.insert(key, label);
    }
}

/// Build the universe for a mapping, including config-level `append_data`.
pub fn build_universe(
    mapping: &DynamicMapping,
    config: &VariableMap,
    sources: &Sources<'_>,
) -> Result<Universe, DynamicError> {
    let library_type = sources.library.info().library_type;
    let mut universe = match mapping.kind {
        GeneratorKind::Decade if library_type.is_show() => show_decades(mapping, sources)?,
        kind if kind.is_tag() => tags(mapping, sources)?,
        GeneratorKind::TmdbCollection | GeneratorKind::OriginalLanguage | GeneratorKind::OriginCountry => {
            metadata_scan(mapping, sources)?
        }
        GeneratorKind::Number => numbers(mapping, config)?,
        GeneratorKind::Custom => {
            let data = mapping.data(config, false)?;
            let pairs = parse_str_dict("data", data).map_err(|e| DynamicError::parse(&mapping.map_name, e))?;
            let mut universe = Universe::default();
            for (key, label) in pairs {
                let excluded = mapping.is_excluded(&[&key, &label]);
                universe.insert(key, label, excluded);
            }
            universe
        }
        kind => match kind.person_role() {
            Some(role) => people(mapping, config, role, sources)?,
            None => ranked_lists(mapping, config, sources)?,
        },
    };

    if let Some(value) = config.get("append_data") {
        let pairs = parse_str_dict("append_data", value).map_err(|e| DynamicError::parse(&mapping.map_name, e))?;
        for (key, label) in pairs {
            let excluded = mapping.is_excluded(&[&key, &label]);
            universe.insert(key, label, excluded);
        }
    }
    Ok(universe)
}

fn all_items(sources: &Sources<'_>) -> Result<Vec<LibraryItem>, DynamicError> {
    sources.library.get_all_items().map_err(|e| DynamicError::collaborator("Library Error", &e))
}

fn show_decades(mapping: &DynamicMapping, sources: &Sources<'_>) -> Result<Universe, DynamicError> {
    if !mapping.addons.is_empty() {
        return Err(DynamicError::ShowDecadeAddons);
    }
    let items = all_items(sources)?;
    let mut universe = Universe::default();
    let mut addons: IndexMap<String, Vec<String>> = IndexMap::new();
    for item in progress_iterator(&items, "Processing", sources.progress, |i| i.title.clone()) {
        let Some(year) = item.year.filter(|y| *y != 0) else {
            continue;
        };
        let decade = (year.div_euclid(10) * 10).to_string();
        let years = addons.entry(decade).or_default();
        let year = year.to_string();
        if !years.contains(&year) {
            years.push(year.clone());
            universe.all_keys.insert(year.clone(), year);
        }
    }
    for decade in addons.keys() {
        let label = format!("{decade}s");
        if !mapping.is_excluded(&[decade, &label]) {
            universe.auto_list.insert(decade.clone(), label);
        }
    }
    universe.addons = Some(addons);
    Ok(universe)
}

fn tags(mapping: &DynamicMapping, sources: &Sources<'_>) -> Result<Universe, DynamicError> {
    let field = mapping.kind.search_tag(sources.library.info().library_type);
    let tags = sources
        .library
        .get_tags(&field)
        .map_err(|e| DynamicError::collaborator(format!("Library Error: {field}"), &e))?;
    let mut universe = Universe::default();
    for tag in tags {
        match mapping.kind {
            GeneratorKind::SubtitleLanguage | GeneratorKind::AudioLanguage => {
                let name = sources
                    .metadata
                    .and_then(|metadata| metadata.language_name(&tag.key))
                    .unwrap_or_else(|| tag.title.clone());
                let excluded = mapping.is_excluded(&[&name, &tag.title, &tag.key]);
                universe.insert(tag.key, name, excluded);
            }
            GeneratorKind::Resolution | GeneratorKind::Decade => {
                let excluded = mapping.is_excluded(&[&tag.title, &tag.key]);
                universe.insert(tag.key, tag.title, excluded);
            }
            _ => {
                let excluded = mapping.is_excluded(&[&tag.title]);
                universe.insert(tag.title.clone(), tag.title, excluded);
            }
        }
    }
    Ok(universe)
}

fn metadata_scan(mapping: &DynamicMapping, sources: &Sources<'_>) -> Result<Universe, DynamicError> {
    let Some(metadata) = sources.metadata else {
        return Err(DynamicError::MetadataUnavailable {
            map_name: mapping.map_name.clone(),
            kind: mapping.kind.as_str().to_string(),
        });
    };
    let is_movie = mapping.kind == GeneratorKind::TmdbCollection || sources.library.info().library_type.is_movie();
    let items = all_items(sources)?;
    let mut universe = Universe::default();
    for item in progress_iterator(&items, "Processing", sources.progress, |i| i.title.clone()) {
        let ids = match sources.library.get_ids(item) {
            Ok(ids) => ids,
            Err(e) => {
                error!("Library Error: {e:#}");
                continue;
            }
        };
        let found = match metadata.get_item(item, &ids, is_movie) {
            Ok(Some(found)) => found,
            Ok(None) => {
                debug!("No metadata found for {}", item.title);
                continue;
            }
            Err(e) => {
                error!("Metadata Error: {e:#}");
                continue;
            }
        };
        match mapping.kind {
            GeneratorKind::TmdbCollection => {
                let id = found.collection_id.filter(|id| *id != 0);
                let name = found.collection_name.filter(|name| !name.is_empty());
                if let (Some(id), Some(name)) = (id, name) {
                    let id = id.to_string();
                    let excluded = mapping.is_excluded(&[&id, &name]);
                    universe.insert(id, name, excluded);
                }
            }
            GeneratorKind::OriginalLanguage => {
                if let Some(iso) = found.language_iso.filter(|iso| !iso.is_empty()) {
                    let name = found.language_name.unwrap_or_default();
                    let excluded = mapping.is_excluded(&[&iso, &name]);
                    universe.insert(iso, name, excluded);
                }
            }
            _ => {
                for country in found.countries {
                    let iso = country.iso_3166_1.to_lowercase();
                    let excluded = mapping.is_excluded(&[&iso, &country.name]);
                    universe.insert(iso, country.name, excluded);
                }
            }
        }
    }
    Ok(universe)
}

/// Integer setting of a `data` block; invalid values fall back to the
/// default with a warning.
fn data_int(parent: &str, data: &AttributeMap, attribute: &str, default: i64, minimum: i64) -> i64 {
    match data.get(attribute) {
        Some(value) => parse_int(attribute, value, minimum).unwrap_or_else(|e| {
            warn!("Config Warning: {parent} {e} using {default} as default");
            default
        }),
        None => default,
    }
}

fn data_block(mapping: &DynamicMapping, config: &VariableMap) -> Result<AttributeMap, DynamicError> {
    let data = mapping.data(config, true)?;
    let data = parse_dict("data", data).map_err(|e| DynamicError::parse(&mapping.map_name, e))?;
    Ok(AttributeMap::from_mapping(&data))
}

fn people(
    mapping: &DynamicMapping,
    config: &VariableMap,
    role: PersonRole,
    sources: &Sources<'_>,
) -> Result<Universe, DynamicError> {
    let mut data = data_block(mapping, config)?;
    data.alias("actor_depth", "depth");
    data.alias("actor_minimum", "minimum");
    data.alias("number_of_actors", "limit");
    let parent = format!("{} data", mapping.map_name);
    let depth = data_int(&parent, &data, "depth", 3, 1) as usize;
    let minimum = data.contains("minimum").then(|| data_int(&parent, &data, "minimum", 3, 1) as usize);
    let limit = data.contains("limit").then(|| data_int(&parent, &data, "limit", 25, 1) as usize);

    let items = all_items(sources)?;
    let mut counts: IndexMap<String, (String, usize)> = IndexMap::new();
    for item in progress_iterator(&items, "Scanning", sources.progress, |i| i.title.clone()) {
        match sources.library.reload(item) {
            Ok(item) => {
                for person in item.people(role).iter().take(depth) {
                    counts.entry(person.id.clone()).or_insert_with(|| (person.tag.clone(), 0)).1 += 1;
                }
            }
            Err(e) => error!("Library Error: {e:#}"),
        }
    }

    let mut roles: Vec<(String, usize)> = counts.into_values().collect();
    roles.sort_by(|a, b| b.1.cmp(&a.1));
    let minimum = minimum.unwrap_or(if limit.is_some() { 1 } else { 3 });
    let limit = limit.unwrap_or(roles.len());

    let mut universe = Universe::default();
    for (name, count) in roles {
        if universe.auto_list.len() >= limit {
            break;
        }
        if count >= minimum && !mapping.is_excluded(&[&name]) {
            universe.insert(name.clone(), name, false);
        }
    }
    Ok(universe)
}

/// `current_year` or `current_year-N`, else an integer.
fn range_bound(
    mapping: &DynamicMapping,
    data: &AttributeMap,
    attribute: &str,
    minimum: i64,
) -> Result<i64, DynamicError> {
    let Some(value) = data.get(attribute) else {
        return Ok(0);
    };
    let text = value_to_string(value);
    if let Some(rest) = text.strip_prefix("current_year") {
        let year = i64::from(Local::now().year());
        let offset = match rest.split('-').nth(1) {
            None => 0,
            Some(modifier) => modifier.trim().parse::<i64>().map_err(|_| DynamicError::InvalidYearModifier {
                attribute: attribute.to_string(),
                modifier: modifier.to_string(),
            })?,
        };
        return Ok(year - offset);
    }
    Ok(data_int(&format!("{} data", mapping.map_name), data, attribute, 0, minimum))
}

fn numbers(mapping: &DynamicMapping, config: &VariableMap) -> Result<Universe, DynamicError> {
    let data = data_block(mapping, config)?;
    let starting = range_bound(mapping, &data, "starting", 0)?;
    let ending = range_bound(mapping, &data, "ending", 1)?;
    let increment = data_int(&format!("{} data", mapping.map_name), &data, "increment", 1, 1);
    if starting > ending {
        return Err(DynamicError::InvalidRange {
            map_name: mapping.map_name.clone(),
        });
    }
    let mut universe = Universe::default();
    let mut current = starting;
    while current <= ending {
        let key = current.to_string();
        let excluded = mapping.is_excluded(&[&key]);
        universe.insert(key.clone(), key, excluded);
        match current.checked_add(increment) {
            Some(next) => current = next,
            None => break,
        }
    }
    Ok(universe)
}

fn ranked_lists(
    mapping: &DynamicMapping,
    config: &VariableMap,
    sources: &Sources<'_>,
) -> Result<Universe, DynamicError> {
    let Some(ranked) = sources.ranked_lists else {
        return Err(DynamicError::RankedListsUnavailable {
            map_name: mapping.map_name.clone(),
            kind: mapping.kind.as_str().to_string(),
        });
    };
    let at_map = |e: ParseError| DynamicError::parse(&mapping.map_name, e);
    let context = format!("{} Ranked List Error", mapping.map_name);
    let failed = |e: anyhow::Error| DynamicError::collaborator(context.clone(), &e);

    let mut lists: Vec<Vec<(String, String)>> = Vec::new();
    match mapping.kind {
        GeneratorKind::TraktLikedLists => lists.push(ranked.all_liked_lists().map_err(failed)?),
        GeneratorKind::TmdbPopularPeople => {
            let count = parse_int("data", mapping.data(config, false)?, 1).map_err(at_map)?;
            lists.push(ranked.get_popular_people(count as usize).map_err(failed)?);
        }
        GeneratorKind::TraktUserLists | GeneratorKind::TraktPeopleList => {
            for option in parse_str_list("data", mapping.data(config, false)?).map_err(at_map)? {
                let list = if mapping.kind == GeneratorKind::TraktUserLists {
                    ranked.all_user_lists(&option)
                } else {
                    ranked.get_people(&option)
                };
                lists.push(list.map_err(failed)?);
            }
        }
        other => {
            return Err(DynamicError::InvalidType {
                map_name: mapping.map_name.clone(),
                kind: other.as_str().to_string(),
                options: String::new(),
            });
        }
    }

    let mut universe = Universe::default();
    for (key, label) in lists.into_iter().flatten() {
        let excluded = mapping.is_excluded(&[&key, &label]);
        universe.insert(key, label, excluded);
    }
    Ok(universe)
}

/// `key` or `key (label)` for every entry, for debug logging.
pub fn describe(list: &IndexMap<String, String>) -> Vec<String> {
    list.iter()
        .map(|(key, label)| if key == label { key.clone() } else { format!("{key} ({label})") })
        .collect()
}
