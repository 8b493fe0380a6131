//! Definition files.
//!
//! A definition file is a YAML document with top-level sections:
//!
//! | Section | Used by |
//! |---|---|
//! | `templates` | every file |
//! | `external_templates` | every file; fills gaps in `templates` |
//! | `translations` | every file; translation bundle references |
//! | `collections`, `dynamic_collections`, `metadata` | [`MetadataFile`] |
//! | `playlists` | [`PlaylistFile`] |
//! | `overlays` | [`OverlayFile`] |
//!
//! Loading a [`MetadataFile`] also runs the dynamic collection generator,
//! so the generated definitions sit next to the hand-written ones and
//! resolve the same way.

pub mod section;
pub mod source;

pub use section::extract_section;
pub use source::{DefinitionSource, FileReference, FsDefinitionSource};

use std::path::Path;

use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};
use tracing::{debug, error, info, warn};

use crate::config::RunConfig;
use crate::core::{DataKind, LibraryInfo, MetaError};
use crate::dynamic::{DynamicGenerator, GenerationReport, Sources};
use crate::templating::{ResolutionContext, TemplateApplier, TemplateError, TemplateSet, VariableMap};
use crate::translation::TranslationSet;
use crate::utils::progress::progress_iterator;
use crate::utils::{AttributeMap, value_to_string};

/// Definition attributes consumed by resolution rather than copied through.
const RESOLUTION_ATTRIBUTES: [&str; 2] = ["template", "variables"];

fn to_mapping(entries: IndexMap<String, Value>) -> Mapping {
    entries.into_iter().map(|(k, v)| (Value::String(k), v)).collect()
}

fn to_definitions(entries: IndexMap<String, Value>) -> IndexMap<String, Mapping> {
    entries
        .into_iter()
        .filter_map(|(name, value)| match value {
            Value::Mapping(map) => Some((name, map)),
            _ => None,
        })
        .collect()
}

/// File name without directories or extension.
fn file_name(reference: &str) -> String {
    Path::new(reference)
        .file_stem()
        .map_or_else(|| reference.to_string(), |stem| stem.to_string_lossy().into_owned())
}

fn load_document(source: &dyn DefinitionSource, reference: &str) -> Result<Value, MetaError> {
    let document = source.load(reference).map_err(|e| match e.downcast::<MetaError>() {
        Ok(meta) => meta,
        Err(e) => MetaError::Other {
            message: format!("{e:#}"),
        },
    })?;
    if !document.is_mapping() {
        return Err(MetaError::YamlParseError {
            file: reference.to_string(),
            reason: "document must be a dictionary".to_string(),
        });
    }
    Ok(document)
}

/// Definitions of `entries` named in `requested`, in requested order.
///
/// An empty request selects everything; unknown names are skipped.
fn select<'a>(entries: &'a IndexMap<String, Mapping>, requested: &[String]) -> Vec<(&'a str, &'a Mapping)> {
    if requested.is_empty() {
        return entries.iter().map(|(title, def)| (title.as_str(), def)).collect();
    }
    requested
        .iter()
        .filter_map(|title| {
            let found = entries.get_key_value(title).map(|(t, def)| (t.as_str(), def));
            if found.is_none() {
                debug!("Requested definition not in file: {title}");
            }
            found
        })
        .collect()
}

/// State shared by every kind of definition file: its templates,
/// translations and resolution context.
#[derive(Debug, Clone)]
pub struct DataFile {
    kind: DataKind,
    name: String,
    library: Option<LibraryInfo>,
    config_variables: VariableMap,
    templates: TemplateSet,
    translations: TranslationSet,
}

impl DataFile {
    /// Empty file of `kind`; templates and translations are loaded later.
    pub fn new(
        kind: DataKind,
        name: impl Into<String>,
        library: Option<LibraryInfo>,
        config_variables: VariableMap,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            library,
            config_variables,
            templates: TemplateSet::new(),
            translations: TranslationSet::new(),
        }
    }

    /// Load translations, own templates and external templates, in that order.
    pub fn load_common(&mut self, document: &Value, source: &dyn DefinitionSource) {
        self.load_translations(document, source);
        self.templates = TemplateSet::from_mapping(&to_mapping(extract_section("templates", document, &[])));
        self.load_external_templates(document, source);
        debug!("{} templates available in {}", self.templates.len(), self.name);
    }

    fn load_translations(&mut self, document: &Value, source: &dyn DefinitionSource) {
        let Some(value) = document.get("translations") else {
            return;
        };
        let library_type = self.library.as_ref().map_or("item", |info| info.library_type.lower());
        for reference in FileReference::parse_all("translations", value) {
            let (default, languages) = match source.load_translations(&reference.path) {
                Ok(documents) => documents,
                Err(e) => {
                    error!("{e:#}");
                    continue;
                }
            };
            match TranslationSet::from_documents(&reference.path, &default, &languages, library_type) {
                Ok(set) => self.translations.merge(set),
                Err(e) => error!("{e}"),
            }
        }
    }

    fn load_external_templates(&mut self, document: &Value, source: &dyn DefinitionSource) {
        let Some(value) = document.get("external_templates") else {
            return;
        };
        for reference in FileReference::parse_all("external_templates", value) {
            let external = match source.load(&reference.path) {
                Ok(external) => external,
                Err(e) => {
                    error!("{e:#}");
                    continue;
                }
            };
            let section = extract_section("templates", &external, &[]);
            if section.is_empty() {
                warn!("Config Warning: No templates found in {}", reference.path);
                continue;
            }
            let added = self.templates.extend_external(&to_mapping(section), &reference.template_variables);
            debug!("{added} external templates added from {}", reference.path);
        }
    }

    /// Definition family of the file.
    pub const fn kind(&self) -> DataKind {
        self.kind
    }

    /// File name used in messages and scheduling.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Library the file resolves against, when any.
    pub const fn library(&self) -> Option<&LibraryInfo> {
        self.library.as_ref()
    }

    /// Templates available to the file's definitions.
    pub const fn templates(&self) -> &TemplateSet {
        &self.templates
    }

    /// Loaded translation bundles.
    pub const fn translations(&self) -> &TranslationSet {
        &self.translations
    }

    /// Resolution context for invocations in this file.
    pub fn context(&self) -> ResolutionContext<'_> {
        ResolutionContext {
            data_type: self.kind,
            library: self.library.as_ref(),
            config_variables: &self.config_variables,
            translations: &self.translations,
        }
    }

    /// Resolve one definition into its final attribute tree.
    ///
    /// Attributes written on the definition come first and win; the
    /// attributes produced by its `template` calls follow. The definition's
    /// `variables` become extra variables of every call.
    pub fn resolve_definition(&self, title: &str, definition: &Mapping) -> Result<Mapping, TemplateError> {
        let attributes = AttributeMap::from_mapping(definition);
        let mut resolved: Mapping = definition
            .iter()
            .filter(|(key, _)| !RESOLUTION_ATTRIBUTES.contains(&value_to_string(key).to_lowercase().as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        let Some(calls) = attributes.get("template") else {
            return Ok(resolved);
        };
        let extra: VariableMap = match attributes.get("variables") {
            Some(Value::Mapping(vars)) => vars.iter().map(|(k, v)| (value_to_string(k), v.clone())).collect(),
            Some(Value::Null) | None => VariableMap::new(),
            Some(_) => {
                warn!("Config Warning: {title} variables must be a dictionary");
                VariableMap::new()
            }
        };
        let call_name = attributes.get("name").map_or_else(|| title.to_string(), value_to_string);

        let produced =
            TemplateApplier::new(self.context(), &self.templates).apply(Some(&call_name), title, definition, calls, &extra)?;
        for (key, value) in produced {
            if !resolved.contains_key(&key) {
                resolved.insert(key, value);
            }
        }
        Ok(resolved)
    }

    /// Resolve the selected definitions, logging and skipping failures.
    fn resolve_selected(
        &self,
        definitions: &IndexMap<String, Mapping>,
        requested: &[String],
        progress: bool,
    ) -> IndexMap<String, Mapping> {
        let selected = select(definitions, requested);
        let mut resolved = IndexMap::new();
        for (title, definition) in progress_iterator(&selected, "Resolving", progress, |(title, _)| title.to_string())
        {
            match self.resolve_definition(title, definition) {
                Ok(tree) => {
                    resolved.insert((*title).to_string(), tree);
                }
                Err(e) => {
                    error!("{e}");
                    error!("{title} {} Failed", self.kind.label());
                }
            }
        }
        resolved
    }
}

/// A file of collection definitions for one library.
#[derive(Debug, Clone)]
pub struct MetadataFile {
    file: DataFile,
    metadata: IndexMap<String, Value>,
    collections: IndexMap<String, Mapping>,
    report: GenerationReport,
    progress: bool,
}

impl MetadataFile {
    /// Load a definition file and expand its dynamic collections.
    ///
    /// `known_titles` holds collection titles from files loaded earlier; a
    /// repeated title is skipped with a warning. Titles from this file are
    /// appended on success.
    ///
    /// # Errors
    ///
    /// - [`MetaError::NotScheduled`] when `run` filters the file out
    /// - [`MetaError::FileNotFound`] or a parse error when the document cannot be read
    /// - [`MetaError::MissingSection`] when neither metadata nor any
    ///   collection remains after loading
    pub fn load(
        run: &RunConfig,
        source: &dyn DefinitionSource,
        reference: &str,
        sources: Sources<'_>,
        known_titles: &mut Vec<String>,
    ) -> Result<Self, MetaError> {
        let name = file_name(reference);
        if !run.is_scheduled(reference) {
            return Err(MetaError::NotScheduled {
                name,
            });
        }
        info!("Loading Metadata File: {reference}");
        let document = load_document(source, reference)?;

        let mut file =
            DataFile::new(DataKind::Collection, name, Some(sources.library.info()), run.template_variables.clone());
        file.load_common(&document, source);

        let metadata = extract_section("metadata", &document, &[]);
        let mut collections = to_definitions(extract_section("collections", &document, known_titles));
        let dynamic = extract_section("dynamic_collections", &document, &[]);

        let report = if dynamic.is_empty() {
            GenerationReport::default()
        } else {
            let mut titles: Vec<String> = known_titles.iter().chain(collections.keys()).cloned().collect();
            DynamicGenerator::new(sources, &file.config_variables).generate(
                &dynamic,
                &mut file.templates,
                &mut collections,
                &mut titles,
            )
        };

        if metadata.is_empty() && collections.is_empty() {
            return Err(MetaError::MissingSection {
                sections: "metadata, collections, or dynamic_collections".to_string(),
            });
        }
        for title in collections.keys() {
            if !known_titles.contains(title) {
                known_titles.push(title.clone());
            }
        }
        info!("Metadata File Loaded Successfully");

        Ok(Self {
            file,
            metadata,
            collections,
            report,
            progress: sources.progress,
        })
    }

    /// File name.
    pub fn name(&self) -> &str {
        self.file.name()
    }

    /// Shared file state.
    pub const fn file(&self) -> &DataFile {
        &self.file
    }

    /// Item metadata entries, unresolved.
    pub const fn metadata(&self) -> &IndexMap<String, Value> {
        &self.metadata
    }

    /// Every collection definition, hand-written first, generated after.
    pub const fn collections(&self) -> &IndexMap<String, Mapping> {
        &self.collections
    }

    /// Outcome of dynamic generation.
    pub const fn report(&self) -> &GenerationReport {
        &self.report
    }

    /// Collection definitions named in `requested`, in requested order;
    /// all of them when `requested` is empty.
    pub fn get_collections(&self, requested: &[String]) -> Vec<(&str, &Mapping)> {
        select(&self.collections, requested)
    }

    /// Resolve one collection into its final attribute tree.
    pub fn resolve_collection(&self, title: &str) -> Result<Mapping, MetaError> {
        let definition = self.collections.get(title).ok_or_else(|| MetaError::CollectionNotFound {
            title: title.to_string(),
        })?;
        Ok(self.file.resolve_definition(title, definition)?)
    }

    /// Resolve every selected collection; failures are logged and skipped.
    pub fn resolve_all(&self, requested: &[String]) -> IndexMap<String, Mapping> {
        self.file.resolve_selected(&self.collections, requested, self.progress)
    }
}

/// Load a file whose definitions live in a single section.
fn load_section_file(
    kind: DataKind,
    section: &str,
    run: &RunConfig,
    source: &dyn DefinitionSource,
    reference: &str,
    library: Option<LibraryInfo>,
) -> Result<(DataFile, IndexMap<String, Mapping>), MetaError> {
    let name = file_name(reference);
    if !run.is_scheduled(reference) {
        return Err(MetaError::NotScheduled {
            name,
        });
    }
    info!("Loading {} File: {reference}", kind.label());
    let document = load_document(source, reference)?;

    let mut file = DataFile::new(kind, name, library, run.template_variables.clone());
    file.load_common(&document, source);
    let definitions = to_definitions(extract_section(section, &document, &[]));
    if definitions.is_empty() {
        return Err(MetaError::MissingSection {
            sections: section.to_string(),
        });
    }
    info!("{} File Loaded Successfully", kind.label());
    Ok((file, definitions))
}

/// A file of playlist definitions spanning libraries.
#[derive(Debug, Clone)]
pub struct PlaylistFile {
    file: DataFile,
    playlists: IndexMap<String, Mapping>,
    progress: bool,
}

impl PlaylistFile {
    /// Load a playlist file; playlists resolve without a library.
    pub fn load(run: &RunConfig, source: &dyn DefinitionSource, reference: &str) -> Result<Self, MetaError> {
        let (file, playlists) = load_section_file(DataKind::Playlist, "playlists", run, source, reference, None)?;
        Ok(Self {
            file,
            playlists,
            progress: run.progress,
        })
    }

    /// Shared file state.
    pub const fn file(&self) -> &DataFile {
        &self.file
    }

    /// Every playlist definition.
    pub const fn playlists(&self) -> &IndexMap<String, Mapping> {
        &self.playlists
    }

    /// Resolve one playlist.
    pub fn resolve_playlist(&self, title: &str) -> Result<Mapping, MetaError> {
        let definition = self.playlists.get(title).ok_or_else(|| MetaError::CollectionNotFound {
            title: title.to_string(),
        })?;
        Ok(self.file.resolve_definition(title, definition)?)
    }

    /// Resolve every selected playlist; failures are logged and skipped.
    pub fn resolve_all(&self, requested: &[String]) -> IndexMap<String, Mapping> {
        self.file.resolve_selected(&self.playlists, requested, self.progress)
    }
}

/// A file of overlay definitions for one library.
#[derive(Debug, Clone)]
pub struct OverlayFile {
    file: DataFile,
    overlays: IndexMap<String, Mapping>,
    progress: bool,
}

impl OverlayFile {
    /// Load an overlay file for `library`.
    pub fn load(
        run: &RunConfig,
        source: &dyn DefinitionSource,
        reference: &str,
        library: LibraryInfo,
    ) -> Result<Self, MetaError> {
        let (file, overlays) =
            load_section_file(DataKind::Overlay, "overlays", run, source, reference, Some(library))?;
        Ok(Self {
            file,
            overlays,
            progress: run.progress,
        })
    }

    /// Shared file state.
    pub const fn file(&self) -> &DataFile {
        &self.file
    }

    /// Every overlay definition.
    pub const fn overlays(&self) -> &IndexMap<String, Mapping> {
        &self.overlays
    }

    /// Resolve one overlay.
    pub fn resolve_overlay(&self, title: &str) -> Result<Mapping, MetaError> {
        let definition = self.overlays.get(title).ok_or_else(|| MetaError::CollectionNotFound {
            title: title.to_string(),
        })?;
        Ok(self.file.resolve_definition(title, definition)?)
    }

    /// Resolve every selected overlay; failures are logged and skipped.
    pub fn resolve_all(&self, requested: &[String]) -> IndexMap<String, Mapping> {
        self.file.resolve_selected(&self.overlays, requested, self.progress)
    }
}
