//! Where definition documents come from.
//!
//! Definition files reference other documents (external templates,
//! translation bundles) by path. A [`DefinitionSource`] turns such a
//! reference into parsed YAML so the loaders never touch the filesystem
//! directly.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde_yaml::{Mapping, Value};
use tracing::{debug, error};

use crate::core::MetaError;
use crate::templating::VariableMap;
use crate::translation::{DEFAULT_LANGUAGE, split_bundle};
use crate::utils::{get_list, value_to_string};

/// Loads referenced definition documents.
pub trait DefinitionSource {
    /// Load and parse one document.
    fn load(&self, reference: &str) -> Result<Value>;

    /// Load a translation bundle as its default document plus
    /// `(language, document)` pairs.
    fn load_translations(&self, reference: &str) -> Result<(Value, Vec<(String, Value)>)>;
}

/// Documents read from disk relative to a root directory.
#[derive(Debug, Clone)]
pub struct FsDefinitionSource {
    root: PathBuf,
}

impl FsDefinitionSource {
    /// Source resolving relative references against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
        }
    }

    /// Source rooted at the directory containing `file`.
    pub fn beside(file: &Path) -> Self {
        Self::new(file.parent().map(Path::to_path_buf).unwrap_or_default())
    }

    fn resolve(&self, reference: &str) -> PathBuf {
        let path = Path::new(reference);
        if path.is_absolute() { path.to_path_buf() } else { self.root.join(path) }
    }

    fn read_yaml(path: &Path) -> Result<Value> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read definition file: {}", path.display()))?;
        serde_yaml::from_str(&text).with_context(|| format!("Failed to parse definition file: {}", path.display()))
    }
}

/// Append `.yml` when the reference names no extension.
fn with_yaml_extension(path: PathBuf) -> PathBuf {
    if path.extension().is_some() { path } else { path.with_extension("yml") }
}

impl DefinitionSource for FsDefinitionSource {
    fn load(&self, reference: &str) -> Result<Value> {
        let path = with_yaml_extension(self.resolve(reference));
        if !path.is_file() {
            return Err(MetaError::FileNotFound {
                path: path.display().to_string(),
            }
            .into());
        }
        debug!("Reading definition file: {}", path.display());
        Self::read_yaml(&path)
    }

    fn load_translations(&self, reference: &str) -> Result<(Value, Vec<(String, Value)>)> {
        let path = self.resolve(reference);
        if path.is_dir() {
            let default_path = path.join(format!("{DEFAULT_LANGUAGE}.yml"));
            if !default_path.is_file() {
                bail!("Config Error: Default translation file not found: {}", default_path.display());
            }
            let default = Self::read_yaml(&default_path)?;

            let mut language_files: Vec<PathBuf> = std::fs::read_dir(&path)
                .with_context(|| format!("Failed to read translation directory: {}", path.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.extension().is_some_and(|ext| ext == "yml") && *p != default_path)
                .collect();
            language_files.sort();

            let mut languages = Vec::new();
            for file in language_files {
                let Some(language) = file.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                    continue;
                };
                languages.push((language, Self::read_yaml(&file)?));
            }
            return Ok((default, languages));
        }

        let bundle = self.load(reference)?;
        let Some(mapping) = bundle.as_mapping() else {
            bail!("Config Error: Translation bundle {reference} must be a dictionary");
        };
        split_bundle(mapping)
            .with_context(|| format!("Config Error: Translation bundle {reference} has no {DEFAULT_LANGUAGE} entry"))
    }
}

/// One document reference with the variables declared alongside it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileReference {
    /// Path handed to the [`DefinitionSource`]
    pub path: String,
    /// Variables captured by everything loaded from the document
    pub template_variables: VariableMap,
}

impl FileReference {
    /// Read the references of an attribute such as `external_templates`.
    ///
    /// Each entry is a bare path or a mapping with `file` and optional
    /// `template_variables`. A value yielding no paths logs an error.
    pub fn parse_all(attribute: &str, value: &Value) -> Vec<Self> {
        let mut references = Vec::new();
        for entry in get_list(value, false) {
            match &entry {
                Value::Mapping(map) => references.extend(Self::from_mapping(attribute, map)),
                Value::Null => {}
                other => {
                    let path = value_to_string(other);
                    if !path.is_empty() {
                        references.push(Self {
                            path,
                            template_variables: VariableMap::new(),
                        });
                    }
                }
            }
        }
        if references.is_empty() {
            error!("Config Error: No Paths Found for {attribute}");
        }
        references
    }

    fn from_mapping(attribute: &str, map: &Mapping) -> Vec<Self> {
        let template_variables: VariableMap = match map.get("template_variables") {
            Some(Value::Mapping(vars)) => vars.iter().map(|(k, v)| (value_to_string(k), v.clone())).collect(),
            Some(Value::Null) | None => VariableMap::new(),
            Some(_) => {
                error!("Config Error: {attribute} template_variables must be a dictionary");
                VariableMap::new()
            }
        };
        let Some(files) = map.get("file") else {
            error!("Config Error: {attribute} entry requires a file attribute");
            return Vec::new();
        };
        get_list(files, false)
            .iter()
            .map(value_to_string)
            .filter(|path| !path.is_empty())
            .map(|path| Self {
                path,
                template_variables: template_variables.clone(),
            })
            .collect()
    }
}
