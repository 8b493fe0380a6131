//! The `render` command.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};
use tracing::{info, warn};

use super::CliConfig;
use crate::config::RunConfig;
use crate::dynamic::Sources;
use crate::library::SnapshotLibrary;
use crate::metadata::{FsDefinitionSource, MetadataFile};

/// Resolve a definition file against a library snapshot.
#[derive(Args, Debug, Clone)]
pub struct RenderCommand {
    /// Definition file to render
    pub definitions: PathBuf,

    /// Library snapshot the definitions resolve against
    #[arg(long, value_name = "SNAPSHOT")]
    pub library: PathBuf,

    /// Run configuration (TOML)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Only render this collection; may be repeated
    #[arg(long = "collection", value_name = "TITLE")]
    pub collections: Vec<String>,

    /// Language used to pick translations
    #[arg(long, value_name = "CODE")]
    pub language: Option<String>,

    /// Output format: yaml or json
    ///
    /// - `yaml`: one `title: tree` document per collection
    /// - `json`: a single object keyed by collection title
    #[arg(long, value_enum, default_value = "yaml")]
    pub format: OutputFormat,
}

/// Output format for resolved collections.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// YAML documents separated by `---`
    #[default]
    Yaml,
    /// Pretty-printed JSON object
    Json,
}

impl RenderCommand {
    /// Render and print to stdout.
    pub fn execute(self, config: &CliConfig) -> Result<()> {
        let output = self.render(config)?;
        print!("{output}");
        Ok(())
    }

    /// Render the resolved collections in the selected format.
    pub fn render(&self, config: &CliConfig) -> Result<String> {
        let run = self.run_config(config)?;

        let mut library = SnapshotLibrary::from_path(&self.library)?;
        if let Some(name) = &run.library.name {
            library.name.clone_from(name);
        }
        if let Some(library_type) = run.library.library_type {
            library.library_type = Some(library_type);
        }
        if let Some(new_agent) = run.library.new_agent {
            library.new_agent = new_agent;
        }

        let reference = self
            .definitions
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .with_context(|| format!("Not a definition file: {}", self.definitions.display()))?;
        let source = FsDefinitionSource::beside(&self.definitions);
        let sources = Sources {
            library: &library,
            metadata: library.metadata_provider(),
            ranked_lists: library.ranked_list_provider(),
            progress: run.progress,
        };
        let file = MetadataFile::load(&run, &source, &reference, sources, &mut Vec::new())?;

        for title in &run.requested_collections {
            if !file.collections().contains_key(title) {
                warn!("Config Warning: Collection {title} not found in {}", file.name());
            }
        }
        let report = file.report();
        if !report.failed.is_empty() {
            warn!("Failed dynamic collections: {}", report.failed.join(", "));
        }

        let resolved = file.resolve_all(&run.requested_collections);
        if resolved.is_empty() && !file.get_collections(&run.requested_collections).is_empty() {
            bail!("No collections could be resolved from {}", self.definitions.display());
        }
        info!("{} of {} collections resolved", resolved.len(), file.collections().len());
        match self.format {
            OutputFormat::Yaml => format_documents(&resolved),
            OutputFormat::Json => format_json(&resolved),
        }
    }

    /// The run configuration with command-line overrides applied.
    fn run_config(&self, config: &CliConfig) -> Result<RunConfig> {
        let mut run = match &self.config {
            Some(path) => RunConfig::load(path)?,
            None => RunConfig::default(),
        };
        if config.no_progress {
            run.progress = false;
        }
        if let Some(language) = &self.language {
            run.set_language(language.clone());
        }
        run.request_collections(self.collections.iter().cloned());
        Ok(run)
    }
}

/// One `title: tree` YAML document per collection.
fn format_documents(resolved: &IndexMap<String, Mapping>) -> Result<String> {
    let mut output = String::new();
    for (title, tree) in resolved {
        let mut document = Mapping::new();
        document.insert(Value::String(title.clone()), Value::Mapping(tree.clone()));
        output.push_str("---\n");
        output.push_str(
            &serde_yaml::to_string(&document)
                .with_context(|| format!("Failed to serialize resolved collection: {title}"))?,
        );
    }
    Ok(output)
}

/// All collections as one JSON object, newline terminated.
fn format_json(resolved: &IndexMap<String, Mapping>) -> Result<String> {
    let mut output =
        serde_json::to_string_pretty(resolved).context("Failed to serialize resolved collections as JSON")?;
    output.push('\n');
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SNAPSHOT: &str = "name: Movies\ntype: movie\ntags:\n  genre:\n    - {key: '1', title: Action}\n";

    const DEFINITIONS: &str = r"
templates:
  genre:
    summary: <<best>> <<key_name>> <<library_type>>s
    smart_filter: {any: {genre: <<value>>}}
translations: lang.yml
collections:
  Hand Picked:
    summary: Chosen by hand
dynamic_collections:
  Genres:
    type: genre
    template: genre
";

    fn command(dir: &std::path::Path) -> RenderCommand {
        std::fs::write(dir.join("movies.yml"), DEFINITIONS).unwrap();
        std::fs::write(dir.join("snapshot.yml"), SNAPSHOT).unwrap();
        std::fs::write(
            dir.join("lang.yml"),
            "default:\n  translations: {best: Best}\nfr:\n  translations: {best: Meilleurs}\n",
        )
        .unwrap();
        RenderCommand {
            definitions: dir.join("movies.yml"),
            library: dir.join("snapshot.yml"),
            config: None,
            collections: Vec::new(),
            language: None,
            format: OutputFormat::Yaml,
        }
    }

    fn config() -> CliConfig {
        CliConfig {
            log_level: "error".to_string(),
            no_progress: true,
        }
    }

    #[test]
    fn test_render_all() {
        let temp = tempdir().unwrap();
        let output = command(temp.path()).render(&config()).unwrap();
        assert!(output.starts_with("---\nHand Picked:\n  summary: Chosen by hand\n"));
        assert!(output.contains("Top Action movies:\n  label: Genres\n  summary: Best Action movies\n"));
    }

    #[test]
    fn test_render_selected_collection_in_language() {
        let temp = tempdir().unwrap();
        let mut cmd = command(temp.path());
        cmd.collections = vec!["Top Action movies".to_string()];
        cmd.language = Some("fr".to_string());

        let output = cmd.render(&config()).unwrap();
        assert!(output.starts_with("---\nTop Action movies:\n"));
        assert!(output.contains("summary: Meilleurs Action movies\n"));
        assert!(!output.contains("Hand Picked"));
    }

    #[test]
    fn test_run_config_file_overrides_library_type() {
        let temp = tempdir().unwrap();
        let mut cmd = command(temp.path());
        std::fs::write(temp.path().join("run.toml"), "[library]\ntype = \"show\"\n").unwrap();
        cmd.config = Some(temp.path().join("run.toml"));

        let output = cmd.render(&config()).unwrap();
        assert!(output.contains("Top Action shows:\n  label: Genres\n  summary: Best Action shows\n"));
    }

    #[test]
    fn test_render_json() {
        let temp = tempdir().unwrap();
        let mut cmd = command(temp.path());
        cmd.format = OutputFormat::Json;

        let output = cmd.render(&config()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["Hand Picked"]["summary"], "Chosen by hand");
        assert_eq!(parsed["Top Action movies"]["smart_filter"]["any"]["genre"], serde_json::json!(["Action"]));
    }

    #[test]
    fn test_missing_snapshot_fails() {
        let temp = tempdir().unwrap();
        let mut cmd = command(temp.path());
        cmd.library = temp.path().join("absent.yml");
        let err = cmd.render(&config()).unwrap_err();
        assert!(err.to_string().contains("Failed to read library snapshot"));
    }
}
