//! On-disk test environment builder.
//!
//! Lays out definition files, library snapshots and run configurations in a
//! temporary directory so loaders and the CLI can be exercised end to end.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::metadata::FsDefinitionSource;

/// A builder for creating test environments with a fluent API
pub struct TestEnvironmentBuilder {
    temp_dir: TempDir,
    files: Vec<(String, String)>,
}

impl TestEnvironmentBuilder {
    /// Create a new test environment builder
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: TempDir::new()?,
            files: Vec::new(),
        })
    }

    /// Add a file to be created in the test environment
    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.files.push((path.into(), content.into()));
        self
    }

    /// Add the definition file rendered by default (`definitions.yml`)
    pub fn with_definitions(self, content: impl Into<String>) -> Self {
        self.with_file(TestEnvironment::DEFINITIONS, content)
    }

    /// Add the library snapshot (`snapshot.yml`)
    pub fn with_snapshot(self, content: impl Into<String>) -> Self {
        self.with_file(TestEnvironment::SNAPSHOT, content)
    }

    /// Add the run configuration (`run.toml`)
    pub fn with_run_config(self, content: impl Into<String>) -> Self {
        self.with_file(TestEnvironment::RUN_CONFIG, content)
    }

    /// Build the test environment
    pub fn build(self) -> Result<TestEnvironment> {
        let root = self.temp_dir.path().to_path_buf();
        for (path, content) in &self.files {
            let full_path = root.join(path);
            if let Some(parent) = full_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(full_path, content)?;
        }
        Ok(TestEnvironment {
            _temp_dir: self.temp_dir,
            root,
        })
    }
}

/// A built test environment
pub struct TestEnvironment {
    _temp_dir: TempDir, // Keep temp dir alive
    /// Directory holding every file of the environment
    pub root: PathBuf,
}

impl TestEnvironment {
    /// Default definition file name
    pub const DEFINITIONS: &'static str = "definitions.yml";
    /// Default library snapshot file name
    pub const SNAPSHOT: &'static str = "snapshot.yml";
    /// Default run configuration file name
    pub const RUN_CONFIG: &'static str = "run.toml";

    /// Create a new test environment builder
    pub fn builder() -> Result<TestEnvironmentBuilder> {
        TestEnvironmentBuilder::new()
    }

    /// Absolute path of a file in the environment
    pub fn path(&self, path: impl AsRef<Path>) -> PathBuf {
        self.root.join(path)
    }

    /// Definition source rooted at the environment
    pub fn source(&self) -> FsDefinitionSource {
        FsDefinitionSource::new(&self.root)
    }

    /// Check if a file exists in the environment
    pub fn file_exists(&self, path: impl AsRef<Path>) -> bool {
        self.root.join(path).exists()
    }

    /// Read a file from the environment
    pub fn read_file(&self, path: impl AsRef<Path>) -> Result<String> {
        Ok(std::fs::read_to_string(self.root.join(path))?)
    }

    /// Write a file to the environment
    pub fn write_file(&self, path: impl AsRef<Path>, content: impl AsRef<str>) -> Result<()> {
        let full_path = self.root.join(path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(full_path, content.as_ref())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::DefinitionSource;

    #[test]
    fn test_builder_creates_environment() {
        let env = TestEnvironment::builder()
            .unwrap()
            .with_definitions("collections: {}")
            .with_file("translations/default.yml", "translations: {}")
            .build()
            .unwrap();

        assert!(env.file_exists(TestEnvironment::DEFINITIONS));
        assert!(env.file_exists("translations/default.yml"));
        assert_eq!(env.read_file(TestEnvironment::DEFINITIONS).unwrap(), "collections: {}");
    }

    #[test]
    fn test_source_reads_environment_files() {
        let env = TestEnvironment::builder().unwrap().build().unwrap();
        env.write_file("shared.yml", "templates:\n  t: {summary: x}\n").unwrap();
        let document = env.source().load("shared").unwrap();
        assert!(document["templates"]["t"].is_mapping());
    }
}
