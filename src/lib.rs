//! meta-templater - template resolution and dynamic collection expansion for
//! media library metadata definitions.
//!
//! Definition files describe collections, playlists and overlays as YAML
//! attribute trees. Shared shapes live in named templates that are called
//! with variables; `<<name>>` placeholders inside a template are replaced by
//! the resolved variables of each call. Dynamic mappings expand into one
//! collection definition per key found in the library (genres, years,
//! actors, ranked lists, ...), and translation bundles overlay per-language
//! text on top.
//!
//! # Architecture Overview
//!
//! Resolution of one definition runs through these layers:
//!
//! 1. [`metadata`] loads a definition file: templates, external templates,
//!    translation bundles and the definitions themselves
//! 2. [`dynamic`] expands `dynamic_collections` into ordinary definitions,
//!    consulting the [`library`] collaborators
//! 3. [`templating`] resolves each `template` call: variables are layered,
//!    conditionals evaluated, placeholders substituted
//! 4. the definition's own attributes are merged over the template output
//!
//! # Core Modules
//!
//! - [`core`] - Error taxonomy, user-facing error context, shared enums
//! - [`templating`] - Placeholder substitution, variable resolution, template applier
//! - [`translation`] - Language-keyed translation and key-name overlay
//! - [`dynamic`] - Dynamic collection generator
//! - [`library`] - Collaborator contracts and the YAML snapshot implementation
//! - [`metadata`] - Definition file loading and resolution
//! - [`config`] - Run configuration (TOML)
//! - [`cli`] - The `meta-templater` command-line interface
//! - [`utils`] - Value helpers, attribute parsers, progress bars
//!
//! # Definition File Example
//!
//! ```yaml
//! templates:
//!   genre:
//!     default:
//!       limit: 50
//!     optional: [poster]
//!     summary: Top <<key_name>> <<library_type>>s
//!     url_poster: <<poster>>
//!     smart_filter:
//!       limit: <<limit>>
//!       any:
//!         genre: <<value>>
//!
//! collections:
//!   Best Action:
//!     template: {name: genre, value: Action, key_name: Action}
//!
//! dynamic_collections:
//!   Genres:
//!     type: genre
//!     template: genre
//!     exclude: [Talk Show]
//! ```
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use meta_templater::config::RunConfig;
//! use meta_templater::dynamic::Sources;
//! use meta_templater::library::SnapshotLibrary;
//! use meta_templater::metadata::{FsDefinitionSource, MetadataFile};
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! let library = SnapshotLibrary::from_path(Path::new("snapshot.yml"))?;
//! let sources = Sources {
//!     library: &library,
//!     metadata: library.metadata_provider(),
//!     ranked_lists: library.ranked_list_provider(),
//!     progress: false,
//! };
//! let run = RunConfig::default();
//! let source = FsDefinitionSource::new(".");
//! let file = MetadataFile::load(&run, &source, "movies.yml", sources, &mut Vec::new())?;
//! for (title, tree) in file.resolve_all(&[]) {
//!     println!("{title}: {tree:?}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod dynamic;
pub mod library;
pub mod metadata;
pub mod templating;
pub mod translation;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
