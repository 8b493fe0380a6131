//! Integration tests for dynamic collection generation.
//!
//! Definition files are written to a temporary directory, expanded against
//! an in-memory library and resolved all the way to attribute trees.

use anyhow::Result;
use meta_templater::config::RunConfig;
use meta_templater::core::{LibraryType, MetaError};
use meta_templater::dynamic::Sources;
use meta_templater::library::SnapshotLibrary;
use meta_templater::metadata::MetadataFile;
use meta_templater::test_utils::{
    GENRE_TEMPLATES, LibraryBuilder, MOVIE_SNAPSHOT, TestEnvironment, init_test_logging, yaml,
};
use serde_yaml::Value;

fn sources(library: &SnapshotLibrary) -> Sources<'_> {
    Sources {
        library,
        metadata: library.metadata_provider(),
        ranked_lists: library.ranked_list_provider(),
        progress: false,
    }
}

fn load(env: &TestEnvironment, library: &SnapshotLibrary, known: &mut Vec<String>) -> Result<MetadataFile, MetaError> {
    let run = RunConfig {
        progress: false,
        ..RunConfig::default()
    };
    MetadataFile::load(&run, &env.source(), TestEnvironment::DEFINITIONS, sources(library), known)
}

fn titles(file: &MetadataFile) -> Vec<&str> {
    file.collections().keys().map(String::as_str).collect()
}

#[test]
fn test_genre_collections_resolve_end_to_end() -> Result<()> {
    init_test_logging(None);
    let env = TestEnvironment::builder()?
        .with_definitions(format!(
            "{GENRE_TEMPLATES}
dynamic_collections:
  Genres:
    type: genre
    template: genre
    exclude: [Horror]
"
        ))
        .build()?;
    let library = SnapshotLibrary::from_yaml(MOVIE_SNAPSHOT)?;
    let file = load(&env, &library, &mut Vec::new())?;

    assert_eq!(titles(&file), vec!["Top Action movies", "Top Crime movies"]);
    let resolved = file.resolve_all(&[]);
    assert_eq!(
        Value::Mapping(resolved["Top Crime movies"].clone()),
        yaml(
            r"
label: Genres
summary: Top Crime movies
smart_filter:
  limit: 50
  sort_by: critic_rating.desc
  any:
    genre: [Crime]
"
        )
    );
    Ok(())
}

/// Show decades group item years; each decade collection filters its years.
#[test]
fn test_show_decades() -> Result<()> {
    init_test_logging(None);
    let env = TestEnvironment::builder()?
        .with_definitions("dynamic_collections:\n  Decades:\n    type: decade\n")
        .build()?;
    let library = LibraryBuilder::new("Shows", LibraryType::Show)
        .item("Friends", 1994, &[])
        .item("ER", 1994, &[])
        .item("Lost", 2001, &[])
        .build();
    let file = load(&env, &library, &mut Vec::new())?;

    assert_eq!(titles(&file), vec!["Best shows of 1990s", "Best shows of 2000s"]);
    let nineties = file.resolve_collection("Best shows of 1990s")?;
    assert_eq!(
        Value::Mapping(nineties),
        yaml("label: Decades\nsmart_filter: {limit: 50, sort_by: critic_rating.desc, any: {year: ['1994']}}")
    );
    Ok(())
}

#[test]
fn test_number_range_with_template() -> Result<()> {
    init_test_logging(None);
    let env = TestEnvironment::builder()?
        .with_definitions(
            r"
templates:
  rated:
    summary: Rated <<key_name>> and up
    smart_filter: {all: {user_rating.gte: <<value>>}}
dynamic_collections:
  Ratings:
    type: number
    template: rated
    title_format: Rated <<key_name>>+
    data: {starting: 0, ending: 4, increment: 2}
",
        )
        .build()?;
    let library = LibraryBuilder::movies().build();
    let file = load(&env, &library, &mut Vec::new())?;

    assert_eq!(titles(&file), vec!["Rated 0+", "Rated 2+", "Rated 4+"]);
    let resolved = file.resolve_collection("Rated 2+")?;
    assert_eq!(resolved["summary"], yaml("Rated 2 and up"));
    assert_eq!(resolved["smart_filter"]["all"]["user_rating.gte"], yaml("['2']"));
    Ok(())
}

/// Actors are ranked by credits; the minimum filters out one-off credits.
#[test]
fn test_actor_collections() -> Result<()> {
    init_test_logging(None);
    let env = TestEnvironment::builder()?
        .with_definitions("dynamic_collections:\n  Actors:\n    type: actor\n    data: {depth: 2, minimum: 2}\n")
        .build()?;
    let library = SnapshotLibrary::from_yaml(MOVIE_SNAPSHOT)?;
    let file = load(&env, &library, &mut Vec::new())?;

    assert_eq!(titles(&file), vec!["John Travolta"]);
    let resolved = file.resolve_collection("John Travolta")?;
    assert_eq!(resolved["plex_search"]["any"]["actor"], yaml("[John Travolta]"));
    Ok(())
}

/// Generated titles never replace hand-written or previously loaded ones.
#[test]
fn test_duplicate_titles_are_suppressed() -> Result<()> {
    init_test_logging(None);
    let env = TestEnvironment::builder()?
        .with_definitions(format!(
            "{GENRE_TEMPLATES}
collections:
  Top Action movies:
    template: {{name: genre, value: Action, key_name: Action}}
    summary: Hand written
dynamic_collections:
  Genres:
    type: genre
    template: genre
"
        ))
        .build()?;
    let library = SnapshotLibrary::from_yaml(MOVIE_SNAPSHOT)?;
    let mut known = vec!["Top Horror movies".to_string()];
    let file = load(&env, &library, &mut known)?;

    assert_eq!(titles(&file), vec!["Top Action movies", "Top Crime movies"]);
    assert_eq!(file.resolve_collection("Top Action movies")?["summary"], yaml("Hand written"));
    assert_eq!(known, vec!["Top Horror movies", "Top Action movies", "Top Crime movies"]);
    Ok(())
}

/// With sync on, collections carrying the mapping's label that were not
/// generated again are deleted.
#[test]
fn test_sync_deletes_stale_collections() -> Result<()> {
    init_test_logging(None);
    let env = TestEnvironment::builder()?
        .with_definitions(format!(
            "{GENRE_TEMPLATES}
dynamic_collections:
  Genres:
    type: genre
    template: genre
    exclude: [Horror]
    sync: true
"
        ))
        .build()?;
    let library = SnapshotLibrary::from_yaml(MOVIE_SNAPSHOT)?;
    let file = load(&env, &library, &mut Vec::new())?;

    assert_eq!(file.report().deleted, vec!["Top Horror movies", "Top Western movies"]);
    assert_eq!(library.deleted(), vec!["Top Horror movies", "Top Western movies"]);
    Ok(())
}

/// A broken mapping is reported and skipped; its siblings still generate.
#[test]
fn test_failed_mapping_is_isolated() -> Result<()> {
    init_test_logging(None);
    let env = TestEnvironment::builder()?
        .with_definitions(format!(
            "{GENRE_TEMPLATES}
dynamic_collections:
  Networks:
    type: network
  Ratings:
    type: number
    data: {{ending: 3}}
  Genres:
    type: genre
    template: genre
    include: [Action]
"
        ))
        .build()?;
    let library = SnapshotLibrary::from_yaml(MOVIE_SNAPSHOT)?;
    let file = load(&env, &library, &mut Vec::new())?;

    assert_eq!(file.report().failed, vec!["Networks", "Ratings"]);
    assert_eq!(file.report().generated, 1);
    assert_eq!(titles(&file), vec!["Top Action movies"]);
    Ok(())
}

/// A file whose only mapping fails has nothing left to process.
#[test]
fn test_all_mappings_failed() -> Result<()> {
    init_test_logging(None);
    let env = TestEnvironment::builder()?
        .with_definitions("dynamic_collections:\n  Broken:\n    type: bogus\n")
        .build()?;
    let library = SnapshotLibrary::from_yaml(MOVIE_SNAPSHOT)?;
    let err = load(&env, &library, &mut Vec::new()).unwrap_err();
    assert!(matches!(err, MetaError::MissingSection { .. }));
    Ok(())
}
