//! Integration tests for loading definition files from disk.

use anyhow::Result;
use meta_templater::config::RunConfig;
use meta_templater::core::{LibraryInfo, LibraryType, MetaError};
use meta_templater::dynamic::Sources;
use meta_templater::library::SnapshotLibrary;
use meta_templater::metadata::{MetadataFile, OverlayFile, PlaylistFile};
use meta_templater::test_utils::{GENRE_TEMPLATES, MOVIE_SNAPSHOT, TestEnvironment, init_test_logging, yaml};

fn sources(library: &SnapshotLibrary) -> Sources<'_> {
    Sources {
        library,
        metadata: library.metadata_provider(),
        ranked_lists: library.ranked_list_provider(),
        progress: false,
    }
}

const TRANSLATED: &str = r"
translations: translations
templates:
  genre:
    default: {limit: 50}
    summary: <<top>> <<key_name>> <<library_type>>s
    smart_filter:
      limit: <<limit>>
      sort_by: <<sort_field>>.desc
      any: {genre: <<value>>}
dynamic_collections:
  Genres:
    type: genre
    template: genre
    include: [Action]
";

const DEFAULT_TRANSLATION: &str = r"
translations:
  top: Top
variables:
  sort_field: {movie: critic_rating, show: audience_rating}
";

const SPANISH_TRANSLATION: &str = r"
translations:
  top: Mejores
key_names:
  library_type: Película
  Action: Acción
";

fn translated_env() -> Result<TestEnvironment> {
    TestEnvironment::builder()?
        .with_definitions(TRANSLATED)
        .with_file("translations/default.yml", DEFAULT_TRANSLATION)
        .with_file("translations/es.yml", SPANISH_TRANSLATION)
        .build()
}

#[test]
fn test_translation_directory_default_language() -> Result<()> {
    init_test_logging(None);
    let env = translated_env()?;
    let library = SnapshotLibrary::from_yaml(MOVIE_SNAPSHOT)?;
    let file =
        MetadataFile::load(&RunConfig::default(), &env.source(), "definitions", sources(&library), &mut Vec::new())?;

    let tree = file.resolve_collection("Top Action movies")?;
    assert_eq!(tree["summary"], yaml("Top Action movies"));
    assert_eq!(tree["smart_filter"]["sort_by"], yaml("critic_rating.desc"));
    Ok(())
}

/// Language documents override translations and relabel key names.
#[test]
fn test_translation_directory_selected_language() -> Result<()> {
    init_test_logging(None);
    let env = translated_env()?;
    let library = SnapshotLibrary::from_yaml(MOVIE_SNAPSHOT)?;
    let mut run = RunConfig::default();
    run.set_language("es");
    let file = MetadataFile::load(&run, &env.source(), "definitions", sources(&library), &mut Vec::new())?;

    // Titles come from the generator and stay untranslated.
    let tree = file.resolve_collection("Top Action movies")?;
    assert_eq!(tree["summary"], yaml("Mejores Acción películas"));
    assert_eq!(tree["smart_filter"]["any"]["genre"], yaml("[Action]"));
    Ok(())
}

#[test]
fn test_missing_default_translation_is_not_fatal() -> Result<()> {
    init_test_logging(None);
    let env = TestEnvironment::builder()?
        .with_definitions(
            "translations: translations\ntemplates:\n  t: {summary: <<top>>, sort_title: plain}\n\
             collections:\n  A: {template: {name: t}}\n",
        )
        .with_file("translations/es.yml", SPANISH_TRANSLATION)
        .build()?;
    let library = SnapshotLibrary::from_yaml(MOVIE_SNAPSHOT)?;
    let file =
        MetadataFile::load(&RunConfig::default(), &env.source(), "definitions", sources(&library), &mut Vec::new())?;

    assert!(file.file().translations().is_empty());
    let tree = file.resolve_collection("A")?;
    assert_eq!(tree["summary"], yaml("<<top>>"));
    assert_eq!(tree["sort_title"], yaml("plain"));
    Ok(())
}

/// External templates carry their own variables and never replace local ones.
#[test]
fn test_external_templates_from_subdirectory() -> Result<()> {
    init_test_logging(None);
    let env = TestEnvironment::builder()?
        .with_definitions(
            r"
external_templates:
  file: [shared/genres, shared/missing]
  template_variables: {sort: title.asc}
templates:
  local: {summary: Local <<collection_name>>}
collections:
  Mine: {template: {name: local}}
  Shared:
    template: {name: genre, value: Drama, key_name: Drama}
",
        )
        .with_file("shared/genres.yml", GENRE_TEMPLATES)
        .build()?;
    let library = SnapshotLibrary::from_yaml(MOVIE_SNAPSHOT)?;
    let file =
        MetadataFile::load(&RunConfig::default(), &env.source(), "definitions", sources(&library), &mut Vec::new())?;

    assert_eq!(file.file().templates().len(), 2);
    assert_eq!(file.resolve_collection("Mine")?["summary"], yaml("Local Mine"));
    let shared = file.resolve_collection("Shared")?;
    assert_eq!(shared["summary"], yaml("Top Drama movies"));
    assert_eq!(shared["smart_filter"]["sort_by"], yaml("title.asc"));
    Ok(())
}

/// A run configuration read from TOML drives scheduling, variables and the
/// collection selection.
#[test]
fn test_run_config_from_disk() -> Result<()> {
    init_test_logging(None);
    let env = TestEnvironment::builder()?
        .with_definitions(format!(
            "{GENRE_TEMPLATES}\ncollections:\n  Action: {{template: {{name: genre, value: Action, key_name: Action}}}}\n  \
             Drama: {{template: {{name: genre, value: Drama, key_name: Drama}}}}\n"
        ))
        .with_run_config(
            r#"
requested_files = ["definitions"]
requested_collections = ["Drama", "Western"]
progress = false

[template_variables]
limit = 10
"#,
        )
        .build()?;
    let run = RunConfig::load(&env.path(TestEnvironment::RUN_CONFIG))?;
    let library = SnapshotLibrary::from_yaml(MOVIE_SNAPSHOT)?;

    let file = MetadataFile::load(&run, &env.source(), "definitions.yml", sources(&library), &mut Vec::new())?;
    let resolved = file.resolve_all(&run.requested_collections);
    assert_eq!(resolved.keys().collect::<Vec<_>>(), vec!["Drama"]);
    assert_eq!(resolved["Drama"]["smart_filter"]["limit"], yaml("10"));

    let err = MetadataFile::load(&run, &env.source(), "other.yml", sources(&library), &mut Vec::new()).unwrap_err();
    assert!(matches!(err, MetaError::NotScheduled { .. }));
    Ok(())
}

#[test]
fn test_playlist_and_overlay_files() -> Result<()> {
    init_test_logging(None);
    let env = TestEnvironment::builder()?
        .with_file(
            "playlists.yml",
            "templates:\n  marathon: {summary: <<playlist_name>> of <<library_type>>s, libraries: <<libraries>>}\n\
             playlists:\n  Weekend: {template: {name: marathon, libraries: [Movies, Shows]}}\n",
        )
        .with_file(
            "overlays.yml",
            "templates:\n  badge: {overlay: {name: <<overlay_name>>}, plex_search: {all: {resolution: <<value>>}}}\n\
             overlays:\n  4K: {template: {name: badge, value: 4K}}\n",
        )
        .build()?;
    let run = RunConfig::default();

    let playlists = PlaylistFile::load(&run, &env.source(), "playlists.yml")?;
    let weekend = playlists.resolve_playlist("Weekend")?;
    assert_eq!(weekend["summary"], yaml("Weekend of items"));
    assert_eq!(weekend["libraries"], yaml("[Movies, Shows]"));

    let overlays =
        OverlayFile::load(&run, &env.source(), "overlays.yml", LibraryInfo::new("Movies", LibraryType::Movie))?;
    let resolved = overlays.resolve_all(&[]);
    assert_eq!(resolved["4K"]["overlay"]["name"], yaml("4K"));
    assert_eq!(resolved["4K"]["plex_search"]["all"]["resolution"], yaml("4K"));
    Ok(())
}

#[test]
fn test_unparsable_file() -> Result<()> {
    init_test_logging(None);
    let env = TestEnvironment::builder()?.with_definitions("collections: [unterminated").build()?;
    let library = SnapshotLibrary::from_yaml(MOVIE_SNAPSHOT)?;
    let result =
        MetadataFile::load(&RunConfig::default(), &env.source(), "definitions", sources(&library), &mut Vec::new());
    assert!(result.is_err());
    Ok(())
}
