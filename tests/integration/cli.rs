//! Integration tests for the `render` command.

use assert_cmd::Command;
use meta_templater::test_utils::{GENRE_TEMPLATES, MOVIE_SNAPSHOT, TestEnvironment};
use predicates::prelude::*;

fn environment(definitions: &str) -> TestEnvironment {
    TestEnvironment::builder()
        .unwrap()
        .with_definitions(definitions)
        .with_snapshot(MOVIE_SNAPSHOT)
        .build()
        .unwrap()
}

fn render(env: &TestEnvironment) -> Command {
    let mut cmd = Command::cargo_bin("meta-templater").unwrap();
    cmd.current_dir(&env.root)
        .arg("--no-progress")
        .arg("render")
        .arg(TestEnvironment::DEFINITIONS)
        .arg("--library")
        .arg(TestEnvironment::SNAPSHOT);
    cmd
}

fn genre_definitions() -> String {
    format!("{GENRE_TEMPLATES}\ndynamic_collections:\n  Genres:\n    type: genre\n    template: genre\n    exclude: [Horror]\n")
}

#[test]
fn test_render_prints_resolved_collections() {
    let env = environment(&genre_definitions());

    render(&env)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("---\nTop Action movies:\n"))
        .stdout(predicate::str::contains("---\nTop Crime movies:\n  label: Genres\n  summary: Top Crime movies\n"))
        .stdout(predicate::str::contains("Horror").not());
}

#[test]
fn test_render_selected_collection() {
    let env = environment(&genre_definitions());

    render(&env)
        .arg("--collection")
        .arg("Top Crime movies")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("---\nTop Crime movies:\n"))
        .stdout(predicate::str::contains("Top Action movies").not());
}

#[test]
fn test_render_with_run_config() {
    let env = environment(&genre_definitions());
    env.write_file(TestEnvironment::RUN_CONFIG, "[template_variables]\nlimit = 5\n").unwrap();

    render(&env)
        .arg("--config")
        .arg(TestEnvironment::RUN_CONFIG)
        .assert()
        .success()
        .stdout(predicate::str::contains("limit: 5\n"))
        .stdout(predicate::str::contains("limit: 50").not());
}

#[test]
fn test_render_json() {
    let env = environment(&genre_definitions());

    let output = render(&env).args(["--format", "json"]).assert().success().get_output().stdout.clone();
    let parsed: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(parsed["Top Action movies"]["label"], "Genres");
    assert_eq!(parsed["Top Crime movies"]["smart_filter"]["limit"], 50);
}

#[test]
fn test_missing_definition_file_fails() {
    let env = environment(&genre_definitions());

    let mut cmd = Command::cargo_bin("meta-templater").unwrap();
    cmd.current_dir(&env.root)
        .args(["render", "absent.yml", "--library", TestEnvironment::SNAPSHOT])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("File does not exist"));
}

#[test]
fn test_definition_file_without_sections_fails() {
    let env = environment("templates:\n  t: {summary: x}\n");

    render(&env)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("metadata, collections, or dynamic_collections"));
}

#[test]
fn test_verbose_and_quiet_conflict() {
    let mut cmd = Command::cargo_bin("meta-templater").unwrap();
    cmd.args(["-v", "-q", "render", "a.yml", "--library", "b.yml"]).assert().failure();
}
