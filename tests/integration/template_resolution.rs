//! Integration tests for template resolution.
//!
//! These tests verify that:
//! - Fully resolved trees carry no placeholders and are stable under re-substitution
//! - Config-level variables win over every other source
//! - The first matching condition wins
//! - Optional placeholders drop their attribute instead of failing
//! - Every variable gets an `_encoded` twin

use anyhow::Result;
use meta_templater::core::{DataKind, LibraryInfo, LibraryType};
use meta_templater::templating::placeholder::unresolved_placeholders;
use meta_templater::templating::{
    ResolutionContext, Substitution, Template, TemplateApplier, TemplateError, TemplateSet, VariableMap,
};
use meta_templater::test_utils::{GENRE_TEMPLATES, init_test_logging, mapping, vars, yaml};
use meta_templater::translation::TranslationSet;
use serde_yaml::{Mapping, Value};

struct Harness {
    templates: TemplateSet,
    config: VariableMap,
    translations: TranslationSet,
    library: LibraryInfo,
}

impl Harness {
    fn new(templates: TemplateSet) -> Self {
        init_test_logging(None);
        Self {
            templates,
            config: VariableMap::new(),
            translations: TranslationSet::new(),
            library: LibraryInfo::new("Movies", LibraryType::Movie),
        }
    }

    fn from_yaml(templates: &str) -> Self {
        Self::new(TemplateSet::from_mapping(&mapping(templates)))
    }

    fn apply_with(&self, calls: &str, extra: &VariableMap) -> Result<Mapping, TemplateError> {
        let ctx = ResolutionContext {
            data_type: DataKind::Collection,
            library: Some(&self.library),
            config_variables: &self.config,
            translations: &self.translations,
        };
        TemplateApplier::new(ctx, &self.templates).apply(
            Some("Best Action"),
            "Best Action",
            &Mapping::new(),
            &yaml(calls),
            extra,
        )
    }

    fn apply(&self, calls: &str) -> Result<Mapping, TemplateError> {
        self.apply_with(calls, &VariableMap::new())
    }
}

/// Every placeholder with a known variable is resolved, including indirect ones.
#[test]
fn test_full_resolution_leaves_no_placeholders() -> Result<()> {
    let harness = Harness::from_yaml(
        r"
genre:
  default:
    limit: 50
    sort: critic_rating.desc
    poster_name: <<key_name>> poster
    poster: https://img.example/<<poster_name_encoded>>.jpg
  summary: Top <<key_name>> <<library_type>>s in <<library_name>>
  url_poster: <<poster>>
  <<key_name>>_details:
    smart_filter:
      limit: <<limit>>
      sort_by: <<sort>>
      any: {genre: <<value>>}
",
    );
    let result = harness.apply("{name: genre, value: [Sci-Fi], key_name: Sci Fi}")?;
    let tree = Value::Mapping(result);

    assert!(unresolved_placeholders(&tree).is_empty(), "unresolved: {tree:?}");
    assert_eq!(tree["summary"], yaml("Top Sci Fi movies in Movies"));
    assert_eq!(tree["url_poster"], yaml("https://img.example/Sci%20Fi%20poster.jpg"));
    assert_eq!(tree["Sci Fi_details"]["smart_filter"]["limit"], yaml("50"));
    assert_eq!(tree["Sci Fi_details"]["smart_filter"]["any"]["genre"], yaml("[Sci-Fi]"));
    Ok(())
}

/// Substituting an already resolved tree again changes nothing.
#[test]
fn test_resolution_is_idempotent() -> Result<()> {
    let section = mapping(GENRE_TEMPLATES);
    let templates = section.get("templates").and_then(Value::as_mapping).cloned().unwrap_or_default();
    let harness = Harness::new(TemplateSet::from_mapping(&templates));
    let tree = Value::Mapping(harness.apply("{name: genre, value: Action, key_name: Action}")?);

    let variables = vars(&[("key_name", yaml("Other")), ("value", yaml("Other"))]);
    let again = Substitution::new(vec![&variables]).substitute("collection", &tree).kept();
    assert_eq!(again, Some(tree));
    Ok(())
}

/// External, definition and call-site values all lose to the config-level value.
#[test]
fn test_config_variables_take_precedence() -> Result<()> {
    let mut templates = TemplateSet::new();
    templates.insert(
        Template::new("t", yaml("summary: <<x>>\nextra: <<y>>"))
            .with_external(vars(&[("x", yaml("external")), ("y", yaml("external"))])),
    );
    let mut harness = Harness::new(templates);
    harness.config = vars(&[("x", yaml("config"))]);

    let result = harness.apply_with("{name: t, x: call}", &vars(&[("x", yaml("definition"))]))?;
    assert_eq!(result["summary"], yaml("config"));
    assert_eq!(result["extra"], yaml("external"));
    Ok(())
}

/// Conditions are tried in order and the first passing one wins.
#[test]
fn test_conditional_first_match_wins() -> Result<()> {
    let harness = Harness::from_yaml(
        r"
t:
  conditionals:
    pick:
      conditions:
        - {a: 1, value: X}
        - {a: 1, value: Y}
  summary: <<pick>>
",
    );
    let result = harness.apply("{name: t, a: 1}")?;
    assert_eq!(result["summary"], yaml("X"));
    Ok(())
}

/// Without a passing condition the conditional default applies; without a
/// default the name becomes optional and its attribute is dropped.
#[test]
fn test_conditional_fallbacks() -> Result<()> {
    let harness = Harness::from_yaml(
        r"
t:
  conditionals:
    with_default:
      default: fallback
      conditions: [{kind.not: movie, value: not a movie}]
    without_default:
      conditions: {kind: show, value: a show}
  first: <<with_default>>
  second: <<without_default>>
",
    );
    let result = harness.apply("{name: t, kind: movie}")?;
    assert_eq!(Value::Mapping(result), yaml("first: fallback"));
    Ok(())
}

/// An optional name left unresolved drops the attribute or list element.
#[test]
fn test_optional_placeholders_are_dropped() -> Result<()> {
    let harness = Harness::from_yaml(
        r"
t:
  optional: [missing]
  foo: <<missing>>
  labels: [kept, <<missing>>]
",
    );
    let result = harness.apply("{name: t}")?;
    assert_eq!(Value::Mapping(result), yaml("labels: [kept]"));

    let harness = Harness::from_yaml("t: {optional: [missing], foo: <<missing>>}");
    assert!(harness.apply("{name: t}")?.is_empty());
    Ok(())
}

/// Call-site nulls mark a name optional for that invocation.
#[test]
fn test_null_call_variable_is_optional() -> Result<()> {
    let harness = Harness::from_yaml("t: {summary: x, url_poster: <<poster>>}");
    let result = harness.apply("{name: t, poster: null}")?;
    assert_eq!(Value::Mapping(result), yaml("summary: x"));
    Ok(())
}

/// Variables and defaults both get URL-encoded twins.
#[test]
fn test_encoded_twins() -> Result<()> {
    let harness = Harness::from_yaml(
        r"
t:
  default: {query: a b}
  by_variable: https://example.com/<<title_encoded>>
  by_default: https://example.com/?q=<<query_encoded>>
",
    );
    let result = harness.apply("{name: t, title: a b}")?;
    assert_eq!(result["by_variable"], yaml("https://example.com/a%20b"));
    assert_eq!(result["by_default"], yaml("https://example.com/?q=a%20b"));
    Ok(())
}

/// The first template of a call list wins an attribute both produce.
#[test]
fn test_first_template_wins_shared_attributes() -> Result<()> {
    let harness = Harness::from_yaml("a: {summary: from a}\nb: {summary: from b, sort_title: from b}");
    let result = harness.apply("[{name: a}, {name: b}]")?;
    assert_eq!(Value::Mapping(result), yaml("summary: from a\nsort_title: from b"));
    Ok(())
}

/// Configuration errors abort only the invocation that hit them.
#[test]
fn test_configuration_errors_are_per_invocation() {
    let harness = Harness::from_yaml("genre_template: {summary: x}\nbad: {default: [1, 2], summary: x}");

    let err = harness.apply("{name: genre_templat}").unwrap_err();
    assert!(matches!(err, TemplateError::TemplateNotFound { ref suggestions, .. } if suggestions == &["genre_template"]));

    let err = harness.apply("{name: bad}").unwrap_err();
    assert!(err.to_string().contains("default"));

    assert!(harness.apply("{name: genre_template}").is_ok());
}
