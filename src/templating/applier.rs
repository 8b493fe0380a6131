//! Applying template calls to a definition.

use serde_yaml::{Mapping, Value};
use tracing::{debug, warn};

use super::VariableMap;
use super::error::TemplateError;
use super::placeholder::{Substituted, Substitution};
use super::template::TemplateSet;
use super::variables::{RESERVED_TEMPLATE_KEYS, ResolutionContext, resolve_variables};
use crate::utils::{get_list, is_truthy, value_to_string};

/// Resolves template calls against one file's templates and context.
#[derive(Debug, Clone, Copy)]
pub struct TemplateApplier<'a> {
    ctx: ResolutionContext<'a>,
    templates: &'a TemplateSet,
}

impl<'a> TemplateApplier<'a> {
    /// Applier over `templates` in the given file context.
    pub const fn new(ctx: ResolutionContext<'a>, templates: &'a TemplateSet) -> Self {
        Self {
            ctx,
            templates,
        }
    }

    /// Resolve every call in `template_calls` into one flat attribute mapping.
    ///
    /// `template_calls` is a single call mapping or a list of them, each with
    /// a `name` plus call-site variables. Attributes already present in
    /// `data` are never produced. When two calls produce the same attribute
    /// the earlier call wins and the later one is skipped with a warning.
    pub fn apply(
        &self,
        call_name: Option<&str>,
        mapping_name: &str,
        data: &Mapping,
        template_calls: &Value,
        extra_variables: &VariableMap,
    ) -> Result<Mapping, TemplateError> {
        let data_type = self.ctx.data_type;
        if self.templates.is_empty() {
            return Err(TemplateError::NoTemplates {
                data_type,
            });
        }
        if !is_truthy(template_calls) {
            return Err(TemplateError::BlankCall {
                data_type,
            });
        }

        let mut attributes = Mapping::new();
        for call in get_list(template_calls, false) {
            let Some(call) = call.as_mapping() else {
                return Err(TemplateError::CallNotADictionary {
                    data_type,
                });
            };
            let Some(name) = call.get("name") else {
                return Err(TemplateError::MissingName {
                    data_type,
                });
            };
            if !is_truthy(name) {
                return Err(TemplateError::BlankName {
                    data_type,
                });
            }
            let template = self.templates.require(&value_to_string(name), data_type)?;
            let body = template.mapping(data_type)?;
            debug!("Template {}", template.name);

            let call: VariableMap = call.iter().map(|(k, v)| (value_to_string(k), v.clone())).collect();
            let resolved =
                resolve_variables(&self.ctx, &call, template, body, call_name, mapping_name, extra_variables)?;
            let substitution = Substitution::new(resolved.layers()).with_optional(&resolved.optional);

            for (method, value) in body {
                let method_name = value_to_string(method);
                if data.contains_key(method) || RESERVED_TEMPLATE_KEYS.contains(&method_name.as_str()) {
                    continue;
                }
                let Substituted::Kept(new_name) = substitution.substitute_scalar(&method_name, method.clone())
                else {
                    continue;
                };
                if attributes.contains_key(&new_name) {
                    warn!(
                        "Template Warning: template attribute: {} from {} skipped",
                        value_to_string(&new_name),
                        template.name
                    );
                    continue;
                }
                if let Substituted::Kept(resolved_value) = substitution.substitute(&value_to_string(&new_name), value)
                {
                    attributes.insert(new_name, resolved_value);
                }
            }
        }

        debug!("Final Template Attributes: {attributes:?}");
        Ok(attributes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DataKind, LibraryInfo, LibraryType};
    use crate::templating::placeholder::unresolved_placeholders;
    use crate::translation::TranslationSet;

    fn yaml(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    fn mapping(text: &str) -> Mapping {
        serde_yaml::from_str(text).unwrap()
    }

    struct Fixture {
        templates: TemplateSet,
        config: VariableMap,
        translations: TranslationSet,
        library: LibraryInfo,
    }

    impl Fixture {
        fn new(templates: &str) -> Self {
            Self {
                templates: TemplateSet::from_mapping(&mapping(templates)),
                config: VariableMap::new(),
                translations: TranslationSet::new(),
                library: LibraryInfo::new("Movies", LibraryType::Movie),
            }
        }

        fn apply(&self, data: &str, calls: &str) -> Result<Mapping, TemplateError> {
            let ctx = ResolutionContext {
                data_type: DataKind::Collection,
                library: Some(&self.library),
                config_variables: &self.config,
                translations: &self.translations,
            };
            TemplateApplier::new(ctx, &self.templates).apply(
                None,
                "Action",
                &mapping(data),
                &yaml(calls),
                &VariableMap::new(),
            )
        }
    }

    #[test]
    fn test_full_resolution() {
        let fixture = Fixture::new(
            "genre:\n  default: {limit: 100}\n  optional: [label]\n  \
             smart_filter: {all: {genre: <<value>>}, limit: <<limit>>}\n  \
             summary: Top <<key_name>> movies\n  url_poster: https://img/<<key_name_encoded>>.jpg",
        );
        let result = fixture.apply("{}", "{name: genre, value: [Sci-Fi], key_name: Sci Fi}").unwrap();
        assert_eq!(
            Value::Mapping(result.clone()),
            yaml(
                "smart_filter: {all: {genre: [Sci-Fi]}, limit: 100}\nsummary: Top Sci Fi movies\n\
                 url_poster: https://img/Sci%20Fi.jpg"
            )
        );
        assert!(unresolved_placeholders(&Value::Mapping(result)).is_empty());
    }

    #[test]
    fn test_optional_attribute_is_dropped() {
        let fixture = Fixture::new("t:\n  optional: [missing]\n  foo: <<missing>>");
        let result = fixture.apply("{}", "{name: t}").unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_data_attributes_win_and_reserved_keys_skipped() {
        let fixture = Fixture::new("t:\n  default: {x: 1}\n  summary: from template\n  sort_title: <<x>>");
        let result = fixture.apply("summary: given", "{name: t}").unwrap();
        assert_eq!(Value::Mapping(result), yaml("sort_title: 1"));
    }

    #[test]
    fn test_first_call_wins_on_duplicate_attributes() {
        let fixture = Fixture::new("a: {summary: first, a_only: 1}\nb: {summary: second, b_only: 2}");
        let result = fixture.apply("{}", "[{name: a}, {name: b}]").unwrap();
        assert_eq!(Value::Mapping(result), yaml("summary: first\na_only: 1\nb_only: 2"));
    }

    #[test]
    fn test_attribute_names_are_substituted() {
        let fixture = Fixture::new("t: {<<field>>_details: <<value>>}");
        let result = fixture.apply("{}", "{name: t, field: tmdb_collection, value: 10}").unwrap();
        assert_eq!(Value::Mapping(result), yaml("tmdb_collection_details: 10"));
    }

    #[test]
    fn test_call_errors() {
        let fixture = Fixture::new("t: {x: 1}\nbad: text");
        assert!(matches!(fixture.apply("{}", "''"), Err(TemplateError::BlankCall { .. })));
        assert!(matches!(fixture.apply("{}", "[text]"), Err(TemplateError::CallNotADictionary { .. })));
        assert!(matches!(fixture.apply("{}", "{value: 1}"), Err(TemplateError::MissingName { .. })));
        assert!(matches!(fixture.apply("{}", "{name: ''}"), Err(TemplateError::BlankName { .. })));
        assert!(matches!(fixture.apply("{}", "{name: nope}"), Err(TemplateError::TemplateNotFound { .. })));

        let empty = Fixture::new("{}");
        assert!(matches!(empty.apply("{}", "{name: t}"), Err(TemplateError::NoTemplates { .. })));
    }

    #[test]
    fn test_translations_sit_between_variables_and_defaults() {
        let mut fixture = Fixture::new("t:\n  default: {summary_text: default text}\n  summary: <<summary_text>>");
        fixture.translations = TranslationSet::from_documents(
            "x",
            &yaml("translations: {summary_text: translated text}"),
            &[],
            "movie",
        )
        .unwrap();
        let result = fixture.apply("{}", "{name: t}").unwrap();
        assert_eq!(result.get("summary"), Some(&Value::from("translated text")));

        let result = fixture.apply("{}", "{name: t, summary_text: explicit}").unwrap();
        assert_eq!(result.get("summary"), Some(&Value::from("explicit")));
    }

    #[test]
    fn test_reapplying_to_resolved_output_is_noop() {
        let fixture = Fixture::new("t: {summary: '<<key_name>> list', sort_title: '!<<key_name>>'}");
        let first = fixture.apply("{}", "{name: t, key_name: Drama}").unwrap();

        let sub_vars = VariableMap::new();
        let again = Substitution::new(vec![&sub_vars]).substitute("x", &Value::Mapping(first.clone()));
        assert_eq!(again, Substituted::Kept(Value::Mapping(first)));
    }
}
