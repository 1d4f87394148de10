//! Schema validation.
//!
//! [`validate`] walks a decoded JSON value against a [`SchemaDescriptor`] in
//! field declaration order, applies the small fixed set of coercions, runs
//! each field's business rules, and accumulates one error per offending
//! field rather than stopping at the first.

use serde_json::{Map as JsonMap, Value as JsonValue};
use tracing::debug;

use crate::error::{FieldError, ValidationOutcome};
use crate::field::{FieldKind, FieldSpec, ScalarType, SchemaDescriptor};
use crate::rules::{RuleScope, ValidationContext};

/// Validate a decoded value against a schema.
///
/// On success returns [`ValidationOutcome::Valid`] with the coerced,
/// schema-exact instance: unknown fields are dropped, coerced values are
/// substituted, and field order follows the schema declaration. On failure
/// returns every field error found, in traversal order.
#[must_use]
pub fn validate(
    value: &JsonValue,
    schema: &SchemaDescriptor,
    context: &ValidationContext,
) -> ValidationOutcome {
    let mut errors = Vec::new();
    let instance = match schema.fields() {
        Some(fields) => validate_object(value, fields, "", context, &mut errors),
        None => {
            let item = schema
                .item_spec()
                .expect("schema root is either an object or a collection");
            validate_collection(value, item, context, &mut errors)
        }
    };

    if errors.is_empty() {
        ValidationOutcome::Valid(instance)
    } else {
        debug!(
            schema = %schema.name,
            error_count = errors.len(),
            "validation failed"
        );
        ValidationOutcome::Invalid(errors)
    }
}

/// Validate a standalone value against a single field spec.
///
/// Used for per-element checks while a collection is still streaming in.
/// Error paths are relative to the value itself.
#[must_use]
pub fn validate_spec(
    value: &JsonValue,
    spec: &FieldSpec,
    context: &ValidationContext,
) -> ValidationOutcome {
    let mut errors = Vec::new();
    let coerced = validate_field(value, spec, "", None, context, &mut errors);
    if errors.is_empty() {
        ValidationOutcome::Valid(coerced)
    } else {
        ValidationOutcome::Invalid(errors)
    }
}

fn validate_object(
    value: &JsonValue,
    fields: &indexmap::IndexMap<String, FieldSpec>,
    path: &str,
    context: &ValidationContext,
    errors: &mut Vec<FieldError>,
) -> JsonValue {
    let map = match value.as_object() {
        Some(map) => map,
        None => {
            errors.push(FieldError::new(
                path,
                format!("expected an object, got {}", kind_of(value)),
            ));
            return JsonValue::Null;
        }
    };

    let mut out = JsonMap::new();
    for (name, spec) in fields {
        let field_path = join_path(path, name);
        match map.get(name) {
            Some(raw) => {
                let checked =
                    validate_field(raw, spec, &field_path, Some(map), context, errors);
                out.insert(name.clone(), checked);
            }
            None if spec.is_optional() => {
                out.insert(name.clone(), JsonValue::Null);
            }
            None => {
                errors.push(FieldError::new(&field_path, "field is required"));
            }
        }
    }
    JsonValue::Object(out)
}

fn validate_collection(
    value: &JsonValue,
    item: &FieldSpec,
    context: &ValidationContext,
    errors: &mut Vec<FieldError>,
) -> JsonValue {
    let items = match value.as_array() {
        Some(items) => items,
        None => {
            errors.push(FieldError::new(
                "",
                format!("expected a list, got {}", kind_of(value)),
            ));
            return JsonValue::Null;
        }
    };

    let out: Vec<JsonValue> = items
        .iter()
        .enumerate()
        .map(|(i, element)| {
            validate_field(element, item, &i.to_string(), None, context, errors)
        })
        .collect();
    JsonValue::Array(out)
}

/// Validate a single field: null handling, type check with coercion, then
/// rules in registration order with the first failure recorded.
fn validate_field(
    value: &JsonValue,
    spec: &FieldSpec,
    path: &str,
    siblings: Option<&JsonMap<String, JsonValue>>,
    context: &ValidationContext,
    errors: &mut Vec<FieldError>,
) -> JsonValue {
    if value.is_null() {
        if spec.is_optional() {
            return JsonValue::Null;
        }
        errors.push(FieldError::new(path, "field must not be null"));
        return JsonValue::Null;
    }

    let inner = spec.unwrap_optional();
    let before = errors.len();
    let coerced = check_kind(value, &inner.kind, path, siblings, context, errors);

    // Rules only run on values that already passed their type check.
    if errors.len() == before {
        let scope = RuleScope { siblings, context };
        for rule in &inner.rules {
            if let Err(message) = rule.check(&coerced, &scope) {
                errors.push(FieldError::new(path, message));
                break;
            }
        }
    }
    coerced
}

/// `siblings` is the map of the object enclosing the field being checked;
/// it stays in scope through lists and unions so nested rules can see it.
fn check_kind(
    value: &JsonValue,
    kind: &FieldKind,
    path: &str,
    siblings: Option<&JsonMap<String, JsonValue>>,
    context: &ValidationContext,
    errors: &mut Vec<FieldError>,
) -> JsonValue {
    match kind {
        FieldKind::Scalar(scalar) => check_scalar(value, *scalar, path, errors),
        FieldKind::Object(descriptor) => match descriptor.fields() {
            Some(fields) => validate_object(value, fields, path, context, errors),
            None => {
                let item = descriptor
                    .item_spec()
                    .expect("schema root is either an object or a collection");
                check_kind(
                    value,
                    &FieldKind::List(Box::new(item.clone())),
                    path,
                    siblings,
                    context,
                    errors,
                )
            }
        },
        FieldKind::List(item) => {
            // A lone scalar where a list is expected becomes a singleton.
            let promoted;
            let elements = match value.as_array() {
                Some(elements) => elements,
                None if !value.is_object() => {
                    promoted = vec![value.clone()];
                    &promoted
                }
                None => {
                    errors.push(FieldError::new(
                        path,
                        format!("expected a list, got {}", kind_of(value)),
                    ));
                    return JsonValue::Null;
                }
            };
            let out: Vec<JsonValue> = elements
                .iter()
                .enumerate()
                .map(|(i, element)| {
                    let element_path = join_path(path, &i.to_string());
                    validate_field(element, item, &element_path, siblings, context, errors)
                })
                .collect();
            JsonValue::Array(out)
        }
        FieldKind::Union(variants) => {
            // First variant that validates cleanly wins; if none do, report
            // the first variant's errors.
            let mut first_failure: Option<Vec<FieldError>> = None;
            for variant in variants {
                let mut trial = Vec::new();
                let coerced =
                    validate_field(value, variant, path, siblings, context, &mut trial);
                if trial.is_empty() {
                    return coerced;
                }
                if first_failure.is_none() {
                    first_failure = Some(trial);
                }
            }
            match first_failure {
                Some(trial) => errors.extend(trial),
                None => errors.push(FieldError::new(path, "union has no variants")),
            }
            JsonValue::Null
        }
        FieldKind::Optional(inner) => {
            check_kind(value, &inner.kind, path, siblings, context, errors)
        }
    }
}

fn check_scalar(
    value: &JsonValue,
    scalar: ScalarType,
    path: &str,
    errors: &mut Vec<FieldError>,
) -> JsonValue {
    match scalar {
        ScalarType::String => {
            if value.is_string() {
                return value.clone();
            }
        }
        ScalarType::Integer => {
            if value.is_i64() || value.is_u64() {
                return value.clone();
            }
            // A float that carries an exact integer is accepted.
            if let Some(f) = value.as_f64() {
                if f.fract() == 0.0 && f.is_finite() && f.abs() < i64::MAX as f64 {
                    return JsonValue::from(f as i64);
                }
            }
            if let Some(s) = value.as_str() {
                if let Ok(n) = s.trim().parse::<i64>() {
                    return JsonValue::from(n);
                }
            }
        }
        ScalarType::Number => {
            if value.is_number() {
                return value.clone();
            }
            if let Some(s) = value.as_str() {
                if let Ok(n) = s.trim().parse::<f64>() {
                    if let Some(num) = serde_json::Number::from_f64(n) {
                        return JsonValue::Number(num);
                    }
                }
            }
        }
        ScalarType::Boolean => {
            if value.is_boolean() {
                return value.clone();
            }
        }
    }
    errors.push(FieldError::new(
        path,
        format!("expected {}, got {}", scalar.type_name(), kind_of(value)),
    ));
    JsonValue::Null
}

fn join_path(base: &str, segment: &str) -> String {
    if base.is_empty() {
        segment.to_string()
    } else {
        format!("{base}.{segment}")
    }
}

fn kind_of(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "list",
        JsonValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn person() -> SchemaDescriptor {
        SchemaDescriptor::object("Person")
            .field("name", FieldSpec::string())
            .field("age", FieldSpec::integer())
            .build()
    }

    #[test]
    fn test_valid_instance_passes_through() {
        let ctx = ValidationContext::empty();
        let outcome = validate(&json!({"name": "Ada", "age": 36}), &person(), &ctx);
        assert_eq!(
            outcome.instance().unwrap(),
            &json!({"name": "Ada", "age": 36})
        );
    }

    #[test]
    fn test_two_missing_fields_two_errors() {
        let ctx = ValidationContext::empty();
        let outcome = validate(&json!({}), &person(), &ctx);
        let errors = outcome.errors();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].path, "name");
        assert_eq!(errors[1].path, "age");
    }

    #[rstest::rstest]
    #[case(json!("36"), json!(36))]
    #[case(json!(36.0), json!(36))]
    #[case(json!(" 36 "), json!(36))]
    fn test_integer_coercions(#[case] input: JsonValue, #[case] expected: JsonValue) {
        let ctx = ValidationContext::empty();
        let outcome = validate(&json!({"name": "Ada", "age": input}), &person(), &ctx);
        assert_eq!(outcome.instance().unwrap()["age"], expected);
    }

    #[test]
    fn test_numeric_string_coerced_to_integer() {
        let ctx = ValidationContext::empty();
        let outcome = validate(&json!({"name": "Ada", "age": "36"}), &person(), &ctx);
        assert_eq!(outcome.instance().unwrap()["age"], json!(36));
    }

    #[test]
    fn test_integer_valued_float_coerced() {
        let ctx = ValidationContext::empty();
        let outcome = validate(&json!({"name": "Ada", "age": 36.0}), &person(), &ctx);
        assert_eq!(outcome.instance().unwrap()["age"], json!(36));
    }

    #[test]
    fn test_fractional_float_rejected_for_integer() {
        let ctx = ValidationContext::empty();
        let outcome = validate(&json!({"name": "Ada", "age": 36.5}), &person(), &ctx);
        assert_eq!(outcome.errors().len(), 1);
        assert_eq!(outcome.errors()[0].path, "age");
    }

    #[test]
    fn test_unknown_fields_dropped() {
        let ctx = ValidationContext::empty();
        let outcome = validate(
            &json!({"name": "Ada", "age": 36, "extra": true}),
            &person(),
            &ctx,
        );
        assert_eq!(
            outcome.instance().unwrap(),
            &json!({"name": "Ada", "age": 36})
        );
    }

    #[test]
    fn test_optional_absent_and_null_both_pass() {
        let schema = SchemaDescriptor::object("Note")
            .field("title", FieldSpec::string())
            .field("tag", FieldSpec::optional(FieldSpec::string()))
            .build();
        let ctx = ValidationContext::empty();

        let outcome = validate(&json!({"title": "hi"}), &schema, &ctx);
        assert_eq!(outcome.instance().unwrap()["tag"], JsonValue::Null);

        let outcome = validate(&json!({"title": "hi", "tag": null}), &schema, &ctx);
        assert!(outcome.is_valid());
    }

    #[test]
    fn test_scalar_promoted_to_singleton_list() {
        let schema = SchemaDescriptor::object("Doc")
            .field("tags", FieldSpec::list(FieldSpec::string()))
            .build();
        let ctx = ValidationContext::empty();

        let outcome = validate(&json!({"tags": "only"}), &schema, &ctx);
        assert_eq!(outcome.instance().unwrap()["tags"], json!(["only"]));
    }

    #[test]
    fn test_nested_error_paths_are_qualified() {
        let item = SchemaDescriptor::object("Item")
            .field("label", FieldSpec::string())
            .build();
        let schema = SchemaDescriptor::object("Doc")
            .field("items", FieldSpec::list(FieldSpec::object(item)))
            .build();
        let ctx = ValidationContext::empty();

        let outcome = validate(
            &json!({"items": [{"label": "a"}, {"label": "b"}, {"label": 3}]}),
            &schema,
            &ctx,
        );
        assert_eq!(outcome.errors().len(), 1);
        assert_eq!(outcome.errors()[0].path, "items.2.label");
    }

    #[test]
    fn test_first_failing_rule_stops_per_field() {
        let schema = SchemaDescriptor::object("Doc")
            .field(
                "code",
                FieldSpec::string()
                    .with_rule(rules::min_length(5))
                    .with_rule(rules::pattern("^[A-Z]+$").unwrap()),
            )
            .build();
        let ctx = ValidationContext::empty();

        // violates both rules, only the first is reported
        let outcome = validate(&json!({"code": "ab"}), &schema, &ctx);
        assert_eq!(outcome.errors().len(), 1);
        assert!(outcome.errors()[0].message.contains("at least 5"));
    }

    #[test]
    fn test_rule_failures_accumulate_across_fields() {
        let schema = SchemaDescriptor::object("Doc")
            .field("a", FieldSpec::string().with_rule(rules::min_length(5)))
            .field("b", FieldSpec::integer().with_rule(rules::minimum(10.0)))
            .build();
        let ctx = ValidationContext::empty();

        let outcome = validate(&json!({"a": "x", "b": 3}), &schema, &ctx);
        assert_eq!(outcome.errors().len(), 2);
    }

    #[test]
    fn test_union_first_match_wins() {
        let schema = SchemaDescriptor::object("Doc")
            .field(
                "value",
                FieldSpec::union(vec![FieldSpec::integer(), FieldSpec::string()]),
            )
            .build();
        let ctx = ValidationContext::empty();

        // "42" coerces under the integer variant, which is declared first
        let outcome = validate(&json!({"value": "42"}), &schema, &ctx);
        assert_eq!(outcome.instance().unwrap()["value"], json!(42));

        let outcome = validate(&json!({"value": "forty"}), &schema, &ctx);
        assert_eq!(outcome.instance().unwrap()["value"], json!("forty"));
    }

    #[test]
    fn test_union_no_variant_matches() {
        let schema = SchemaDescriptor::object("Doc")
            .field(
                "value",
                FieldSpec::union(vec![FieldSpec::integer(), FieldSpec::boolean()]),
            )
            .build();
        let ctx = ValidationContext::empty();

        let outcome = validate(&json!({"value": [1]}), &schema, &ctx);
        assert!(!outcome.is_valid());
        assert_eq!(outcome.errors()[0].path, "value");
    }

    #[test]
    fn test_list_element_rules_see_the_enclosing_object() {
        let below_limit = rules::Rule::new("below_limit", |value: &JsonValue, scope: &RuleScope| {
            let limit = scope
                .siblings
                .and_then(|s| s.get("limit"))
                .and_then(JsonValue::as_i64)
                .unwrap_or(i64::MAX);
            match value.as_i64() {
                Some(v) if v > limit => Err(format!("{v} exceeds the declared limit {limit}")),
                _ => Ok(()),
            }
        });
        let schema = SchemaDescriptor::object("Doc")
            .field("limit", FieldSpec::integer())
            .field(
                "values",
                FieldSpec::list(FieldSpec::integer().with_rule(below_limit)),
            )
            .build();
        let ctx = ValidationContext::empty();

        let outcome = validate(&json!({"limit": 5, "values": [1, 9]}), &schema, &ctx);
        assert_eq!(outcome.errors().len(), 1);
        assert_eq!(outcome.errors()[0].path, "values.1");

        let outcome = validate(&json!({"limit": 10, "values": [1, 9]}), &schema, &ctx);
        assert!(outcome.is_valid());
    }

    #[test]
    fn test_union_variant_rules_see_the_enclosing_object() {
        let has_unit = rules::Rule::new("has_unit", |_value: &JsonValue, scope: &RuleScope| {
            match scope.siblings.and_then(|s| s.get("unit")) {
                Some(_) => Ok(()),
                None => Err("numeric values need a sibling 'unit'".to_string()),
            }
        });
        let schema = SchemaDescriptor::object("Measurement")
            .field("unit", FieldSpec::optional(FieldSpec::string()))
            .field(
                "value",
                FieldSpec::union(vec![
                    FieldSpec::integer().with_rule(has_unit),
                    FieldSpec::string(),
                ]),
            )
            .build();
        let ctx = ValidationContext::empty();

        let outcome = validate(&json!({"unit": "cm", "value": 7}), &schema, &ctx);
        assert_eq!(outcome.instance().unwrap()["value"], json!(7));

        // without the sibling, neither variant accepts the number
        let outcome = validate(&json!({"value": 7}), &schema, &ctx);
        assert!(!outcome.is_valid());
        assert!(outcome.errors()[0].message.contains("unit"));
    }

    #[test]
    fn test_collection_root() {
        let item = SchemaDescriptor::object("Item")
            .field("id", FieldSpec::integer())
            .build();
        let schema = SchemaDescriptor::list_of("Items", FieldSpec::object(item));
        let ctx = ValidationContext::empty();

        let outcome = validate(&json!([{"id": 1}, {"id": "2"}]), &schema, &ctx);
        assert_eq!(outcome.instance().unwrap(), &json!([{"id": 1}, {"id": 2}]));

        let outcome = validate(&json!([{"id": 1}, {}]), &schema, &ctx);
        assert_eq!(outcome.errors()[0].path, "1.id");
    }

    #[test]
    fn test_context_backed_rule() {
        let schema = SchemaDescriptor::object("Answer")
            .field(
                "quote",
                FieldSpec::string().with_rule(rules::substring_of("document", 1.0)),
            )
            .build();
        let ctx = ValidationContext::with("document", "the quick brown fox");

        let outcome = validate(&json!({"quote": "quick brown"}), &schema, &ctx);
        assert!(outcome.is_valid());

        let outcome = validate(&json!({"quote": "lazy dog"}), &schema, &ctx);
        assert!(!outcome.is_valid());
    }

    #[test]
    fn test_non_object_root() {
        let ctx = ValidationContext::empty();
        let outcome = validate(&json!("just text"), &person(), &ctx);
        assert!(!outcome.is_valid());
        assert!(outcome.errors()[0].message.contains("expected an object"));
    }
}
