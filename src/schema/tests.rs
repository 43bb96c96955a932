//! Schema inference tests

use super::*;
use crate::types::JsonObject;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use test_case::test_case;

fn records(values: Vec<Value>) -> Vec<JsonObject> {
    values
        .into_iter()
        .map(|v| match v {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        })
        .collect()
}

fn props(schema: &Schema) -> Vec<(String, FieldType)> {
    schema.properties().to_vec()
}

// ============================================================================
// classify
// ============================================================================

#[test_case(json!(42), FieldType::Integer ; "integer")]
#[test_case(json!(-7), FieldType::Integer ; "negative integer")]
#[test_case(json!(3.5), FieldType::Number ; "float")]
#[test_case(json!(true), FieldType::Boolean ; "boolean")]
#[test_case(json!("hello"), FieldType::String ; "plain string")]
#[test_case(json!("2024-01-15T10:30:00+0000"), FieldType::Timestamp ; "timestamp positive offset")]
#[test_case(json!("2024-01-15T10:30:00-0500"), FieldType::Timestamp ; "timestamp negative offset")]
#[test_case(json!("2024-01-15"), FieldType::String ; "date only")]
#[test_case(json!("2024-01-15T10:30:00Z"), FieldType::String ; "zulu suffix")]
#[test_case(json!("2024-01-15T10:30:00+00:00"), FieldType::String ; "colon in offset")]
#[test_case(json!("2024-01-15T10:30:00.123+0000"), FieldType::String ; "fractional seconds")]
#[test_case(json!(null), FieldType::Any ; "null")]
#[test_case(json!([]), FieldType::array(FieldType::Any) ; "empty array")]
#[test_case(json!([1, "a"]), FieldType::array(FieldType::Integer) ; "array uses first element")]
fn test_classify(value: Value, expected: FieldType) {
    assert_eq!(classify(&value), expected);
}

#[test]
fn test_classify_nested_object() {
    let value = json!({
        "name": "Jo",
        "address": {"zip": "02134", "geo": {"lat": 42.3}}
    });

    assert_eq!(
        classify(&value),
        FieldType::Object(vec![
            ("name".to_string(), FieldType::String),
            (
                "address".to_string(),
                FieldType::Object(vec![
                    ("zip".to_string(), FieldType::String),
                    (
                        "geo".to_string(),
                        FieldType::Object(vec![("lat".to_string(), FieldType::Number)])
                    ),
                ])
            ),
        ])
    );
}

// ============================================================================
// infer_schema
// ============================================================================

#[test]
fn test_empty_sample_fallback() {
    let schema = infer_schema(Vec::new(), Some("updated_at"));
    assert_eq!(
        props(&schema),
        vec![
            ("id".to_string(), FieldType::String),
            ("updated_at".to_string(), FieldType::Timestamp),
        ]
    );

    let schema = infer_schema(Vec::new(), None);
    assert_eq!(props(&schema), vec![("id".to_string(), FieldType::String)]);
}

#[test]
fn test_fallback_replication_key_named_id() {
    let schema = infer_schema(Vec::new(), Some("id"));
    assert_eq!(props(&schema), vec![("id".to_string(), FieldType::Timestamp)]);
}

#[test]
fn test_empty_first_record_fallback() {
    let schema = infer_schema(
        records(vec![json!({}), json!({"email": "a@example.com"})]),
        None,
    );
    assert_eq!(props(&schema), vec![("id".to_string(), FieldType::String)]);
}

#[test]
fn test_first_record_is_skipped() {
    let schema = infer_schema(
        records(vec![
            json!({"id": 1, "only_first": "x"}),
            json!({"id": 2, "email": "b@example.com"}),
        ]),
        None,
    );

    assert!(schema.get("only_first").is_none());
    assert_eq!(schema.names(), vec!["id", "email"]);
}

#[test]
fn test_single_record_sample_has_no_fields() {
    let schema = infer_schema(records(vec![json!({"id": 1})]), None);
    assert!(schema.is_empty());

    let schema = infer_schema(records(vec![json!({"id": 1})]), Some("updated_at"));
    assert_eq!(schema.names(), vec!["updated_at"]);
}

#[test]
fn test_first_seen_name_wins() {
    let schema = infer_schema(
        records(vec![
            json!({"id": 0}),
            json!({"id": 1, "zip": 2134}),
            json!({"id": 2, "zip": "02134"}),
        ]),
        None,
    );

    assert_eq!(schema.get("zip"), Some(&FieldType::Integer));
}

#[test]
fn test_later_records_add_new_fields_in_order() {
    let schema = infer_schema(
        records(vec![
            json!({"skipped": true}),
            json!({"id": 1, "email": "a@example.com"}),
            json!({"id": 2, "phone": "555-0100", "email": null}),
        ]),
        None,
    );

    assert_eq!(schema.names(), vec!["id", "email", "phone"]);
}

#[test]
fn test_dynamic_container_widening() {
    let schema = infer_schema(
        records(vec![
            json!({"id": 0}),
            json!({"id": 1, "fields": {"a": 1}}),
            json!({"id": 2, "fields": {"b": "x"}}),
        ]),
        None,
    );

    assert_eq!(
        props(&schema),
        vec![
            ("id".to_string(), FieldType::Integer),
            (
                "fields".to_string(),
                FieldType::Object(vec![
                    ("a".to_string(), FieldType::Integer),
                    ("b".to_string(), FieldType::String),
                ])
            ),
        ]
    );
}

#[test]
fn test_dynamic_container_last_type_wins() {
    let schema = infer_schema(
        records(vec![
            json!({"id": 0}),
            json!({"fields": {"a": 1, "b": true}}),
            json!({"fields": {"a": "one"}}),
            json!({"fields": null}),
        ]),
        None,
    );

    assert_eq!(
        schema.get("fields"),
        Some(&FieldType::Object(vec![
            ("a".to_string(), FieldType::String),
            ("b".to_string(), FieldType::Boolean),
        ]))
    );
}

#[test]
fn test_dynamic_container_keeps_single_entry_in_place() {
    let schema = infer_schema(
        records(vec![
            json!({"id": 0}),
            json!({"id": 1, "fields": {"a": 1}, "email": "a@example.com"}),
            json!({"id": 2, "fields": {"b": 2}}),
        ]),
        Some("updated_at"),
    );

    assert_eq!(schema.names(), vec!["id", "fields", "email", "updated_at"]);
}

#[test]
fn test_null_container_is_not_registered() {
    let schema = infer_schema(
        records(vec![
            json!({"id": 0}),
            json!({"fields": null}),
            json!({"fields": {"a": 1}}),
        ]),
        None,
    );

    assert_eq!(schema.get("fields"), Some(&FieldType::Any));
}

#[test]
fn test_ordinary_object_first_type_wins() {
    let schema = infer_schema(
        records(vec![
            json!({"id": 0}),
            json!({"address": {"city": "Boston"}}),
            json!({"address": {"zip": "02134"}}),
        ]),
        None,
    );

    assert_eq!(
        schema.get("address"),
        Some(&FieldType::Object(vec![(
            "city".to_string(),
            FieldType::String
        )]))
    );
}

#[test]
fn test_custom_dynamic_containers() {
    let inferrer = SchemaInferrer::new().with_dynamic_containers(["custom"]);
    assert!(inferrer.is_dynamic_container("custom"));
    assert!(!inferrer.is_dynamic_container("fields"));

    let schema = inferrer.infer(
        records(vec![
            json!({"id": 0}),
            json!({"custom": {"a": 1}, "fields": {"x": 1}}),
            json!({"custom": {"b": 2}, "fields": {"y": 2}}),
        ]),
        None,
    );

    assert_eq!(
        schema.get("custom"),
        Some(&FieldType::Object(vec![
            ("a".to_string(), FieldType::Integer),
            ("b".to_string(), FieldType::Integer),
        ]))
    );
    assert_eq!(
        schema.get("fields"),
        Some(&FieldType::Object(vec![("x".to_string(), FieldType::Integer)]))
    );
}

#[test]
fn test_empty_array_wildcard() {
    let schema = infer_schema(
        records(vec![json!({"id": 0}), json!({"tags": []}), json!({"tags": ["a"]})]),
        None,
    );

    assert_eq!(schema.get("tags"), Some(&FieldType::array(FieldType::Any)));
}

#[test]
fn test_replication_key_backstop() {
    let schema = infer_schema(
        records(vec![
            json!({"id": 0, "updated_at": "2024-01-15T10:30:00+0000"}),
            json!({"id": 1}),
        ]),
        Some("updated_at"),
    );

    assert_eq!(
        props(&schema).last(),
        Some(&("updated_at".to_string(), FieldType::Timestamp))
    );
}

#[test]
fn test_replication_key_sampled_type_is_kept() {
    let schema = infer_schema(
        records(vec![
            json!({"id": 0}),
            json!({"updated_at": "2024-01-15", "id": 1}),
        ]),
        Some("updated_at"),
    );

    assert_eq!(schema.names(), vec!["updated_at", "id"]);
    assert_eq!(schema.get("updated_at"), Some(&FieldType::String));
}

#[test]
fn test_accumulator_fold_directly() {
    let inferrer = SchemaInferrer::new();
    let mut accumulator = SchemaAccumulator::new();

    for record in records(vec![json!({"a": 1}), json!({"a": "x", "b": 2.5})]) {
        accumulator.add_record(&record, &inferrer);
    }
    let schema = accumulator.finish(None);
    assert_eq!(
        props(&schema),
        vec![
            ("a".to_string(), FieldType::Integer),
            ("b".to_string(), FieldType::Number),
        ]
    );
}

// ============================================================================
// Rendering
// ============================================================================

#[test]
fn test_field_descriptors() {
    assert_eq!(FieldType::Integer.to_json(), json!({"type": ["integer", "null"]}));
    assert_eq!(FieldType::Number.to_json(), json!({"type": ["number", "null"]}));
    assert_eq!(FieldType::String.to_json(), json!({"type": ["string", "null"]}));
    assert_eq!(FieldType::Boolean.to_json(), json!({"type": ["boolean", "null"]}));
    assert_eq!(
        FieldType::Timestamp.to_json(),
        json!({"type": ["string", "null"], "format": "date-time"})
    );
    assert_eq!(
        FieldType::Any.to_json(),
        json!({"type": ["number", "string", "object"]})
    );
    assert_eq!(
        FieldType::array(FieldType::Any).to_json(),
        json!({
            "type": ["array", "null"],
            "items": {"type": ["number", "string", "object"]}
        })
    );
}

#[test]
fn test_schema_to_json_preserves_order() {
    let schema = infer_schema(
        records(vec![
            json!({"id": 0}),
            json!({
                "zeta": 1,
                "alpha": "2024-01-15T10:30:00+0000",
                "fields": {"m": true, "b": null}
            }),
        ]),
        Some("updated_at"),
    );

    let rendered = schema.to_json_schema();
    assert_eq!(
        rendered,
        json!({
            "type": "object",
            "properties": {
                "zeta": {"type": ["integer", "null"]},
                "alpha": {"type": ["string", "null"], "format": "date-time"},
                "fields": {
                    "type": ["object", "null"],
                    "properties": {
                        "m": {"type": ["boolean", "null"]},
                        "b": {"type": ["number", "string", "object"]}
                    }
                },
                "updated_at": {"type": ["string", "null"], "format": "date-time"}
            }
        })
    );

    let keys: Vec<&String> = rendered["properties"].as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["zeta", "alpha", "fields", "updated_at"]);

    assert_eq!(serde_json::to_value(&schema).unwrap(), rendered);
}

#[test]
fn test_json_type_or_array() {
    let nullable = JsonTypeOrArray::nullable(JsonType::Integer);
    assert_eq!(nullable.to_value(), json!(["integer", "null"]));
    assert_eq!(
        JsonTypeOrArray::nullable(JsonType::Null).to_value(),
        json!("null")
    );

    let single = JsonTypeOrArray::Single(JsonType::Object);
    assert_eq!(single.to_value(), json!("object"));
    assert_eq!(JsonType::Array.to_string(), "array");
}
