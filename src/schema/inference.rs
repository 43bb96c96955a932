//! Schema inference from sampled records

use super::types::{FieldType, Schema};
use crate::types::JsonObject;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;

/// Fixed-width ISO-8601 with a numeric offset and no colon in it
static TIMESTAMP_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}[+-]\d{4}$").expect("valid timestamp pattern")
});

/// Field names whose object values are unioned across records by default
pub const DEFAULT_DYNAMIC_CONTAINERS: &[&str] = &["fields"];

/// Classify a single JSON value.
///
/// Arrays are typed by their first element; `null` and empty arrays fall
/// back to the wildcard.
pub fn classify(value: &Value) -> FieldType {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => FieldType::Integer,
        Value::Number(_) => FieldType::Number,
        Value::Bool(_) => FieldType::Boolean,
        Value::String(s) if is_timestamp(s) => FieldType::Timestamp,
        Value::String(_) => FieldType::String,
        Value::Array(items) => match items.first() {
            Some(first) => FieldType::array(classify(first)),
            None => FieldType::array(FieldType::Any),
        },
        Value::Object(map) => FieldType::Object(
            map.iter()
                .map(|(name, value)| (name.clone(), classify(value)))
                .collect(),
        ),
        Value::Null => FieldType::Any,
    }
}

/// Check a string against the strict timestamp pattern
pub fn is_timestamp(s: &str) -> bool {
    TIMESTAMP_REGEX.is_match(s)
}

/// Running state of one inference call
#[derive(Debug, Clone, Default)]
pub struct SchemaAccumulator {
    /// Top-level properties in order of first appearance
    properties: Vec<(String, FieldType)>,
    /// Names already captured
    seen_names: HashSet<String>,
    /// Container name -> sub-fields, both in order of first appearance
    dynamic_fields: Vec<(String, Vec<(String, FieldType)>)>,
}

impl SchemaAccumulator {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one record in
    pub fn add_record(&mut self, record: &JsonObject, inferrer: &SchemaInferrer) {
        for (name, value) in record {
            self.add_field(name, value, inferrer);
        }
    }

    fn add_field(&mut self, name: &str, value: &Value, inferrer: &SchemaInferrer) {
        if self.is_dynamic(name) {
            self.merge_dynamic(name, value);
            return;
        }

        if !self.seen_names.insert(name.to_string()) {
            return;
        }

        let field_type = classify(value);
        let widen = field_type.is_object() && inferrer.is_dynamic_container(name);
        self.properties.push((name.to_string(), field_type));

        if widen {
            self.dynamic_fields.push((name.to_string(), Vec::new()));
            self.merge_dynamic(name, value);
        }
    }

    fn is_dynamic(&self, name: &str) -> bool {
        self.dynamic_fields.iter().any(|(n, _)| n == name)
    }

    /// Upsert every sub-field of `value`; the last type seen wins
    fn merge_dynamic(&mut self, name: &str, value: &Value) {
        let Value::Object(map) = value else {
            return;
        };
        let Some((_, sub_fields)) = self.dynamic_fields.iter_mut().find(|(n, _)| n == name) else {
            return;
        };

        for (sub_name, sub_value) in map {
            let sub_type = classify(sub_value);
            match sub_fields.iter_mut().find(|(n, _)| n == sub_name) {
                Some((_, existing)) => *existing = sub_type,
                None => sub_fields.push((sub_name.clone(), sub_type)),
            }
        }
    }

    /// Finish the fold
    pub fn finish(mut self, replication_key: Option<&str>) -> Schema {
        // Widened containers take the slot of their first classification
        for (name, sub_fields) in self.dynamic_fields {
            let widened = FieldType::Object(sub_fields);
            match self.properties.iter_mut().find(|(n, _)| *n == name) {
                Some((_, existing)) => *existing = widened,
                None => self.properties.push((name, widened)),
            }
        }

        if let Some(key) = replication_key {
            if !self.properties.iter().any(|(n, _)| n == key) {
                self.properties.push((key.to_string(), FieldType::Timestamp));
            }
        }

        Schema::from_properties(self.properties)
    }
}

/// Schema inferrer with configuration options
#[derive(Debug, Clone)]
pub struct SchemaInferrer {
    /// Object-valued fields whose sub-keys vary per record
    dynamic_containers: HashSet<String>,
}

impl Default for SchemaInferrer {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaInferrer {
    /// Create a new schema inferrer with the default container names
    pub fn new() -> Self {
        Self {
            dynamic_containers: DEFAULT_DYNAMIC_CONTAINERS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Replace the set of dynamic-container field names
    #[must_use]
    pub fn with_dynamic_containers<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dynamic_containers = names.into_iter().map(Into::into).collect();
        self
    }

    /// Check if a field name is a dynamic container
    pub fn is_dynamic_container(&self, name: &str) -> bool {
        self.dynamic_containers.contains(name)
    }

    /// Fold a record sequence into a schema.
    ///
    /// The first record only decides whether the sample is empty; its
    /// fields are not classified.
    pub fn infer<I>(&self, records: I, replication_key: Option<&str>) -> Schema
    where
        I: IntoIterator<Item = JsonObject>,
    {
        let mut records = records.into_iter();

        match records.next() {
            Some(first) if !first.is_empty() => {}
            _ => {
                debug!("Empty sample, using fallback schema");
                return fallback_schema(replication_key);
            }
        }

        let mut accumulator = SchemaAccumulator::new();
        let mut folded = 0usize;
        for record in records {
            accumulator.add_record(&record, self);
            folded += 1;
        }

        let schema = accumulator.finish(replication_key);
        debug!(
            records = folded,
            fields = schema.len(),
            "Inferred schema from sample"
        );
        schema
    }
}

/// Schema used when the sample has nothing to look at
fn fallback_schema(replication_key: Option<&str>) -> Schema {
    let mut properties = vec![("id".to_string(), FieldType::String)];
    match replication_key {
        // A replication key named `id` overrides the default entry
        Some("id") => properties[0].1 = FieldType::Timestamp,
        Some(key) => properties.push((key.to_string(), FieldType::Timestamp)),
        None => {}
    }
    Schema::from_properties(properties)
}

/// Infer a schema with the default settings
pub fn infer_schema<I>(records: I, replication_key: Option<&str>) -> Schema
where
    I: IntoIterator<Item = JsonObject>,
{
    SchemaInferrer::new().infer(records, replication_key)
}
