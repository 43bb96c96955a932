//! Schema types

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// JSON Schema type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
    Null,
}

impl JsonType {
    /// Name used in JSON Schema documents
    pub fn as_str(&self) -> &'static str {
        match self {
            JsonType::String => "string",
            JsonType::Number => "number",
            JsonType::Integer => "integer",
            JsonType::Boolean => "boolean",
            JsonType::Object => "object",
            JsonType::Array => "array",
            JsonType::Null => "null",
        }
    }
}

impl std::fmt::Display for JsonType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JSON type can be a single type or array of types (for nullable)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonTypeOrArray {
    Single(JsonType),
    Multiple(Vec<JsonType>),
}

impl JsonTypeOrArray {
    /// Create a nullable type
    pub fn nullable(t: JsonType) -> Self {
        if t == JsonType::Null {
            JsonTypeOrArray::Single(JsonType::Null)
        } else {
            JsonTypeOrArray::Multiple(vec![t, JsonType::Null])
        }
    }

    /// Render as the value of a `"type"` keyword
    pub fn to_value(&self) -> Value {
        match self {
            JsonTypeOrArray::Single(t) => Value::from(t.as_str()),
            JsonTypeOrArray::Multiple(types) => {
                Value::Array(types.iter().map(|t| Value::from(t.as_str())).collect())
            }
        }
    }
}

/// Inferred type of one field
///
/// Every concrete type renders as nullable. `Any` is the wildcard used for
/// nulls, empty arrays and anything else that cannot be pinned down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Integer,
    Number,
    String,
    /// String in `YYYY-MM-DDTHH:MM:SS±HHMM` form
    Timestamp,
    Boolean,
    /// Element type taken from the first element only
    Array(Box<FieldType>),
    /// Sub-fields in order of first appearance
    Object(Vec<(String, FieldType)>),
    Any,
}

impl FieldType {
    /// Array of the given element type
    pub fn array(items: FieldType) -> Self {
        FieldType::Array(Box::new(items))
    }

    /// The `"type"` keyword for this field
    pub fn json_type(&self) -> JsonTypeOrArray {
        match self {
            FieldType::Integer => JsonTypeOrArray::nullable(JsonType::Integer),
            FieldType::Number => JsonTypeOrArray::nullable(JsonType::Number),
            FieldType::String | FieldType::Timestamp => {
                JsonTypeOrArray::nullable(JsonType::String)
            }
            FieldType::Boolean => JsonTypeOrArray::nullable(JsonType::Boolean),
            FieldType::Array(_) => JsonTypeOrArray::nullable(JsonType::Array),
            FieldType::Object(_) => JsonTypeOrArray::nullable(JsonType::Object),
            FieldType::Any => JsonTypeOrArray::Multiple(vec![
                JsonType::Number,
                JsonType::String,
                JsonType::Object,
            ]),
        }
    }

    /// Format hint, if any
    pub fn format(&self) -> Option<&'static str> {
        match self {
            FieldType::Timestamp => Some("date-time"),
            _ => None,
        }
    }

    /// Check if this is an object type
    pub fn is_object(&self) -> bool {
        matches!(self, FieldType::Object(_))
    }

    /// Render as a JSON Schema property descriptor
    pub fn to_json(&self) -> Value {
        let mut descriptor = Map::new();
        descriptor.insert("type".to_string(), self.json_type().to_value());

        if let Some(format) = self.format() {
            descriptor.insert("format".to_string(), Value::from(format));
        }

        match self {
            FieldType::Array(items) => {
                descriptor.insert("items".to_string(), items.to_json());
            }
            FieldType::Object(properties) => {
                descriptor.insert("properties".to_string(), properties_to_json(properties));
            }
            _ => {}
        }

        Value::Object(descriptor)
    }
}

impl Serialize for FieldType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

fn properties_to_json(properties: &[(String, FieldType)]) -> Value {
    Value::Object(
        properties
            .iter()
            .map(|(name, field_type)| (name.clone(), field_type.to_json()))
            .collect(),
    )
}

/// Inferred schema for one stream: ordered, one entry per field name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    properties: Vec<(String, FieldType)>,
}

impl Schema {
    /// Build a schema from already de-duplicated properties
    pub(crate) fn from_properties(properties: Vec<(String, FieldType)>) -> Self {
        Self { properties }
    }

    /// Properties in schema order
    pub fn properties(&self) -> &[(String, FieldType)] {
        &self.properties
    }

    /// Type of a top-level field
    pub fn get(&self, name: &str) -> Option<&FieldType> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t)
    }

    /// Field names in schema order
    pub fn names(&self) -> Vec<&str> {
        self.properties.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Number of top-level fields
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Check if the schema has no fields
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Render as a JSON Schema document
    pub fn to_json_schema(&self) -> Value {
        let mut document = Map::new();
        document.insert("type".to_string(), Value::from(JsonType::Object.as_str()));
        document.insert("properties".to_string(), properties_to_json(&self.properties));
        Value::Object(document)
    }

    /// Convert to pretty JSON string
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(&self.to_json_schema()).unwrap_or_default()
    }
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json_schema().serialize(serializer)
    }
}
