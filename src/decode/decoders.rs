//! JSON decoder and path helpers

use super::types::RecordDecoder;
use crate::error::{Error, Result};
use serde_json::Value;

/// Where ActionKit list endpoints keep their records
pub const DEFAULT_RECORDS_PATH: &str = "$.objects[*]";

/// JSON decoder extracting records at a path
#[derive(Debug, Clone)]
pub struct JsonDecoder {
    /// JSONPath (`$.objects[*]`) or dotted path (`data.items`) to the records
    record_path: String,
}

impl JsonDecoder {
    /// Create a JSON decoder with a record path
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            record_path: path.into(),
        }
    }

    /// The configured record path
    pub fn record_path(&self) -> &str {
        &self.record_path
    }
}

impl RecordDecoder for JsonDecoder {
    fn decode_value(&self, value: &Value) -> Result<Vec<Value>> {
        let path = self.record_path.as_str();

        // Wildcards go through jsonpath-rust, plain dotted paths do not
        if path.contains('*') {
            return extract_with_jsonpath(value, path);
        }

        match extract_path(value, path) {
            Some(Value::Array(arr)) => Ok(arr.clone()),
            Some(Value::Null) | None => Ok(vec![]),
            Some(v) => Ok(vec![v.clone()]),
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Follow a dot-notation path (`meta.next`, `$.meta.next`) through objects
pub fn extract_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let path = path.strip_prefix("$.").unwrap_or(path);
    path.split('.')
        .filter(|part| !part.is_empty())
        .try_fold(value, |current, part| current.get(part))
}

/// Follow a dot-notation path and render scalars as a string
pub fn extract_path_string(value: &Value, path: &str) -> Option<String> {
    match extract_path(value, path)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Extract records using jsonpath-rust
fn extract_with_jsonpath(value: &Value, path: &str) -> Result<Vec<Value>> {
    use jsonpath_rust::JsonPath;

    let jp = JsonPath::try_from(path).map_err(|e| Error::RecordExtraction {
        path: path.to_string(),
        message: format!("Invalid JSONPath: {e}"),
    })?;

    match jp.find(value) {
        Value::Array(arr) => Ok(arr),
        Value::Null => Ok(vec![]),
        other => Ok(vec![other]),
    }
}
