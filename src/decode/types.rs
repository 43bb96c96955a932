//! Decoder trait

use crate::error::{Error, Result};
use serde_json::Value;

/// Trait for decoding response bodies into records
pub trait RecordDecoder: Send + Sync {
    /// Extract the list of records from an already parsed body
    fn decode_value(&self, body: &Value) -> Result<Vec<Value>>;

    /// Parse a raw body and extract its records
    fn decode(&self, body: &str) -> Result<Vec<Value>> {
        let value = self.decode_raw(body)?;
        self.decode_value(&value)
    }

    /// Parse a raw body into a single JSON value (full response)
    fn decode_raw(&self, body: &str) -> Result<Value> {
        serde_json::from_str(body).map_err(|e| Error::decode(format!("Failed to parse JSON: {e}")))
    }
}
