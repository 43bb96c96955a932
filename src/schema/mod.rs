//! Schema inference module
//!
//! Folds one sampled page of records into an ordered schema.
//!
//! # Rules
//!
//! - The first record only guards against an empty sample; it is not classified
//! - A top-level field keeps the type of its first occurrence
//! - Dynamic containers (`fields` by default) are unioned across records,
//!   with the last type seen for each sub-field winning
//! - The replication key is always present, as a timestamp if never sampled

mod inference;
mod types;

pub use inference::{
    classify, infer_schema, is_timestamp, SchemaAccumulator, SchemaInferrer,
    DEFAULT_DYNAMIC_CONTAINERS,
};
pub use types::{FieldType, JsonType, JsonTypeOrArray, Schema};

#[cfg(test)]
mod tests;
