//! Response decoder module
//!
//! ActionKit answers list requests with a JSON envelope:
//!
//! ```json
//! { "meta": { "next": "/rest/v1/user/?_limit=100&_offset=100" },
//!   "objects": [ { "id": 1, ... } ] }
//! ```
//!
//! The decoder extracts the records from the envelope using a configured path.

mod decoders;
mod types;

pub use decoders::{extract_path, extract_path_string, JsonDecoder, DEFAULT_RECORDS_PATH};
pub use types::RecordDecoder;
