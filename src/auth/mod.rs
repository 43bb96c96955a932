//! Authentication module
//!
//! ActionKit's REST API uses HTTP Basic authentication. The `Authenticator`
//! turns a validated `AuthConfig` into the `Authorization` header.

mod authenticator;
mod types;

pub use authenticator::{basic_header_value, Authenticator};
pub use types::AuthConfig;
