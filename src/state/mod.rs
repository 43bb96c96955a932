//! State management module
//!
//! Bookmarks for incremental reads. A stream's cursor is the highest
//! replication-key value emitted so far; the next run skips anything
//! older.

mod manager;
mod types;

pub use manager::StateManager;
pub use types::{State, StreamState};
