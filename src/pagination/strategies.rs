//! Pagination strategy implementations

use super::types::{NextPage, PaginationState, Paginator};
use crate::decode::extract_path_string;
use serde_json::Value;

/// Where ActionKit puts the link to the following page
pub const DEFAULT_NEXT_PAGE_PATH: &str = "meta.next";

// ============================================================================
// Next URL Pagination
// ============================================================================

/// Follows a next-page link found in the response body
#[derive(Debug, Clone)]
pub struct NextUrlPaginator {
    /// Dot path to the next URL in the response
    pub path: String,
}

impl NextUrlPaginator {
    /// Create a new next URL paginator
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for NextUrlPaginator {
    fn default() -> Self {
        Self::new(DEFAULT_NEXT_PAGE_PATH)
    }
}

impl Paginator for NextUrlPaginator {
    fn process_response(
        &self,
        body: &Value,
        records_count: usize,
        state: &mut PaginationState,
    ) -> NextPage {
        state.add_fetched(records_count as u64);

        match extract_path_string(body, &self.path) {
            // An empty page with a link would loop forever on a misbehaving API
            Some(next_url) if !next_url.is_empty() && records_count > 0 => {
                state.advance(next_url.clone());
                NextPage::with_url(next_url)
            }
            _ => {
                state.mark_done();
                NextPage::Done
            }
        }
    }
}
