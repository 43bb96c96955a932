//! Pagination types and traits

use crate::error::Result;
use serde_json::Value;
use url::Url;

/// Result of the next page computation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    /// Fetch this link next; it already carries its query string
    Url(String),
    /// No more pages
    Done,
}

impl NextPage {
    /// Create a continuation with a new URL
    pub fn with_url(url: impl Into<String>) -> Self {
        Self::Url(url.into())
    }

    /// Check if this is a done result
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

/// Tracks pagination state during iteration
#[derive(Debug, Clone, Default)]
pub struct PaginationState {
    /// Pages fetched so far
    pub page: u32,
    /// Total records fetched so far
    pub total_fetched: u64,
    /// Next-page token taken from the last response
    pub next_token: Option<String>,
    /// Is pagination complete?
    pub done: bool,
}

impl PaginationState {
    /// Create a new pagination state (first page, no token)
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark pagination as complete
    pub fn mark_done(&mut self) {
        self.done = true;
        self.next_token = None;
    }

    /// Advance to the page behind `token`
    pub fn advance(&mut self, token: String) {
        self.page += 1;
        self.next_token = Some(token);
    }

    /// Add to total fetched
    pub fn add_fetched(&mut self, count: u64) {
        self.total_fetched += count;
    }
}

/// Core trait for pagination strategies
pub trait Paginator: Send + Sync {
    /// Process a response and determine if there's a next page
    fn process_response(
        &self,
        body: &Value,
        records_count: usize,
        state: &mut PaginationState,
    ) -> NextPage;
}

/// Resolve a next-page link against the URL that produced it.
///
/// ActionKit returns host-relative links (`/rest/v1/user/?_offset=100`);
/// absolute links pass through unchanged.
pub fn resolve_next_url(current: &str, next: &str) -> Result<String> {
    let base = Url::parse(current)?;
    Ok(base.join(next)?.to_string())
}
