//! Pagination module
//!
//! ActionKit paginates with a next-page link in `meta.next`. The sampler
//! only ever reads the first page; a full read follows the links with
//! `NextUrlPaginator` until the API stops returning one.

mod strategies;
mod types;

pub use strategies::{NextUrlPaginator, DEFAULT_NEXT_PAGE_PATH};
pub use types::{resolve_next_url, NextPage, PaginationState, Paginator};
