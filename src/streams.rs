//! Built-in ActionKit streams
//!
//! Each stream is a REST collection under `/rest/v1/`. Both built-in
//! streams read the `user` collection; `users` is bookmarked on
//! `updated_at`, `contacts` is always a full refresh.

use crate::decode::{JsonDecoder, DEFAULT_RECORDS_PATH};
use crate::error::{Error, Result};
use crate::http::RequestConfig;
use crate::pagination::{NextUrlPaginator, DEFAULT_NEXT_PAGE_PATH};
use crate::types::SyncMode;

/// Static description of one stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDefinition {
    /// Stream name as it appears in the catalog
    pub name: String,
    /// Collection path relative to the base URL
    pub path: String,
    /// Primary key fields
    pub primary_keys: Vec<String>,
    /// Field used for bookmarks and ordering
    pub replication_key: Option<String>,
    /// JSONPath to the records in a response
    pub records_path: String,
    /// Dot path to the next-page link in a response
    pub next_page_path: String,
}

impl StreamDefinition {
    /// Create a stream with the ActionKit response layout
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            primary_keys: Vec::new(),
            replication_key: None,
            records_path: DEFAULT_RECORDS_PATH.to_string(),
            next_page_path: DEFAULT_NEXT_PAGE_PATH.to_string(),
        }
    }

    /// Set the primary key fields
    #[must_use]
    pub fn with_primary_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Set the replication key
    #[must_use]
    pub fn with_replication_key(mut self, key: impl Into<String>) -> Self {
        self.replication_key = Some(key.into());
        self
    }

    /// `users`: the user collection, bookmarked on `updated_at`
    pub fn users() -> Self {
        Self::new("users", "user/")
            .with_primary_keys(["id"])
            .with_replication_key("updated_at")
    }

    /// `contacts`: the user collection without a bookmark
    pub fn contacts() -> Self {
        Self::new("contacts", "user/").with_primary_keys(["id"])
    }

    /// Query parameters for the first page
    pub fn request_config(&self, page_size: u32) -> RequestConfig {
        let mut config = RequestConfig::new()
            .query("_limit", page_size.to_string())
            .query("format", "json");

        if let Some(key) = &self.replication_key {
            config = config.query("order_by", key.clone());
        }

        config
    }

    /// Decoder for this stream's responses
    pub fn decoder(&self) -> JsonDecoder {
        JsonDecoder::with_path(self.records_path.clone())
    }

    /// Paginator for this stream's responses
    pub fn paginator(&self) -> NextUrlPaginator {
        NextUrlPaginator::new(self.next_page_path.clone())
    }

    /// Check if the stream can be read incrementally
    pub fn is_incremental(&self) -> bool {
        self.replication_key.is_some()
    }

    /// Sync modes the catalog advertises
    pub fn supported_sync_modes(&self) -> Vec<SyncMode> {
        if self.is_incremental() {
            vec![SyncMode::FullRefresh, SyncMode::Incremental]
        } else {
            vec![SyncMode::FullRefresh]
        }
    }
}

/// All streams the tap knows about, in catalog order
pub fn builtin_streams() -> Vec<StreamDefinition> {
    vec![StreamDefinition::users(), StreamDefinition::contacts()]
}

/// Look up a built-in stream by name
pub fn find_stream(name: &str) -> Result<StreamDefinition> {
    builtin_streams()
        .into_iter()
        .find(|s| s.name == name)
        .ok_or_else(|| Error::StreamNotFound {
            stream: name.to_string(),
        })
}
