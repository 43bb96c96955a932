//! Execution engine module
//!
//! Main read loop for one stream.
//!
//! # Overview
//!
//! The engine module provides:
//! - `SyncEngine` - Pages through a stream, filters on the bookmark, emits messages
//! - `SyncConfig` - Page size, record cap and start date
//! - Message types for output (Record, State, Log)

mod types;

pub use types::{Message, SyncConfig, SyncStats};

use crate::decode::RecordDecoder;
use crate::error::Result;
use crate::http::{HttpClient, RequestConfig};
use crate::pagination::{resolve_next_url, NextPage, PaginationState, Paginator};
use crate::state::{StateManager, StreamState};
use crate::streams::StreamDefinition;
use crate::types::{parse_datetime, SyncMode};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Sync engine for orchestrating data extraction
pub struct SyncEngine {
    /// HTTP client
    client: Arc<HttpClient>,
    /// State manager
    state: StateManager,
    /// Sync configuration
    config: SyncConfig,
    /// Statistics
    stats: SyncStats,
}

/// Highest replication value seen so far, raw and parsed
type Bookmark = Option<(DateTime<Utc>, String)>;

impl SyncEngine {
    /// Create a new sync engine
    pub fn new(client: Arc<HttpClient>, state: StateManager) -> Self {
        Self {
            client,
            state,
            config: SyncConfig::default(),
            stats: SyncStats::default(),
        }
    }

    /// Set sync configuration
    #[must_use]
    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the state manager
    pub fn state(&self) -> &StateManager {
        &self.state
    }

    /// Get statistics
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// Sync a stream and collect every message
    pub async fn sync_stream(
        &mut self,
        stream: &StreamDefinition,
        mode: SyncMode,
    ) -> Result<Vec<Message>> {
        let mut messages = Vec::new();
        self.sync_stream_into(stream, mode, &mut |message| messages.push(message))
            .await?;
        Ok(messages)
    }

    /// Sync a stream, handing each message to `emit` as soon as it exists
    pub async fn sync_stream_into(
        &mut self,
        stream: &StreamDefinition,
        mode: SyncMode,
        emit: &mut (dyn FnMut(Message) + Send),
    ) -> Result<()> {
        let start = Instant::now();
        let name = stream.name.as_str();
        let replication_key = stream.replication_key.as_deref();

        emit(Message::info(format!("Starting sync for stream: {name}")));

        let stored_cursor = self.state.get_cursor(name).await;
        let lower_bound = match (mode, replication_key) {
            (SyncMode::Incremental, Some(_)) => stored_cursor
                .as_deref()
                .and_then(parse_datetime)
                .or(self.config.start_date),
            _ => None,
        };
        if let Some(bound) = lower_bound {
            info!(stream = name, %bound, "Reading records updated since bookmark");
        }

        let decoder = stream.decoder();
        let paginator = stream.paginator();
        let mut pagination_state = PaginationState::new();
        let mut url = self.client.build_url(&stream.path);
        let mut request = stream.request_config(self.config.page_size);
        let mut max_seen: Bookmark = None;
        let mut emitted = 0usize;
        let mut pages = 0usize;

        'pages: loop {
            let body = self.client.get_json(&url, request).await?;
            self.stats.add_page();
            pages += 1;

            let records = decoder.decode_value(&body)?;
            let record_count = records.len();
            debug!(stream = name, page = pages, records = record_count, "Fetched page");

            for record in records {
                if !record.is_object() {
                    warn!(stream = name, value = %record, "Skipping non-object record");
                    continue;
                }

                if let Some(key) = replication_key {
                    let value = record_timestamp(&record, key);
                    if let (Some(bound), Some((ts, _))) = (lower_bound, &value) {
                        if *ts < bound {
                            self.stats.records_filtered += 1;
                            continue;
                        }
                    }
                    if let Some((ts, raw)) = value {
                        if max_seen.as_ref().map_or(true, |(max, _)| ts > *max) {
                            max_seen = Some((ts, raw));
                        }
                    }
                }

                emit(Message::record(name, record));
                emitted += 1;
                self.stats.records_synced += 1;

                if self.config.limit_reached(emitted) {
                    debug!(stream = name, max_records = self.config.max_records, "Record cap reached");
                    break 'pages;
                }
            }

            match paginator.process_response(&body, record_count, &mut pagination_state) {
                NextPage::Url(next) => {
                    url = resolve_next_url(&url, &next)?;
                    // The next link already carries its query string
                    request = RequestConfig::new();
                }
                NextPage::Done => break,
            }
        }

        if replication_key.is_some() {
            let stored: Bookmark =
                stored_cursor.and_then(|raw| parse_datetime(&raw).map(|ts| (ts, raw)));
            // The bookmark never moves backwards, even on a full refresh
            let cursor = match (max_seen, stored) {
                (Some(seen), Some(stored)) if stored.0 > seen.0 => Some(stored),
                (Some(seen), _) => Some(seen),
                (None, stored) => stored,
            };
            if let Some((_, cursor)) = cursor {
                self.state.set_cursor(name, cursor.clone()).await?;
                emit(Message::state(
                    name,
                    StreamState::with_cursor(cursor).to_message_data(),
                ));
            }
        }

        self.stats.add_stream();
        #[allow(clippy::cast_possible_truncation)]
        self.stats.set_duration(start.elapsed().as_millis() as u64);

        info!(
            stream = name,
            records = emitted,
            pages,
            "Completed sync"
        );
        emit(Message::info(format!(
            "Completed sync for {name}: {emitted} records"
        )));

        Ok(())
    }

    /// Reset statistics
    pub fn reset_stats(&mut self) {
        self.stats = SyncStats::default();
    }
}

/// Replication value of a record, when present and parseable
fn record_timestamp(record: &Value, key: &str) -> Option<(DateTime<Utc>, String)> {
    let raw = record.get(key)?.as_str()?;
    parse_datetime(raw).map(|ts| (ts, raw.to_string()))
}

#[cfg(test)]
mod tests;
