//! One-page record sampler
//!
//! Discovery looks at a single page of a stream: one GET with the stream's
//! first-page parameters, no pagination. Retries live in the HTTP client;
//! anything that still fails comes back as a transport error.

use crate::decode::RecordDecoder;
use crate::error::Result;
use crate::http::HttpClient;
use crate::streams::StreamDefinition;
use crate::types::{JsonObject, JsonValue};
use reqwest::StatusCode;
use tracing::{debug, warn};

/// Default number of records to sample
pub const DEFAULT_SAMPLE_SIZE: u32 = 100;

/// Fetches the first page of a stream
pub struct Sampler<'a> {
    client: &'a HttpClient,
    stream: &'a StreamDefinition,
    page_size: u32,
}

impl<'a> Sampler<'a> {
    /// Create a sampler for `stream`
    pub fn new(client: &'a HttpClient, stream: &'a StreamDefinition) -> Self {
        Self {
            client,
            stream,
            page_size: DEFAULT_SAMPLE_SIZE,
        }
    }

    /// Set the page size (`_limit`)
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Issue the first-page request and return the status and parsed body
    pub async fn fetch_first_page(&self) -> Result<(StatusCode, JsonValue)> {
        let config = self.stream.request_config(self.page_size);
        debug!(
            stream = %self.stream.name,
            path = %self.stream.path,
            limit = self.page_size,
            "Sampling first page"
        );
        self.client.get_json_with_status(&self.stream.path, config).await
    }

    /// Fetch the first page and expose its records
    pub async fn sample(&self) -> Result<Records> {
        let (status, body) = self.fetch_first_page().await?;
        let values = self.stream.decoder().decode_value(&body)?;

        debug!(
            stream = %self.stream.name,
            status = status.as_u16(),
            records = values.len(),
            "Sampled records"
        );

        Ok(Records::new(self.stream.name.clone(), values))
    }
}

/// Records from one sampled page.
///
/// Elements that are not JSON objects are dropped with a warning, except
/// the first one: it comes out as an empty record so the page still starts
/// with the element the API put there.
#[derive(Debug)]
pub struct Records {
    stream: String,
    values: std::vec::IntoIter<JsonValue>,
    started: bool,
    skipped: usize,
}

impl Records {
    /// Wrap decoded values
    pub fn new(stream: impl Into<String>, values: Vec<JsonValue>) -> Self {
        Self {
            stream: stream.into(),
            values: values.into_iter(),
            started: false,
            skipped: 0,
        }
    }

    /// Elements dropped so far because they were not objects
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl Iterator for Records {
    type Item = JsonObject;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let first = !self.started;
            self.started = true;

            match self.values.next()? {
                JsonValue::Object(record) => return Some(record),
                other if first => {
                    warn!(stream = %self.stream, value = %other, "First record is not an object");
                    return Some(JsonObject::new());
                }
                other => {
                    self.skipped += 1;
                    warn!(stream = %self.stream, value = %other, "Skipping non-object record");
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.values.size_hint().1)
    }
}
