//! Connector trait and the ActionKit connector
//!
//! Defines the Connector trait with the four protocol operations and
//! implements it for ActionKit on top of the sampler, schema inference
//! and the sync engine.

use crate::config::{Catalog, CatalogStream, ConfiguredCatalog, TapConfig};
use crate::engine::{Message, SyncConfig, SyncEngine};
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::sampler::Sampler;
use crate::schema::{Schema, SchemaInferrer};
use crate::state::{State, StateManager};
use crate::streams::{builtin_streams, find_stream, StreamDefinition};
use crate::types::SyncMode;
use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, info, warn};

// ============================================================================
// Connector Spec
// ============================================================================

/// Connector specification returned by spec()
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorSpec {
    /// Connector name
    pub name: String,

    /// Human-readable title
    pub title: String,

    /// Description
    pub description: Option<String>,

    /// JSON Schema of the configuration document
    pub connection_specification: Value,
}

// ============================================================================
// Check Result
// ============================================================================

/// Result of a connection check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    /// Whether the check succeeded
    pub success: bool,

    /// Error message if failed
    pub message: Option<String>,
}

impl CheckResult {
    /// Create a successful check result
    pub fn success() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    /// Create a failed check result
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

// ============================================================================
// Connector Trait
// ============================================================================

/// Type alias for the message stream returned by read()
pub type MessageStream = Pin<Box<dyn Stream<Item = Result<Message>> + Send>>;

/// Core trait that all connectors implement
#[async_trait]
pub trait Connector: Send + Sync {
    /// Returns the connector specification
    fn spec(&self) -> ConnectorSpec;

    /// Tests if credentials and configuration are valid
    async fn check(&self, config: &Value) -> Result<CheckResult>;

    /// Lists available streams with their inferred schemas
    async fn discover(&self, config: &Value) -> Result<Catalog>;

    /// Reads data from selected streams
    ///
    /// Returns a stream of messages (records, state checkpoints, logs)
    async fn read(
        &self,
        config: &Value,
        catalog: &ConfiguredCatalog,
        state: Option<&State>,
    ) -> Result<MessageStream>;
}

// ============================================================================
// ActionKit Connector
// ============================================================================

/// Connector for the ActionKit REST API
#[derive(Debug, Clone)]
pub struct ActionKitConnector {
    streams: Vec<StreamDefinition>,
    inferrer: SchemaInferrer,
    /// Per-stream record cap for reads (0 = unlimited)
    max_records: usize,
}

impl Default for ActionKitConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionKitConnector {
    /// Connector with the built-in streams
    pub fn new() -> Self {
        Self {
            streams: builtin_streams(),
            inferrer: SchemaInferrer::new(),
            max_records: 0,
        }
    }

    /// Stop each stream after `max` records
    #[must_use]
    pub fn with_max_records(mut self, max: usize) -> Self {
        self.max_records = max;
        self
    }

    /// Use a custom schema inferrer for discovery
    #[must_use]
    pub fn with_inferrer(mut self, inferrer: SchemaInferrer) -> Self {
        self.inferrer = inferrer;
        self
    }

    /// Streams this connector exposes
    pub fn streams(&self) -> &[StreamDefinition] {
        &self.streams
    }

    /// Catalog of the exposed streams without sampling
    pub fn static_catalog(&self) -> Catalog {
        let empty = Schema::default();
        Catalog {
            streams: self
                .streams
                .iter()
                .map(|s| CatalogStream::from_definition(s, &empty))
                .collect(),
        }
    }

    /// Parse and validate a configuration document
    pub fn parse_config(config: &Value) -> Result<TapConfig> {
        let config: TapConfig = serde_json::from_value(config.clone())?;
        config.validate()?;
        Ok(config)
    }

    /// Build an authenticated client for a validated config
    pub fn client(config: &TapConfig) -> Result<HttpClient> {
        HttpClient::with_auth(config.http_client_config()?, config.auth()?)
    }

    /// Sample one page of `stream` and infer its catalog entry
    pub async fn discover_stream(
        &self,
        client: &HttpClient,
        config: &TapConfig,
        stream: &StreamDefinition,
    ) -> Result<CatalogStream> {
        let records = Sampler::new(client, stream)
            .with_page_size(config.page_size)
            .sample()
            .await?;
        let schema = self
            .inferrer
            .infer(records, stream.replication_key.as_deref());

        debug!(stream = %stream.name, fields = ?schema.names(), "Discovered stream");
        Ok(CatalogStream::from_definition(stream, &schema))
    }
}

/// Configuration document schema
fn connection_specification() -> Value {
    json!({
        "type": "object",
        "required": ["hostname", "username", "password"],
        "properties": {
            "hostname": {
                "type": "string",
                "description": "The ActionKit instance hostname"
            },
            "username": {
                "type": "string",
                "description": "API username for authentication"
            },
            "password": {
                "type": "string",
                "description": "API password for authentication",
                "secret": true
            },
            "start_date": {
                "type": "string",
                "format": "date-time",
                "description": "Earliest updated_at to sync when no bookmark exists"
            },
            "page_size": {
                "type": "integer",
                "minimum": 1,
                "default": 100,
                "description": "Records per request"
            },
            "requests_per_second": {
                "type": "integer",
                "minimum": 0,
                "description": "Client-side request budget (0 disables it)"
            }
        }
    })
}

#[async_trait]
impl Connector for ActionKitConnector {
    fn spec(&self) -> ConnectorSpec {
        ConnectorSpec {
            name: crate::NAME.to_string(),
            title: "ActionKit".to_string(),
            description: Some("Users and contacts from the ActionKit REST API".to_string()),
            connection_specification: connection_specification(),
        }
    }

    async fn check(&self, config: &Value) -> Result<CheckResult> {
        let config = match Self::parse_config(config) {
            Ok(config) => config,
            Err(e) => return Ok(CheckResult::failure(e.to_string())),
        };
        let Some(stream) = self.streams.first() else {
            return Ok(CheckResult::failure("No streams configured"));
        };

        let client = Self::client(&config)?;
        let result = Sampler::new(&client, stream)
            .with_page_size(1)
            .fetch_first_page()
            .await;

        Ok(match result {
            Ok(_) => CheckResult::success(),
            Err(e) => {
                warn!("Connection check failed: {e}");
                CheckResult::failure(e.to_string())
            }
        })
    }

    async fn discover(&self, config: &Value) -> Result<Catalog> {
        let config = Self::parse_config(config)?;
        let client = Self::client(&config)?;

        let mut streams = Vec::with_capacity(self.streams.len());
        for stream in &self.streams {
            streams.push(self.discover_stream(&client, &config, stream).await?);
        }

        info!(streams = streams.len(), "Discovery complete");
        Ok(Catalog { streams })
    }

    async fn read(
        &self,
        config: &Value,
        catalog: &ConfiguredCatalog,
        state: Option<&State>,
    ) -> Result<MessageStream> {
        let config = Self::parse_config(config)?;
        let client = Arc::new(Self::client(&config)?);

        let mut selected = Vec::with_capacity(catalog.streams.len());
        for configured in &catalog.streams {
            let stream = find_stream(&configured.stream.name)?;
            let mode = match configured.sync_mode {
                SyncMode::Incremental if !stream.is_incremental() => {
                    warn!(stream = %stream.name, "Stream has no replication key, using full refresh");
                    SyncMode::FullRefresh
                }
                mode => mode,
            };
            selected.push((stream, mode));
        }

        let sync_config = SyncConfig::new()
            .with_page_size(config.page_size)
            .with_max_records(self.max_records)
            .with_start_date(config.start_date()?);
        let state = StateManager::from_state(state.cloned().unwrap_or_default());
        let mut engine = SyncEngine::new(client, state).with_config(sync_config);

        let (tx, rx) = futures::channel::mpsc::unbounded::<Result<Message>>();
        tokio::spawn(async move {
            for (stream, mode) in selected {
                let result = engine
                    .sync_stream_into(&stream, mode, &mut |message| {
                        // A dropped receiver means nobody is reading any more
                        let _ = tx.unbounded_send(Ok(message));
                    })
                    .await;

                if let Err(e) = result {
                    let _ = tx.unbounded_send(Err(e));
                    return;
                }
            }
        });

        Ok(Box::pin(rx))
    }
}

/// Build a configured catalog selecting `names` (all streams when empty)
pub fn select_streams(catalog: &Catalog, names: &[String]) -> Result<ConfiguredCatalog> {
    use crate::config::ConfiguredStream;

    for name in names {
        if !catalog.streams.iter().any(|s| &s.name == name) {
            return Err(Error::StreamNotFound {
                stream: name.clone(),
            });
        }
    }

    let streams = catalog
        .streams
        .iter()
        .filter(|s| names.is_empty() || names.contains(&s.name))
        .map(|s| ConfiguredStream {
            stream: s.clone(),
            sync_mode: s
                .supported_sync_modes
                .iter()
                .copied()
                .find(|m| *m == SyncMode::Incremental)
                .unwrap_or_default(),
            cursor_field: s.default_cursor_field.clone(),
        })
        .collect();

    Ok(ConfiguredCatalog { streams })
}
