//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::TapConfig;
use crate::connector::{select_streams, ActionKitConnector, Connector};
use crate::engine::Message;
use crate::error::{Error, Result};
use crate::state::StateManager;
use futures::StreamExt;
use serde_json::{json, Value};
use std::time::Instant;
use tracing::info;

const DOCUMENTATION_URL: &str = "https://roboticdogs.actionkit.com/docs/manual/api/rest/";

/// CLI runner
pub struct Runner {
    cli: Cli,
    connector: ActionKitConnector,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self {
            cli,
            connector: ActionKitConnector::new(),
        }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Spec => self.spec(),
            Commands::Check => self.check().await,
            Commands::Discover => self.discover().await,
            Commands::Read {
                streams,
                max_records,
            } => self.read(streams.as_deref(), *max_records).await,
            Commands::Streams => self.streams(),
        }
    }

    /// Load configuration
    fn load_config(&self) -> Result<Value> {
        // Inline config takes precedence
        if let Some(json_str) = &self.cli.config_json {
            return serde_json::from_str(json_str)
                .map_err(|e| Error::config(format!("Invalid config JSON: {e}")));
        }

        if let Some(path) = &self.cli.config {
            let config = TapConfig::from_file(path)?;
            return Ok(serde_json::to_value(config)?);
        }

        // Empty config; the connector reports what is missing
        Ok(json!({}))
    }

    /// Load state
    fn load_state(&self) -> Result<StateManager> {
        // Inline state takes precedence
        if let Some(state_json) = &self.cli.state_json {
            StateManager::from_json(state_json)
        } else if let Some(path) = &self.cli.state {
            StateManager::from_file(path)
        } else {
            Ok(StateManager::in_memory())
        }
    }

    /// Show spec
    fn spec(&self) -> Result<()> {
        let spec = self.connector.spec();

        self.output_message(&json!({
            "type": "SPEC",
            "spec": {
                "documentationUrl": DOCUMENTATION_URL,
                "connectionSpecification": spec.connection_specification
            }
        }));

        Ok(())
    }

    /// Check connection
    async fn check(&self) -> Result<()> {
        let config = self.load_config()?;

        self.output_message(&log_message("INFO", "Checking connection to ActionKit"));

        let result = self.connector.check(&config).await?;
        let status = if result.success {
            json!({"status": "SUCCEEDED", "message": "Connection successful"})
        } else {
            json!({
                "status": "FAILED",
                "message": format!(
                    "Connection failed: {}",
                    result.message.unwrap_or_default()
                )
            })
        };

        self.output_message(&json!({
            "type": "CONNECTION_STATUS",
            "connectionStatus": status
        }));

        Ok(())
    }

    /// Discover streams
    async fn discover(&self) -> Result<()> {
        let config = self.load_config()?;
        let catalog = self.connector.discover(&config).await?;

        self.output_message(&json!({
            "type": "CATALOG",
            "catalog": catalog
        }));

        Ok(())
    }

    /// List stream names without contacting the API
    fn streams(&self) -> Result<()> {
        let names: Vec<&str> = self
            .connector
            .streams()
            .iter()
            .map(|s| s.name.as_str())
            .collect();

        self.output_message(&json!({
            "type": "STREAMS",
            "streams": names
        }));

        Ok(())
    }

    /// Read records from the selected streams
    async fn read(&self, streams: Option<&str>, max_records: Option<usize>) -> Result<()> {
        let start = Instant::now();
        let config = self.load_config()?;
        let state = self.load_state()?;

        let names = parse_stream_names(streams);
        let catalog = select_streams(&self.connector.static_catalog(), &names)?;
        let connector = self
            .connector
            .clone()
            .with_max_records(max_records.unwrap_or(0));

        let snapshot = state.snapshot().await;
        let mut messages = connector.read(&config, &catalog, Some(&snapshot)).await?;

        let mut records = 0usize;
        while let Some(message) = messages.next().await {
            let message = message?;
            match &message {
                Message::Record { .. } => records += 1,
                Message::State { stream, data } => {
                    if let Some(cursor) = data.get("cursor").and_then(Value::as_str) {
                        state.set_cursor(stream, cursor.to_string()).await?;
                    }
                }
                Message::Log { .. } => {}
            }
            self.output_message(&protocol_message(&message));
        }

        info!(
            streams = catalog.streams.len(),
            records,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Read complete"
        );

        Ok(())
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

/// Split a comma-separated stream list, dropping blanks
fn parse_stream_names(streams: Option<&str>) -> Vec<String> {
    streams
        .map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

fn log_message(level: &str, message: &str) -> Value {
    json!({
        "type": "LOG",
        "log": {
            "level": level,
            "message": message
        }
    })
}

/// Wire form of an engine message
fn protocol_message(msg: &Message) -> Value {
    match msg {
        Message::Record { stream, data } => json!({
            "type": "RECORD",
            "record": {
                "stream": stream,
                "data": data,
                "emitted_at": chrono::Utc::now().timestamp_millis()
            }
        }),
        Message::State { stream, data } => json!({
            "type": "STATE",
            "state": {
                "type": "STREAM",
                "stream": {
                    "stream_descriptor": {
                        "name": stream
                    },
                    "stream_state": data
                }
            }
        }),
        Message::Log { level, message } => json!({
            "type": "LOG",
            "log": {
                "level": level,
                "message": message
            }
        }),
    }
}
