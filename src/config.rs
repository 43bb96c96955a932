//! Tap configuration and catalog types
//!
//! The tap is configured with a small JSON (or YAML) document:
//!
//! ```json
//! {
//!   "hostname": "roboticdogs",
//!   "username": "api_user",
//!   "password": "secret",
//!   "start_date": "2024-01-01T00:00:00Z"
//! }
//! ```
//!
//! Required values are checked where they are used (base URL, auth), so a
//! bad config fails before any request goes out.

use crate::auth::AuthConfig;
use crate::error::{Error, Result, ResultExt};
use crate::http::{HttpClientConfig, RateLimiterConfig};
use crate::schema::Schema;
use crate::streams::StreamDefinition;
use crate::types::{parse_datetime, OptionStringExt, SyncMode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use url::Url;

// ============================================================================
// Tap Config
// ============================================================================

/// Runtime configuration for the tap
#[derive(Clone, Serialize, Deserialize)]
pub struct TapConfig {
    /// ActionKit instance name (`<hostname>.actionkit.com`) or a full base URL
    #[serde(default)]
    pub hostname: Option<String>,

    /// API username
    #[serde(default)]
    pub username: Option<String>,

    /// API password
    #[serde(default)]
    pub password: Option<String>,

    /// Earliest replication-key value to sync when no bookmark exists
    #[serde(default)]
    pub start_date: Option<String>,

    /// Records per page (`_limit`)
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// User agent override
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Maximum number of retries per request
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Client-side request budget; 0 disables it, unset keeps the default
    #[serde(default)]
    pub requests_per_second: Option<u32>,
}

fn default_page_size() -> u32 {
    100
}

fn default_max_retries() -> u32 {
    3
}

impl Default for TapConfig {
    fn default() -> Self {
        Self {
            hostname: None,
            username: None,
            password: None,
            start_date: None,
            page_size: default_page_size(),
            user_agent: None,
            max_retries: default_max_retries(),
            requests_per_second: None,
        }
    }
}

impl fmt::Debug for TapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TapConfig")
            .field("hostname", &self.hostname)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("start_date", &self.start_date)
            .field("page_size", &self.page_size)
            .field("user_agent", &self.user_agent)
            .field("max_retries", &self.max_retries)
            .field("requests_per_second", &self.requests_per_second)
            .finish()
    }
}

impl TapConfig {
    /// Create a config for the given instance and credentials
    pub fn new(
        hostname: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            hostname: Some(hostname.into()),
            username: Some(username.into()),
            password: Some(password.into()),
            ..Self::default()
        }
    }

    /// Set the start date
    #[must_use]
    pub fn with_start_date(mut self, start_date: impl Into<String>) -> Self {
        self.start_date = Some(start_date.into());
        self
    }

    /// Set the page size
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Load from a file; `.yaml`/`.yml` are read as YAML, anything else as JSON
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml_str(&content),
            _ => Self::from_json_str(&content),
        }
    }

    /// Parse from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Base URL of the REST API.
    ///
    /// A full `http(s)://` URL in `hostname` is used as given.
    pub fn base_url(&self) -> Result<String> {
        let hostname = self
            .hostname
            .clone()
            .none_if_empty()
            .ok_or_else(|| Error::missing_field("hostname"))?;
        let hostname = hostname.trim();

        let base = if hostname.starts_with("http://") || hostname.starts_with("https://") {
            hostname.trim_end_matches('/').to_string()
        } else {
            format!("https://{hostname}.actionkit.com/rest/v1")
        };

        Url::parse(&base)?;
        Ok(base)
    }

    /// Basic credentials for every request
    pub fn auth(&self) -> Result<AuthConfig> {
        let username = self.username.clone().none_if_empty();
        let password = self.password.clone().none_if_empty();

        match (username, password) {
            (Some(username), Some(password)) => Ok(AuthConfig::basic(username, password)),
            (None, _) => Err(Error::missing_field("username")),
            (_, None) => Err(Error::missing_field("password")),
        }
    }

    /// Parsed start date, if one is configured
    pub fn start_date(&self) -> Result<Option<DateTime<Utc>>> {
        match self.start_date.clone().none_if_empty() {
            None => Ok(None),
            Some(raw) => parse_datetime(&raw)
                .map(Some)
                .ok_or_else(|| Error::invalid_value("start_date", format!("not a date: {raw}"))),
        }
    }

    /// HTTP client settings derived from this config
    pub fn http_client_config(&self) -> Result<HttpClientConfig> {
        let mut builder = HttpClientConfig::builder()
            .base_url(self.base_url()?)
            .max_retries(self.max_retries);

        if let Some(agent) = self.user_agent.clone().none_if_empty() {
            builder = builder.user_agent(agent);
        }

        builder = match self.requests_per_second {
            Some(0) => builder.no_rate_limit(),
            Some(n) => builder.rate_limit(RateLimiterConfig::per_second(n)),
            None => builder,
        };

        Ok(builder.build())
    }

    /// Check every setting without touching the network
    pub fn validate(&self) -> Result<()> {
        self.base_url()?;
        self.auth()?;
        self.start_date()?;

        if self.page_size == 0 {
            return Err(Error::invalid_value("page_size", "must be at least 1"));
        }

        Ok(())
    }
}

// ============================================================================
// Catalog Types
// ============================================================================

/// Discovered catalog (available streams)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    /// Available streams
    pub streams: Vec<CatalogStream>,
}

/// Stream in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogStream {
    /// Stream name
    pub name: String,

    /// JSON schema for the stream
    #[serde(default)]
    pub json_schema: serde_json::Value,

    /// Supported sync modes
    #[serde(default)]
    pub supported_sync_modes: Vec<SyncMode>,

    /// Default cursor field
    #[serde(default)]
    pub default_cursor_field: Option<Vec<String>>,

    /// Source-defined primary key
    #[serde(default)]
    pub source_defined_primary_key: Option<Vec<Vec<String>>>,
}

impl CatalogStream {
    /// Catalog entry for a stream with its inferred schema
    pub fn from_definition(stream: &StreamDefinition, schema: &Schema) -> Self {
        Self {
            name: stream.name.clone(),
            json_schema: schema.to_json_schema(),
            supported_sync_modes: stream.supported_sync_modes(),
            default_cursor_field: stream.replication_key.clone().map(|key| vec![key]),
            source_defined_primary_key: if stream.primary_keys.is_empty() {
                None
            } else {
                Some(stream.primary_keys.iter().map(|k| vec![k.clone()]).collect())
            },
        }
    }
}

/// Configured catalog (selected streams for sync)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfiguredCatalog {
    /// Selected streams
    pub streams: Vec<ConfiguredStream>,
}

/// Configured stream for sync
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfiguredStream {
    /// Stream reference
    pub stream: CatalogStream,

    /// Selected sync mode
    #[serde(default)]
    pub sync_mode: SyncMode,

    /// Cursor field to use
    #[serde(default)]
    pub cursor_field: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_json_config_defaults() {
        let config =
            TapConfig::from_json_str(r#"{"hostname": "demo", "username": "u", "password": "p"}"#)
                .unwrap();

        assert_eq!(config.hostname.as_deref(), Some("demo"));
        assert_eq!(config.page_size, 100);
        assert_eq!(config.max_retries, 3);
        assert!(config.start_date.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn test_base_url() {
        let config = TapConfig::new("roboticdogs", "u", "p");
        assert_eq!(
            config.base_url().unwrap(),
            "https://roboticdogs.actionkit.com/rest/v1"
        );

        let config = TapConfig::new("http://127.0.0.1:8080/rest/v1/", "u", "p");
        assert_eq!(config.base_url().unwrap(), "http://127.0.0.1:8080/rest/v1");
    }

    #[test]
    fn test_missing_hostname_fails() {
        let config = TapConfig {
            hostname: Some("  ".to_string()),
            ..TapConfig::new("x", "u", "p")
        };
        let err = config.base_url().unwrap_err();
        assert!(err.is_config());
        assert_eq!(err.to_string(), "Missing required config field: hostname");

        let err = TapConfig::default().validate().unwrap_err();
        assert!(err.to_string().contains("hostname"));
    }

    #[test]
    fn test_missing_credentials_fail() {
        let config = TapConfig {
            password: None,
            ..TapConfig::new("demo", "u", "p")
        };
        let err = config.auth().unwrap_err();
        assert!(matches!(
            err,
            Error::MissingConfigField { ref field } if field == "password"
        ));

        let config = TapConfig {
            username: Some(String::new()),
            ..TapConfig::new("demo", "u", "p")
        };
        assert!(config.auth().is_err());
    }

    #[test]
    fn test_auth_is_basic() {
        let auth = TapConfig::new("demo", "user", "pass").auth().unwrap();
        assert!(matches!(
            auth,
            AuthConfig::Basic { ref username, ref password } if username == "user" && password == "pass"
        ));
    }

    #[test]
    fn test_start_date() {
        let config = TapConfig::new("demo", "u", "p").with_start_date("2024-01-01");
        let parsed = config.start_date().unwrap().unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-01-01T00:00:00+00:00");

        let config = TapConfig::new("demo", "u", "p").with_start_date("soon");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let config = TapConfig::new("demo", "u", "p").with_page_size(0);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("page_size"));
    }

    #[test]
    fn test_http_client_config() {
        let config = TapConfig {
            user_agent: Some("custom/1.0".to_string()),
            max_retries: 7,
            ..TapConfig::new("demo", "u", "p")
        };
        let http = config.http_client_config().unwrap();

        assert_eq!(
            http.base_url.as_deref(),
            Some("https://demo.actionkit.com/rest/v1")
        );
        assert_eq!(http.max_retries, 7);
        assert_eq!(http.user_agent, "custom/1.0");
        assert_eq!(http.rate_limit, Some(RateLimiterConfig::default()));
    }

    #[test]
    fn test_requests_per_second() {
        let mut config = TapConfig::new("demo", "u", "p");

        config.requests_per_second = Some(2);
        assert_eq!(
            config.http_client_config().unwrap().rate_limit,
            Some(RateLimiterConfig::per_second(2))
        );

        config.requests_per_second = Some(0);
        assert!(config.http_client_config().unwrap().rate_limit.is_none());
    }

    #[test]
    fn test_debug_redacts_password() {
        let debug = format!("{:?}", TapConfig::new("demo", "user", "hunter2"));
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn test_from_file_json_and_yaml() {
        let mut json_file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            json_file,
            r#"{{"hostname": "demo", "username": "u", "password": "p", "page_size": 25}}"#
        )
        .unwrap();
        let config = TapConfig::from_file(json_file.path()).unwrap();
        assert_eq!(config.page_size, 25);

        let mut yaml_file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(yaml_file, "hostname: demo\nusername: u\npassword: p").unwrap();
        let config = TapConfig::from_file(yaml_file.path()).unwrap();
        assert_eq!(config.username.as_deref(), Some("u"));
    }

    #[test]
    fn test_from_file_missing() {
        let err = TapConfig::from_file("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_catalog_stream_from_definition() {
        let stream = StreamDefinition::users();
        let schema = crate::schema::infer_schema(Vec::new(), Some("updated_at"));
        let entry = CatalogStream::from_definition(&stream, &schema);

        assert_eq!(entry.name, "users");
        assert_eq!(entry.default_cursor_field, Some(vec!["updated_at".to_string()]));
        assert_eq!(
            entry.source_defined_primary_key,
            Some(vec![vec!["id".to_string()]])
        );
        assert_eq!(entry.json_schema["type"], "object");
        assert!(entry.json_schema["properties"]["id"].is_object());
    }
}
