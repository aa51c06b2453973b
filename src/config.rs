//! Configuration types for connector definitions
//!
//! A connector definition file is JSON with `${ENV_VAR}` placeholders:
//!
//! ```json
//! { "name": "products_api", "type": "api", "config": { "base_url": "..." } }
//! ```
//!
//! The `config` object is parsed into the typed struct of the connector type
//! at construction time, so missing fields surface before any request is made.

use crate::auth::AuthConfig;
use crate::decode::DecoderFormat;
use crate::error::{Error, Result};
use crate::pagination::PaginationConfig;
use crate::types::{JsonObject, JsonValue};
use regex::{Captures, Regex};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Regex for matching environment placeholders: ${VAR_NAME}
static ENV_VAR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env placeholder regex"));

// ============================================================================
// Top-Level Connector Definition
// ============================================================================

/// A named connector definition loaded from a configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorDefinition {
    /// Unique connector name
    pub name: String,

    /// Connector type tag (e.g. "api", "file", "kaggle")
    #[serde(rename = "type")]
    pub connector_type: String,

    /// Type-specific configuration
    #[serde(default)]
    pub config: JsonValue,
}

/// Replace every `${VAR}` in `raw` with the process environment value
///
/// Unset variables are replaced with an empty string.
pub fn substitute_env_vars(raw: &str) -> String {
    ENV_VAR_REGEX
        .replace_all(raw, |caps: &Captures<'_>| {
            std::env::var(&caps[1]).unwrap_or_default()
        })
        .into_owned()
}

/// Load a connector definition from a JSON file with env substitution
pub fn load_definition(path: impl AsRef<Path>) -> Result<ConnectorDefinition> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            Error::Io(e)
        }
    })?;

    parse_definition(&raw, &path.display().to_string())
}

/// Parse a connector definition from raw JSON text
///
/// `source` names the origin of the text in error messages.
pub fn parse_definition(raw: &str, source: &str) -> Result<ConnectorDefinition> {
    let content = substitute_env_vars(raw);
    let value: JsonValue = serde_json::from_str(&content)
        .map_err(|e| Error::config(format!("Invalid JSON in configuration file {source}: {e}")))?;

    let name = required_str(&value, "name");
    let connector_type = required_str(&value, "type");
    let (Some(name), Some(connector_type)) = (name, connector_type) else {
        return Err(Error::config(format!(
            "Configuration {source} must include 'name' and 'type'"
        )));
    };

    Ok(ConnectorDefinition {
        name,
        connector_type,
        config: value.get("config").cloned().unwrap_or(JsonValue::Null),
    })
}

fn required_str(value: &JsonValue, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(JsonValue::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Deserialize a type-specific configuration object
///
/// A missing or null `config` is treated as an empty object so types whose
/// fields are all optional can be created without one.
pub fn parse_config<T: DeserializeOwned>(config: &JsonValue) -> Result<T> {
    let value = if config.is_null() {
        JsonValue::Object(JsonObject::new())
    } else {
        config.clone()
    };

    serde_json::from_value(value).map_err(|e| {
        let message = e.to_string();
        match message
            .strip_prefix("missing field `")
            .and_then(|rest| rest.split('`').next())
        {
            Some(field) => Error::missing_field(field),
            None => Error::invalid_value("config", message),
        }
    })
}

// ============================================================================
// API Connector Config
// ============================================================================

/// Configuration of a REST API connector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL all relative endpoints are joined to
    pub base_url: String,

    /// Logical endpoint name -> relative path or absolute URL
    #[serde(default)]
    pub endpoints: BTreeMap<String, String>,

    /// Authentication settings
    #[serde(default)]
    pub auth: AuthConfig,

    /// Extra headers overlaid on the defaults
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Default and per-endpoint request parameters
    #[serde(default)]
    pub params: ParamsConfig,

    /// Rate limit and retry settings
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Pagination settings; absent means single-request extraction
    #[serde(default)]
    pub pagination: Option<PaginationConfig>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_timeout() -> u64 {
    30
}

/// Request parameter layers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParamsConfig {
    /// Parameters sent with every request
    #[serde(default)]
    pub default: JsonObject,

    /// Parameters keyed by endpoint name
    #[serde(flatten)]
    pub endpoints: HashMap<String, JsonObject>,
}

impl ParamsConfig {
    /// Merge defaults < endpoint defaults < overrides into a fresh map
    pub fn merged(&self, endpoint: &str, overrides: &JsonObject) -> JsonObject {
        let mut merged = self.default.clone();
        if let Some(endpoint_params) = self.endpoints.get(endpoint) {
            merged.extend(endpoint_params.clone());
        }
        merged.extend(overrides.clone());
        merged
    }
}

/// Rate limiting and retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum requests per second; zero or less disables throttling
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: f64,

    /// Retries for transient status codes
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff factor in seconds (delay = factor * 2^attempt)
    #[serde(default = "default_backoff_factor")]
    pub retry_backoff_factor: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_requests_per_second(),
            max_retries: default_max_retries(),
            retry_backoff_factor: default_backoff_factor(),
        }
    }
}

fn default_requests_per_second() -> f64 {
    5.0
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_factor() -> f64 {
    0.5
}

// ============================================================================
// File Connector Config
// ============================================================================

/// Configuration of a local file connector
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    /// Explicit files to read
    #[serde(default)]
    pub files: Vec<FileSpec>,

    /// Directories scanned with a glob pattern
    #[serde(default)]
    pub directories: Vec<DirectorySpec>,
}

/// A single file to read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSpec {
    pub path: PathBuf,

    /// Format override; detected from the extension when absent
    #[serde(default)]
    pub format: Option<DecoderFormat>,

    #[serde(default)]
    pub read_options: ReadOptions,
}

/// A directory scanned for matching files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectorySpec {
    pub path: PathBuf,

    /// Glob pattern relative to `path`
    #[serde(default = "default_pattern")]
    pub pattern: String,

    #[serde(default)]
    pub format: Option<DecoderFormat>,

    #[serde(default)]
    pub read_options: ReadOptions,
}

fn default_pattern() -> String {
    "*.*".to_string()
}

/// Options applied when decoding a file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadOptions {
    /// CSV field delimiter
    #[serde(default, alias = "sep")]
    pub delimiter: Option<char>,

    /// Whether the first CSV row is a header (default true)
    #[serde(default)]
    pub has_header: Option<bool>,

    /// Dot path to the records array inside a JSON document
    #[serde(default)]
    pub records_path: Option<String>,
}

// ============================================================================
// Kaggle Connector Config
// ============================================================================

/// Configuration of a Kaggle dataset connector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KaggleConfig {
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub key: Option<String>,

    /// Kaggle REST API root
    #[serde(default = "default_kaggle_api_url")]
    pub api_url: String,

    #[serde(default)]
    pub datasets: Vec<DatasetSpec>,
}

impl Default for KaggleConfig {
    fn default() -> Self {
        Self {
            username: None,
            key: None,
            api_url: default_kaggle_api_url(),
            datasets: Vec::new(),
        }
    }
}

fn default_kaggle_api_url() -> String {
    "https://www.kaggle.com/api/v1".to_string()
}

/// A dataset to download
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSpec {
    #[serde(default)]
    pub owner: Option<String>,

    #[serde(default)]
    pub dataset: Option<String>,

    /// Download a single file of the dataset instead of the whole archive
    #[serde(default)]
    pub file_name: Option<String>,

    #[serde(default = "default_destination")]
    pub destination: PathBuf,
}

fn default_destination() -> PathBuf {
    PathBuf::from("data/raw/external")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("RC_TEST_API_KEY", "secret-123");
        let raw = r#"{"key": "${RC_TEST_API_KEY}", "other": "${RC_TEST_UNSET_VAR}"}"#;
        assert_eq!(
            substitute_env_vars(raw),
            r#"{"key": "secret-123", "other": ""}"#
        );
    }

    #[test]
    fn test_parse_definition() {
        let def = parse_definition(
            r#"{"name": "products", "type": "api", "config": {"base_url": "https://x"}}"#,
            "inline",
        )
        .unwrap();
        assert_eq!(def.name, "products");
        assert_eq!(def.connector_type, "api");
        assert_eq!(def.config, json!({"base_url": "https://x"}));
    }

    #[test]
    fn test_parse_definition_missing_type() {
        let err = parse_definition(r#"{"name": "products", "config": {}}"#, "products.json")
            .unwrap_err();
        assert!(err.to_string().contains("must include 'name' and 'type'"));
    }

    #[test]
    fn test_parse_definition_invalid_json() {
        let err = parse_definition("{not json", "broken.json").unwrap_err();
        assert!(err.to_string().contains("Invalid JSON"));
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn test_parse_config_missing_field() {
        let err = parse_config::<ApiConfig>(&json!({"endpoints": {}})).unwrap_err();
        assert!(matches!(err, Error::MissingConfigField { ref field } if field == "base_url"));
    }

    #[test]
    fn test_api_config_defaults() {
        let config: ApiConfig = parse_config(&json!({"base_url": "https://api.example.com"})).unwrap();
        assert_eq!(config.timeout_seconds, 30);
        assert_eq!(config.rate_limit.max_retries, 3);
        assert!((config.rate_limit.requests_per_second - 5.0).abs() < f64::EPSILON);
        assert!(config.pagination.is_none());
        assert!(matches!(config.auth, AuthConfig::None));
    }

    #[test]
    fn test_params_merge_precedence() {
        let params: ParamsConfig = serde_json::from_value(json!({
            "default": {"limit": 100, "sort": "id"},
            "products": {"category": "electronics", "sort": "name"}
        }))
        .unwrap();

        let overrides = json!({"category": "toys"}).as_object().cloned().unwrap();
        let merged = params.merged("products", &overrides);

        assert_eq!(merged["limit"], 100);
        assert_eq!(merged["sort"], "name");
        assert_eq!(merged["category"], "toys");

        // Merging never mutates the configured layers
        assert_eq!(params.endpoints["products"]["category"], "electronics");
    }

    #[test]
    fn test_file_config_defaults() {
        let config: FileConfig = parse_config(&json!({
            "directories": [{"path": "data/raw"}]
        }))
        .unwrap();
        assert_eq!(config.directories[0].pattern, "*.*");
        assert!(config.files.is_empty());
    }

    #[test]
    fn test_kaggle_config_null_is_default() {
        let config: KaggleConfig = parse_config(&JsonValue::Null).unwrap();
        assert_eq!(config.api_url, "https://www.kaggle.com/api/v1");
        assert!(config.datasets.is_empty());
    }
}
