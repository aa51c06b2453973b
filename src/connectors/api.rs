//! REST API connector
//!
//! Reads JSON records from a REST API. The connector owns one HTTP client
//! for its lifetime; `connect` (re)builds it with retry, rate limiting,
//! default headers and authentication, and `extract` drives either a single
//! request or the pagination engine.

use crate::config::{parse_config, ApiConfig};
use crate::connector::{Connector, ExtractOptions, ExtractOutput};
use crate::error::{Error, Result};
use crate::http::{join_url, HttpClient, HttpClientConfig, RateLimiterConfig, RequestConfig};
use crate::metadata::Metadata;
use crate::output::json_to_arrow;
use crate::pagination::{extract_results, paginate, to_query_pairs};
use crate::types::{BackoffType, ConnectorStatus, JsonObject, JsonValue, OutputShape};
use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;
use tracing::{error, info};
use url::Url;

const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Connector for paginated REST APIs
#[derive(Debug)]
pub struct ApiConnector {
    name: String,
    config: ApiConfig,
    metadata: Metadata,
    client: Option<HttpClient>,
}

impl ApiConnector {
    /// Type tag registered with the factory
    pub const TYPE: &'static str = "api";

    /// Create a connector from a typed configuration
    pub fn new(name: impl Into<String>, config: ApiConfig) -> Self {
        let name = name.into();
        let mut metadata = Metadata::new(&name, Self::TYPE);
        metadata.data_source = Some(format!("api_{name}"));
        metadata.set("base_url", config.base_url.clone());
        metadata.set(
            "endpoints",
            config.endpoints.keys().cloned().collect::<Vec<_>>(),
        );

        info!("Initialized ApiConnector with name: {name}");
        Self {
            name,
            config,
            metadata,
            client: None,
        }
    }

    /// Create a connector from an untyped `config` object
    pub fn from_config(name: impl Into<String>, config: &JsonValue) -> Result<Self> {
        Ok(Self::new(name, parse_config(config)?))
    }

    /// The connector configuration
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Full URL of a logical endpoint
    pub fn endpoint_url(&self, endpoint: &str) -> Result<String> {
        let path = self
            .config
            .endpoints
            .get(endpoint)
            .ok_or_else(|| Error::UnknownEndpoint {
                endpoint: endpoint.to_string(),
            })?;
        Ok(join_url(&self.config.base_url, path))
    }

    fn client_config(&self) -> HttpClientConfig {
        let rate_limit = &self.config.rate_limit;
        let initial_backoff =
            Duration::try_from_secs_f64(rate_limit.retry_backoff_factor).unwrap_or(Duration::ZERO);

        let mut builder = HttpClientConfig::builder()
            .timeout(Duration::from_secs(self.config.timeout_seconds))
            .max_retries(rate_limit.max_retries)
            .backoff(BackoffType::Exponential, initial_backoff, MAX_BACKOFF)
            .rate_limit(RateLimiterConfig::new(rate_limit.requests_per_second))
            .user_agent(format!("RetailAnalytics/{}", self.name))
            .header("Content-Type", "application/json")
            .header("Accept", "application/json");

        for (key, value) in &self.config.headers {
            builder = builder.header(key, value);
        }
        builder.build()
    }

    fn build_client(&self) -> Result<HttpClient> {
        Url::parse(&self.config.base_url)?;
        HttpClient::with_auth(self.client_config(), self.config.auth.clone())
    }

    async fn fetch_records(&self, endpoint: &str, overrides: &JsonObject) -> Result<Vec<JsonValue>> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| Error::not_connected(&self.name))?;
        let url = self.endpoint_url(endpoint)?;
        let params = self.config.params.merged(endpoint, overrides);

        match &self.config.pagination {
            Some(pagination) => paginate(client, url, params, pagination)?.try_concat().await,
            None => {
                info!("Making request to {url} with params: {params:?}");
                let request = RequestConfig {
                    query: to_query_pairs(&params),
                    ..Default::default()
                };
                let body = client.get_json(&url, request).await?;
                Ok(extract_results(&body, ""))
            }
        }
    }
}

#[async_trait]
impl Connector for ApiConnector {
    fn name(&self) -> &str {
        &self.name
    }

    fn connector_type(&self) -> &str {
        Self::TYPE
    }

    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    async fn connect(&mut self) -> bool {
        self.client = None;
        self.metadata.set_status(ConnectorStatus::Connecting);

        match self.build_client() {
            Ok(client) => {
                self.client = Some(client);
                self.metadata.set_status(ConnectorStatus::Connected);
                self.metadata.set("auth_type", self.config.auth.kind());
                info!("Successfully created API session for {}", self.name);
                true
            }
            Err(e) => {
                error!("Failed to create API session for {}: {e}", self.name);
                self.metadata.fail(format!("Connection failed: {e}"));
                false
            }
        }
    }

    async fn extract(&mut self, options: &ExtractOptions) -> Result<ExtractOutput> {
        self.ensure_connected().await?;
        let endpoint = options
            .endpoint
            .clone()
            .ok_or_else(|| Error::missing_field("endpoint"))?;

        self.metadata.begin_extraction();
        self.metadata.set("endpoint", endpoint.as_str());
        let batch_id = self.generate_batch_id();

        let result = self
            .fetch_records(&endpoint, &options.params)
            .await
            .and_then(|records| shape_output(records, options));

        self.metadata.set("batch_id", batch_id);
        self.metadata
            .set("completion_time", Utc::now().to_rfc3339());

        match result {
            Ok(output) => {
                if let ExtractOutput::Table(batch) = &output {
                    let columns: Vec<String> = batch
                        .schema()
                        .fields()
                        .iter()
                        .map(|f| f.name().clone())
                        .collect();
                    self.metadata.set("columns", columns);
                }
                self.metadata.record_count = output.record_count() as u64;
                self.metadata.set_status(ConnectorStatus::Completed);
                info!(
                    "Extracted {} records from {} endpoint '{endpoint}'",
                    output.record_count(),
                    self.name
                );
                Ok(output)
            }
            Err(e) => {
                error!("Failed to extract data from API {}: {e}", self.name);
                self.metadata.fail(format!("Extraction failed: {e}"));
                Err(e)
            }
        }
    }
}

fn shape_output(records: Vec<JsonValue>, options: &ExtractOptions) -> Result<ExtractOutput> {
    match options.output {
        OutputShape::Records => Ok(ExtractOutput::Records(records)),
        OutputShape::Table if options.flatten => {
            let flat: Vec<JsonValue> = records.iter().map(flatten_record).collect();
            Ok(ExtractOutput::Table(json_to_arrow(&flat, None)?))
        }
        OutputShape::Table => Ok(ExtractOutput::Table(json_to_arrow(&records, None)?)),
    }
}

// ============================================================================
// Flattening
// ============================================================================

/// Flatten nested objects into dot-separated keys
///
/// Arrays become their JSON text with `", "` and `": "` separators
/// (`[1, 2]`); scalars are copied. Non-object records are returned as-is.
pub fn flatten_record(record: &JsonValue) -> JsonValue {
    let JsonValue::Object(obj) = record else {
        return record.clone();
    };

    let mut flat = JsonObject::new();
    flatten_into(obj, "", &mut flat);
    JsonValue::Object(flat)
}

fn flatten_into(obj: &JsonObject, prefix: &str, out: &mut JsonObject) {
    for (key, value) in obj {
        let key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };

        match value {
            JsonValue::Object(nested) => flatten_into(nested, &key, out),
            JsonValue::Array(_) => {
                out.insert(key, JsonValue::String(spaced_json(value)));
            }
            scalar => {
                out.insert(key, scalar.clone());
            }
        }
    }
}

/// Serialize with a space after `,` and `:`
fn spaced_json(value: &JsonValue) -> String {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
    match value.serialize(&mut ser) {
        Ok(()) => String::from_utf8(buf).unwrap_or_else(|_| value.to_string()),
        Err(_) => value.to_string(),
    }
}

struct SpacedFormatter;

impl serde_json::ser::Formatter for SpacedFormatter {
    fn begin_array_value<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> std::io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> std::io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(b": ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use test_case::test_case;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn connector(base_url: &str, extra: JsonValue) -> ApiConnector {
        let mut config = json!({
            "base_url": base_url,
            "endpoints": {"products": "/products", "stores": "stores/"},
            "rate_limit": {"requests_per_second": 0, "max_retries": 0}
        });
        if let (Some(target), Some(extra)) = (config.as_object_mut(), extra.as_object()) {
            target.extend(extra.clone());
        }
        ApiConnector::from_config("shop", &config).unwrap()
    }

    // ------------------------------------------------------------------------
    // Flattening
    // ------------------------------------------------------------------------

    #[test]
    fn test_flatten_nested_objects() {
        let record = json!({"id": 1, "customer": {"name": "Ann", "address": {"city": "Lyon"}}});
        assert_eq!(
            flatten_record(&record),
            json!({"id": 1, "customer.name": "Ann", "customer.address.city": "Lyon"})
        );
    }

    #[test_case(json!([1, 2]), "[1, 2]" ; "numbers")]
    #[test_case(json!(["a", "b"]), r#"["a", "b"]"# ; "strings")]
    #[test_case(json!([{"k": 1, "v": 2}]), r#"[{"k": 1, "v": 2}]"# ; "objects")]
    #[test_case(json!([]), "[]" ; "empty")]
    fn test_flatten_arrays_as_text(array: JsonValue, expected: &str) {
        let flat = flatten_record(&json!({"tags": array}));
        assert_eq!(flat["tags"], expected);
    }

    #[test]
    fn test_flatten_is_idempotent() {
        let record = json!({"a": {"b": {"c": 1}}, "list": [1, {"x": 2}], "s": "t", "n": null});
        let once = flatten_record(&record);
        assert_eq!(flatten_record(&once), once);
    }

    #[test]
    fn test_flatten_leaves_flat_records_unchanged() {
        let record = json!({"id": 7, "name": "widget", "price": 2.5});
        assert_eq!(flatten_record(&record), record);
    }

    #[test]
    fn test_flatten_drops_empty_objects() {
        assert_eq!(flatten_record(&json!({"a": {}, "b": 1})), json!({"b": 1}));
    }

    // ------------------------------------------------------------------------
    // Construction and connect
    // ------------------------------------------------------------------------

    #[test]
    fn test_from_config_requires_base_url() {
        let err = ApiConnector::from_config("shop", &json!({"endpoints": {}})).unwrap_err();
        assert!(matches!(err, Error::MissingConfigField { ref field } if field == "base_url"));
    }

    #[test]
    fn test_initial_metadata() {
        let c = connector("https://api.example.com/v1", json!({}));
        let meta = c.metadata();
        assert_eq!(meta.status, ConnectorStatus::Initialized);
        assert_eq!(meta.data_source.as_deref(), Some("api_shop"));
        assert_eq!(meta.get("endpoints"), Some(json!(["products", "stores"])));
    }

    #[test_case("products", "https://api.example.com/v1/products" ; "leading slash")]
    #[test_case("stores", "https://api.example.com/v1/stores/" ; "trailing slash kept")]
    fn test_endpoint_url(endpoint: &str, expected: &str) {
        let c = connector("https://api.example.com/v1/", json!({}));
        assert_eq!(c.endpoint_url(endpoint).unwrap(), expected);
    }

    #[test]
    fn test_endpoint_url_absolute() {
        let c = connector(
            "https://api.example.com/v1",
            json!({"endpoints": {"feed": "https://cdn.example.com/feed.json"}}),
        );
        assert_eq!(
            c.endpoint_url("feed").unwrap(),
            "https://cdn.example.com/feed.json"
        );
    }

    #[test]
    fn test_endpoint_url_unknown() {
        let c = connector("https://api.example.com/v1", json!({}));
        assert!(matches!(
            c.endpoint_url("orders"),
            Err(Error::UnknownEndpoint { .. })
        ));
    }

    #[tokio::test]
    async fn test_connect_is_idempotent() {
        let mut c = connector("https://api.example.com/v1", json!({}));
        assert!(c.connect().await);
        assert!(c.connect().await);
        assert!(c.is_connected());
        assert_eq!(c.metadata().status, ConnectorStatus::Connected);
    }

    #[tokio::test]
    async fn test_connect_fails_on_invalid_base_url() {
        let mut c = connector("not a url", json!({}));
        assert!(!c.connect().await);
        assert_eq!(c.metadata().status, ConnectorStatus::Error);
        assert!(c
            .metadata()
            .error
            .as_deref()
            .unwrap()
            .starts_with("Connection failed:"));

        let err = c
            .extract(&ExtractOptions::new().with_endpoint("products"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotConnected { .. }));
    }

    #[tokio::test]
    async fn test_connect_fails_on_invalid_header() {
        let mut c = connector(
            "https://api.example.com",
            json!({"headers": {"bad header": "x"}}),
        );
        assert!(!c.connect().await);
    }

    // ------------------------------------------------------------------------
    // Extraction
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_extract_sends_default_headers_and_auth() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products"))
            .and(header("User-Agent", "RetailAnalytics/shop"))
            .and(header("Accept", "application/json"))
            .and(header("X-Shop-Key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
            .expect(1)
            .mount(&server)
            .await;

        let mut c = connector(
            &server.uri(),
            json!({"auth": {"type": "api_key", "api_key": "secret", "api_key_name": "X-Shop-Key"}}),
        );
        let output = c
            .extract(&ExtractOptions::new().with_endpoint("products"))
            .await
            .unwrap();
        assert_eq!(output.record_count(), 1);
    }

    #[tokio::test]
    async fn test_extract_merges_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products"))
            .and(query_param("currency", "EUR"))
            .and(query_param("category", "shoes"))
            .and(query_param("active", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
            .expect(1)
            .mount(&server)
            .await;

        let mut c = connector(
            &server.uri(),
            json!({"params": {
                "default": {"currency": "USD", "active": true},
                "products": {"category": "shoes", "currency": "GBP"}
            }}),
        );
        let output = c
            .extract(
                &ExtractOptions::new()
                    .with_endpoint("products")
                    .with_param("currency", "EUR")
                    .with_output(OutputShape::Records),
            )
            .await
            .unwrap();

        // A single object body is one record
        assert_eq!(output.as_records().unwrap(), &[json!({"id": 1})]);
        // Configuration is never mutated by a call
        assert_eq!(
            c.config().params.default.get("currency"),
            Some(&json!("USD"))
        );
    }

    #[tokio::test]
    async fn test_extract_paginated_table() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products"))
            .and(query_param("offset", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": 1, "name": "a"}, {"id": 2, "name": "b"}]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/products"))
            .and(query_param("offset", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": 3, "name": "c"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut c = connector(
            &server.uri(),
            json!({
                "params": {"default": {"limit": 2}},
                "pagination": {"type": "offset", "results_path": "data"}
            }),
        );
        let output = c
            .extract(&ExtractOptions::new().with_endpoint("products"))
            .await
            .unwrap();

        let table = output.as_table().unwrap();
        assert_eq!(table.num_rows(), 3);

        let meta = c.metadata();
        assert_eq!(meta.status, ConnectorStatus::Completed);
        assert_eq!(meta.record_count, 3);
        assert_eq!(meta.get("endpoint"), Some(json!("products")));
        assert_eq!(meta.get("columns"), Some(json!(["id", "name"])));
        assert_eq!(meta.get("batch_id").unwrap().as_str().unwrap().len(), 32);
        assert!(meta.get("completion_time").is_some());
        assert!(meta.extraction_date.is_some());
    }

    #[tokio::test]
    async fn test_extract_flattened_table() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "vendor": {"name": "Acme"}, "tags": ["x", "y"]}
            ])))
            .mount(&server)
            .await;

        let mut c = connector(&server.uri(), json!({}));
        c.extract(
            &ExtractOptions::new()
                .with_endpoint("products")
                .with_flatten(true),
        )
        .await
        .unwrap();

        assert_eq!(
            c.metadata().get("columns"),
            Some(json!(["id", "vendor.name", "tags"]))
        );
    }

    #[tokio::test]
    async fn test_extract_http_error_records_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let mut c = connector(&server.uri(), json!({}));
        let err = c
            .extract(&ExtractOptions::new().with_endpoint("products"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::HttpStatus { status: 503, .. }));
        let meta = c.metadata();
        assert_eq!(meta.status, ConnectorStatus::Error);
        assert!(meta
            .error
            .as_deref()
            .unwrap()
            .starts_with("Extraction failed: HTTP 503"));
        assert!(meta.get("batch_id").is_some());
    }

    #[tokio::test]
    async fn test_extract_unknown_endpoint() {
        let mut c = connector("https://api.example.com", json!({}));
        let err = c
            .extract(&ExtractOptions::new().with_endpoint("orders"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnknownEndpoint { .. }));
        assert_eq!(c.metadata().status, ConnectorStatus::Error);
    }

    #[tokio::test]
    async fn test_extract_requires_endpoint() {
        let mut c = connector("https://api.example.com", json!({}));
        let err = c.extract(&ExtractOptions::new()).await.unwrap_err();
        assert!(matches!(err, Error::MissingConfigField { ref field } if field == "endpoint"));
    }
}
