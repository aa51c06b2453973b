//! Tests for the HTTP client module

use super::*;
use crate::auth::AuthConfig;
use crate::types::BackoffType;
use std::time::Duration;
use test_case::test_case;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_retry_config() -> HttpClientConfig {
    HttpClientConfig::builder()
        .max_retries(3)
        .backoff(
            BackoffType::Constant,
            Duration::from_millis(10),
            Duration::from_secs(1),
        )
        .no_rate_limit()
        .build()
}

#[test]
fn test_http_client_config_default() {
    let config = HttpClientConfig::default();
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert_eq!(config.max_retries, 3);
    assert!(config.rate_limit.is_some());
}

#[test]
fn test_http_client_config_builder() {
    let config = HttpClientConfig::builder()
        .timeout(Duration::from_secs(60))
        .max_retries(5)
        .backoff(
            BackoffType::Constant,
            Duration::from_millis(200),
            Duration::from_secs(30),
        )
        .header("X-Custom", "value")
        .user_agent("test-agent/1.0")
        .build();

    assert_eq!(config.timeout, Duration::from_secs(60));
    assert_eq!(config.max_retries, 5);
    assert_eq!(config.backoff_type, BackoffType::Constant);
    assert_eq!(
        config.default_headers.get("X-Custom"),
        Some(&"value".to_string())
    );
    assert_eq!(config.user_agent, "test-agent/1.0");
}

#[test_case("https://api.example.com/v1/", "products", "https://api.example.com/v1/products" ; "base trailing slash")]
#[test_case("https://api.example.com/v1", "/products", "https://api.example.com/v1/products" ; "endpoint leading slash")]
#[test_case("https://api.example.com/v1/", "/products", "https://api.example.com/v1/products" ; "both slashes")]
#[test_case("https://api.example.com/v1", "products", "https://api.example.com/v1/products" ; "no slashes")]
#[test_case("https://api.example.com/v1", "https://other.example.com/x", "https://other.example.com/x" ; "absolute endpoint")]
#[test_case("https://api.example.com/v1", "http://other.example.com/x", "http://other.example.com/x" ; "absolute http endpoint")]
#[test_case("https://api.example.com/v1/", "", "https://api.example.com/v1" ; "empty endpoint")]
fn test_join_url(base: &str, endpoint: &str, expected: &str) {
    assert_eq!(join_url(base, endpoint), expected);
}

#[test]
fn test_invalid_default_header_rejected() {
    let config = HttpClientConfig::builder()
        .header("bad header", "x")
        .no_rate_limit()
        .build();
    assert!(HttpClient::with_config(config).is_err());
}

#[tokio::test]
async fn test_http_client_get_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "value": 42
        })))
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig::builder().no_rate_limit().build();

    let client = HttpClient::with_config(config).unwrap();
    let data = client
        .get_json(
            &format!("{}/api/data", mock_server.uri()),
            RequestConfig::new(),
        )
        .await
        .unwrap();

    assert_eq!(data["value"], 42);
}

#[tokio::test]
async fn test_http_client_invalid_json_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig::builder().no_rate_limit().build();

    let client = HttpClient::with_config(config).unwrap();
    let err = client
        .get_json(
            &format!("{}/api/html", mock_server.uri()),
            RequestConfig::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, crate::error::Error::Decode { .. }));
}

#[tokio::test]
async fn test_http_client_query_params() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/search"))
        .and(query_param("q", "test"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": []
        })))
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig::builder().no_rate_limit().build();

    let client = HttpClient::with_config(config).unwrap();
    let response = client
        .get_with_config(
            &format!("{}/api/search", mock_server.uri()),
            RequestConfig::new().query("q", "test").query("page", "2"),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_http_client_default_headers_and_auth() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/secure"))
        .and(header("Accept", "application/json"))
        .and(header("X-API-Key", "secret123"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig::builder()
        .header("Accept", "application/json")
        .no_rate_limit()
        .build();

    let client = HttpClient::with_auth(
        config,
        AuthConfig::ApiKey {
            api_key: "secret123".to_string(),
            api_key_name: "X-API-Key".to_string(),
        },
    )
    .unwrap();
    let url = format!("{}/api/secure", mock_server.uri());
    let response = client.get(&url).await.unwrap();

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_http_client_404_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not found"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_retry_config()).unwrap();
    let url = format!("{}/api/missing", mock_server.uri());
    let err = client.get(&url).await.unwrap_err();

    assert!(matches!(
        err,
        crate::error::Error::HttpStatus { status: 404, .. }
    ));
}

#[tokio::test]
async fn test_http_client_retry_on_500() {
    let mock_server = MockServer::start().await;

    // First two calls return 500, third succeeds
    Mock::given(method("GET"))
        .and(path("/api/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_retry_config()).unwrap();
    let url = format!("{}/api/flaky", mock_server.uri());
    let response = client.get(&url).await.unwrap();

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_http_client_rate_limit_retry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/limited"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "0")
                .set_body_string("Rate limited"),
        )
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/limited"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_retry_config()).unwrap();
    let url = format!("{}/api/limited", mock_server.uri());
    let response = client.get(&url).await.unwrap();

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_http_client_max_retries_exceeded() {
    let mock_server = MockServer::start().await;

    // One initial attempt plus three retries
    Mock::given(method("GET"))
        .and(path("/api/always-fail"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Server error"))
        .expect(4)
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_retry_config()).unwrap();
    let url = format!("{}/api/always-fail", mock_server.uri());
    let err = client.get(&url).await.unwrap_err();

    assert!(matches!(
        err,
        crate::error::Error::HttpStatus { status: 503, .. }
    ));
}

#[tokio::test]
async fn test_http_client_connection_refused_is_retried() {
    // Bind then drop a listener so the port is closed
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();

    let config = HttpClientConfig::builder()
        .max_retries(2)
        .backoff(
            BackoffType::Constant,
            Duration::from_millis(100),
            Duration::from_secs(1),
        )
        .no_rate_limit()
        .build();
    let client = HttpClient::with_config(config).unwrap();

    let start = std::time::Instant::now();
    let err = client.get(&format!("http://{addr}/")).await.unwrap_err();

    assert!(matches!(err, crate::error::Error::Http(_)));
    assert!(err.is_retryable());
    // Two backoff sleeps before giving up
    assert!(start.elapsed() >= Duration::from_millis(200));
}

#[test]
fn test_calculate_backoff_constant() {
    let config = HttpClientConfig::builder()
        .backoff(
            BackoffType::Constant,
            Duration::from_millis(100),
            Duration::from_secs(10),
        )
        .no_rate_limit()
        .build();

    let client = HttpClient::with_config(config).unwrap();

    assert_eq!(client.calculate_backoff(0), Duration::from_millis(100));
    assert_eq!(client.calculate_backoff(5), Duration::from_millis(100));
}

#[test]
fn test_calculate_backoff_exponential() {
    let config = HttpClientConfig::builder()
        .backoff(
            BackoffType::Exponential,
            Duration::from_millis(500),
            Duration::from_secs(60),
        )
        .no_rate_limit()
        .build();

    let client = HttpClient::with_config(config).unwrap();

    assert_eq!(client.calculate_backoff(0), Duration::from_millis(500));
    assert_eq!(client.calculate_backoff(1), Duration::from_secs(1));
    assert_eq!(client.calculate_backoff(2), Duration::from_secs(2));
    assert_eq!(client.calculate_backoff(3), Duration::from_secs(4));
    // Capped at max
    assert_eq!(client.calculate_backoff(12), Duration::from_secs(60));
}

#[test]
fn test_http_client_debug() {
    let client = HttpClient::with_config(HttpClientConfig::default()).unwrap();
    let debug_str = format!("{client:?}");
    assert!(debug_str.contains("HttpClient"));
    assert!(debug_str.contains("config"));
    assert!(debug_str.contains("has_rate_limiter: true"));
}
