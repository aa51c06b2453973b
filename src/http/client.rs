//! HTTP client with retry and rate limiting
//!
//! Provides the HTTP session a connector owns for its lifetime:
//! - Automatic retries on transient status codes with backoff
//! - Minimum interval between requests
//! - Default headers and authentication on every request
//! - Explicit request timeout

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::auth::{AuthConfig, Authenticator};
use crate::error::{is_retryable_status, Error, Result};
use crate::types::BackoffType;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout
    pub timeout: Duration,
    /// Maximum number of retries
    pub max_retries: u32,
    /// Initial delay for backoff
    pub initial_backoff: Duration,
    /// Maximum delay for backoff
    pub max_backoff: Duration,
    /// Type of backoff strategy
    pub backoff_type: BackoffType,
    /// Rate limiter configuration
    pub rate_limit: Option<RateLimiterConfig>,
    /// Default headers for all requests
    pub default_headers: BTreeMap<String, String>,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(60),
            backoff_type: BackoffType::Exponential,
            rate_limit: Some(RateLimiterConfig::default()),
            default_headers: BTreeMap::new(),
            user_agent: format!("retail-connectors/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set max retries
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Set backoff configuration
    pub fn backoff(mut self, backoff_type: BackoffType, initial: Duration, max: Duration) -> Self {
        self.config.backoff_type = backoff_type;
        self.config.initial_backoff = initial;
        self.config.max_backoff = max;
        self
    }

    /// Set rate limiter
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Disable rate limiting
    pub fn no_rate_limit(mut self) -> Self {
        self.config.rate_limit = None;
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Configuration for a single request
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Query parameters, in insertion order
    pub query: Vec<(String, String)>,
    /// Request headers
    pub headers: BTreeMap<String, String>,
}

impl RequestConfig {
    /// Create a new request config
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }
}

/// HTTP client with retry and rate limiting
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    authenticator: Authenticator,
    rate_limiter: Option<RateLimiter>,
}

impl HttpClient {
    /// Create a new HTTP client with custom configuration
    ///
    /// Fails when a default header is not a valid HTTP header or the
    /// underlying client cannot be built.
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        for (key, value) in &config.default_headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| Error::invalid_value("headers", format!("{key}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::invalid_value("headers", format!("{key}: {e}")))?;
            headers.insert(name, value);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .build()?;

        let rate_limiter = config.rate_limit.as_ref().and_then(RateLimiter::new);
        if let Some(limiter) = &rate_limiter {
            debug!("Spacing requests by {:?}", limiter.interval());
        }

        Ok(Self {
            client,
            config,
            authenticator: Authenticator::default(),
            rate_limiter,
        })
    }

    /// Create a client with authentication
    pub fn with_auth(config: HttpClientConfig, auth_config: AuthConfig) -> Result<Self> {
        let authenticator = Authenticator::new(auth_config);
        authenticator.validate()?;

        let mut client = Self::with_config(config)?;
        client.authenticator = authenticator;
        Ok(client)
    }

    /// Make a GET request
    pub async fn get(&self, url: &str) -> Result<Response> {
        self.get_with_config(url, RequestConfig::default()).await
    }

    /// Make a GET request with config
    ///
    /// Retries 429/500/502/503/504, timeouts and connection errors up to
    /// `max_retries` times. Any other non-2xx status is returned as
    /// `Error::HttpStatus`.
    pub async fn get_with_config(&self, url: &str, config: RequestConfig) -> Result<Response> {
        let max_retries = self.config.max_retries;
        let mut attempt = 0;

        loop {
            if let Some(ref limiter) = self.rate_limiter {
                limiter.wait().await;
            }

            let mut req = self.client.get(url);
            for (key, value) in &config.headers {
                req = req.header(key.as_str(), value.as_str());
            }
            if !config.query.is_empty() {
                req = req.query(&config.query);
            }
            req = self.authenticator.apply(req);

            match req.send().await {
                Ok(response) => {
                    let status = response.status();

                    if is_retryable_status(status.as_u16()) && attempt < max_retries {
                        let delay = if status == StatusCode::TOO_MANY_REQUESTS {
                            extract_retry_after(&response)
                                .unwrap_or_else(|| self.calculate_backoff(attempt))
                                .min(self.config.max_backoff)
                        } else {
                            self.calculate_backoff(attempt)
                        };
                        warn!(
                            "Request to {} failed with {}, attempt {}/{}, retrying in {:?}",
                            url,
                            status.as_u16(),
                            attempt + 1,
                            max_retries + 1,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    if !status.is_success() {
                        let body = response.text().await.unwrap_or_default();
                        return Err(Error::http_status(status.as_u16(), body));
                    }

                    debug!("Request succeeded: GET {}", url);
                    return Ok(response);
                }
                Err(e) => {
                    let err = if e.is_timeout() {
                        Error::Timeout {
                            timeout_ms: self.config.timeout.as_millis() as u64,
                        }
                    } else {
                        Error::Http(e)
                    };

                    if err.is_retryable() && attempt < max_retries {
                        let delay = self.calculate_backoff(attempt);
                        warn!(
                            "Request to {} failed ({}), attempt {}/{}, retrying in {:?}",
                            url,
                            err,
                            attempt + 1,
                            max_retries + 1,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(err);
                }
            }
        }
    }

    /// Make a GET request and parse the JSON body
    pub async fn get_json(&self, url: &str, config: RequestConfig) -> Result<Value> {
        let response = self.get_with_config(url, config).await?;
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| Error::decode(format!("Response from {url} is not valid JSON: {e}")))
    }

    /// Calculate backoff delay for a given attempt
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let delay = match self.config.backoff_type {
            BackoffType::Constant => self.config.initial_backoff,
            BackoffType::Exponential => {
                let factor = 2u32.saturating_pow(attempt);
                self.config.initial_backoff.saturating_mul(factor)
            }
        };

        std::cmp::min(delay, self.config.max_backoff)
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("auth", &self.authenticator.config().kind())
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

/// Join a base URL and an endpoint path with exactly one slash
///
/// Absolute endpoints (`http://` or `https://`) are returned unchanged.
pub fn join_url(base: &str, endpoint: &str) -> String {
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        return endpoint.to_string();
    }

    let base = base.trim_end_matches('/');
    let endpoint = endpoint.trim_start_matches('/');
    if endpoint.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{endpoint}")
    }
}

/// Extract retry-after header value
fn extract_retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
