//! Authenticator implementation
//!
//! Applies the configured credentials to outgoing requests.

use super::types::AuthConfig;
use crate::error::{Error, Result};
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::RequestBuilder;

/// Authenticator handles applying authentication to HTTP requests
#[derive(Debug, Clone, Default)]
pub struct Authenticator {
    config: AuthConfig,
}

impl Authenticator {
    /// Create a new authenticator with the given config
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Check that the credentials can be sent as HTTP headers
    ///
    /// Called while a connector connects so bad header names or values are
    /// reported as a connection failure instead of on the first request.
    pub fn validate(&self) -> Result<()> {
        match &self.config {
            AuthConfig::ApiKey {
                api_key,
                api_key_name,
            } => {
                HeaderName::from_bytes(api_key_name.as_bytes()).map_err(|e| {
                    Error::invalid_value("auth.api_key_name", format!("{api_key_name}: {e}"))
                })?;
                HeaderValue::from_str(api_key)
                    .map_err(|e| Error::invalid_value("auth.api_key", e.to_string()))?;
                Ok(())
            }
            AuthConfig::Bearer { token } | AuthConfig::OAuth { token } => {
                HeaderValue::from_str(&format!("Bearer {token}"))
                    .map_err(|e| Error::invalid_value("auth.token", e.to_string()))?;
                Ok(())
            }
            AuthConfig::None | AuthConfig::Basic { .. } => Ok(()),
        }
    }

    /// Apply authentication to a request builder
    pub fn apply(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.config {
            AuthConfig::None => req,

            AuthConfig::ApiKey {
                api_key,
                api_key_name,
            } => req.header(api_key_name.as_str(), api_key.as_str()),

            AuthConfig::Basic { username, password } => req.basic_auth(username, Some(password)),

            AuthConfig::Bearer { token } | AuthConfig::OAuth { token } => req.bearer_auth(token),
        }
    }

    /// Get the auth configuration
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }
}
