//! Auth configuration types
//!
//! These types mirror the `auth` object of an API connector configuration
//! after environment substitution has been applied.

use serde::{Deserialize, Serialize};

/// Authentication configuration, tagged by its `type` field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    /// No authentication required
    #[default]
    None,

    /// API key sent in a request header
    ApiKey {
        /// The API key value
        #[serde(default)]
        api_key: String,
        /// Header carrying the key
        #[serde(default = "default_api_key_name")]
        api_key_name: String,
    },

    /// HTTP Basic authentication
    Basic {
        #[serde(default)]
        username: String,
        #[serde(default)]
        password: String,
    },

    /// Bearer token authentication
    Bearer {
        #[serde(default)]
        token: String,
    },

    /// OAuth with an already obtained access token, sent as a bearer token
    #[serde(rename = "oauth")]
    OAuth {
        #[serde(default)]
        token: String,
    },
}

fn default_api_key_name() -> String {
    "X-API-Key".to_string()
}

impl AuthConfig {
    /// Short label of the auth mode, used in logs and metadata
    pub fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::ApiKey { .. } => "api_key",
            Self::Basic { .. } => "basic",
            Self::Bearer { .. } => "bearer",
            Self::OAuth { .. } => "oauth",
        }
    }
}
