//! Authentication module
//!
//! Supports: API Key header, HTTP Basic, Bearer token, OAuth (pre-obtained token)
//!
//! The `Authenticator` applies the configured credentials to every request
//! issued by a connector's HTTP client.

mod authenticator;
mod types;

pub use authenticator::Authenticator;
pub use types::AuthConfig;
