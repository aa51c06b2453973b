// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Retail Connectors
//!
//! Data-acquisition connectors for a retail analytics pipeline.
//!
//! ## Features
//!
//! - **REST API Extraction**: endpoints, parameter layers and auth from JSON configuration
//! - **Pagination**: offset, page number and cursor traversal
//! - **Local Files**: CSV, JSON, JSON lines and Parquet into Arrow tables
//! - **Kaggle**: dataset downloads with archive extraction
//! - **Arrow Output**: tables saved as CSV, JSON lines or Parquet
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use retail_connectors::{Connector, ConnectorFactory, ExtractOptions, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let factory = ConnectorFactory::new();
//!     let mut connector = factory.create_connector_from_config("config/products_api.json")?;
//!
//!     if connector.connect().await {
//!         let data = connector
//!             .extract(&ExtractOptions::new().with_endpoint("products"))
//!             .await?;
//!         println!("{} records", data.record_count());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Connector Interface                         │
//! │  connect() → bool    extract(options) → ExtractOutput           │
//! │  save(data, path, format)    metadata()                         │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │   Auth   │   HTTP    │   Paginate    │  Decode   │   Output    │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ API Key  │ GET       │ Offset        │ CSV       │ Arrow       │
//! │ Basic    │ Retry     │ Page Number   │ JSON      │ Parquet     │
//! │ Bearer   │ Rate Limit│ Cursor        │ JSONL     │ CSV         │
//! │ OAuth    │ Backoff   │               │ Parquet   │ JSON lines  │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the connectors
pub mod error;

/// Common types and type aliases
pub mod types;

/// Authentication implementations
pub mod auth;

/// HTTP client with retry and rate limiting
pub mod http;

/// Pagination strategies
pub mod pagination;

/// File decoders (CSV, JSON, JSONL, Parquet)
pub mod decode;

/// Arrow conversion and file output
pub mod output;

/// Configuration and connector definitions
pub mod config;

/// Connector metadata
pub mod metadata;

/// Connector trait and extraction types
pub mod connector;

/// Built-in connectors
pub mod connectors;

/// Connector type registry
pub mod factory;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::{load_definition, ConnectorDefinition};
pub use connector::{Connector, ExtractOptions, ExtractOutput};
pub use connectors::{ApiConnector, FileConnector, KaggleConnector};
pub use error::{Error, Result};
pub use factory::{ConnectorConstructor, ConnectorFactory};
pub use metadata::Metadata;
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
