//! Built-in connectors
//!
//! - [`ApiConnector`]: paginated REST APIs
//! - [`FileConnector`]: CSV, JSON, JSON lines and Parquet files on disk
//! - [`KaggleConnector`]: Kaggle dataset downloads

mod api;
mod file;
mod kaggle;

pub use api::{flatten_record, ApiConnector};
pub use file::{detect_format, FileConnector};
pub use kaggle::{
    resolve_credentials, DatasetSummary, DownloadStatus, DownloadedFile, KaggleConnector,
};
