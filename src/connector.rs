//! Connector trait and extraction types
//!
//! Defines the contract every data source implements: a two-phase
//! lifecycle (`connect` then `extract`), persistence of the extracted data,
//! and metadata tracking.

use crate::config::{DatasetSpec, DirectorySpec, FileSpec};
use crate::connectors::DownloadedFile;
use crate::error::{Error, Result};
use crate::metadata::Metadata;
use crate::output::save_data;
use crate::types::{FileFormat, JsonObject, JsonValue, OutputShape};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;

// ============================================================================
// Extract Options
// ============================================================================

/// Per-call options of [`Connector::extract`]
///
/// Each connector reads the options that apply to it and ignores the rest.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Logical endpoint name (API)
    pub endpoint: Option<String>,
    /// Request parameter overrides (API)
    pub params: JsonObject,
    /// Table or raw records (API)
    pub output: OutputShape,
    /// Flatten nested records before building a table (API)
    pub flatten: bool,
    /// Replace the configured files for this call (file)
    pub files: Option<Vec<FileSpec>>,
    /// Replace the configured directories for this call (file)
    pub directories: Option<Vec<DirectorySpec>>,
    /// Replace the configured datasets for this call (Kaggle)
    pub datasets: Option<Vec<DatasetSpec>>,
    /// Extract downloaded archives (Kaggle)
    pub unzip: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            endpoint: None,
            params: JsonObject::new(),
            output: OutputShape::Table,
            flatten: false,
            files: None,
            directories: None,
            datasets: None,
            unzip: true,
        }
    }
}

impl ExtractOptions {
    /// Create default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the endpoint
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Add a request parameter override
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Set the output shape
    #[must_use]
    pub fn with_output(mut self, output: OutputShape) -> Self {
        self.output = output;
        self
    }

    /// Enable or disable flattening
    #[must_use]
    pub fn with_flatten(mut self, flatten: bool) -> Self {
        self.flatten = flatten;
        self
    }

    /// Override the files to read
    #[must_use]
    pub fn with_files(mut self, files: Vec<FileSpec>) -> Self {
        self.files = Some(files);
        self
    }

    /// Override the directories to scan
    #[must_use]
    pub fn with_directories(mut self, directories: Vec<DirectorySpec>) -> Self {
        self.directories = Some(directories);
        self
    }

    /// Override the datasets to download
    #[must_use]
    pub fn with_datasets(mut self, datasets: Vec<DatasetSpec>) -> Self {
        self.datasets = Some(datasets);
        self
    }

    /// Enable or disable archive extraction
    #[must_use]
    pub fn with_unzip(mut self, unzip: bool) -> Self {
        self.unzip = unzip;
        self
    }
}

// ============================================================================
// Extract Output
// ============================================================================

/// Data returned by [`Connector::extract`]
#[derive(Debug, Clone)]
pub enum ExtractOutput {
    /// One table
    Table(RecordBatch),
    /// Raw JSON records
    Records(Vec<JsonValue>),
    /// Named tables, one per source file
    Tables(BTreeMap<String, RecordBatch>),
    /// Files downloaded to local storage
    Downloads(Vec<DownloadedFile>),
}

impl ExtractOutput {
    /// Short name of the variant, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Table(_) => "table",
            Self::Records(_) => "records",
            Self::Tables(_) => "table map",
            Self::Downloads(_) => "download list",
        }
    }

    /// Number of records (rows, records, rows across tables, or files)
    pub fn record_count(&self) -> usize {
        match self {
            Self::Table(batch) => batch.num_rows(),
            Self::Records(records) => records.len(),
            Self::Tables(tables) => tables.values().map(RecordBatch::num_rows).sum(),
            Self::Downloads(files) => files.len(),
        }
    }

    /// The table, if this is a single table
    pub fn as_table(&self) -> Option<&RecordBatch> {
        match self {
            Self::Table(batch) => Some(batch),
            _ => None,
        }
    }

    /// The records, if this is a record list
    pub fn as_records(&self) -> Option<&[JsonValue]> {
        match self {
            Self::Records(records) => Some(records),
            _ => None,
        }
    }

    /// The named tables, if this is a table map
    pub fn as_tables(&self) -> Option<&BTreeMap<String, RecordBatch>> {
        match self {
            Self::Tables(tables) => Some(tables),
            _ => None,
        }
    }

    /// The downloaded files, if this is a download list
    pub fn as_downloads(&self) -> Option<&[DownloadedFile]> {
        match self {
            Self::Downloads(files) => Some(files),
            _ => None,
        }
    }
}

// ============================================================================
// Connector Trait
// ============================================================================

/// Core trait implemented by all connectors
///
/// `connect` reports connectivity problems by returning `false` and
/// recording them in the metadata. `extract` returns `Err` for everything
/// else, after recording the failure in the metadata.
#[async_trait]
pub trait Connector: std::fmt::Debug + Send + Sync {
    /// Connector name, unique within a registry
    fn name(&self) -> &str;

    /// Type tag the connector was created from
    fn connector_type(&self) -> &str;

    /// Current metadata
    fn metadata(&self) -> &Metadata;

    /// Mutable access to the metadata
    fn metadata_mut(&mut self) -> &mut Metadata;

    /// Whether the last `connect` succeeded
    fn is_connected(&self) -> bool;

    /// Establish readiness; safe to call repeatedly
    async fn connect(&mut self) -> bool;

    /// Extract data from the source
    async fn extract(&mut self, options: &ExtractOptions) -> Result<ExtractOutput>;

    /// Connect when needed, failing with `Error::NotConnected`
    async fn ensure_connected(&mut self) -> Result<()> {
        if self.is_connected() || self.connect().await {
            Ok(())
        } else {
            Err(Error::not_connected(self.name()))
        }
    }

    /// Merge fields into the metadata
    fn update_metadata(&mut self, fields: JsonObject) -> Result<()> {
        self.metadata_mut().update(fields)
    }

    /// Persist extracted data, returning the written path
    fn save(&self, data: &ExtractOutput, destination: &Path, format: FileFormat) -> Result<PathBuf> {
        save_data(self.name(), data, destination, format)
    }

    /// Identifier of one extraction batch
    fn generate_batch_id(&self) -> String {
        batch_id(self.name(), Utc::now())
    }

    /// Write the metadata as JSON
    fn save_metadata(&self, path: &Path) -> Result<()> {
        self.metadata().save(path)
    }
}

/// Batch identifier for a connector name at a given second
///
/// 32 lowercase hex characters; the same name within the same second
/// always yields the same id.
pub fn batch_id(name: &str, at: DateTime<Utc>) -> String {
    let seed = format!("{name}_{}", at.format("%Y%m%d%H%M%S"));
    Uuid::new_v5(&Uuid::NAMESPACE_OID, seed.as_bytes())
        .simple()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_batch_id_is_stable_within_a_second() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap();
        let a = batch_id("sales_api", at);
        let b = batch_id("sales_api", at + chrono::Duration::milliseconds(400));
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_batch_id_differs_by_name_and_time() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap();
        assert_ne!(batch_id("sales_api", at), batch_id("stock_api", at));
        assert_ne!(
            batch_id("sales_api", at),
            batch_id("sales_api", at + chrono::Duration::seconds(1))
        );
    }

    #[test]
    fn test_extract_options_builder() {
        let options = ExtractOptions::new()
            .with_endpoint("products")
            .with_param("limit", 10)
            .with_output(OutputShape::Records)
            .with_flatten(true);

        assert_eq!(options.endpoint.as_deref(), Some("products"));
        assert_eq!(options.params.get("limit"), Some(&json!(10)));
        assert_eq!(options.output, OutputShape::Records);
        assert!(options.flatten);
        assert!(options.unzip);
    }

    #[test]
    fn test_extract_output_counts() {
        let records = ExtractOutput::Records(vec![json!({"a": 1}), json!({"a": 2})]);
        assert_eq!(records.record_count(), 2);
        assert_eq!(records.kind(), "records");
        assert!(records.as_table().is_none());
        assert_eq!(records.as_records().map(<[_]>::len), Some(2));

        let batch = crate::output::json_to_arrow(&[json!({"a": 1})], None).unwrap();
        let mut tables = BTreeMap::new();
        tables.insert("a.csv".to_string(), batch.clone());
        tables.insert("b.csv".to_string(), batch);
        assert_eq!(ExtractOutput::Tables(tables).record_count(), 2);
    }
}
