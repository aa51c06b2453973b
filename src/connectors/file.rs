//! Local file connector
//!
//! Reads explicit files and glob matches inside directories into one Arrow
//! table per file. A file that fails to decode is recorded and skipped; the
//! remaining files are still returned.

use crate::config::{parse_config, DirectorySpec, FileConfig, FileSpec, ReadOptions};
use crate::connector::{Connector, ExtractOptions, ExtractOutput};
use crate::decode::{read_table, DecoderConfig, DecoderFormat};
use crate::error::Result;
use crate::metadata::Metadata;
use crate::types::{ConnectorStatus, JsonValue};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// A file selected for reading
#[derive(Debug, Clone, PartialEq)]
struct MatchedFile {
    path: PathBuf,
    format: DecoderFormat,
    read_options: ReadOptions,
}

/// Connector for CSV, JSON, JSON lines and Parquet files on local disk
#[derive(Debug)]
pub struct FileConnector {
    name: String,
    config: FileConfig,
    metadata: Metadata,
    connected: bool,
}

impl FileConnector {
    /// Type tag registered with the factory
    pub const TYPE: &'static str = "file";

    pub fn new(name: impl Into<String>, config: FileConfig) -> Self {
        let name = name.into();
        let mut metadata = Metadata::new(&name, Self::TYPE);
        metadata.data_source = Some("local_files".to_string());
        metadata.set("files", serde_json::to_value(&config.files).unwrap_or_default());
        metadata.set(
            "directories",
            serde_json::to_value(&config.directories).unwrap_or_default(),
        );

        info!("Initialized FileConnector with name: {name}");
        Self {
            name,
            config,
            metadata,
            connected: false,
        }
    }

    /// Create a connector from an untyped `config` object
    pub fn from_config(name: impl Into<String>, config: &JsonValue) -> Result<Self> {
        Ok(Self::new(name, parse_config(config)?))
    }

    pub fn config(&self) -> &FileConfig {
        &self.config
    }
}

#[async_trait]
impl Connector for FileConnector {
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
        self.connected
    }

    async fn connect(&mut self) -> bool {
        let missing_files: Vec<String> = self
            .config
            .files
            .iter()
            .filter(|f| !f.path.is_file())
            .map(|f| f.path.display().to_string())
            .collect();
        let missing_directories: Vec<String> = self
            .config
            .directories
            .iter()
            .filter(|d| !d.path.is_dir())
            .map(|d| d.path.display().to_string())
            .collect();

        if missing_files.is_empty() && missing_directories.is_empty() {
            info!("All specified files and directories exist");
            self.connected = true;
            self.metadata.set_status(ConnectorStatus::Connected);
            return true;
        }

        warn!("Missing files: {missing_files:?}");
        warn!("Missing directories: {missing_directories:?}");
        self.connected = false;
        self.metadata.set_status(ConnectorStatus::Warning);
        self.metadata.set("missing_files", missing_files);
        self.metadata.set("missing_directories", missing_directories);
        false
    }

    /// Read every matching file
    ///
    /// Missing paths are skipped rather than treated as connection
    /// failures, so `connect` is not required first.
    async fn extract(&mut self, options: &ExtractOptions) -> Result<ExtractOutput> {
        let files = options.files.as_ref().unwrap_or(&self.config.files);
        let directories = options
            .directories
            .as_ref()
            .unwrap_or(&self.config.directories);
        let (matches, mut failed_files) = matching_files(files, directories);

        self.metadata.begin_extraction();
        let batch_id = self.generate_batch_id();
        self.metadata.set("batch_id", batch_id.as_str());

        if matches.is_empty() && failed_files.is_empty() {
            warn!("No matching files found for {}", self.name);
            self.metadata.set_status(ConnectorStatus::Warning);
            self.metadata.set("warning", "No matching files found");
            self.metadata.set("completion_time", Utc::now().to_rfc3339());
            return Ok(ExtractOutput::Tables(BTreeMap::new()));
        }

        let mut tables: BTreeMap<String, RecordBatch> = BTreeMap::new();
        for file in &matches {
            info!("Reading {} file: {}", file.format, file.path.display());
            let config = DecoderConfig::from_options(file.format, &file.read_options);
            match read_table(&file.path, &config) {
                Ok(batch) => {
                    info!(
                        "Successfully read {} records from {}",
                        batch.num_rows(),
                        file.path.display()
                    );
                    tables.insert(file.path.display().to_string(), batch);
                }
                Err(e) => {
                    error!("Failed to read {}: {e}", file.path.display());
                    failed_files.push(json!({
                        "file": file.path.display().to_string(),
                        "error": e.to_string(),
                    }));
                }
            }
        }

        let record_count: usize = tables.values().map(RecordBatch::num_rows).sum();
        self.metadata.record_count = record_count as u64;
        self.metadata.set_status(if failed_files.is_empty() {
            ConnectorStatus::Completed
        } else {
            ConnectorStatus::CompletedWithErrors
        });
        self.metadata.set("processed_files", tables.len());
        self.metadata.set("failed_files", failed_files);
        self.metadata.set("completion_time", Utc::now().to_rfc3339());

        Ok(ExtractOutput::Tables(tables))
    }
}

// ============================================================================
// File Matching
// ============================================================================

/// Detect the decoder format from a file extension
///
/// Unknown extensions are read as CSV.
pub fn detect_format(path: &Path) -> DecoderFormat {
    DecoderFormat::from_path(path).unwrap_or_else(|| {
        warn!(
            "Unknown file extension for {}, reading as csv",
            path.display()
        );
        DecoderFormat::Csv
    })
}

/// Resolve explicit files and directory globs
///
/// Returns the existing files in configuration order, followed by the
/// sorted matches of each directory, plus a failure entry for every
/// unusable glob pattern.
fn matching_files(
    files: &[FileSpec],
    directories: &[DirectorySpec],
) -> (Vec<MatchedFile>, Vec<JsonValue>) {
    let mut matches = Vec::new();
    let mut failures = Vec::new();

    for file in files {
        if !file.path.is_file() {
            warn!("Skipping missing file {}", file.path.display());
            continue;
        }
        matches.push(MatchedFile {
            path: file.path.clone(),
            format: file.format.unwrap_or_else(|| detect_format(&file.path)),
            read_options: file.read_options.clone(),
        });
    }

    for dir in directories {
        if !dir.path.is_dir() {
            warn!("Skipping missing directory {}", dir.path.display());
            continue;
        }
        match glob_directory(dir) {
            Ok(paths) => matches.extend(paths.into_iter().map(|path| MatchedFile {
                format: dir.format.unwrap_or_else(|| detect_format(&path)),
                path,
                read_options: dir.read_options.clone(),
            })),
            Err(e) => {
                error!("Invalid pattern for {}: {e}", dir.path.display());
                failures.push(json!({
                    "file": dir.path.join(&dir.pattern).display().to_string(),
                    "error": e.to_string(),
                }));
            }
        }
    }

    (matches, failures)
}

fn glob_directory(dir: &DirectorySpec) -> Result<Vec<PathBuf>> {
    let pattern = dir.path.join(&dir.pattern);
    let mut paths: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())?
        .filter_map(std::result::Result::ok)
        .filter(|p| p.is_file())
        .collect();
    paths.sort();
    Ok(paths)
}
