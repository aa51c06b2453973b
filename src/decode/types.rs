//! Decoder types and traits
//!
//! Defines the file formats the connectors read and the decoder trait the
//! text formats share.

use crate::config::ReadOptions;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::Path;

/// Format of a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecoderFormat {
    /// CSV format (default for unknown extensions)
    #[default]
    Csv,
    /// A JSON document, either an array of records or an object
    Json,
    /// JSON Lines format (one JSON object per line)
    #[serde(alias = "ndjson")]
    Jsonl,
    /// Apache Parquet
    Parquet,
}

impl DecoderFormat {
    /// Detect the format from a file extension
    ///
    /// Returns `None` for unknown or missing extensions; callers fall back
    /// to CSV.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" | "txt" | "tsv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            "jsonl" | "ndjson" => Some(Self::Jsonl),
            "parquet" | "pq" => Some(Self::Parquet),
            _ => None,
        }
    }

    /// Whether the format is text decoded through a [`RecordDecoder`]
    pub fn is_text(self) -> bool {
        !matches!(self, Self::Parquet)
    }
}

impl fmt::Display for DecoderFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Jsonl => "jsonl",
            Self::Parquet => "parquet",
        };
        f.write_str(name)
    }
}

/// Configuration for decoding a file
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// File format
    pub format: DecoderFormat,
    /// Dot path to the records inside a JSON document
    pub record_path: Option<String>,
    /// CSV delimiter
    pub csv_delimiter: char,
    /// Whether CSV has a header row
    pub csv_has_header: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self::csv()
    }
}

impl DecoderConfig {
    /// Create a JSON decoder config
    pub fn json() -> Self {
        Self {
            format: DecoderFormat::Json,
            ..Self::csv()
        }
    }

    /// Create a JSONL decoder config
    pub fn jsonl() -> Self {
        Self {
            format: DecoderFormat::Jsonl,
            ..Self::csv()
        }
    }

    /// Create a CSV decoder config
    pub fn csv() -> Self {
        Self {
            format: DecoderFormat::Csv,
            record_path: None,
            csv_delimiter: ',',
            csv_has_header: true,
        }
    }

    /// Create a Parquet decoder config
    pub fn parquet() -> Self {
        Self {
            format: DecoderFormat::Parquet,
            ..Self::csv()
        }
    }

    /// Build a config for `format` from the read options of a file entry
    pub fn from_options(format: DecoderFormat, options: &ReadOptions) -> Self {
        let base = Self::csv();
        Self {
            format,
            record_path: options.records_path.clone(),
            csv_delimiter: options.delimiter.unwrap_or(base.csv_delimiter),
            csv_has_header: options.has_header.unwrap_or(base.csv_has_header),
        }
    }

    /// Set the record path
    #[must_use]
    pub fn with_record_path(mut self, path: impl Into<String>) -> Self {
        self.record_path = Some(path.into());
        self
    }

    /// Set the CSV delimiter and header handling
    #[must_use]
    pub fn with_csv_options(mut self, delimiter: char, has_header: bool) -> Self {
        self.csv_delimiter = delimiter;
        self.csv_has_header = has_header;
        self
    }
}

/// Trait for decoding text bodies into records
pub trait RecordDecoder: Send + Sync {
    /// Decode the body into a list of records
    fn decode(&self, body: &str) -> Result<Vec<Value>>;
}
