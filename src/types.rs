//! Common types used throughout the connectors crate
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// Connector Status
// ============================================================================

/// Lifecycle status recorded in connector metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorStatus {
    #[default]
    Initialized,
    Connecting,
    Connected,
    InProgress,
    Completed,
    CompletedWithErrors,
    /// Local resources are missing or nothing matched
    Warning,
    Error,
}

impl ConnectorStatus {
    /// Whether this status ends an extraction attempt
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::CompletedWithErrors | Self::Warning | Self::Error
        )
    }
}

impl fmt::Display for ConnectorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Initialized => "initialized",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::CompletedWithErrors => "completed_with_errors",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

// ============================================================================
// Output Shape
// ============================================================================

/// Shape of the data returned by an API extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputShape {
    /// Arrow table
    #[default]
    #[serde(alias = "dataframe")]
    Table,
    /// Raw JSON records
    #[serde(alias = "dict")]
    Records,
}

// ============================================================================
// File Format
// ============================================================================

/// Persistence format accepted by `save`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    #[default]
    Csv,
    Json,
    Parquet,
}

impl FileFormat {
    /// File extension for this format
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Parquet => "parquet",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for FileFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "parquet" => Ok(Self::Parquet),
            other => Err(Error::unsupported_format(other, "any")),
        }
    }
}

// ============================================================================
// Backoff Type
// ============================================================================

/// Type of backoff for retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay between retries
    Constant,
    /// Exponential increase in delay
    #[default]
    Exponential,
}

// ============================================================================
// Utilities
// ============================================================================

/// Extension trait for Option<String> to handle empty strings
pub trait OptionStringExt {
    /// Returns None if the string is empty
    fn none_if_empty(self) -> Option<String>;
}

impl OptionStringExt for Option<String> {
    fn none_if_empty(self) -> Option<String> {
        self.filter(|s| !s.is_empty())
    }
}

impl OptionStringExt for String {
    fn none_if_empty(self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serde() {
        let status: ConnectorStatus = serde_json::from_str("\"completed_with_errors\"").unwrap();
        assert_eq!(status, ConnectorStatus::CompletedWithErrors);

        let json = serde_json::to_string(&ConnectorStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        assert_eq!(ConnectorStatus::InProgress.to_string(), "in_progress");
    }

    #[test]
    fn test_status_terminal() {
        assert!(ConnectorStatus::Completed.is_terminal());
        assert!(ConnectorStatus::Error.is_terminal());
        assert!(!ConnectorStatus::InProgress.is_terminal());
        assert!(!ConnectorStatus::Connected.is_terminal());
    }

    #[test]
    fn test_output_shape_aliases() {
        let shape: OutputShape = serde_json::from_str("\"dataframe\"").unwrap();
        assert_eq!(shape, OutputShape::Table);
        let shape: OutputShape = serde_json::from_str("\"dict\"").unwrap();
        assert_eq!(shape, OutputShape::Records);
    }

    #[test]
    fn test_file_format_parse() {
        assert_eq!("CSV".parse::<FileFormat>().unwrap(), FileFormat::Csv);
        assert_eq!("parquet".parse::<FileFormat>().unwrap(), FileFormat::Parquet);
        assert!("xlsx".parse::<FileFormat>().is_err());
        assert_eq!(FileFormat::Json.extension(), "json");
    }

    #[test]
    fn test_option_string_none_if_empty() {
        assert_eq!(
            Some("test".to_string()).none_if_empty(),
            Some("test".to_string())
        );
        assert_eq!(Some(String::new()).none_if_empty(), None);
        assert_eq!(None::<String>.none_if_empty(), None);
        assert_eq!(String::new().none_if_empty(), None);
    }
}
