//! Connector metadata
//!
//! Every connector carries a [`Metadata`] record describing its latest
//! connection and extraction attempt. The fixed fields are typed; anything
//! connector specific (`endpoint`, `batch_id`, `processed_files`, ...) lives
//! in an open extension map that is flattened when serialized.

use crate::error::{Error, Result};
use crate::types::{ConnectorStatus, JsonObject, JsonValue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Lifecycle and extraction metadata of one connector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub connector_name: String,
    pub connector_type: String,
    /// Start of the latest extraction attempt
    pub extraction_date: Option<DateTime<Utc>>,
    pub data_source: Option<String>,
    pub record_count: u64,
    pub status: ConnectorStatus,
    pub error: Option<String>,
    /// Connector specific fields
    #[serde(flatten)]
    pub extra: JsonObject,
}

impl Metadata {
    /// Metadata of a freshly constructed connector
    pub fn new(connector_name: impl Into<String>, connector_type: impl Into<String>) -> Self {
        Self {
            connector_name: connector_name.into(),
            connector_type: connector_type.into(),
            extraction_date: None,
            data_source: None,
            record_count: 0,
            status: ConnectorStatus::Initialized,
            error: None,
            extra: JsonObject::new(),
        }
    }

    /// Set the status
    ///
    /// A terminal status is never replaced by `in_progress`; only
    /// [`Metadata::begin_extraction`] starts a new attempt.
    pub fn set_status(&mut self, status: ConnectorStatus) {
        if status == ConnectorStatus::InProgress && self.status.is_terminal() {
            warn!(
                "Ignoring status change {} -> {} for '{}'",
                self.status, status, self.connector_name
            );
            return;
        }
        self.status = status;
    }

    /// Start a new extraction attempt
    pub fn begin_extraction(&mut self) {
        self.extraction_date = Some(Utc::now());
        self.status = ConnectorStatus::InProgress;
        self.error = None;
    }

    /// Record a failure; the message is stored verbatim
    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = ConnectorStatus::Error;
        self.error = Some(message.into());
    }

    /// Set a connector specific field
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<JsonValue>) {
        self.extra.insert(key.into(), value.into());
    }

    /// Read any field, fixed or connector specific, as JSON
    pub fn get(&self, key: &str) -> Option<JsonValue> {
        match key {
            "connector_name" => Some(self.connector_name.clone().into()),
            "connector_type" => Some(self.connector_type.clone().into()),
            "extraction_date" => Some(
                self.extraction_date
                    .map_or(JsonValue::Null, |d| d.to_rfc3339().into()),
            ),
            "data_source" => Some(self.data_source.clone().into()),
            "record_count" => Some(self.record_count.into()),
            "status" => Some(self.status.to_string().into()),
            "error" => Some(self.error.clone().into()),
            other => self.extra.get(other).cloned(),
        }
    }

    /// Merge a map of fields into the metadata
    ///
    /// Keys overlay existing values and are never removed. The connector
    /// identity cannot be changed; typed fields must carry a value of the
    /// right shape.
    pub fn update(&mut self, fields: JsonObject) -> Result<()> {
        for (key, value) in fields {
            match key.as_str() {
                "connector_name" | "connector_type" => {
                    warn!("Metadata field '{key}' is immutable, ignoring update");
                }
                "status" => {
                    let status: ConnectorStatus = serde_json::from_value(value)
                        .map_err(|e| Error::invalid_value("status", e.to_string()))?;
                    self.set_status(status);
                }
                "error" => self.error = optional_string(&key, value)?,
                "data_source" => self.data_source = optional_string(&key, value)?,
                "record_count" => {
                    self.record_count = value.as_u64().ok_or_else(|| {
                        Error::invalid_value("record_count", format!("expected a count, got {value}"))
                    })?;
                }
                "extraction_date" => {
                    self.extraction_date = serde_json::from_value(value)
                        .map_err(|e| Error::invalid_value("extraction_date", e.to_string()))?;
                }
                _ => {
                    self.extra.insert(key, value);
                }
            }
        }
        Ok(())
    }

    /// Write the metadata as indented JSON, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        crate::output::write_json_pretty(path, self)?;
        info!("Saved metadata to {}", path.display());
        Ok(())
    }
}

fn optional_string(field: &str, value: JsonValue) -> Result<Option<String>> {
    match value {
        JsonValue::Null => Ok(None),
        JsonValue::String(s) => Ok(Some(s)),
        other => Err(Error::invalid_value(
            field,
            format!("expected a string or null, got {other}"),
        )),
    }
}
