//! Pagination types and traits
//!
//! Defines the pagination configuration, the transient state of one
//! traversal, and the dot-path helpers used to read results, totals and
//! cursors out of a response body.

use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Page size used when the request parameters carry none
pub const DEFAULT_LIMIT: u64 = 100;

/// Pagination protocol of an API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PaginationType {
    /// `?offset=200&limit=100`
    #[default]
    Offset,
    /// Opaque token taken from the previous response
    Cursor,
    /// `?page=3&limit=100`, first page is 1
    Page,
}

impl PaginationType {
    /// Name of the position parameter when none is configured
    pub fn default_position_param(self) -> &'static str {
        match self {
            Self::Offset => "offset",
            Self::Cursor => "cursor",
            Self::Page => "page",
        }
    }
}

impl fmt::Display for PaginationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_position_param())
    }
}

impl TryFrom<String> for PaginationType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        match value.as_str() {
            "offset" => Ok(Self::Offset),
            "cursor" => Ok(Self::Cursor),
            "page" => Ok(Self::Page),
            _ => Err(Error::UnsupportedPagination {
                pagination_type: value,
            }),
        }
    }
}

impl From<PaginationType> for String {
    fn from(value: PaginationType) -> Self {
        value.to_string()
    }
}

/// Pagination section of an API connector configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Pagination protocol
    #[serde(rename = "type", default)]
    pub pagination_type: PaginationType,

    /// Query parameter carrying the page size
    #[serde(default = "default_limit_param")]
    pub limit_param: String,

    /// Query parameter carrying the offset, cursor or page number
    #[serde(default, alias = "position_param")]
    pub offset_param: Option<String>,

    /// Dot path to the results array; empty means the whole body
    #[serde(default)]
    pub results_path: String,

    /// Dot path to the total record count
    #[serde(default)]
    pub total_count_path: String,

    /// Dot path to the next cursor (cursor mode)
    #[serde(default)]
    pub next_cursor_path: String,
}

fn default_limit_param() -> String {
    "limit".to_string()
}

impl PaginationConfig {
    /// Create a config for the given protocol with default parameter names
    pub fn new(pagination_type: PaginationType) -> Self {
        Self {
            pagination_type,
            limit_param: default_limit_param(),
            ..Default::default()
        }
    }

    /// Set the results path
    #[must_use]
    pub fn with_results_path(mut self, path: impl Into<String>) -> Self {
        self.results_path = path.into();
        self
    }

    /// Set the total count path
    #[must_use]
    pub fn with_total_count_path(mut self, path: impl Into<String>) -> Self {
        self.total_count_path = path.into();
        self
    }

    /// Set the next cursor path
    #[must_use]
    pub fn with_next_cursor_path(mut self, path: impl Into<String>) -> Self {
        self.next_cursor_path = path.into();
        self
    }

    /// Name of the position parameter
    pub fn position_param(&self) -> &str {
        self.offset_param
            .as_deref()
            .unwrap_or_else(|| self.pagination_type.default_position_param())
    }

    /// Page size taken from the request parameters
    ///
    /// Falls back to [`DEFAULT_LIMIT`]; a zero or non-numeric value is a
    /// configuration error.
    pub fn limit_from(&self, params: &JsonObject) -> Result<u64> {
        let Some(value) = params.get(&self.limit_param) else {
            return Ok(DEFAULT_LIMIT);
        };

        let limit = match value {
            JsonValue::Number(n) => n.as_u64(),
            JsonValue::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        };

        match limit {
            Some(limit) if limit > 0 => Ok(limit),
            _ => Err(Error::invalid_value(
                self.limit_param.clone(),
                format!("page size must be a positive integer, got {value}"),
            )),
        }
    }
}

/// Tracks pagination state during one traversal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationState {
    /// Protocol being traversed
    pub pagination_type: PaginationType,
    /// Current offset (offset mode)
    pub offset: u64,
    /// Current page number (page mode)
    pub page: u64,
    /// Cursor for the next request (cursor mode)
    pub cursor: Option<String>,
    /// Page size
    pub limit: u64,
    /// Total record count, once learned from the first page
    pub total_count: Option<u64>,
    /// Whether another request should be issued
    pub more_pages: bool,
    /// Requests issued so far
    pub requests: u32,
}

impl PaginationState {
    /// Create the initial state: offset 0, page 1, no cursor
    pub fn new(pagination_type: PaginationType, limit: u64) -> Self {
        Self {
            pagination_type,
            offset: 0,
            page: 1,
            cursor: None,
            limit,
            total_count: None,
            more_pages: true,
            requests: 0,
        }
    }

    /// Whether the next request is the first one
    pub fn is_first_page(&self) -> bool {
        self.requests == 0
    }

    /// Mark pagination as complete
    pub fn mark_done(&mut self) {
        self.more_pages = false;
    }
}

/// Core trait for pagination strategies
pub trait Paginator: Send + Sync {
    /// Query parameter for the current position, `None` to omit it
    fn position_param(&self, state: &PaginationState) -> Option<(String, String)>;

    /// Advance the position after a page and recompute `more_pages`
    fn advance(&self, body: &JsonValue, results_len: usize, state: &mut PaginationState);
}

// ============================================================================
// Dot-path helpers
// ============================================================================

/// Walk a dot-separated path through nested objects
///
/// An empty path returns the value itself.
pub fn extract_path<'a>(value: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    if path.is_empty() {
        return Some(value);
    }

    let mut current = value;
    for part in path.split('.') {
        match current {
            JsonValue::Object(map) => current = map.get(part)?,
            _ => return None,
        }
    }
    Some(current)
}

/// Extract the records of a page
///
/// A missing path segment or a null value yields no records; a single
/// non-array value is treated as one record.
pub fn extract_results(body: &JsonValue, results_path: &str) -> Vec<JsonValue> {
    match extract_path(body, results_path) {
        Some(JsonValue::Array(items)) => items.clone(),
        Some(JsonValue::Null) | None => Vec::new(),
        Some(other) => vec![other.clone()],
    }
}

/// Extract a non-negative integer count (numbers or numeric strings)
pub fn extract_count(body: &JsonValue, path: &str) -> Option<u64> {
    match extract_path(body, path)? {
        JsonValue::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Extract a non-empty cursor token
pub fn extract_cursor(body: &JsonValue, path: &str) -> Option<String> {
    if path.is_empty() {
        return None;
    }

    match extract_path(body, path)? {
        JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Render request parameters as query pairs
///
/// Strings are sent verbatim, nulls are dropped, everything else uses its
/// JSON text.
pub fn to_query_pairs(params: &JsonObject) -> Vec<(String, String)> {
    params
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| {
            let value = match v {
                JsonValue::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), value)
        })
        .collect()
}
