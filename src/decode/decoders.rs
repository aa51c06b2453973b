//! Decoder implementations
//!
//! Each decoder handles a specific text format.

use super::types::{DecoderConfig, DecoderFormat, RecordDecoder};
use crate::error::{Error, Result};
use crate::pagination::extract_results;
use serde_json::{Map, Value};

// ============================================================================
// JSON Decoder
// ============================================================================

/// JSON decoder with optional record path extraction
#[derive(Debug, Clone, Default)]
pub struct JsonDecoder {
    /// Dot path to the records
    record_path: Option<String>,
}

impl JsonDecoder {
    /// Create a new JSON decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a JSON decoder with a record path
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            record_path: Some(path.into()),
        }
    }
}

impl RecordDecoder for JsonDecoder {
    fn decode(&self, body: &str) -> Result<Vec<Value>> {
        let value: Value = serde_json::from_str(body).map_err(|e| Error::Decode {
            message: format!("Failed to parse JSON: {e}"),
        })?;
        Ok(extract_results(
            &value,
            self.record_path.as_deref().unwrap_or_default(),
        ))
    }
}

// ============================================================================
// JSONL Decoder
// ============================================================================

/// JSON Lines decoder (one JSON object per line)
#[derive(Debug, Clone, Default)]
pub struct JsonlDecoder;

impl JsonlDecoder {
    /// Create a new JSONL decoder
    pub fn new() -> Self {
        Self
    }
}

impl RecordDecoder for JsonlDecoder {
    fn decode(&self, body: &str) -> Result<Vec<Value>> {
        let mut records = Vec::new();

        for (line_num, line) in body.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let value: Value = serde_json::from_str(line).map_err(|e| Error::Decode {
                message: format!("Failed to parse JSONL at line {}: {e}", line_num + 1),
            })?;

            records.push(value);
        }

        Ok(records)
    }
}

// ============================================================================
// CSV Decoder
// ============================================================================

/// CSV decoder with configurable delimiter and header handling
#[derive(Debug, Clone)]
pub struct CsvDecoder {
    /// Field delimiter
    delimiter: char,
    /// Whether the first row is a header
    has_header: bool,
}

impl Default for CsvDecoder {
    fn default() -> Self {
        Self {
            delimiter: ',',
            has_header: true,
        }
    }
}

impl CsvDecoder {
    /// Create a new CSV decoder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a CSV decoder with custom settings
    pub fn with_options(delimiter: char, has_header: bool) -> Self {
        Self {
            delimiter,
            has_header,
        }
    }
}

impl RecordDecoder for CsvDecoder {
    fn decode(&self, body: &str) -> Result<Vec<Value>> {
        let body = body.strip_prefix('\u{feff}').unwrap_or(body);
        let mut lines = body.lines().filter(|l| !l.trim().is_empty()).peekable();

        let headers: Vec<String> = if self.has_header {
            match lines.next() {
                Some(header_line) => parse_csv_line(header_line, self.delimiter),
                None => return Ok(Vec::new()),
            }
        } else {
            match lines.peek() {
                Some(first_line) => {
                    let field_count = parse_csv_line(first_line, self.delimiter).len();
                    (0..field_count).map(|i| format!("column_{i}")).collect()
                }
                None => return Ok(Vec::new()),
            }
        };

        let mut records = Vec::new();
        for (row, line) in lines.enumerate() {
            let fields = parse_csv_line(line, self.delimiter);
            if fields.len() > headers.len() {
                return Err(Error::CsvParse {
                    message: format!(
                        "row {} has {} fields, expected {}",
                        row + 1,
                        fields.len(),
                        headers.len()
                    ),
                });
            }

            let mut obj = Map::new();
            for (i, header) in headers.iter().enumerate() {
                let value = fields.get(i).map_or(Value::Null, |v| parse_csv_value(v));
                obj.insert(header.clone(), value);
            }

            records.push(Value::Object(obj));
        }

        Ok(records)
    }
}

/// Parse a CSV line into fields
fn parse_csv_line(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '"' {
            if in_quotes {
                // Escaped quote
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                in_quotes = true;
            }
        } else if c == delimiter && !in_quotes {
            fields.push(current.trim().to_string());
            current = String::new();
        } else {
            current.push(c);
        }
    }

    fields.push(current.trim().to_string());
    fields
}

/// Parse a CSV value into a JSON value
fn parse_csv_value(value: &str) -> Value {
    if value.is_empty() || value.eq_ignore_ascii_case("null") || value.eq_ignore_ascii_case("nan")
    {
        return Value::Null;
    }

    if let Ok(n) = value.parse::<i64>() {
        return Value::Number(n.into());
    }

    if let Ok(n) = value.parse::<f64>() {
        if let Some(num) = serde_json::Number::from_f64(n) {
            return Value::Number(num);
        }
    }

    if value.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if value.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }

    Value::String(value.to_string())
}

/// Build the decoder for a text format
///
/// Returns `None` for binary formats, which are read directly into tables.
pub fn decoder_for(config: &DecoderConfig) -> Option<Box<dyn RecordDecoder>> {
    match config.format {
        DecoderFormat::Json => Some(match &config.record_path {
            Some(path) => Box::new(JsonDecoder::with_path(path.clone())),
            None => Box::new(JsonDecoder::new()),
        }),
        DecoderFormat::Jsonl => Some(Box::new(JsonlDecoder::new())),
        DecoderFormat::Csv => Some(Box::new(CsvDecoder::with_options(
            config.csv_delimiter,
            config.csv_has_header,
        ))),
        DecoderFormat::Parquet => None,
    }
}
