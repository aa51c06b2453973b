//! File decoder module
//!
//! Supports: CSV, JSON, JSONL, Parquet
//!
//! # Overview
//!
//! The decode module turns local files into Arrow tables. Text formats go
//! through a [`RecordDecoder`] and a schema inferred from the records;
//! Parquet is read natively.

mod decoders;
mod reader;
mod types;

pub use decoders::{decoder_for, CsvDecoder, JsonDecoder, JsonlDecoder};
pub use reader::{read_parquet, read_table};
pub use types::{DecoderConfig, DecoderFormat, RecordDecoder};
