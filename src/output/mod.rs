//! Output module
//!
//! Handles Arrow RecordBatch creation and persistence of extracted data.
//!
//! # Overview
//!
//! This module provides utilities for:
//! - Inferring Arrow schemas from JSON records
//! - Converting between JSON records and Arrow RecordBatches
//! - Writing CSV, JSON Lines and Parquet files
//! - Saving any extraction result with [`save_data`]

mod save;
mod schema;
mod writer;

pub use save::save_data;
pub use schema::{arrow_to_json, infer_schema, json_to_arrow, stringify_nested};
pub use writer::{
    write_batch_to_csv, write_batch_to_json_lines, write_batch_to_parquet, write_json_pretty,
};
