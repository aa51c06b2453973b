//! File writers for tables and records
//!
//! Provides utilities for writing Arrow RecordBatches as Parquet, CSV or
//! JSON Lines, and JSON records as an indented document.

use super::schema::stringify_nested;
use crate::error::{Error, Result};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Rows per Parquet row group
const ROW_GROUP_SIZE: usize = 1024 * 1024;

/// Write a single RecordBatch to a Snappy-compressed Parquet file
///
/// Returns the number of rows written.
pub fn write_batch_to_parquet(path: impl AsRef<Path>, batch: &RecordBatch) -> Result<usize> {
    let properties = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .set_max_row_group_size(ROW_GROUP_SIZE)
        .build();

    let file = create_file(path.as_ref())?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(properties))
        .map_err(|e| Error::output(format!("Failed to create Parquet writer: {e}")))?;
    writer
        .write(batch)
        .map_err(|e| Error::output(format!("Failed to write batch: {e}")))?;
    writer
        .close()
        .map_err(|e| Error::output(format!("Failed to close Parquet writer: {e}")))?;

    Ok(batch.num_rows())
}

/// Write a RecordBatch as CSV with a header row
///
/// Nested columns are written as their JSON text.
pub fn write_batch_to_csv(path: impl AsRef<Path>, batch: &RecordBatch) -> Result<usize> {
    let flat = stringify_nested(batch)?;
    let file = create_file(path.as_ref())?;

    let mut writer = arrow::csv::WriterBuilder::new()
        .with_header(true)
        .build(BufWriter::new(file));
    writer.write(&flat)?;
    writer.into_inner().flush()?;

    Ok(batch.num_rows())
}

/// Write a RecordBatch as JSON Lines, one object per row
pub fn write_batch_to_json_lines(path: impl AsRef<Path>, batch: &RecordBatch) -> Result<usize> {
    let file = create_file(path.as_ref())?;

    let mut writer = arrow::json::LineDelimitedWriter::new(BufWriter::new(file));
    writer.write(batch)?;
    writer.finish()?;
    writer.into_inner().flush()?;

    Ok(batch.num_rows())
}

/// Write any serializable value as an indented JSON document
pub fn write_json_pretty<T: Serialize + ?Sized>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let mut writer = BufWriter::new(create_file(path.as_ref())?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

fn create_file(path: &Path) -> Result<File> {
    File::create(path)
        .map_err(|e| Error::output(format!("Failed to create file {}: {e}", path.display())))
}
