//! Reading whole files into Arrow tables

use super::decoders::decoder_for;
use super::types::DecoderConfig;
use crate::error::{Error, Result};
use crate::output::json_to_arrow;
use arrow::compute::concat_batches;
use arrow::record_batch::{RecordBatch, RecordBatchReader};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// Read a file into a single table
///
/// Text formats are decoded into records and converted with a schema
/// inferred from the data; Parquet files keep their own schema.
pub fn read_table(path: &Path, config: &DecoderConfig) -> Result<RecordBatch> {
    let batch = match decoder_for(config) {
        Some(decoder) => {
            let body = std::fs::read_to_string(path).map_err(|e| not_found_or(path, e))?;
            let records = decoder.decode(&body)?;
            json_to_arrow(&records, None)?
        }
        None => read_parquet(path)?,
    };

    debug!(
        "Read {} rows from {} as {}",
        batch.num_rows(),
        path.display(),
        config.format
    );
    Ok(batch)
}

/// Read every row group of a Parquet file into one batch
pub fn read_parquet(path: &Path) -> Result<RecordBatch> {
    let file = File::open(path).map_err(|e| not_found_or(path, e))?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
    let schema = reader.schema();

    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(concat_batches(&schema, &batches)?)
}

fn not_found_or(path: &Path, e: std::io::Error) -> Error {
    if e.kind() == ErrorKind::NotFound {
        Error::FileNotFound {
            path: path.display().to_string(),
        }
    } else {
        Error::Io(e)
    }
}
