//! Persisting extraction results

use super::schema::json_to_arrow;
use super::writer::{
    write_batch_to_csv, write_batch_to_json_lines, write_batch_to_parquet, write_json_pretty,
};
use crate::connector::ExtractOutput;
use crate::error::{Error, Result};
use crate::types::FileFormat;
use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::info;

/// Save extracted data under `destination`
///
/// A directory, either existing or given with a trailing separator, gets a
/// generated `{name}_{YYYYmmdd_HHMMSS}.{ext}` file; any other path is written
/// as-is after creating its parent directories.
///
/// | data      | csv | json                 | parquet |
/// |-----------|-----|----------------------|---------|
/// | table     | yes | one object per line  | yes     |
/// | records   | yes | indented array       | no      |
/// | downloads | no  | indented array       | no      |
///
/// Table maps are saved one table at a time.
pub fn save_data(
    name: &str,
    data: &ExtractOutput,
    destination: &Path,
    format: FileFormat,
) -> Result<PathBuf> {
    let path = resolve_destination(name, destination, format)?;

    let written = match (data, format) {
        (ExtractOutput::Table(batch), FileFormat::Csv) => write_batch_to_csv(&path, batch)?,
        (ExtractOutput::Table(batch), FileFormat::Json) => write_batch_to_json_lines(&path, batch)?,
        (ExtractOutput::Table(batch), FileFormat::Parquet) => write_batch_to_parquet(&path, batch)?,
        (ExtractOutput::Records(records), FileFormat::Json) => {
            write_json_pretty(&path, records)?;
            records.len()
        }
        (ExtractOutput::Records(records), FileFormat::Csv) => {
            write_batch_to_csv(&path, &json_to_arrow(records, None)?)?
        }
        (ExtractOutput::Downloads(files), FileFormat::Json) => {
            write_json_pretty(&path, files)?;
            files.len()
        }
        (data, format) => return Err(Error::unsupported_format(format.to_string(), data.kind())),
    };

    info!("Saved {} records to {}", written, path.display());
    Ok(path)
}

fn resolve_destination(name: &str, destination: &Path, format: FileFormat) -> Result<PathBuf> {
    // `out/` names a directory even before it exists
    let names_directory = destination
        .as_os_str()
        .to_string_lossy()
        .ends_with(std::path::is_separator);
    if names_directory {
        std::fs::create_dir_all(destination)?;
    }

    if destination.is_dir() {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        return Ok(destination.join(format!("{name}_{timestamp}.{}", format.extension())));
    }

    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(destination.to_path_buf())
}
