//! CLI module
//!
//! Command-line interface for running connectors.
//!
//! # Commands
//!
//! - `check` - Connect a connector and report its status
//! - `extract` - Extract data and save it with the connector metadata
//! - `scan` - Check every connector definition in a directory
//! - `datasets` - Search Kaggle datasets
//! - `types` - List registered connector types

mod commands;
mod runner;

pub use commands::{Cli, Commands, ExportFormat, ReportFormat};
pub use runner::{build_extract_options, parse_param, save_output, Runner};
