//! CLI commands and argument parsing

use crate::types::FileFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Retail analytics data connectors
#[derive(Parser, Debug)]
#[command(name = "retail-connectors")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Report format for command results
    #[arg(short, long, global = true, default_value = "json")]
    pub report: ReportFormat,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Connect a configured connector and report its status
    Check {
        /// Connector definition file (JSON)
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Extract data and save it with the connector metadata
    Extract {
        /// Connector definition file (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// API endpoint name
        #[arg(short, long)]
        endpoint: Option<String>,

        /// Request parameter override as key=value (repeatable)
        #[arg(short, long = "param")]
        params: Vec<String>,

        /// Output directory
        #[arg(short, long, default_value = "data/raw")]
        output: PathBuf,

        /// File format of the saved data
        #[arg(short, long, default_value = "parquet")]
        format: ExportFormat,

        /// Flatten nested API records into dotted columns
        #[arg(long)]
        flatten: bool,

        /// Keep downloaded archives zipped
        #[arg(long)]
        no_unzip: bool,
    },

    /// Build every connector in a directory and check each one
    Scan {
        /// Directory of connector definition files
        #[arg(short, long, default_value = "config/connectors")]
        dir: PathBuf,
    },

    /// Search Kaggle datasets
    Datasets {
        /// Kaggle connector definition file (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Search term
        #[arg(short, long)]
        search: Option<String>,

        /// Dataset owner
        #[arg(short, long)]
        author: Option<String>,
    },

    /// List registered connector types
    Types,
}

/// How command results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}

/// File format accepted by `extract --format`
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
    Parquet,
}

impl From<ExportFormat> for FileFormat {
    fn from(format: ExportFormat) -> Self {
        match format {
            ExportFormat::Csv => FileFormat::Csv,
            ExportFormat::Json => FileFormat::Json,
            ExportFormat::Parquet => FileFormat::Parquet,
        }
    }
}
