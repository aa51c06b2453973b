//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, ExportFormat, ReportFormat};
use crate::config::load_definition;
use crate::connector::{Connector, ExtractOptions, ExtractOutput};
use crate::connectors::KaggleConnector;
use crate::error::{Error, Result, ResultExt};
use crate::factory::{definition_files, ConnectorFactory};
use crate::output::save_data;
use crate::types::{FileFormat, JsonValue};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
    factory: ConnectorFactory,
}

impl Runner {
    /// Create a runner with the built-in connector types
    pub fn new(cli: Cli) -> Self {
        Self::with_factory(cli, ConnectorFactory::new())
    }

    /// Create a runner using a custom factory
    pub fn with_factory(cli: Cli, factory: ConnectorFactory) -> Self {
        Self { cli, factory }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Check { config } => self.check(config).await,
            Commands::Extract {
                config,
                endpoint,
                params,
                output,
                format,
                flatten,
                no_unzip,
            } => {
                let options = build_extract_options(endpoint.as_deref(), params, *flatten, !no_unzip)?;
                self.extract(config, &options, output, *format).await
            }
            Commands::Scan { dir } => self.scan(dir).await,
            Commands::Datasets {
                config,
                search,
                author,
            } => self.datasets(config, search.as_deref(), author.as_deref()).await,
            Commands::Types => self.types(),
        }
    }

    /// Connect one connector and report the outcome
    async fn check(&self, config: &Path) -> Result<()> {
        let mut connector = self.factory.create_connector_from_config(config)?;
        self.log(&format!("Checking connection to {}", connector.name()));

        let connected = connector.connect().await;
        self.output_message(&connection_status(connector.as_ref(), connected));
        Ok(())
    }

    /// Extract, save the data and write `<output>/<name>_metadata.json`
    async fn extract(
        &self,
        config: &Path,
        options: &ExtractOptions,
        output: &Path,
        format: ExportFormat,
    ) -> Result<()> {
        let mut connector = self.factory.create_connector_from_config(config)?;
        if !connector.connect().await {
            warn!(
                "Connector {} is not ready: {}",
                connector.name(),
                connector.metadata().error.as_deref().unwrap_or("see metadata")
            );
        }

        let result = connector.extract(options).await;
        let metadata_path = output.join(format!("{}_metadata.json", connector.name()));
        connector
            .save_metadata(&metadata_path)
            .with_context(|| format!("Failed to save metadata to {}", metadata_path.display()))?;

        let data = result?;
        let saved = save_output(connector.as_ref(), &data, output, format.into())?;
        info!(
            "Saved {} records from {} to {} file(s)",
            data.record_count(),
            connector.name(),
            saved.len()
        );

        self.output_message(&json!({
            "type": "EXTRACT_RESULT",
            "extract": {
                "connector": connector.name(),
                "status": connector.metadata().status.to_string(),
                "record_count": data.record_count(),
                "files": saved,
                "metadata": metadata_path,
            }
        }));
        Ok(())
    }

    /// Check every definition in a directory without stopping on failures
    async fn scan(&self, dir: &Path) -> Result<()> {
        if !dir.is_dir() {
            return Err(Error::FileNotFound {
                path: dir.display().to_string(),
            });
        }

        let mut succeeded = 0usize;
        let mut failed = 0usize;
        for path in definition_files(dir)? {
            let report = match self.factory.create_connector_from_config(&path) {
                Ok(mut connector) => {
                    let connected = connector.connect().await;
                    if connected {
                        succeeded += 1;
                    } else {
                        failed += 1;
                    }
                    let mut status = connection_status(connector.as_ref(), connected);
                    status["file"] = json!(path);
                    status
                }
                Err(e) => {
                    failed += 1;
                    json!({
                        "type": "CONNECTION_STATUS",
                        "file": path,
                        "connectionStatus": {
                            "status": "FAILED",
                            "message": e.to_string()
                        }
                    })
                }
            };
            self.output_message(&report);
        }

        self.output_message(&json!({
            "type": "SCAN_SUMMARY",
            "summary": {"directory": dir, "succeeded": succeeded, "failed": failed}
        }));
        Ok(())
    }

    /// Search Kaggle datasets with the credentials of a definition
    async fn datasets(&self, config: &Path, search: Option<&str>, author: Option<&str>) -> Result<()> {
        let definition = load_definition(config)?;
        if definition.connector_type != KaggleConnector::TYPE {
            return Err(Error::config(format!(
                "{} defines a '{}' connector, expected '{}'",
                config.display(),
                definition.connector_type,
                KaggleConnector::TYPE
            )));
        }

        let mut connector = KaggleConnector::from_config(definition.name, &definition.config)?;
        for dataset in connector.list_datasets(search, author).await? {
            self.output_message(&json!({"type": "DATASET", "dataset": dataset}));
        }
        Ok(())
    }

    /// Print the registered connector types
    fn types(&self) -> Result<()> {
        self.output_message(&json!({
            "type": "CONNECTOR_TYPES",
            "types": self.factory.supported_types()
        }));
        Ok(())
    }

    fn log(&self, message: &str) {
        self.output_message(&json!({
            "type": "LOG",
            "log": {"level": "INFO", "message": message}
        }));
    }

    /// Output a message
    fn output_message(&self, msg: &JsonValue) {
        match self.cli.report {
            ReportFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            ReportFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Build extraction options from command-line arguments
pub fn build_extract_options(
    endpoint: Option<&str>,
    params: &[String],
    flatten: bool,
    unzip: bool,
) -> Result<ExtractOptions> {
    let mut options = ExtractOptions::new()
        .with_flatten(flatten)
        .with_unzip(unzip);
    if let Some(endpoint) = endpoint {
        options = options.with_endpoint(endpoint);
    }
    for param in params {
        let (key, value) = parse_param(param)?;
        options = options.with_param(key, value);
    }
    Ok(options)
}

/// Parse `key=value`; the value is JSON when it parses as JSON, else text
pub fn parse_param(raw: &str) -> Result<(String, JsonValue)> {
    let (key, value) = raw
        .split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| Error::invalid_value("param", format!("expected key=value, got '{raw}'")))?;

    let value = serde_json::from_str(value).unwrap_or_else(|_| JsonValue::String(value.to_string()));
    Ok((key.to_string(), value))
}

/// Save an extraction result, one file per table
///
/// Downloaded files are already on disk; their manifest is written as JSON.
pub fn save_output(
    connector: &dyn Connector,
    data: &ExtractOutput,
    output: &Path,
    format: FileFormat,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output)?;
    match data {
        ExtractOutput::Table(_) | ExtractOutput::Records(_) => {
            Ok(vec![connector.save(data, output, format)?])
        }
        ExtractOutput::Tables(tables) => {
            let mut saved = Vec::with_capacity(tables.len());
            for (source, batch) in tables {
                let stem = Path::new(source)
                    .file_stem()
                    .map_or_else(|| "table".into(), |s| s.to_string_lossy());
                let name = format!("{}_{stem}", connector.name());
                saved.push(save_data(
                    &name,
                    &ExtractOutput::Table(batch.clone()),
                    output,
                    format,
                )?);
            }
            Ok(saved)
        }
        ExtractOutput::Downloads(_) => {
            let manifest = output.join(format!("{}_downloads.json", connector.name()));
            Ok(vec![connector.save(data, &manifest, FileFormat::Json)?])
        }
    }
}

fn connection_status(connector: &dyn Connector, connected: bool) -> JsonValue {
    let metadata = connector.metadata();
    json!({
        "type": "CONNECTION_STATUS",
        "connector": connector.name(),
        "connector_type": connector.connector_type(),
        "connectionStatus": {
            "status": if connected { "SUCCEEDED" } else { "FAILED" },
            "message": metadata.error.clone().unwrap_or_else(|| metadata.status.to_string()),
        },
        "metadata": metadata,
    })
}
