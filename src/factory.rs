//! Connector factory
//!
//! Maps type tags to constructors. The built-in types are registered by
//! [`ConnectorFactory::new`]; further types can be added at runtime and are
//! creatable immediately.

use crate::config::load_definition;
use crate::connector::Connector;
use crate::connectors::{ApiConnector, FileConnector, KaggleConnector};
use crate::error::{Error, Result};
use crate::types::JsonValue;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Builds a connector from its name and untyped `config` object
pub type ConnectorConstructor =
    Arc<dyn Fn(String, &JsonValue) -> Result<Box<dyn Connector>> + Send + Sync>;

/// Registry of creatable connector types
#[derive(Clone)]
pub struct ConnectorFactory {
    constructors: HashMap<String, ConnectorConstructor>,
}

impl Default for ConnectorFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConnectorFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectorFactory")
            .field("types", &self.supported_types())
            .finish()
    }
}

impl ConnectorFactory {
    /// Factory with the `api`, `file` and `kaggle` types
    pub fn new() -> Self {
        let mut factory = Self::empty();
        factory.register_connector_type(ApiConnector::TYPE, |name, config| {
            Ok(Box::new(ApiConnector::from_config(name, config)?))
        });
        factory.register_connector_type(FileConnector::TYPE, |name, config| {
            Ok(Box::new(FileConnector::from_config(name, config)?))
        });
        factory.register_connector_type(KaggleConnector::TYPE, |name, config| {
            Ok(Box::new(KaggleConnector::from_config(name, config)?))
        });
        factory
    }

    /// Factory without any registered type
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Register a constructor for `type_name`, replacing any previous one
    pub fn register_connector_type<F>(&mut self, type_name: impl Into<String>, constructor: F)
    where
        F: Fn(String, &JsonValue) -> Result<Box<dyn Connector>> + Send + Sync + 'static,
    {
        let type_name = type_name.into();
        info!("Registered connector type: {type_name}");
        self.constructors.insert(type_name, Arc::new(constructor));
    }

    /// Registered type tags, sorted
    pub fn supported_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.constructors.keys().cloned().collect();
        types.sort();
        types
    }

    /// Whether `type_name` can be created
    pub fn supports(&self, type_name: &str) -> bool {
        self.constructors.contains_key(type_name)
    }

    /// Create a connector of the given type
    pub fn create_connector(
        &self,
        name: impl Into<String>,
        connector_type: &str,
        config: &JsonValue,
    ) -> Result<Box<dyn Connector>> {
        let constructor =
            self.constructors
                .get(connector_type)
                .ok_or_else(|| Error::UnsupportedConnectorType {
                    connector_type: connector_type.to_string(),
                    supported: self.supported_types(),
                })?;

        let name = name.into();
        let connector = constructor(name.clone(), config)?;
        info!("Created {connector_type} connector with name: {name}");
        Ok(connector)
    }

    /// Create a connector from a JSON definition file
    pub fn create_connector_from_config(&self, path: impl AsRef<Path>) -> Result<Box<dyn Connector>> {
        let path = path.as_ref();
        let definition = load_definition(path).inspect_err(|e| {
            error!("Failed to load connector configuration {}: {e}", path.display());
        })?;
        self.create_connector(
            definition.name,
            &definition.connector_type,
            &definition.config,
        )
    }

    /// Create a connector from every `*.json` file of a directory
    ///
    /// Files that fail to load are logged and skipped. A missing directory
    /// yields an empty map.
    pub fn create_connectors_from_directory(
        &self,
        dir: impl AsRef<Path>,
    ) -> Result<BTreeMap<String, Box<dyn Connector>>> {
        let dir = dir.as_ref();
        let mut connectors = BTreeMap::new();

        if !dir.is_dir() {
            warn!("Configuration directory not found: {}", dir.display());
            return Ok(connectors);
        }

        for path in definition_files(dir)? {
            match self.create_connector_from_config(&path) {
                Ok(connector) => {
                    connectors.insert(connector.name().to_string(), connector);
                }
                Err(e) => {
                    error!("Error creating connector from {}: {e}", path.display());
                }
            }
        }

        info!(
            "Created {} connectors from directory: {}",
            connectors.len(),
            dir.display()
        );
        Ok(connectors)
    }
}

/// Sorted `*.json` files directly inside `dir`
pub fn definition_files(dir: &Path) -> Result<Vec<std::path::PathBuf>> {
    let mut paths: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::{ExtractOptions, ExtractOutput};
    use crate::metadata::Metadata;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;
    use test_case::test_case;

    /// Connector returning fixed records
    #[derive(Debug)]
    struct StaticConnector {
        name: String,
        metadata: Metadata,
    }

    #[async_trait]
    impl Connector for StaticConnector {
        fn name(&self) -> &str {
            &self.name
        }
        fn connector_type(&self) -> &str {
            "static"
        }
        fn metadata(&self) -> &Metadata {
            &self.metadata
        }
        fn metadata_mut(&mut self) -> &mut Metadata {
            &mut self.metadata
        }
        fn is_connected(&self) -> bool {
            true
        }
        async fn connect(&mut self) -> bool {
            true
        }
        async fn extract(&mut self, _options: &ExtractOptions) -> Result<ExtractOutput> {
            Ok(ExtractOutput::Records(vec![json!({"id": 1})]))
        }
    }

    fn write_definition(dir: &Path, file: &str, value: &JsonValue) {
        fs::write(dir.join(file), value.to_string()).unwrap();
    }

    #[test]
    fn test_builtin_types() {
        let factory = ConnectorFactory::new();
        assert_eq!(factory.supported_types(), vec!["api", "file", "kaggle"]);
        assert!(ConnectorFactory::empty().supported_types().is_empty());
    }

    #[test_case("api", json!({"base_url": "https://api.example.com"}) ; "api")]
    #[test_case("file", json!({"files": []}) ; "file")]
    #[test_case("file", JsonValue::Null ; "file without config")]
    #[test_case("kaggle", json!({"datasets": []}) ; "kaggle")]
    fn test_create_builtin(connector_type: &str, config: JsonValue) {
        let factory = ConnectorFactory::new();
        let connector = factory
            .create_connector("sales", connector_type, &config)
            .unwrap();
        assert_eq!(connector.name(), "sales");
        assert_eq!(connector.connector_type(), connector_type);
        assert!(format!("{connector:?}").contains("\"sales\""));
    }

    #[test]
    fn test_unsupported_type_lists_supported() {
        let factory = ConnectorFactory::new();
        let err = factory
            .create_connector("x", "graphql", &JsonValue::Null)
            .unwrap_err();
        match err {
            Error::UnsupportedConnectorType {
                connector_type,
                supported,
            } => {
                assert_eq!(connector_type, "graphql");
                assert_eq!(supported, vec!["api", "file", "kaggle"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let factory = ConnectorFactory::new();
        let err = factory
            .create_connector("x", "api", &json!({"endpoints": {}}))
            .unwrap_err();
        assert!(matches!(err, Error::MissingConfigField { .. }));
    }

    #[tokio::test]
    async fn test_register_custom_type() {
        let mut factory = ConnectorFactory::new();
        factory.register_connector_type("static", |name, _config| {
            Ok(Box::new(StaticConnector {
                metadata: Metadata::new(&name, "static"),
                name,
            }))
        });

        assert!(factory.supports("static"));
        let mut connector = factory
            .create_connector("fixed", "static", &JsonValue::Null)
            .unwrap();
        let output = connector.extract(&ExtractOptions::new()).await.unwrap();
        assert_eq!(output.record_count(), 1);
    }

    #[test]
    fn test_create_from_config_file() {
        let dir = TempDir::new().unwrap();
        write_definition(
            dir.path(),
            "local.json",
            &json!({"name": "local_files", "type": "file", "config": {"files": []}}),
        );

        let factory = ConnectorFactory::new();
        let connector = factory
            .create_connector_from_config(dir.path().join("local.json"))
            .unwrap();
        assert_eq!(connector.name(), "local_files");
    }

    #[test]
    fn test_create_from_config_errors() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        write_definition(dir.path(), "nameless.json", &json!({"type": "file"}));

        let factory = ConnectorFactory::new();
        assert!(matches!(
            factory.create_connector_from_config(dir.path().join("absent.json")),
            Err(Error::FileNotFound { .. })
        ));

        let err = factory
            .create_connector_from_config(dir.path().join("broken.json"))
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().contains("broken.json"));

        assert!(matches!(
            factory.create_connector_from_config(dir.path().join("nameless.json")),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn test_create_from_directory_skips_failures() {
        let dir = TempDir::new().unwrap();
        write_definition(
            dir.path(),
            "b_files.json",
            &json!({"name": "files", "type": "file"}),
        );
        write_definition(
            dir.path(),
            "a_api.json",
            &json!({"name": "shop", "type": "api", "config": {"base_url": "https://x.test"}}),
        );
        write_definition(
            dir.path(),
            "c_bad.json",
            &json!({"name": "bad", "type": "graphql"}),
        );
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let connectors = ConnectorFactory::new()
            .create_connectors_from_directory(dir.path())
            .unwrap();
        let names: Vec<&String> = connectors.keys().collect();
        assert_eq!(names, vec!["files", "shop"]);
    }

    #[test]
    fn test_create_from_missing_directory() {
        let dir = TempDir::new().unwrap();
        let connectors = ConnectorFactory::new()
            .create_connectors_from_directory(dir.path().join("absent"))
            .unwrap();
        assert!(connectors.is_empty());
    }
}
