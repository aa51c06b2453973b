//! Kaggle dataset connector
//!
//! Downloads public datasets through the Kaggle REST API. Whole datasets
//! arrive as zip archives and are unpacked into their destination; single
//! files are copied as-is.

use crate::auth::AuthConfig;
use crate::config::{parse_config, DatasetSpec, KaggleConfig};
use crate::connector::{Connector, ExtractOptions, ExtractOutput};
use crate::decode::{read_table, DecoderConfig, DecoderFormat};
use crate::error::{Error, Result, ResultExt};
use crate::http::{HttpClient, HttpClientConfig, RequestConfig};
use crate::metadata::Metadata;
use crate::types::{BackoffType, ConnectorStatus, JsonValue, OptionStringExt};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

// ============================================================================
// Download Results
// ============================================================================

/// Outcome of one downloaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadStatus {
    Success,
    Failed,
}

/// A file written to local storage, or a dataset that failed to download
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadedFile {
    pub file_name: String,
    pub local_path: PathBuf,
    /// `owner/dataset`
    pub dataset: String,
    pub status: DownloadStatus,
    pub error: Option<String>,
    /// Row count, for CSV files
    pub record_count: Option<u64>,
    pub batch_id: String,
}

/// One entry of a dataset search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "totalBytes")]
    pub size: Option<u64>,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub download_count: Option<u64>,
    #[serde(default)]
    pub vote_count: Option<u64>,
    #[serde(default)]
    pub usability_rating: Option<f64>,
}

// ============================================================================
// Credentials
// ============================================================================

#[derive(Debug, Deserialize)]
struct CredentialsFile {
    username: String,
    key: String,
}

/// Resolve the API username and key
///
/// Looks at the connector configuration, then `KAGGLE_USERNAME` and
/// `KAGGLE_KEY`, then `kaggle.json` in `KAGGLE_CONFIG_DIR` or `~/.kaggle`.
pub fn resolve_credentials(
    config: &KaggleConfig,
    env: impl Fn(&str) -> Option<String>,
) -> Result<(String, String)> {
    // Unset `${VAR}` placeholders leave empty strings behind
    if let (Some(username), Some(key)) = (
        config.username.clone().none_if_empty(),
        config.key.clone().none_if_empty(),
    ) {
        return Ok((username, key));
    }

    if let (Some(username), Some(key)) = (
        env("KAGGLE_USERNAME").none_if_empty(),
        env("KAGGLE_KEY").none_if_empty(),
    ) {
        return Ok((username, key));
    }

    let dir = env("KAGGLE_CONFIG_DIR")
        .map(PathBuf::from)
        .or_else(|| {
            env("HOME")
                .or_else(|| env("USERPROFILE"))
                .map(|home| Path::new(&home).join(".kaggle"))
        })
        .ok_or_else(|| Error::config("Kaggle credentials not found"))?;

    let path = dir.join("kaggle.json");
    let raw = std::fs::read_to_string(&path).map_err(|_| {
        Error::config(format!(
            "Kaggle credentials not found in config, environment or {}",
            path.display()
        ))
    })?;
    let creds: CredentialsFile = serde_json::from_str(&raw)
        .map_err(|e| Error::config(format!("Invalid {}: {e}", path.display())))?;
    Ok((creds.username, creds.key))
}

// ============================================================================
// Connector
// ============================================================================

/// Connector downloading datasets from Kaggle
#[derive(Debug)]
pub struct KaggleConnector {
    name: String,
    config: KaggleConfig,
    metadata: Metadata,
    client: Option<HttpClient>,
}

impl KaggleConnector {
    /// Type tag registered with the factory
    pub const TYPE: &'static str = "kaggle";

    pub fn new(name: impl Into<String>, config: KaggleConfig) -> Self {
        let name = name.into();
        let mut metadata = Metadata::new(&name, Self::TYPE);
        metadata.data_source = Some("kaggle".to_string());
        metadata.set(
            "datasets",
            serde_json::to_value(&config.datasets).unwrap_or_default(),
        );

        info!("Initialized KaggleConnector with name: {name}");
        Self {
            name,
            config,
            metadata,
            client: None,
        }
    }

    /// Create a connector from an untyped `config` object
    pub fn from_config(name: impl Into<String>, config: &JsonValue) -> Result<Self> {
        Ok(Self::new(name, parse_config(config)?))
    }

    pub fn config(&self) -> &KaggleConfig {
        &self.config
    }

    fn build_client(&self) -> Result<HttpClient> {
        let (username, key) = resolve_credentials(&self.config, |k| std::env::var(k).ok())?;
        let config = HttpClientConfig::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .backoff(
                BackoffType::Exponential,
                Duration::from_millis(500),
                Duration::from_secs(60),
            )
            .no_rate_limit()
            .user_agent(format!("RetailAnalytics/{}", self.name))
            .build();
        HttpClient::with_auth(
            config,
            AuthConfig::Basic {
                username,
                password: key,
            },
        )
    }

    fn client(&self) -> Result<&HttpClient> {
        self.client
            .as_ref()
            .ok_or_else(|| Error::not_connected(&self.name))
    }

    /// Search public datasets
    ///
    /// Request and decoding failures are logged and yield an empty list.
    pub async fn list_datasets(
        &mut self,
        search: Option<&str>,
        author: Option<&str>,
    ) -> Result<Vec<DatasetSummary>> {
        self.ensure_connected().await?;
        let client = self.client()?;

        let mut request = RequestConfig::new();
        if let Some(search) = search {
            request = request.query("search", search);
        }
        if let Some(author) = author {
            request = request.query("user", author);
        }

        let url = format!("{}/datasets/list", self.config.api_url.trim_end_matches('/'));
        let listed = client
            .get_json(&url, request)
            .await
            .and_then(|body| Ok(serde_json::from_value::<Vec<DatasetSummary>>(body)?));

        match listed {
            Ok(datasets) => Ok(datasets),
            Err(e) => {
                error!("Failed to list datasets: {e}");
                Ok(Vec::new())
            }
        }
    }

    async fn download(
        &self,
        dataset: &DatasetSpec,
        owner: &str,
        slug: &str,
        unzip: bool,
        batch_id: &str,
    ) -> Result<Vec<DownloadedFile>> {
        let reference = format!("{owner}/{slug}");
        let api_url = self.config.api_url.trim_end_matches('/');
        let (url, file_name) = match &dataset.file_name {
            Some(file) => (
                format!("{api_url}/datasets/download/{reference}/{file}"),
                file.clone(),
            ),
            None => (
                format!("{api_url}/datasets/download/{reference}"),
                format!("{slug}.zip"),
            ),
        };

        info!("Downloading dataset: {reference}");
        let bytes = self.client()?.get(&url).await?.bytes().await?;

        let temp_dir = tempfile::tempdir()?;
        let download_path = temp_dir.path().join(&file_name);
        std::fs::write(&download_path, &bytes)?;
        std::fs::create_dir_all(&dataset.destination)?;

        let local_files = if unzip && file_name.ends_with(".zip") {
            let extracted = unpack_archive(&download_path, &dataset.destination)?;
            info!(
                "Extracted {} files from {reference} to {}",
                extracted.len(),
                dataset.destination.display()
            );
            extracted
        } else {
            let dest_path = dataset.destination.join(&file_name);
            std::fs::copy(&download_path, &dest_path)
                .with_context(|| format!("Failed to copy {file_name} to {}", dest_path.display()))?;
            vec![(file_name, dest_path)]
        };

        Ok(local_files
            .into_iter()
            .map(|(file_name, local_path)| DownloadedFile {
                record_count: csv_record_count(&local_path),
                file_name,
                local_path,
                dataset: reference.clone(),
                status: DownloadStatus::Success,
                error: None,
                batch_id: batch_id.to_string(),
            })
            .collect())
    }
}

#[async_trait]
impl Connector for KaggleConnector {
    fn name(&self) -> &str {
        &self.name
    }

    fn connector_type(&self) -> &str {
        Self::TYPE
    }

    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    async fn connect(&mut self) -> bool {
        self.client = None;
        match self.build_client() {
            Ok(client) => {
                self.client = Some(client);
                self.metadata.set_status(ConnectorStatus::Connected);
                info!("Successfully authenticated with Kaggle API");
                true
            }
            Err(e) => {
                error!("Failed to authenticate with Kaggle API: {e}");
                self.metadata.fail(format!("Authentication failed: {e}"));
                false
            }
        }
    }

    async fn extract(&mut self, options: &ExtractOptions) -> Result<ExtractOutput> {
        self.ensure_connected().await?;
        let datasets = options
            .datasets
            .clone()
            .unwrap_or_else(|| self.config.datasets.clone());

        if datasets.is_empty() {
            warn!("No datasets specified for download");
            return Ok(ExtractOutput::Downloads(Vec::new()));
        }

        self.metadata.begin_extraction();
        let batch_id = self.generate_batch_id();
        let mut downloaded: Vec<DownloadedFile> = Vec::new();

        for dataset in &datasets {
            let (Some(owner), Some(slug)) = (
                dataset.owner.as_deref().filter(|s| !s.is_empty()),
                dataset.dataset.as_deref().filter(|s| !s.is_empty()),
            ) else {
                warn!("Missing owner or dataset name in {dataset:?}");
                continue;
            };

            match self
                .download(dataset, owner, slug, options.unzip, &batch_id)
                .await
            {
                Ok(files) => {
                    info!("Successfully downloaded dataset: {owner}/{slug}");
                    downloaded.extend(files);
                }
                Err(e) => {
                    error!("Failed to download dataset {owner}/{slug}: {e}");
                    downloaded.push(DownloadedFile {
                        file_name: dataset.file_name.clone().unwrap_or_default(),
                        local_path: dataset.destination.clone(),
                        dataset: format!("{owner}/{slug}"),
                        status: DownloadStatus::Failed,
                        error: Some(e.to_string()),
                        record_count: None,
                        batch_id: batch_id.clone(),
                    });
                }
            }
        }

        let failed = downloaded
            .iter()
            .filter(|f| f.status == DownloadStatus::Failed)
            .count();
        self.metadata.record_count = downloaded.iter().filter_map(|f| f.record_count).sum();
        self.metadata.set_status(if failed == 0 {
            ConnectorStatus::Completed
        } else {
            ConnectorStatus::CompletedWithErrors
        });
        self.metadata.set("batch_id", batch_id);
        self.metadata.set("downloaded_files", downloaded.len());
        self.metadata.set("failed_downloads", failed);
        self.metadata.set("completion_time", Utc::now().to_rfc3339());

        Ok(ExtractOutput::Downloads(downloaded))
    }
}

/// Extract every file of a zip archive into `destination`
///
/// Returns the archive-relative name and local path of each file entry.
fn unpack_archive(archive_path: &Path, destination: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut archive = zip::ZipArchive::new(File::open(archive_path)?)?;

    let mut entries = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let entry = archive.by_index(i)?;
        if entry.is_file() {
            if let Some(relative) = entry.enclosed_name() {
                entries.push((entry.name().to_string(), destination.join(relative)));
            }
        }
    }

    archive.extract(destination)?;
    Ok(entries)
}

fn csv_record_count(path: &Path) -> Option<u64> {
    if DecoderFormat::from_path(path) != Some(DecoderFormat::Csv) {
        return None;
    }
    match read_table(path, &DecoderConfig::csv()) {
        Ok(batch) => Some(batch.num_rows() as u64),
        Err(e) => {
            warn!("Could not count records in {}: {e}", path.display());
            None
        }
    }
}
