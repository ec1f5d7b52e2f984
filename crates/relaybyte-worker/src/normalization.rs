//! Post-sync normalization of raw destination tables.
//!
//! The normalization image is run against the destination only when the
//! destination config enables `basic_normalization` and the destination
//! image is one the normalization image knows how to handle.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use relaybyte_types::catalog::ConfiguredCatalog;
use relaybyte_types::job::JobRunConfig;

use crate::error::{Result, WorkerError};
use crate::launcher::{ConnectorProcess, DockerSettings};
use crate::workers::{
    write_json, DESTINATION_CATALOG_JSON_FILENAME, DESTINATION_CONFIG_JSON_FILENAME,
};

/// Destination config key that turns normalization on.
pub const BASIC_NORMALIZATION_KEY: &str = "basic_normalization";

/// Destinations the normalization image supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DestinationType {
    Postgres,
    BigQuery,
    Snowflake,
    Redshift,
}

impl DestinationType {
    /// Destination type of `image`, ignoring its tag.
    #[must_use]
    pub fn from_image(image: &str) -> Option<Self> {
        match strip_tag(image) {
            "relaybyte/destination-postgres" => Some(Self::Postgres),
            "relaybyte/destination-bigquery" => Some(Self::BigQuery),
            "relaybyte/destination-snowflake" => Some(Self::Snowflake),
            "relaybyte/destination-redshift" => Some(Self::Redshift),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::BigQuery => "bigquery",
            Self::Snowflake => "snowflake",
            Self::Redshift => "redshift",
        }
    }
}

impl fmt::Display for DestinationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `image` without its `:tag`. A colon inside a registry host
/// (`host:5000/name`) is not a tag.
#[must_use]
pub fn strip_tag(image: &str) -> &str {
    match image.rsplit_once(':') {
        Some((name, tag)) if !tag.contains('/') => name,
        _ => image,
    }
}

/// `true` when the destination config asks for normalization.
#[must_use]
pub fn basic_normalization_enabled(destination_config: &serde_json::Value) -> bool {
    destination_config
        .get(BASIC_NORMALIZATION_KEY)
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false)
}

#[async_trait]
pub trait NormalizationRunner: Send + Sync {
    /// # Errors
    ///
    /// Returns [`WorkerError::Normalization`] when normalization fails.
    async fn normalize(
        &self,
        job_run: JobRunConfig,
        job_root: &Path,
        destination_config: &serde_json::Value,
        catalog: &ConfiguredCatalog,
    ) -> Result<()>;
}

/// Runner used when normalization is off or unsupported.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpNormalizationRunner;

#[async_trait]
impl NormalizationRunner for NoOpNormalizationRunner {
    async fn normalize(
        &self,
        _job_run: JobRunConfig,
        _job_root: &Path,
        _destination_config: &serde_json::Value,
        _catalog: &ConfiguredCatalog,
    ) -> Result<()> {
        tracing::debug!("Normalization skipped");
        Ok(())
    }
}

/// Runs the normalization image in a container next to the destination.
#[derive(Debug, Clone)]
pub struct DockerNormalizationRunner {
    destination_type: DestinationType,
    destination_image: String,
    normalization_image: String,
    settings: Arc<DockerSettings>,
}

impl DockerNormalizationRunner {
    #[must_use]
    pub fn new(
        destination_type: DestinationType,
        destination_image: impl Into<String>,
        normalization_image: impl Into<String>,
        settings: Arc<DockerSettings>,
    ) -> Self {
        Self {
            destination_type,
            destination_image: destination_image.into(),
            normalization_image: normalization_image.into(),
            settings,
        }
    }

    fn args(&self) -> Vec<String> {
        vec![
            "run".into(),
            "--integration-type".into(),
            self.destination_type.as_str().into(),
            "--config".into(),
            DESTINATION_CONFIG_JSON_FILENAME.into(),
            "--catalog".into(),
            DESTINATION_CATALOG_JSON_FILENAME.into(),
        ]
    }

    async fn run(
        &self,
        job_run: JobRunConfig,
        job_root: &Path,
        destination_config: &serde_json::Value,
        catalog: &ConfiguredCatalog,
    ) -> Result<()> {
        write_json(job_root, DESTINATION_CONFIG_JSON_FILENAME, destination_config).await?;
        write_json(job_root, DESTINATION_CATALOG_JSON_FILENAME, catalog).await?;

        let command = self.settings.command(
            &self.normalization_image,
            job_run,
            job_root,
            &self.args(),
        );
        let mut process = ConnectorProcess::spawn(self.normalization_image.clone(), command)?;
        while process.next_message().await?.is_some() {}
        process.wait().await
    }
}

#[async_trait]
impl NormalizationRunner for DockerNormalizationRunner {
    async fn normalize(
        &self,
        job_run: JobRunConfig,
        job_root: &Path,
        destination_config: &serde_json::Value,
        catalog: &ConfiguredCatalog,
    ) -> Result<()> {
        tracing::info!(
            destination_type = %self.destination_type,
            image = %self.normalization_image,
            "Running normalization"
        );
        self.run(job_run, job_root, destination_config, catalog)
            .await
            .map_err(|err| WorkerError::Normalization {
                destination_image: self.destination_image.clone(),
                message: err.to_string(),
            })
    }
}

/// Chooses the normalization runner for a sync's destination.
pub trait NormalizationRunnerFactory: Send + Sync {
    fn create(
        &self,
        destination_image: &str,
        destination_config: &serde_json::Value,
    ) -> Arc<dyn NormalizationRunner>;
}

/// Factory producing [`DockerNormalizationRunner`]s for supported
/// destinations with normalization enabled, and no-ops otherwise.
#[derive(Debug, Clone)]
pub struct DefaultNormalizationRunnerFactory {
    normalization_image: String,
    settings: Arc<DockerSettings>,
}

impl DefaultNormalizationRunnerFactory {
    #[must_use]
    pub fn new(normalization_image: impl Into<String>, settings: Arc<DockerSettings>) -> Self {
        Self {
            normalization_image: normalization_image.into(),
            settings,
        }
    }
}

impl NormalizationRunnerFactory for DefaultNormalizationRunnerFactory {
    fn create(
        &self,
        destination_image: &str,
        destination_config: &serde_json::Value,
    ) -> Arc<dyn NormalizationRunner> {
        if !basic_normalization_enabled(destination_config) {
            return Arc::new(NoOpNormalizationRunner);
        }
        match DestinationType::from_image(destination_image) {
            Some(destination_type) => Arc::new(DockerNormalizationRunner::new(
                destination_type,
                destination_image,
                self.normalization_image.clone(),
                Arc::clone(&self.settings),
            )),
            None => {
                tracing::warn!(
                    destination_image,
                    "Normalization requested for an unsupported destination; skipping"
                );
                Arc::new(NoOpNormalizationRunner)
            }
        }
    }
}
