//! Kind-specific job submission configs.
//!
//! These are what an upstream scheduler hands to the dispatcher. The
//! dispatcher turns each one into launcher configs plus a job input.

use serde::{Deserialize, Serialize};

use crate::catalog::ConfiguredCatalog;
use crate::input::State;
use crate::job::JobType;

/// Fetch the specification document of a connector image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobGetSpecConfig {
    pub docker_image: String,
}

/// Check that a connector can reach its system with the given configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobCheckConnectionConfig {
    pub docker_image: String,
    #[serde(default)]
    pub connection_configuration: serde_json::Value,
}

/// Discover the streams a source connector exposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDiscoverCatalogConfig {
    pub docker_image: String,
    #[serde(default)]
    pub connection_configuration: serde_json::Value,
}

/// Replicate the configured catalog from a source into a destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSyncConfig {
    /// Prefix prepended to every destination stream name.
    #[serde(default)]
    pub prefix: String,
    pub source_docker_image: String,
    pub destination_docker_image: String,
    #[serde(default)]
    pub source_configuration: serde_json::Value,
    #[serde(default)]
    pub destination_configuration: serde_json::Value,
    #[serde(default)]
    pub configured_catalog: ConfiguredCatalog,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<State>,
}

/// One submission config of any kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobConfig {
    GetSpec(JobGetSpecConfig),
    CheckConnection(JobCheckConnectionConfig),
    DiscoverSchema(JobDiscoverCatalogConfig),
    Sync(JobSyncConfig),
}

impl JobConfig {
    #[must_use]
    pub fn job_type(&self) -> JobType {
        match self {
            Self::GetSpec(_) => JobType::GetSpec,
            Self::CheckConnection(_) => JobType::CheckConnection,
            Self::DiscoverSchema(_) => JobType::DiscoverSchema,
            Self::Sync(_) => JobType::Sync,
        }
    }

    /// Connector images this job will launch, in launch-role order
    /// (source before destination for syncs).
    #[must_use]
    pub fn docker_images(&self) -> Vec<&str> {
        match self {
            Self::GetSpec(c) => vec![c.docker_image.as_str()],
            Self::CheckConnection(c) => vec![c.docker_image.as_str()],
            Self::DiscoverSchema(c) => vec![c.docker_image.as_str()],
            Self::Sync(c) => vec![
                c.source_docker_image.as_str(),
                c.destination_docker_image.as_str(),
            ],
        }
    }
}
