//! Worker configuration and job file types.

use std::path::PathBuf;
use std::sync::Arc;

use relaybyte_types::config::JobConfig;
use serde::{Deserialize, Serialize};

use crate::launcher::{DockerLauncherFactory, DockerSettings};
use crate::normalization::DefaultNormalizationRunnerFactory;

pub const DEFAULT_WORKSPACE_ROOT: &str = "/tmp/relaybyte/workspace";
pub const DEFAULT_LOCAL_ROOT: &str = "/tmp/relaybyte/local";
pub const DEFAULT_DOCKER_NETWORK: &str = "host";
pub const DEFAULT_NORMALIZATION_IMAGE: &str = "relaybyte/normalization:0.1.0";

/// Worker settings, read from a YAML file. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkerConfig {
    /// Host directory holding one `<job_id>/<attempt_id>` root per attempt.
    pub workspace_root: PathBuf,
    /// What containers mount at `/data`; defaults to `workspace_root`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_mount: Option<String>,
    /// What containers mount at `/local`.
    pub local_mount: String,
    pub docker_network: String,
    pub normalization_image: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            workspace_root: PathBuf::from(DEFAULT_WORKSPACE_ROOT),
            workspace_mount: None,
            local_mount: DEFAULT_LOCAL_ROOT.to_string(),
            docker_network: DEFAULT_DOCKER_NETWORK.to_string(),
            normalization_image: DEFAULT_NORMALIZATION_IMAGE.to_string(),
        }
    }
}

impl WorkerConfig {
    #[must_use]
    pub fn docker_settings(&self) -> DockerSettings {
        DockerSettings {
            workspace_mount: self
                .workspace_mount
                .clone()
                .unwrap_or_else(|| self.workspace_root.display().to_string()),
            local_mount: self.local_mount.clone(),
            network: self.docker_network.clone(),
        }
    }

    /// Launcher factory and normalization factory sharing this config's
    /// Docker settings.
    #[must_use]
    pub fn docker_factories(&self) -> (DockerLauncherFactory, DefaultNormalizationRunnerFactory) {
        let launchers = DockerLauncherFactory::new(self.docker_settings());
        let normalization = DefaultNormalizationRunnerFactory::new(
            self.normalization_image.clone(),
            Arc::clone(launchers.settings()),
        );
        (launchers, normalization)
    }
}

/// One job submission as written to disk.
///
/// ```yaml
/// job_id: 42
/// attempt: 0
/// job:
///   kind: check_connection
///   docker_image: relaybyte/source-postgres:0.3
///   connection_configuration:
///     host: ${PG_HOST}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFile {
    pub job_id: i64,
    #[serde(default)]
    pub attempt: i32,
    pub job: JobConfig,
}
