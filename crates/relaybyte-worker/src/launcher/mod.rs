//! Launching connector processes.
//!
//! An [`IntegrationLauncher`] knows how to start one connector image in each
//! of its commands; a [`LauncherFactory`] builds launchers from
//! [`IntegrationLauncherConfig`]s so activities never name a concrete
//! launcher type.

pub mod docker;
pub mod process;
pub mod scripted;

use std::path::Path;
use std::sync::Arc;

use relaybyte_types::job::IntegrationLauncherConfig;

pub use docker::{DockerIntegrationLauncher, DockerLauncherFactory, DockerSettings};
pub use process::{ConnectorProcess, MessageReader};
pub use scripted::{LaunchCommand, LaunchRecord, ScriptedLauncherFactory};

use crate::error::Result;

/// Starts one connector image in each of its commands.
///
/// File name arguments are relative to `job_root`, where the caller has
/// already written them.
pub trait IntegrationLauncher: Send + Sync {
    fn image(&self) -> &str;

    /// # Errors
    ///
    /// Returns [`WorkerError::Launch`](crate::error::WorkerError::Launch) if
    /// the process cannot be started.
    fn spec(&self, job_root: &Path) -> Result<ConnectorProcess>;

    /// # Errors
    ///
    /// See [`spec`](Self::spec).
    fn check(&self, job_root: &Path, config_filename: &str) -> Result<ConnectorProcess>;

    /// # Errors
    ///
    /// See [`spec`](Self::spec).
    fn discover(&self, job_root: &Path, config_filename: &str) -> Result<ConnectorProcess>;

    /// # Errors
    ///
    /// See [`spec`](Self::spec).
    fn read(
        &self,
        job_root: &Path,
        config_filename: &str,
        catalog_filename: &str,
        state_filename: Option<&str>,
    ) -> Result<ConnectorProcess>;

    /// # Errors
    ///
    /// See [`spec`](Self::spec).
    fn write(
        &self,
        job_root: &Path,
        config_filename: &str,
        catalog_filename: &str,
    ) -> Result<ConnectorProcess>;
}

/// Builds launchers for one role of one attempt.
pub trait LauncherFactory: Send + Sync {
    fn create(&self, config: &IntegrationLauncherConfig) -> Arc<dyn IntegrationLauncher>;
}

/// Command-line arguments of each connector command, shared by every
/// launcher so the connector-facing interface stays in one place.
pub(crate) mod args {
    pub fn spec() -> Vec<String> {
        vec!["spec".to_string()]
    }

    pub fn check(config_filename: &str) -> Vec<String> {
        vec!["check".into(), "--config".into(), config_filename.into()]
    }

    pub fn discover(config_filename: &str) -> Vec<String> {
        vec!["discover".into(), "--config".into(), config_filename.into()]
    }

    pub fn read(
        config_filename: &str,
        catalog_filename: &str,
        state_filename: Option<&str>,
    ) -> Vec<String> {
        let mut args = vec![
            "read".to_string(),
            "--config".into(),
            config_filename.into(),
            "--catalog".into(),
            catalog_filename.into(),
        ];
        if let Some(state) = state_filename {
            args.push("--state".into());
            args.push(state.into());
        }
        args
    }

    pub fn write(config_filename: &str, catalog_filename: &str) -> Vec<String> {
        vec![
            "write".into(),
            "--config".into(),
            config_filename.into(),
            "--catalog".into(),
            catalog_filename.into(),
        ]
    }
}
