//! `docker run` launcher.

use std::path::Path;
use std::sync::Arc;

use relaybyte_types::job::{IntegrationLauncherConfig, JobRunConfig};
use tokio::process::Command;

use super::{args, ConnectorProcess, IntegrationLauncher, LauncherFactory};
use crate::error::Result;

/// Container path the workspace is mounted at.
pub const DATA_MOUNT_DESTINATION: &str = "/data";
/// Container path the local scratch directory is mounted at.
pub const LOCAL_MOUNT_DESTINATION: &str = "/local";

/// Host-side settings shared by every container the worker starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerSettings {
    /// Volume (or host path) holding the workspace, as the Docker daemon sees it.
    pub workspace_mount: String,
    /// Volume (or host path) mounted at `/local`.
    pub local_mount: String,
    pub network: String,
}

impl DockerSettings {
    /// Full `docker` argument list for running `image` with `args` inside the
    /// attempt's job root.
    #[must_use]
    pub fn run_args(&self, image: &str, job_run: JobRunConfig, args: &[String]) -> Vec<String> {
        let mut run = vec![
            "run".to_string(),
            "--rm".into(),
            "-i".into(),
            "-v".into(),
            format!("{}:{DATA_MOUNT_DESTINATION}", self.workspace_mount),
            "-v".into(),
            format!("{}:{LOCAL_MOUNT_DESTINATION}", self.local_mount),
            "-w".into(),
            format!(
                "{DATA_MOUNT_DESTINATION}/{}/{}",
                job_run.job_id, job_run.attempt_id
            ),
            "--network".into(),
            self.network.clone(),
            image.into(),
        ];
        run.extend(args.iter().cloned());
        run
    }

    /// `docker run` command ready to spawn from `job_root`.
    #[must_use]
    pub fn command(
        &self,
        image: &str,
        job_run: JobRunConfig,
        job_root: &Path,
        args: &[String],
    ) -> Command {
        let mut command = Command::new("docker");
        command
            .args(self.run_args(image, job_run, args))
            .current_dir(job_root);
        command
    }
}

/// Launches one connector image as a Docker container.
#[derive(Debug, Clone)]
pub struct DockerIntegrationLauncher {
    job_run: JobRunConfig,
    image: String,
    settings: Arc<DockerSettings>,
}

impl DockerIntegrationLauncher {
    #[must_use]
    pub fn new(job_run: JobRunConfig, image: impl Into<String>, settings: Arc<DockerSettings>) -> Self {
        Self {
            job_run,
            image: image.into(),
            settings,
        }
    }

    fn launch(&self, job_root: &Path, args: &[String]) -> Result<ConnectorProcess> {
        tracing::info!(
            image = %self.image,
            job_id = self.job_run.job_id,
            attempt_id = self.job_run.attempt_id,
            command = %args.join(" "),
            "Launching connector"
        );
        let command = self
            .settings
            .command(&self.image, self.job_run, job_root, args);
        ConnectorProcess::spawn(self.image.clone(), command)
    }
}

impl IntegrationLauncher for DockerIntegrationLauncher {
    fn image(&self) -> &str {
        &self.image
    }

    fn spec(&self, job_root: &Path) -> Result<ConnectorProcess> {
        self.launch(job_root, &args::spec())
    }

    fn check(&self, job_root: &Path, config_filename: &str) -> Result<ConnectorProcess> {
        self.launch(job_root, &args::check(config_filename))
    }

    fn discover(&self, job_root: &Path, config_filename: &str) -> Result<ConnectorProcess> {
        self.launch(job_root, &args::discover(config_filename))
    }

    fn read(
        &self,
        job_root: &Path,
        config_filename: &str,
        catalog_filename: &str,
        state_filename: Option<&str>,
    ) -> Result<ConnectorProcess> {
        self.launch(
            job_root,
            &args::read(config_filename, catalog_filename, state_filename),
        )
    }

    fn write(
        &self,
        job_root: &Path,
        config_filename: &str,
        catalog_filename: &str,
    ) -> Result<ConnectorProcess> {
        self.launch(job_root, &args::write(config_filename, catalog_filename))
    }
}

/// Factory for [`DockerIntegrationLauncher`]s sharing one set of settings.
#[derive(Debug, Clone)]
pub struct DockerLauncherFactory {
    settings: Arc<DockerSettings>,
}

impl DockerLauncherFactory {
    #[must_use]
    pub fn new(settings: DockerSettings) -> Self {
        Self {
            settings: Arc::new(settings),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &Arc<DockerSettings> {
        &self.settings
    }
}

impl LauncherFactory for DockerLauncherFactory {
    fn create(&self, config: &IntegrationLauncherConfig) -> Arc<dyn IntegrationLauncher> {
        Arc::new(DockerIntegrationLauncher::new(
            JobRunConfig::new(config.job_id, config.attempt_id),
            config.docker_image.clone(),
            Arc::clone(&self.settings),
        ))
    }
}
