pub mod check;
pub mod discover;
pub mod spec;
pub mod sync;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use relaybyte_types::job::JobType;
use relaybyte_worker::config::{parser, validator, JobFile, WorkerConfig};
use relaybyte_worker::{JobDispatcher, JobError, LocalWorkflowEngine};

/// Global options shared by every subcommand.
pub struct Settings {
    pub config: Option<PathBuf>,
    pub workspace_root: Option<PathBuf>,
}

impl Settings {
    /// Load, override and validate the worker config.
    fn worker_config(&self) -> Result<WorkerConfig> {
        let mut config = match &self.config {
            Some(path) => parser::parse_worker_config(path).with_context(|| {
                format!("Failed to load worker config: {}", path.display())
            })?,
            None => WorkerConfig::default(),
        };
        if let Some(root) = &self.workspace_root {
            config.workspace_root = std::path::absolute(root).with_context(|| {
                format!("Failed to resolve workspace root: {}", root.display())
            })?;
        }
        validator::validate_worker_config(&config)?;
        Ok(config)
    }
}

/// A validated job of the expected kind, plus a dispatcher wired to Docker
/// connectors under the configured workspace.
pub(crate) struct Prepared {
    pub job: JobFile,
    pub dispatcher: JobDispatcher,
}

pub(crate) fn prepare(settings: &Settings, job_path: &Path, expected: JobType) -> Result<Prepared> {
    let config = settings.worker_config()?;

    let job = parser::parse_job(job_path)
        .with_context(|| format!("Failed to parse job: {}", job_path.display()))?;
    validator::validate_job(&job)?;
    if job.job.job_type() != expected {
        bail!(
            "Job file {} describes a {} job, expected {}",
            job_path.display(),
            job.job.job_type(),
            expected
        );
    }

    tracing::info!(
        job_id = job.job_id,
        attempt = job.attempt,
        kind = %expected,
        images = ?job.job.docker_images(),
        workspace_root = %config.workspace_root.display(),
        "Job validated"
    );

    let (launchers, normalization) = config.docker_factories();
    let engine = LocalWorkflowEngine::with_default_activities(
        Arc::new(launchers),
        Arc::new(normalization),
        config.workspace_root.clone(),
    );
    Ok(Prepared {
        job,
        dispatcher: JobDispatcher::new(Arc::new(engine)),
    })
}

/// Turn a job failure into a CLI error, pointing at the attempt log when
/// there is one.
pub(crate) fn job_failed(err: JobError) -> anyhow::Error {
    if let Some(failure) = err.as_attempt_failure() {
        eprintln!("Attempt log: {}", failure.log_path().display());
    }
    anyhow::Error::new(err).context("Job failed")
}

/// Print `value` as a single JSON line behind `marker`.
pub(crate) fn print_json(marker: &str, value: &impl serde::Serialize) -> Result<()> {
    let json = serde_json::to_string(value)?;
    println!("@@{marker}@@{json}");
    Ok(())
}
