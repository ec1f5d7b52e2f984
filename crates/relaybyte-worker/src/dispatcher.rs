//! Single entry point for submitting jobs.
//!
//! The dispatcher turns a kind-specific submission config into a
//! [`WorkflowRequest`], starts exactly one workflow execution with the
//! kind's options, and waits for its result. It never retries and never
//! deduplicates: two calls with the same ids start two executions.

use std::sync::Arc;

use relaybyte_types::catalog::Catalog;
use relaybyte_types::config::{
    JobCheckConnectionConfig, JobConfig, JobDiscoverCatalogConfig, JobGetSpecConfig, JobSyncConfig,
};
use relaybyte_types::input::{CheckConnectionInput, DiscoverCatalogInput, SyncInput};
use relaybyte_types::job::{IntegrationLauncherConfig, JobRunConfig, JobType};
use relaybyte_types::output::{CheckConnectionOutput, ConnectorSpecification, SyncOutput};

use crate::engine::{WorkflowEngine, WorkflowOptions, WorkflowOutput, WorkflowRequest, WorkflowStub};
use crate::error::{JobError, WorkflowError};

pub struct JobDispatcher {
    engine: Arc<dyn WorkflowEngine>,
}

impl JobDispatcher {
    #[must_use]
    pub fn new(engine: Arc<dyn WorkflowEngine>) -> Self {
        Self { engine }
    }

    /// Submit a job of any kind.
    ///
    /// # Errors
    ///
    /// Returns the attempt's failure or an engine-side [`WorkflowError`].
    pub async fn submit(
        &self,
        job_id: i64,
        attempt: i32,
        config: &JobConfig,
    ) -> Result<WorkflowOutput, JobError> {
        let request = build_request(job_id, attempt, config);
        let stub = self.workflow_stub(request.job_type());
        stub.run(request).await
    }

    /// # Errors
    ///
    /// See [`submit`](Self::submit).
    pub async fn submit_get_spec(
        &self,
        job_id: i64,
        attempt: i32,
        config: &JobGetSpecConfig,
    ) -> Result<ConnectorSpecification, JobError> {
        match self
            .submit(job_id, attempt, &JobConfig::GetSpec(config.clone()))
            .await?
        {
            WorkflowOutput::Spec(spec) => Ok(spec),
            other => Err(unexpected(JobType::GetSpec, &other)),
        }
    }

    /// # Errors
    ///
    /// See [`submit`](Self::submit).
    pub async fn submit_check_connection(
        &self,
        job_id: i64,
        attempt: i32,
        config: &JobCheckConnectionConfig,
    ) -> Result<CheckConnectionOutput, JobError> {
        match self
            .submit(job_id, attempt, &JobConfig::CheckConnection(config.clone()))
            .await?
        {
            WorkflowOutput::CheckConnection(output) => Ok(output),
            other => Err(unexpected(JobType::CheckConnection, &other)),
        }
    }

    /// # Errors
    ///
    /// See [`submit`](Self::submit).
    pub async fn submit_discover_schema(
        &self,
        job_id: i64,
        attempt: i32,
        config: &JobDiscoverCatalogConfig,
    ) -> Result<Catalog, JobError> {
        match self
            .submit(job_id, attempt, &JobConfig::DiscoverSchema(config.clone()))
            .await?
        {
            WorkflowOutput::DiscoverSchema(catalog) => Ok(catalog),
            other => Err(unexpected(JobType::DiscoverSchema, &other)),
        }
    }

    /// # Errors
    ///
    /// See [`submit`](Self::submit).
    pub async fn submit_sync(
        &self,
        job_id: i64,
        attempt: i32,
        config: &JobSyncConfig,
    ) -> Result<SyncOutput, JobError> {
        match self
            .submit(job_id, attempt, &JobConfig::Sync(config.clone()))
            .await?
        {
            WorkflowOutput::Sync(output) => Ok(output),
            other => Err(unexpected(JobType::Sync, &other)),
        }
    }

    fn workflow_stub(&self, job_type: JobType) -> WorkflowStub {
        WorkflowStub::new(
            Arc::clone(&self.engine),
            WorkflowOptions::for_job_type(job_type),
        )
    }
}

fn unexpected(expected: JobType, output: &WorkflowOutput) -> JobError {
    WorkflowError::UnexpectedOutput {
        expected,
        actual: output.job_type(),
    }
    .into()
}

/// Workflow arguments for `config`, submitted as attempt `attempt` of job
/// `job_id`.
#[must_use]
pub fn build_request(job_id: i64, attempt: i32, config: &JobConfig) -> WorkflowRequest {
    let job_run = JobRunConfig::new(job_id, i64::from(attempt));
    let launcher = |image: &str| IntegrationLauncherConfig::new(job_id, i64::from(attempt), image);

    match config {
        JobConfig::GetSpec(config) => WorkflowRequest::GetSpec {
            job_run,
            launcher_config: launcher(&config.docker_image),
        },
        JobConfig::CheckConnection(config) => WorkflowRequest::CheckConnection {
            job_run,
            launcher_config: launcher(&config.docker_image),
            input: CheckConnectionInput {
                connection_configuration: config.connection_configuration.clone(),
            },
        },
        JobConfig::DiscoverSchema(config) => WorkflowRequest::DiscoverSchema {
            job_run,
            launcher_config: launcher(&config.docker_image),
            input: DiscoverCatalogInput {
                connection_configuration: config.connection_configuration.clone(),
            },
        },
        JobConfig::Sync(config) => WorkflowRequest::Sync {
            job_run,
            source_launcher_config: launcher(&config.source_docker_image),
            destination_launcher_config: launcher(&config.destination_docker_image),
            input: SyncInput {
                prefix: config.prefix.clone(),
                source_configuration: config.source_configuration.clone(),
                destination_configuration: config.destination_configuration.clone(),
                catalog: config.configured_catalog.clone(),
                state: config.state.clone(),
            },
        },
    }
}
