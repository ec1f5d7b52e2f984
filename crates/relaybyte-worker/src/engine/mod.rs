//! Boundary to the durable workflow engine.
//!
//! The dispatcher talks to an engine only through [`WorkflowEngine`], with a
//! typed [`WorkflowRequest`] in and a typed [`WorkflowOutput`] out. Workflows
//! call their activity through an [`ActivityStub`]. [`LocalWorkflowEngine`]
//! runs everything in-process.

mod activity;
mod local;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use relaybyte_types::catalog::Catalog;
use relaybyte_types::input::{CheckConnectionInput, DiscoverCatalogInput, SyncInput};
use relaybyte_types::job::{IntegrationLauncherConfig, JobRunConfig, JobType};
use relaybyte_types::output::{CheckConnectionOutput, ConnectorSpecification, SyncOutput};

pub use activity::{ActivityOptions, ActivityStub};
pub use local::LocalWorkflowEngine;

use crate::error::JobError;

/// Options a workflow stub is created with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowOptions {
    pub task_queue: String,
    pub workflow_execution_timeout: Duration,
}

impl WorkflowOptions {
    /// Task queue named after the kind, timeout set to the kind's budget.
    #[must_use]
    pub fn for_job_type(job_type: JobType) -> Self {
        Self {
            task_queue: job_type.as_str().to_string(),
            workflow_execution_timeout: job_type.timeout_budget(),
        }
    }
}

/// Arguments of one workflow execution.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowRequest {
    GetSpec {
        job_run: JobRunConfig,
        launcher_config: IntegrationLauncherConfig,
    },
    CheckConnection {
        job_run: JobRunConfig,
        launcher_config: IntegrationLauncherConfig,
        input: CheckConnectionInput,
    },
    DiscoverSchema {
        job_run: JobRunConfig,
        launcher_config: IntegrationLauncherConfig,
        input: DiscoverCatalogInput,
    },
    Sync {
        job_run: JobRunConfig,
        source_launcher_config: IntegrationLauncherConfig,
        destination_launcher_config: IntegrationLauncherConfig,
        input: SyncInput,
    },
}

impl WorkflowRequest {
    #[must_use]
    pub fn job_type(&self) -> JobType {
        match self {
            Self::GetSpec { .. } => JobType::GetSpec,
            Self::CheckConnection { .. } => JobType::CheckConnection,
            Self::DiscoverSchema { .. } => JobType::DiscoverSchema,
            Self::Sync { .. } => JobType::Sync,
        }
    }

    #[must_use]
    pub fn job_run(&self) -> JobRunConfig {
        match self {
            Self::GetSpec { job_run, .. }
            | Self::CheckConnection { job_run, .. }
            | Self::DiscoverSchema { job_run, .. }
            | Self::Sync { job_run, .. } => *job_run,
        }
    }
}

/// Result of one workflow execution.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowOutput {
    Spec(ConnectorSpecification),
    CheckConnection(CheckConnectionOutput),
    DiscoverSchema(Catalog),
    Sync(SyncOutput),
}

impl WorkflowOutput {
    #[must_use]
    pub fn job_type(&self) -> JobType {
        match self {
            Self::Spec(_) => JobType::GetSpec,
            Self::CheckConnection(_) => JobType::CheckConnection,
            Self::DiscoverSchema(_) => JobType::DiscoverSchema,
            Self::Sync(_) => JobType::Sync,
        }
    }
}

/// Executes workflows.
#[async_trait]
pub trait WorkflowEngine: Send + Sync {
    /// Run one workflow to completion.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::Attempt`] when the attempt failed and
    /// [`JobError::Workflow`] for engine-side failures such as timeouts.
    async fn execute(
        &self,
        options: &WorkflowOptions,
        request: WorkflowRequest,
    ) -> Result<WorkflowOutput, JobError>;
}

/// Handle for starting workflows with fixed options.
#[derive(Clone)]
pub struct WorkflowStub {
    engine: Arc<dyn WorkflowEngine>,
    options: WorkflowOptions,
}

impl WorkflowStub {
    #[must_use]
    pub fn new(engine: Arc<dyn WorkflowEngine>, options: WorkflowOptions) -> Self {
        Self { engine, options }
    }

    /// # Errors
    ///
    /// See [`WorkflowEngine::execute`].
    pub async fn run(&self, request: WorkflowRequest) -> Result<WorkflowOutput, JobError> {
        self.engine.execute(&self.options, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_follow_job_type_policy() {
        for job_type in JobType::ALL {
            let options = WorkflowOptions::for_job_type(job_type);
            assert_eq!(options.task_queue, job_type.as_str());
            assert_eq!(options.workflow_execution_timeout, job_type.timeout_budget());
        }
    }

    #[test]
    fn request_reports_kind_and_identity() {
        let request = WorkflowRequest::GetSpec {
            job_run: JobRunConfig::new(4, 2),
            launcher_config: IntegrationLauncherConfig::new(4, 2, "img"),
        };
        assert_eq!(request.job_type(), JobType::GetSpec);
        assert_eq!(request.job_run(), JobRunConfig::new(4, 2));
    }
}
