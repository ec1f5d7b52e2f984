use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use super::{WorkflowEngine, WorkflowOptions, WorkflowOutput, WorkflowRequest};
use crate::error::{JobError, WorkflowError};
use crate::launcher::LauncherFactory;
use crate::normalization::NormalizationRunnerFactory;
use crate::workflows::{
    CheckConnectionActivityImpl, CheckConnectionWorkflow, DiscoverCatalogActivityImpl,
    DiscoverCatalogWorkflow, SpecActivityImpl, SpecWorkflow, SyncActivityImpl, SyncWorkflow,
};

/// In-process engine: runs the workflow on the caller's task and enforces
/// the workflow execution timeout. Nothing is persisted, so a crash loses
/// the execution.
pub struct LocalWorkflowEngine {
    spec: SpecWorkflow,
    check: CheckConnectionWorkflow,
    discover: DiscoverCatalogWorkflow,
    sync: SyncWorkflow,
}

impl LocalWorkflowEngine {
    #[must_use]
    pub fn new(
        spec: SpecWorkflow,
        check: CheckConnectionWorkflow,
        discover: DiscoverCatalogWorkflow,
        sync: SyncWorkflow,
    ) -> Self {
        Self {
            spec,
            check,
            discover,
            sync,
        }
    }

    /// Engine wired to the default activities of every kind.
    #[must_use]
    pub fn with_default_activities(
        launchers: Arc<dyn LauncherFactory>,
        normalization: Arc<dyn NormalizationRunnerFactory>,
        workspace_root: impl Into<PathBuf>,
    ) -> Self {
        let workspace_root = workspace_root.into();
        Self::new(
            SpecWorkflow::new(Arc::new(SpecActivityImpl::new(
                Arc::clone(&launchers),
                workspace_root.clone(),
            ))),
            CheckConnectionWorkflow::new(Arc::new(CheckConnectionActivityImpl::new(
                Arc::clone(&launchers),
                workspace_root.clone(),
            ))),
            DiscoverCatalogWorkflow::new(Arc::new(DiscoverCatalogActivityImpl::new(
                Arc::clone(&launchers),
                workspace_root.clone(),
            ))),
            SyncWorkflow::new(Arc::new(SyncActivityImpl::new(
                launchers,
                normalization,
                workspace_root,
            ))),
        )
    }

    async fn dispatch(&self, request: WorkflowRequest) -> Result<WorkflowOutput, JobError> {
        match request {
            WorkflowRequest::GetSpec {
                job_run,
                launcher_config,
            } => self
                .spec
                .run(job_run, launcher_config)
                .await
                .map(WorkflowOutput::Spec),
            WorkflowRequest::CheckConnection {
                job_run,
                launcher_config,
                input,
            } => self
                .check
                .run(job_run, launcher_config, input)
                .await
                .map(WorkflowOutput::CheckConnection),
            WorkflowRequest::DiscoverSchema {
                job_run,
                launcher_config,
                input,
            } => self
                .discover
                .run(job_run, launcher_config, input)
                .await
                .map(WorkflowOutput::DiscoverSchema),
            WorkflowRequest::Sync {
                job_run,
                source_launcher_config,
                destination_launcher_config,
                input,
            } => self
                .sync
                .run(
                    job_run,
                    source_launcher_config,
                    destination_launcher_config,
                    input,
                )
                .await
                .map(WorkflowOutput::Sync),
        }
    }
}

#[async_trait]
impl WorkflowEngine for LocalWorkflowEngine {
    async fn execute(
        &self,
        options: &WorkflowOptions,
        request: WorkflowRequest,
    ) -> Result<WorkflowOutput, JobError> {
        let job_type = request.job_type();
        if options.task_queue != job_type.as_str() {
            return Err(WorkflowError::TaskQueueMismatch {
                task_queue: options.task_queue.clone(),
                job_type,
            }
            .into());
        }

        let job_run = request.job_run();
        let timeout = options.workflow_execution_timeout;
        tracing::info!(
            job_id = job_run.job_id,
            attempt_id = job_run.attempt_id,
            task_queue = %options.task_queue,
            ?timeout,
            "Starting workflow"
        );

        match tokio::time::timeout(timeout, self.dispatch(request)).await {
            Ok(result) => {
                match &result {
                    Ok(_) => {
                        tracing::info!(job_id = job_run.job_id, %job_type, "Workflow completed");
                    }
                    Err(err) => {
                        tracing::warn!(
                            job_id = job_run.job_id,
                            %job_type,
                            error = %err,
                            "Workflow failed"
                        );
                    }
                }
                result
            }
            Err(_) => {
                tracing::error!(
                    job_id = job_run.job_id,
                    %job_type,
                    ?timeout,
                    "Workflow timed out"
                );
                Err(WorkflowError::TimedOut { job_type, timeout }.into())
            }
        }
    }
}
