use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use relaybyte_types::job::{IntegrationLauncherConfig, JobRunConfig, JobType};
use relaybyte_types::output::ConnectorSpecification;

use crate::attempt::AttemptExecution;
use crate::engine::{ActivityOptions, ActivityStub};
use crate::error::{AttemptFailure, JobError};
use crate::launcher::LauncherFactory;
use crate::workers::DefaultGetSpecWorker;

#[async_trait]
pub trait SpecActivity: Send + Sync {
    async fn run(
        &self,
        job_run: JobRunConfig,
        launcher_config: IntegrationLauncherConfig,
    ) -> Result<ConnectorSpecification, AttemptFailure>;
}

pub struct SpecActivityImpl {
    launchers: Arc<dyn LauncherFactory>,
    workspace_root: PathBuf,
}

impl SpecActivityImpl {
    #[must_use]
    pub fn new(launchers: Arc<dyn LauncherFactory>, workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            launchers,
            workspace_root: workspace_root.into(),
        }
    }
}

#[async_trait]
impl SpecActivity for SpecActivityImpl {
    async fn run(
        &self,
        job_run: JobRunConfig,
        launcher_config: IntegrationLauncherConfig,
    ) -> Result<ConnectorSpecification, AttemptFailure> {
        AttemptExecution::new(self.workspace_root.clone(), job_run, |job_root: PathBuf| async move {
            let launcher = self.launchers.create(&launcher_config);
            DefaultGetSpecWorker::new(launcher)
                .run(&job_root)
                .await
                .map_err(anyhow::Error::from)
        })
        .get()
        .await
    }
}

pub struct SpecWorkflow {
    activity: ActivityStub<dyn SpecActivity>,
}

impl SpecWorkflow {
    #[must_use]
    pub fn new(activity: Arc<dyn SpecActivity>) -> Self {
        Self::with_options(activity, ActivityOptions::for_job_type(JobType::GetSpec))
    }

    #[must_use]
    pub fn with_options(activity: Arc<dyn SpecActivity>, options: ActivityOptions) -> Self {
        Self {
            activity: ActivityStub::new(JobType::GetSpec, activity, options),
        }
    }

    /// # Errors
    ///
    /// Returns the activity's failure or an activity timeout.
    pub async fn run(
        &self,
        job_run: JobRunConfig,
        launcher_config: IntegrationLauncherConfig,
    ) -> Result<ConnectorSpecification, JobError> {
        self.activity
            .execute(|activity| activity.run(job_run, launcher_config))
            .await
    }
}
