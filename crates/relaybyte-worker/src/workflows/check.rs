use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use relaybyte_types::input::CheckConnectionInput;
use relaybyte_types::job::{IntegrationLauncherConfig, JobRunConfig, JobType};
use relaybyte_types::output::CheckConnectionOutput;

use crate::attempt::AttemptExecution;
use crate::engine::{ActivityOptions, ActivityStub};
use crate::error::{AttemptFailure, JobError};
use crate::launcher::LauncherFactory;
use crate::workers::DefaultCheckConnectionWorker;

#[async_trait]
pub trait CheckConnectionActivity: Send + Sync {
    async fn run(
        &self,
        job_run: JobRunConfig,
        launcher_config: IntegrationLauncherConfig,
        input: CheckConnectionInput,
    ) -> Result<CheckConnectionOutput, AttemptFailure>;
}

pub struct CheckConnectionActivityImpl {
    launchers: Arc<dyn LauncherFactory>,
    workspace_root: PathBuf,
}

impl CheckConnectionActivityImpl {
    #[must_use]
    pub fn new(launchers: Arc<dyn LauncherFactory>, workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            launchers,
            workspace_root: workspace_root.into(),
        }
    }
}

#[async_trait]
impl CheckConnectionActivity for CheckConnectionActivityImpl {
    async fn run(
        &self,
        job_run: JobRunConfig,
        launcher_config: IntegrationLauncherConfig,
        input: CheckConnectionInput,
    ) -> Result<CheckConnectionOutput, AttemptFailure> {
        AttemptExecution::new(self.workspace_root.clone(), job_run, |job_root: PathBuf| async move {
            let launcher = self.launchers.create(&launcher_config);
            DefaultCheckConnectionWorker::new(launcher)
                .run(&input, &job_root)
                .await
                .map_err(anyhow::Error::from)
        })
        .get()
        .await
    }
}

pub struct CheckConnectionWorkflow {
    activity: ActivityStub<dyn CheckConnectionActivity>,
}

impl CheckConnectionWorkflow {
    #[must_use]
    pub fn new(activity: Arc<dyn CheckConnectionActivity>) -> Self {
        Self::with_options(
            activity,
            ActivityOptions::for_job_type(JobType::CheckConnection),
        )
    }

    #[must_use]
    pub fn with_options(
        activity: Arc<dyn CheckConnectionActivity>,
        options: ActivityOptions,
    ) -> Self {
        Self {
            activity: ActivityStub::new(JobType::CheckConnection, activity, options),
        }
    }

    /// # Errors
    ///
    /// Returns the activity's failure or an activity timeout.
    pub async fn run(
        &self,
        job_run: JobRunConfig,
        launcher_config: IntegrationLauncherConfig,
        input: CheckConnectionInput,
    ) -> Result<CheckConnectionOutput, JobError> {
        self.activity
            .execute(|activity| activity.run(job_run, launcher_config, input))
            .await
    }
}
