use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use relaybyte_types::input::SyncInput;
use relaybyte_types::job::{IntegrationLauncherConfig, JobRunConfig, JobType};
use relaybyte_types::output::SyncOutput;

use crate::attempt::AttemptExecution;
use crate::engine::{ActivityOptions, ActivityStub};
use crate::error::{AttemptFailure, JobError};
use crate::launcher::LauncherFactory;
use crate::normalization::NormalizationRunnerFactory;
use crate::workers::{
    DefaultDestination, DefaultSource, DefaultSyncWorker, EmptySource, MessageTracker,
    NamespacingMapper, Source,
};

#[async_trait]
pub trait SyncActivity: Send + Sync {
    async fn run(
        &self,
        job_run: JobRunConfig,
        source_launcher_config: IntegrationLauncherConfig,
        destination_launcher_config: IntegrationLauncherConfig,
        input: SyncInput,
    ) -> Result<SyncOutput, AttemptFailure>;
}

pub struct SyncActivityImpl {
    launchers: Arc<dyn LauncherFactory>,
    normalization: Arc<dyn NormalizationRunnerFactory>,
    workspace_root: PathBuf,
}

impl SyncActivityImpl {
    #[must_use]
    pub fn new(
        launchers: Arc<dyn LauncherFactory>,
        normalization: Arc<dyn NormalizationRunnerFactory>,
        workspace_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            launchers,
            normalization,
            workspace_root: workspace_root.into(),
        }
    }

    fn source(&self, config: &IntegrationLauncherConfig) -> Box<dyn Source> {
        if config.is_reset_stub() {
            tracing::info!(
                job_id = config.job_id,
                attempt_id = config.attempt_id,
                "Reset requested; source replaced by an empty source"
            );
            Box::new(EmptySource)
        } else {
            Box::new(DefaultSource::new(self.launchers.create(config)))
        }
    }
}

#[async_trait]
impl SyncActivity for SyncActivityImpl {
    async fn run(
        &self,
        job_run: JobRunConfig,
        source_launcher_config: IntegrationLauncherConfig,
        destination_launcher_config: IntegrationLauncherConfig,
        input: SyncInput,
    ) -> Result<SyncOutput, AttemptFailure> {
        AttemptExecution::new(self.workspace_root.clone(), job_run, |job_root: PathBuf| async move {
            let source = self.source(&source_launcher_config);
            let destination = Box::new(DefaultDestination::new(
                self.launchers.create(&destination_launcher_config),
            ));
            let normalization = self.normalization.create(
                &destination_launcher_config.docker_image,
                &input.destination_configuration,
            );
            let worker = DefaultSyncWorker::new(
                job_run,
                source,
                NamespacingMapper::new(input.prefix.clone()),
                destination,
                MessageTracker::new(),
                normalization,
            );
            worker
                .run(&input, &job_root)
                .await
                .map_err(anyhow::Error::from)
        })
        .get()
        .await
    }
}

pub struct SyncWorkflow {
    activity: ActivityStub<dyn SyncActivity>,
}

impl SyncWorkflow {
    #[must_use]
    pub fn new(activity: Arc<dyn SyncActivity>) -> Self {
        Self::with_options(activity, ActivityOptions::for_job_type(JobType::Sync))
    }

    #[must_use]
    pub fn with_options(activity: Arc<dyn SyncActivity>, options: ActivityOptions) -> Self {
        Self {
            activity: ActivityStub::new(JobType::Sync, activity, options),
        }
    }

    /// # Errors
    ///
    /// Returns the activity's failure or an activity timeout.
    pub async fn run(
        &self,
        job_run: JobRunConfig,
        source_launcher_config: IntegrationLauncherConfig,
        destination_launcher_config: IntegrationLauncherConfig,
        input: SyncInput,
    ) -> Result<SyncOutput, JobError> {
        self.activity
            .execute(|activity| {
                activity.run(
                    job_run,
                    source_launcher_config,
                    destination_launcher_config,
                    input,
                )
            })
            .await
    }
}
