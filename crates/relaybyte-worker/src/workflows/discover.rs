use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use relaybyte_types::catalog::Catalog;
use relaybyte_types::input::DiscoverCatalogInput;
use relaybyte_types::job::{IntegrationLauncherConfig, JobRunConfig, JobType};

use crate::attempt::AttemptExecution;
use crate::engine::{ActivityOptions, ActivityStub};
use crate::error::{AttemptFailure, JobError};
use crate::launcher::LauncherFactory;
use crate::workers::DefaultDiscoverCatalogWorker;

#[async_trait]
pub trait DiscoverCatalogActivity: Send + Sync {
    async fn run(
        &self,
        job_run: JobRunConfig,
        launcher_config: IntegrationLauncherConfig,
        input: DiscoverCatalogInput,
    ) -> Result<Catalog, AttemptFailure>;
}

pub struct DiscoverCatalogActivityImpl {
    launchers: Arc<dyn LauncherFactory>,
    workspace_root: PathBuf,
}

impl DiscoverCatalogActivityImpl {
    #[must_use]
    pub fn new(launchers: Arc<dyn LauncherFactory>, workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            launchers,
            workspace_root: workspace_root.into(),
        }
    }
}

#[async_trait]
impl DiscoverCatalogActivity for DiscoverCatalogActivityImpl {
    async fn run(
        &self,
        job_run: JobRunConfig,
        launcher_config: IntegrationLauncherConfig,
        input: DiscoverCatalogInput,
    ) -> Result<Catalog, AttemptFailure> {
        AttemptExecution::new(self.workspace_root.clone(), job_run, |job_root: PathBuf| async move {
            let launcher = self.launchers.create(&launcher_config);
            DefaultDiscoverCatalogWorker::new(launcher)
                .run(&input, &job_root)
                .await
                .map_err(anyhow::Error::from)
        })
        .get()
        .await
    }
}

pub struct DiscoverCatalogWorkflow {
    activity: ActivityStub<dyn DiscoverCatalogActivity>,
}

impl DiscoverCatalogWorkflow {
    #[must_use]
    pub fn new(activity: Arc<dyn DiscoverCatalogActivity>) -> Self {
        Self::with_options(
            activity,
            ActivityOptions::for_job_type(JobType::DiscoverSchema),
        )
    }

    #[must_use]
    pub fn with_options(
        activity: Arc<dyn DiscoverCatalogActivity>,
        options: ActivityOptions,
    ) -> Self {
        Self {
            activity: ActivityStub::new(JobType::DiscoverSchema, activity, options),
        }
    }

    /// # Errors
    ///
    /// Returns the activity's failure or an activity timeout.
    pub async fn run(
        &self,
        job_run: JobRunConfig,
        launcher_config: IntegrationLauncherConfig,
        input: DiscoverCatalogInput,
    ) -> Result<Catalog, JobError> {
        self.activity
            .execute(|activity| activity.run(job_run, launcher_config, input))
            .await
    }
}
