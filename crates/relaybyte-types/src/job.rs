//! Attempt identity, launcher configuration, and job kinds.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Image reference that marks a sync as a reset: the source is replaced by
/// one that emits nothing, so the destination only sees the end of stream.
pub const RESET_JOB_SOURCE_DOCKER_IMAGE_STUB: &str = "__RESET__";

const GET_SPEC_TIMEOUT: Duration = Duration::from_secs(10 * 60);
const CHECK_CONNECTION_TIMEOUT: Duration = Duration::from_secs(60 * 60);
const DISCOVER_SCHEMA_TIMEOUT: Duration = Duration::from_secs(60 * 60);
const SYNC_TIMEOUT: Duration = Duration::from_secs(3 * 24 * 60 * 60);

/// Identifies one attempt within one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobRunConfig {
    pub job_id: i64,
    pub attempt_id: i64,
}

impl JobRunConfig {
    #[must_use]
    pub fn new(job_id: i64, attempt_id: i64) -> Self {
        Self { job_id, attempt_id }
    }

    /// Working directory of this attempt: `workspace_root/<job_id>/<attempt_id>`.
    #[must_use]
    pub fn job_root(&self, workspace_root: &Path) -> PathBuf {
        workspace_root
            .join(self.job_id.to_string())
            .join(self.attempt_id.to_string())
    }
}

impl fmt::Display for JobRunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.job_id, self.attempt_id)
    }
}

/// Which connector image to launch for one role of one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntegrationLauncherConfig {
    pub job_id: i64,
    pub attempt_id: i64,
    pub docker_image: String,
}

impl IntegrationLauncherConfig {
    #[must_use]
    pub fn new(job_id: i64, attempt_id: i64, docker_image: impl Into<String>) -> Self {
        Self {
            job_id,
            attempt_id,
            docker_image: docker_image.into(),
        }
    }

    /// `true` when this launcher stands in for a reset source.
    #[must_use]
    pub fn is_reset_stub(&self) -> bool {
        self.docker_image == RESET_JOB_SOURCE_DOCKER_IMAGE_STUB
    }
}

/// The closed set of job kinds a worker can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    GetSpec,
    CheckConnection,
    DiscoverSchema,
    Sync,
}

impl JobType {
    pub const ALL: [JobType; 4] = [
        Self::GetSpec,
        Self::CheckConnection,
        Self::DiscoverSchema,
        Self::Sync,
    ];

    /// Stable wire name; also used as the workflow task queue.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GetSpec => "get_spec",
            Self::CheckConnection => "check_connection",
            Self::DiscoverSchema => "discover_schema",
            Self::Sync => "sync",
        }
    }

    /// Upper bound on how long one workflow of this kind may take end to end.
    #[must_use]
    pub fn timeout_budget(self) -> Duration {
        match self {
            Self::GetSpec => GET_SPEC_TIMEOUT,
            Self::CheckConnection => CHECK_CONNECTION_TIMEOUT,
            Self::DiscoverSchema => DISCOVER_SCHEMA_TIMEOUT,
            Self::Sync => SYNC_TIMEOUT,
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
