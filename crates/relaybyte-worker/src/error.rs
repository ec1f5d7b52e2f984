//! Error model for attempts, workers, and the workflow engine boundary.
//!
//! [`AttemptFailure`] is the only failure shape that leaves an attempt.
//! [`WorkerError`] is what the default workers raise internally; it reaches
//! callers only as the cause of an `AttemptFailure`. [`WorkflowError`]
//! covers engine-side failures around the attempt, and [`JobError`] is the
//! union the dispatcher returns.

use std::path::{Path, PathBuf};
use std::time::Duration;

use relaybyte_types::job::JobType;

// ---------------------------------------------------------------------------
// AttemptFailure
// ---------------------------------------------------------------------------

/// Terminal failure of one attempt.
///
/// Carries the path of the attempt's log file and, when the failure came
/// from an error rather than a plain non-success signal, that error.
#[derive(Debug, thiserror::Error)]
#[error("attempt failed (logs: {})", log_path.display())]
pub struct AttemptFailure {
    log_path: PathBuf,
    #[source]
    cause: Option<anyhow::Error>,
}

impl AttemptFailure {
    /// Failure without an underlying error.
    #[must_use]
    pub fn from_log_path(log_path: impl Into<PathBuf>) -> Self {
        Self {
            log_path: log_path.into(),
            cause: None,
        }
    }

    /// Failure wrapping the error that caused it.
    #[must_use]
    pub fn with_cause(log_path: impl Into<PathBuf>, cause: impl Into<anyhow::Error>) -> Self {
        Self {
            log_path: log_path.into(),
            cause: Some(cause.into()),
        }
    }

    #[must_use]
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    #[must_use]
    pub fn cause(&self) -> Option<&anyhow::Error> {
        self.cause.as_ref()
    }
}

// ---------------------------------------------------------------------------
// WorkerError
// ---------------------------------------------------------------------------

/// Failures raised while a worker drives connector processes.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// The connector process could not be spawned.
    #[error("failed to launch {image}: {source}")]
    Launch {
        image: String,
        #[source]
        source: std::io::Error,
    },

    /// The connector exited with a non-zero status.
    #[error("{image} exited with code {code}")]
    ConnectorExit { image: String, code: i32 },

    /// The connector finished without emitting the message the job needs.
    #[error("{image} did not emit a {expected} message")]
    MissingOutput {
        image: String,
        expected: &'static str,
    },

    /// A process handle was used after its stdin or stdout was released.
    #[error("{image}: {stream} is not available")]
    StreamClosed {
        image: String,
        stream: &'static str,
    },

    /// Normalization failed after the sync itself completed.
    #[error("normalization of {destination_image} failed: {message}")]
    Normalization {
        destination_image: String,
        message: String,
    },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for worker-side results.
pub type Result<T> = std::result::Result<T, WorkerError>;

// ---------------------------------------------------------------------------
// WorkflowError / JobError
// ---------------------------------------------------------------------------

/// Failures produced by the workflow engine rather than by an attempt.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// The workflow ran past its execution timeout.
    #[error("{job_type} workflow exceeded its {timeout:?} budget")]
    TimedOut { job_type: JobType, timeout: Duration },

    /// The activity ran past its schedule-to-close timeout.
    #[error("{job_type} activity exceeded its {timeout:?} schedule-to-close timeout")]
    ActivityTimedOut { job_type: JobType, timeout: Duration },

    /// The stub's task queue does not match the request kind.
    #[error("task queue '{task_queue}' cannot run a {job_type} workflow")]
    TaskQueueMismatch {
        task_queue: String,
        job_type: JobType,
    },

    /// The engine returned a result of a different kind than was submitted.
    #[error("expected {expected} output, workflow returned {actual}")]
    UnexpectedOutput { expected: JobType, actual: JobType },

    /// Any other engine-side failure.
    #[error("workflow engine error: {0}")]
    Engine(#[source] anyhow::Error),
}

/// What a dispatcher call can fail with.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error(transparent)]
    Attempt(#[from] AttemptFailure),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}

impl JobError {
    /// The attempt failure, if the job got far enough to produce one.
    #[must_use]
    pub fn as_attempt_failure(&self) -> Option<&AttemptFailure> {
        match self {
            Self::Attempt(failure) => Some(failure),
            Self::Workflow(_) => None,
        }
    }
}
