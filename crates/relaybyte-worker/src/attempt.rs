//! Per-attempt execution scope.
//!
//! Every activity runs its work through [`AttemptExecution`], which gives the
//! attempt a deterministic working directory and logging context before the
//! work starts and folds every way the work can fail into an
//! [`AttemptFailure`].

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use futures_util::FutureExt;
use relaybyte_types::job::JobRunConfig;
use tracing::Instrument;

use crate::error::AttemptFailure;
use crate::logging::ATTEMPT_SPAN_NAME;

/// Name of the log file inside every job root.
pub const LOG_FILENAME: &str = "logs.log";

/// Installs the logging context of one attempt.
///
/// The returned span instruments the attempt's work, so everything the work
/// logs carries the attempt's correlation fields.
pub trait LogContext: Send + Sync {
    fn install(&self, job_root: &Path, job_run: JobRunConfig) -> tracing::Span;
}

/// Creates the working directory of one attempt. Must succeed when the
/// directory already exists.
pub trait JobRootCreator: Send + Sync {
    /// # Errors
    ///
    /// Returns the underlying I/O error when the directory cannot be created.
    fn create(&self, job_root: &Path) -> std::io::Result<()>;
}

/// Default [`LogContext`]: an `attempt` span with the job id, attempt id,
/// and log file path. With [`AttemptLogLayer`](crate::logging::AttemptLogLayer)
/// installed, events inside the span are also written to that file.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogContext;

impl LogContext for TracingLogContext {
    fn install(&self, job_root: &Path, job_run: JobRunConfig) -> tracing::Span {
        tracing::info_span!(
            ATTEMPT_SPAN_NAME,
            job_id = job_run.job_id,
            attempt_id = job_run.attempt_id,
            log_path = %job_root.join(LOG_FILENAME).display(),
        )
    }
}

/// Default [`JobRootCreator`] backed by `create_dir_all`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsJobRootCreator;

impl JobRootCreator for FsJobRootCreator {
    fn create(&self, job_root: &Path) -> std::io::Result<()> {
        std::fs::create_dir_all(job_root)
    }
}

/// One attempt of one job, ready to run.
///
/// `execution` receives the job root and returns the attempt's result. An
/// error that already is an [`AttemptFailure`] passes through untouched;
/// anything else is wrapped with the standard log path of this attempt.
pub struct AttemptExecution<F> {
    workspace_root: PathBuf,
    job_run: JobRunConfig,
    execution: F,
    log_context: Arc<dyn LogContext>,
    job_root_creator: Arc<dyn JobRootCreator>,
}

impl<F, Fut, T> AttemptExecution<F>
where
    F: FnOnce(PathBuf) -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    /// Attempt with the default tracing context and filesystem creator.
    pub fn new(workspace_root: impl Into<PathBuf>, job_run: JobRunConfig, execution: F) -> Self {
        Self::with_collaborators(
            workspace_root,
            job_run,
            execution,
            Arc::new(TracingLogContext),
            Arc::new(FsJobRootCreator),
        )
    }

    /// Attempt with explicit logging and directory collaborators.
    pub fn with_collaborators(
        workspace_root: impl Into<PathBuf>,
        job_run: JobRunConfig,
        execution: F,
        log_context: Arc<dyn LogContext>,
        job_root_creator: Arc<dyn JobRootCreator>,
    ) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            job_run,
            execution,
            log_context,
            job_root_creator,
        }
    }

    /// Run the attempt.
    ///
    /// # Errors
    ///
    /// Returns an [`AttemptFailure`] when the job root cannot be created or
    /// the execution fails.
    pub async fn get(self) -> Result<T, AttemptFailure> {
        let Self {
            workspace_root,
            job_run,
            execution,
            log_context,
            job_root_creator,
        } = self;

        let job_root = job_run.job_root(&workspace_root);
        let log_path = job_root.join(LOG_FILENAME);

        let span = log_context.install(&job_root, job_run);

        let outcome: anyhow::Result<T> = async {
            job_root_creator
                .create(&job_root)
                .with_context(|| format!("Failed to create job root {}", job_root.display()))?;
            tracing::info!(job_root = %job_root.display(), "Starting attempt");
            AssertUnwindSafe(async { execution(job_root.clone()).await })
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| Err(panic_error(&*payload)))
        }
        .instrument(span.clone())
        .await;

        let _entered = span.enter();
        match outcome {
            Ok(value) => {
                tracing::info!("Attempt completed");
                Ok(value)
            }
            Err(err) => match err.downcast::<AttemptFailure>() {
                Ok(failure) => {
                    tracing::error!(
                        log_path = %failure.log_path().display(),
                        "Attempt failed with a nested attempt failure"
                    );
                    Err(failure)
                }
                Err(err) => {
                    tracing::error!(error = %format!("{err:#}"), "Attempt failed");
                    Err(AttemptFailure::with_cause(log_path, err))
                }
            },
        }
    }
}

/// Unit-of-work panics become ordinary errors carrying the panic message.
fn panic_error(payload: &(dyn Any + Send)) -> anyhow::Error {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    anyhow::anyhow!("attempt execution panicked: {message}")
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    const JOB_ID: i64 = 11;
    const ATTEMPT_ID: i64 = 21;

    /// Records the order in which the collaborators were called.
    #[derive(Default)]
    struct CallLog {
        calls: Mutex<Vec<String>>,
    }

    impl CallLog {
        fn push(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    struct RecordingLogContext(Arc<CallLog>);

    impl LogContext for RecordingLogContext {
        fn install(&self, job_root: &Path, job_run: JobRunConfig) -> tracing::Span {
            self.0.push(format!(
                "log_context {} {} {}",
                job_root.display(),
                job_run.job_id,
                job_run.attempt_id
            ));
            tracing::Span::none()
        }
    }

    struct RecordingCreator {
        log: Arc<CallLog>,
        fail: bool,
    }

    impl JobRootCreator for RecordingCreator {
        fn create(&self, job_root: &Path) -> std::io::Result<()> {
            self.log.push(format!("create {}", job_root.display()));
            if self.fail {
                Err(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "read-only workspace",
                ))
            } else {
                Ok(())
            }
        }
    }

    fn workspace_root() -> PathBuf {
        PathBuf::from("/tmp/ws")
    }

    fn job_root() -> PathBuf {
        workspace_root().join("11").join("21")
    }

    fn expected_calls() -> Vec<String> {
        vec![
            "log_context /tmp/ws/11/21 11 21".to_string(),
            "create /tmp/ws/11/21".to_string(),
            "execute /tmp/ws/11/21".to_string(),
        ]
    }

    async fn run_attempt<T>(
        fail_create: bool,
        outcome: impl FnOnce() -> anyhow::Result<T>,
    ) -> (Result<T, AttemptFailure>, Vec<String>) {
        let log = Arc::new(CallLog::default());
        let execution_log = log.clone();
        let attempt = AttemptExecution::with_collaborators(
            workspace_root(),
            JobRunConfig::new(JOB_ID, ATTEMPT_ID),
            move |job_root: PathBuf| async move {
                execution_log.push(format!("execute {}", job_root.display()));
                outcome()
            },
            Arc::new(RecordingLogContext(log.clone())),
            Arc::new(RecordingCreator {
                log: log.clone(),
                fail: fail_create,
            }),
        );
        let result = attempt.get().await;
        (result, log.calls())
    }

    #[tokio::test]
    async fn returns_value_of_successful_execution() {
        let (result, calls) = run_attempt(false, || Ok("louis XVI".to_string())).await;
        assert_eq!(result.unwrap(), "louis XVI");
        assert_eq!(calls, expected_calls());
    }

    #[tokio::test]
    async fn wraps_io_error_with_standard_log_path() {
        let (result, calls) = run_attempt::<String>(false, || {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed").into())
        })
        .await;

        let failure = result.unwrap_err();
        assert_eq!(failure.log_path(), job_root().join(LOG_FILENAME));
        let cause = failure.cause().expect("cause");
        assert!(cause.downcast_ref::<std::io::Error>().is_some());
        assert_eq!(calls, expected_calls());
    }

    #[tokio::test]
    async fn wraps_arbitrary_error_with_standard_log_path() {
        #[derive(Debug, thiserror::Error)]
        #[error("illegal argument")]
        struct IllegalArgument;

        let (result, calls) = run_attempt::<String>(false, || Err(IllegalArgument.into())).await;

        let failure = result.unwrap_err();
        assert_eq!(failure.log_path(), Path::new("/tmp/ws/11/21/logs.log"));
        assert!(failure
            .cause()
            .and_then(|c| c.downcast_ref::<IllegalArgument>())
            .is_some());
        assert_eq!(calls, expected_calls());
    }

    #[tokio::test]
    async fn wraps_panic_with_standard_log_path() {
        let (result, calls) = run_attempt::<String>(false, || {
            let streams: Vec<String> = Vec::new();
            Ok(streams[3].clone())
        })
        .await;

        let failure = result.unwrap_err();
        assert_eq!(failure.log_path(), job_root().join(LOG_FILENAME));
        let cause = failure.cause().expect("panic cause").to_string();
        assert!(cause.contains("attempt execution panicked"), "{cause}");
        assert!(cause.contains("index out of bounds"), "{cause}");
        assert_eq!(calls, expected_calls());
    }

    #[tokio::test]
    async fn wraps_formatted_panic_message() {
        let (result, _) =
            run_attempt::<String>(false, || panic!("connector {} vanished", "faker")).await;

        let failure = result.unwrap_err();
        assert_eq!(
            failure.cause().map(ToString::to_string).as_deref(),
            Some("attempt execution panicked: connector faker vanished")
        );
    }

    #[tokio::test]
    async fn attempt_events_land_in_log_file() {
        use tracing_subscriber::layer::SubscriberExt;

        let workspace = tempfile::tempdir().unwrap();
        let run = JobRunConfig::new(JOB_ID, ATTEMPT_ID);
        let subscriber = tracing_subscriber::registry().with(crate::logging::AttemptLogLayer);
        let _default = tracing::subscriber::set_default(subscriber);

        let failure = AttemptExecution::new(workspace.path(), run, |_job_root: PathBuf| async {
            tracing::error!(image = "relaybyte/source-faker:0.1", "Connector crashed");
            Err::<(), _>(anyhow::anyhow!("exit code 3"))
        })
        .get()
        .await
        .unwrap_err();

        let log_path = workspace.path().join("11").join("21").join(LOG_FILENAME);
        assert_eq!(failure.log_path(), log_path);
        let contents = std::fs::read_to_string(&log_path).unwrap();
        assert!(contents.contains("Starting attempt"), "{contents}");
        assert!(contents.contains("Connector crashed"), "{contents}");
        assert!(contents.contains("Attempt failed"), "{contents}");
        assert!(contents.contains("exit code 3"), "{contents}");
    }

    #[tokio::test]
    async fn passes_nested_attempt_failure_through_unchanged() {
        let other_path = job_root().join("other file path");
        let nested_path = other_path.clone();

        let (result, calls) = run_attempt::<String>(false, move || {
            Err(AttemptFailure::from_log_path(nested_path).into())
        })
        .await;

        let failure = result.unwrap_err();
        assert_eq!(failure.log_path(), other_path);
        assert!(failure.cause().is_none());
        assert_eq!(calls, expected_calls());
    }

    #[tokio::test]
    async fn creation_failure_uses_precomputed_log_path_and_skips_execution() {
        let (result, calls) = run_attempt(true, || Ok("never".to_string())).await;

        let failure = result.unwrap_err();
        assert_eq!(failure.log_path(), job_root().join(LOG_FILENAME));
        let io = failure
            .cause()
            .and_then(|c| c.downcast_ref::<std::io::Error>())
            .expect("io cause");
        assert_eq!(io.kind(), std::io::ErrorKind::PermissionDenied);
        assert_eq!(calls, expected_calls()[..2].to_vec());
    }

    #[tokio::test]
    async fn default_collaborators_create_job_root_idempotently() {
        let workspace = tempfile::tempdir().unwrap();
        let run = JobRunConfig::new(JOB_ID, ATTEMPT_ID);
        std::fs::create_dir_all(run.job_root(workspace.path())).unwrap();

        let seen = AttemptExecution::new(workspace.path(), run, |job_root: PathBuf| async move {
            Ok::<_, anyhow::Error>(job_root.is_dir())
        })
        .get()
        .await
        .unwrap();
        assert!(seen);

        let again = AttemptExecution::new(workspace.path(), run, |job_root: PathBuf| async move {
            Ok::<_, anyhow::Error>(job_root)
        })
        .get()
        .await
        .unwrap();
        assert_eq!(again, workspace.path().join("11").join("21"));
    }

    #[test]
    fn fs_creator_accepts_existing_directory() {
        let workspace = tempfile::tempdir().unwrap();
        let root = workspace.path().join("1").join("0");
        FsJobRootCreator.create(&root).unwrap();
        FsJobRootCreator.create(&root).unwrap();
        assert!(root.is_dir());
    }
}
