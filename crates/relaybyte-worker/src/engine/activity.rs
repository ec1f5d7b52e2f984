use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use relaybyte_types::job::JobType;

use crate::error::{AttemptFailure, JobError, WorkflowError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityOptions {
    pub schedule_to_close_timeout: Duration,
}

impl ActivityOptions {
    /// Schedule-to-close timeout equal to the kind's budget.
    #[must_use]
    pub fn for_job_type(job_type: JobType) -> Self {
        Self {
            schedule_to_close_timeout: job_type.timeout_budget(),
        }
    }
}

/// How a workflow calls its activity: the activity runs at most until the
/// schedule-to-close timeout elapses, after which its future is dropped.
pub struct ActivityStub<A: ?Sized> {
    job_type: JobType,
    activity: Arc<A>,
    options: ActivityOptions,
}

impl<A: ?Sized + Send + Sync> ActivityStub<A> {
    #[must_use]
    pub fn new(job_type: JobType, activity: Arc<A>, options: ActivityOptions) -> Self {
        Self {
            job_type,
            activity,
            options,
        }
    }

    /// Invoke the activity through `call`.
    ///
    /// # Errors
    ///
    /// Passes the activity's [`AttemptFailure`] through, or returns
    /// [`WorkflowError::ActivityTimedOut`].
    pub async fn execute<'a, T, F, Fut>(&'a self, call: F) -> Result<T, JobError>
    where
        F: FnOnce(&'a A) -> Fut,
        Fut: Future<Output = Result<T, AttemptFailure>> + 'a,
    {
        let timeout = self.options.schedule_to_close_timeout;
        match tokio::time::timeout(timeout, call(self.activity.as_ref())).await {
            Ok(result) => result.map_err(JobError::from),
            Err(_) => {
                tracing::error!(job_type = %self.job_type, ?timeout, "Activity timed out");
                Err(WorkflowError::ActivityTimedOut {
                    job_type: self.job_type,
                    timeout,
                }
                .into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl Echo {
        async fn run(&self, value: u32) -> Result<u32, AttemptFailure> {
            Ok(value)
        }

        async fn fail(&self) -> Result<u32, AttemptFailure> {
            Err(AttemptFailure::from_log_path("/ws/1/0/logs.log"))
        }

        async fn hang(&self) -> Result<u32, AttemptFailure> {
            std::future::pending().await
        }
    }

    fn stub(timeout: Duration) -> ActivityStub<Echo> {
        ActivityStub::new(
            JobType::GetSpec,
            Arc::new(Echo),
            ActivityOptions {
                schedule_to_close_timeout: timeout,
            },
        )
    }

    #[tokio::test]
    async fn passes_result_through() {
        let stub = stub(Duration::from_secs(1));
        assert_eq!(stub.execute(|echo| echo.run(7)).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn passes_attempt_failure_through() {
        let stub = stub(Duration::from_secs(1));
        let err = stub.execute(Echo::fail).await.unwrap_err();
        assert_eq!(
            err.as_attempt_failure().map(|f| f.log_path().to_path_buf()),
            Some("/ws/1/0/logs.log".into())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_hung_activity() {
        let stub = stub(Duration::from_secs(600));
        let err = stub.execute(Echo::hang).await.unwrap_err();
        assert!(matches!(
            err,
            JobError::Workflow(WorkflowError::ActivityTimedOut {
                job_type: JobType::GetSpec,
                ..
            })
        ));
    }

    #[test]
    fn options_use_kind_budget() {
        assert_eq!(
            ActivityOptions::for_job_type(JobType::Sync).schedule_to_close_timeout,
            Duration::from_secs(3 * 24 * 3600)
        );
    }
}
