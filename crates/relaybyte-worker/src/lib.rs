//! Attempt execution and job dispatch for relaybyte connectors.
//!
//! A job submitted through the [`JobDispatcher`] becomes one workflow
//! execution on a [`WorkflowEngine`]. The workflow calls its kind's activity,
//! and the activity runs a worker inside an [`AttemptExecution`], which gives
//! the attempt its own directory and logging context and reduces every
//! failure to an [`AttemptFailure`].

pub mod attempt;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod launcher;
pub mod logging;
pub mod normalization;
pub mod workers;
pub mod workflows;

// Re-export public API for convenience
pub use attempt::AttemptExecution;
pub use dispatcher::JobDispatcher;
pub use engine::{LocalWorkflowEngine, WorkflowEngine, WorkflowOutput};
pub use error::{AttemptFailure, JobError, WorkerError, WorkflowError};
