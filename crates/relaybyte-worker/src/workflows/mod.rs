//! Per-kind workflow and activity pairs.
//!
//! Each workflow is a thin coordinator that calls its activity through an
//! [`ActivityStub`](crate::engine::ActivityStub) with the kind's
//! schedule-to-close timeout. Each activity builds its launchers and worker
//! and runs the worker inside an
//! [`AttemptExecution`](crate::attempt::AttemptExecution).

pub mod check;
pub mod discover;
pub mod spec;
pub mod sync;

pub use check::{CheckConnectionActivity, CheckConnectionActivityImpl, CheckConnectionWorkflow};
pub use discover::{DiscoverCatalogActivity, DiscoverCatalogActivityImpl, DiscoverCatalogWorkflow};
pub use spec::{SpecActivity, SpecActivityImpl, SpecWorkflow};
pub use sync::{SyncActivity, SyncActivityImpl, SyncWorkflow};
