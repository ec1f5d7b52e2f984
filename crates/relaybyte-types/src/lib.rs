//! Shared relaybyte job, launcher, catalog, and connector message types.
//!
//! Everything in this crate is plain data: the orchestration core passes
//! these values through unchanged between the dispatcher, the workflow
//! engine, and the workers.

pub mod catalog;
pub mod config;
pub mod input;
pub mod job;
pub mod output;
pub mod protocol;
