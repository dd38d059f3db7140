//! Job orchestration for desk-rs
//!
//! This crate owns the lifecycle of analysis jobs: the [`JobRecord`] and
//! its one-directional state machine, the concurrent [`JobStore`]
//! registry, and the [`JobDispatcher`] that validates a submission,
//! creates the record, and runs the analysis pipeline on its own task
//! while the caller gets the job id back immediately.

pub mod dispatcher;
pub mod record;
pub mod store;

pub use dispatcher::JobDispatcher;
pub use record::{JobId, JobRecord, JobStatus, StatusSummary};
pub use store::JobStore;
