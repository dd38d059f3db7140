//! Error taxonomy for desk-rs
//!
//! One enum covers the failure classes that cross crate boundaries.
//! Failures below the analyst-node boundary (a single tool call, a single
//! inference call) are normally absorbed into degraded output and never
//! surface here; these variants exist for the cases that must propagate.

use thiserror::Error;

/// Result type alias for desk-rs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can cross component boundaries
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or incomplete submission - rejected before a job record exists
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Unknown job id on a status or result query
    #[error("job not found: {0}")]
    NotFound(String),

    /// Requested job status change is not permitted by the state machine
    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// Model inference call failed
    #[error("inference failed: {0}")]
    Inference(String),

    /// An individual tool invocation failed
    #[error("tool '{name}' failed: {message}")]
    Tool { name: String, message: String },

    /// Uncaught error during pipeline execution - terminates the job as failed
    #[error("pipeline failed: {0}")]
    Pipeline(String),
}
