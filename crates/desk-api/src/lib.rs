//! HTTP surface for desk-rs
//!
//! Thin transport over the job dispatcher and store: submission returns a
//! job id immediately, status and result are polled. All orchestration
//! lives below this layer.

pub mod routes;

pub use routes::{AppState, router, serve};
