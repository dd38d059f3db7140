//! Shared utilities for desk-rs
//!
//! This crate provides common functionality used across the desk-rs
//! workspace, currently logging setup.

pub mod logging;

pub use logging::init_tracing;
