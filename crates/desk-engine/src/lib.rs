//! Analysis engine for desk-rs
//!
//! This crate implements the per-role tool-calling decision loop
//! ([`AnalystNode`]), the sequencing of analyst roles over shared report
//! state ([`AnalysisPipeline`]), deterministic decision derivation, and the
//! flattening of the pipeline's composite result into the consumer-facing
//! shape ([`aggregate::aggregate`]).

pub mod aggregate;
pub mod config;
pub mod decision;
pub mod node;
pub mod pipeline;
pub mod prompts;

pub use config::{NodeConfig, PipelineConfig};
pub use node::{AnalystNode, Turn};
pub use pipeline::AnalysisPipeline;
pub use prompts::PromptContext;
