//! Data tool framework for desk-rs
//!
//! This crate defines the tool contract analysts call during their turns
//! and ships the reference data tools: market data with technical
//! indicators, company news, social sentiment, and fundamentals. The
//! reference tools generate deterministic sample data so the pipeline runs
//! end-to-end without network access; swap them for live fetchers behind
//! the same [`Tool`] trait.

pub mod fundamentals;
pub mod indicators;
pub mod market_data;
pub mod news;
pub mod registry;
pub mod sample;
pub mod social;
pub mod tool;

pub use fundamentals::FundamentalsTool;
pub use market_data::MarketDataTool;
pub use news::CompanyNewsTool;
pub use registry::ToolRegistry;
pub use social::SocialSentimentTool;
pub use tool::Tool;

use std::sync::Arc;

/// Build a registry holding all reference tools
pub fn default_registry() -> ToolRegistry {
    let registry = ToolRegistry::new();
    registry.register(Arc::new(MarketDataTool::new()));
    registry.register(Arc::new(FundamentalsTool::new()));
    registry.register(Arc::new(CompanyNewsTool::new()));
    registry.register(Arc::new(SocialSentimentTool::new()));
    registry
}
