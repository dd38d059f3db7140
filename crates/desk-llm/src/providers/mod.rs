//! Reference client implementations
//!
//! Two wire formats cover the providers this system talks to: the
//! Anthropic messages API and the OpenAI chat-completions API (which many
//! vendors expose compatibly). Providers that need an explicit
//! continuation turn after tool results are configured through
//! [`OpenAIConfig::with_tool_continuation`], not detected by type.

pub mod anthropic;
pub mod openai;

pub use anthropic::AnthropicClient;
pub use openai::{OpenAIClient, OpenAIConfig};
