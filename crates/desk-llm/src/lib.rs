//! Model client abstraction layer for desk-rs
//!
//! This crate provides provider-agnostic abstractions for the model calls
//! the analysis pipeline makes. It includes:
//!
//! - Message types for conversation state (text, tool calls, tool results)
//! - Completion request/response types
//! - Tool definitions for function calling
//! - The [`ModelClient`] trait, including the capability flag that tells
//!   the engine whether a provider needs an explicit continuation turn
//!   after tool results are appended
//! - Reference client implementations (OpenAI-compatible, Anthropic)

pub mod client;
pub mod completion;
pub mod error;
pub mod messages;
pub mod providers;
pub mod tools;

// Re-export main types
pub use client::ModelClient;
pub use completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};
pub use error::{ModelError, Result};
pub use messages::{ContentBlock, Message, MessageContent, Role};
pub use tools::ToolDefinition;
