//! Model client trait definition

use crate::{CompletionRequest, CompletionResponse, Result};
use async_trait::async_trait;

/// Trait for model inference clients
///
/// Implementations wrap a model service. The pipeline treats a completion
/// as opaque: it either carries tool-call requests or a terminal text
/// report, distinguished by the stop reason.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Generate a completion from the model
    ///
    /// # Arguments
    ///
    /// * `request` - The completion request with messages, tools, and parameters
    ///
    /// # Returns
    ///
    /// The completion response with the assistant's message and metadata
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Get the client name (e.g. "anthropic", "openai")
    fn name(&self) -> &str;

    /// Whether this provider needs an explicit follow-up turn after tool
    /// results are appended
    ///
    /// Some providers do not resume generation on their own once tool
    /// results land in the conversation; for those the analyst node runs a
    /// bounded internal continuation loop instead of yielding back to the
    /// pipeline. This is a capability of the configured provider, not a
    /// type distinction.
    fn requires_continuation_after_tool(&self) -> bool {
        false
    }
}
