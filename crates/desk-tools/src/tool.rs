//! Tool trait definition

use async_trait::async_trait;
use desk_core::Result;
use serde_json::Value;

/// Trait for data tools analysts can invoke
///
/// Tools are external data-retrieval capabilities a model can call during
/// an analyst turn. Each tool provides a name, description, and JSON
/// schema for its input.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Execute the tool with given parameters
    ///
    /// # Arguments
    ///
    /// * `params` - Tool input as JSON value (should match input_schema)
    ///
    /// # Returns
    ///
    /// Tool output as JSON value
    async fn execute(&self, params: Value) -> Result<Value>;

    /// Get the tool's name
    ///
    /// Must be unique within a ToolRegistry
    fn name(&self) -> &str;

    /// Get the tool's description
    ///
    /// This description tells the model when to use the tool
    fn description(&self) -> &str;

    /// Get the tool's input schema (JSON Schema format)
    fn input_schema(&self) -> Value;
}
