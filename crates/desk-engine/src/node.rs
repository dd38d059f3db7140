//! Analyst node - the per-role tool-calling decision loop
//!
//! One node drives one analyst role's conversation until a terminal report
//! exists. Each turn: frame the conversation, call the model, then either
//! execute requested tools or record the terminal text. Failures below
//! this boundary are absorbed into a degraded report; nothing here aborts
//! the job.

use std::sync::Arc;

use desk_llm::messages::conversation_has_tool_output;
use desk_llm::{CompletionRequest, ContentBlock, Message, ModelClient, ToolDefinition};
use desk_tools::Tool;
use tracing::{debug, info, warn};

use crate::config::NodeConfig;
use crate::prompts::{self, Framing, PromptContext};
use desk_core::AnalystRole;

/// Result of one analyst turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Turn {
    /// The role produced its terminal report
    Completed {
        /// Report text for this role
        report: String,
        /// True when the report is a placeholder substituted after a failure
        degraded: bool,
    },

    /// Tool calls were executed and their results appended; the pipeline
    /// should re-enter this node for another turn
    NeedsMoreWork,
}

/// One pipeline stage driving a single analyst role
pub struct AnalystNode {
    role: AnalystRole,
    client: Arc<dyn ModelClient>,
    tools: Vec<Arc<dyn Tool>>,
    config: NodeConfig,
}

impl AnalystNode {
    /// Create a node for one role
    pub fn new(
        role: AnalystRole,
        client: Arc<dyn ModelClient>,
        tools: Vec<Arc<dyn Tool>>,
        config: NodeConfig,
    ) -> Self {
        Self {
            role,
            client,
            tools,
            config,
        }
    }

    /// The role this node drives
    pub fn role(&self) -> AnalystRole {
        self.role
    }

    /// Run one turn of the decision loop over the conversation
    ///
    /// Appends to the conversation, never removes from it. Providers that
    /// need an explicit continuation after tool results are handled with a
    /// bounded internal loop; others yield back to the pipeline after tool
    /// execution.
    pub async fn turn(&self, conversation: &mut Vec<Message>, ctx: &PromptContext) -> Turn {
        let framing = if conversation_has_tool_output(conversation) {
            Framing::Analyze
        } else {
            Framing::GatherFirst
        };
        debug!(role = %self.role, ?framing, "analyst turn started");

        let response = match self.complete(conversation, framing, ctx).await {
            Ok(response) => response,
            Err(e) => {
                warn!(role = %self.role, error = %e, "inference failed, degrading role report");
                return self.degrade(conversation, "model inference failed");
            }
        };

        conversation.push(response.clone());

        if !response.has_tool_uses() {
            let report = response.text().unwrap_or_default().to_string();
            info!(role = %self.role, length = report.len(), "terminal report produced");
            return Turn::Completed {
                report,
                degraded: false,
            };
        }

        if self.client.requires_continuation_after_tool() {
            return self.continuation_loop(conversation, ctx).await;
        }

        // Execute the requested tools, then hand control back to the
        // pipeline for the next turn
        let results = self.execute_tool_calls(&response).await;
        conversation.extend(results);
        Turn::NeedsMoreWork
    }

    /// Bounded sub-loop for providers that do not resume after tool results
    ///
    /// Executes tools and re-invokes the model until terminal text appears
    /// or the round cap is hit; the cap converts a runaway loop into a
    /// degraded report.
    async fn continuation_loop(
        &self,
        conversation: &mut Vec<Message>,
        ctx: &PromptContext,
    ) -> Turn {
        for round in 0..self.config.max_tool_rounds {
            let last = conversation
                .last()
                .cloned()
                .unwrap_or_else(|| Message::assistant(""));
            let results = self.execute_tool_calls(&last).await;
            conversation.extend(results);

            debug!(role = %self.role, round, "continuation round");
            let response = match self.complete(conversation, Framing::Analyze, ctx).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(role = %self.role, error = %e, "continuation inference failed");
                    return self.degrade(conversation, "model inference failed");
                }
            };
            conversation.push(response.clone());

            if !response.has_tool_uses() {
                let report = response.text().unwrap_or_default().to_string();
                info!(role = %self.role, round, "continuation produced terminal report");
                return Turn::Completed {
                    report,
                    degraded: false,
                };
            }
        }

        warn!(
            role = %self.role,
            cap = self.config.max_tool_rounds,
            "tool round cap exceeded, degrading role report"
        );
        self.degrade(conversation, "tool round cap exceeded")
    }

    /// Call the model with the framed conversation and this role's tools
    async fn complete(
        &self,
        conversation: &[Message],
        framing: Framing,
        ctx: &PromptContext,
    ) -> desk_llm::Result<Message> {
        let tool_names: Vec<String> = self.tools.iter().map(|t| t.name().to_string()).collect();
        let system = prompts::system_prompt(self.role, framing, ctx, &tool_names);

        let mut builder = CompletionRequest::builder(&self.config.model)
            .messages(conversation.to_vec())
            .system(system)
            .max_tokens(self.config.max_tokens);
        if let Some(temperature) = self.config.temperature {
            builder = builder.temperature(temperature);
        }
        let tools = self.tool_definitions();
        if !tools.is_empty() {
            builder = builder.tools(tools);
        }

        let response = self.client.complete(builder.build()).await?;
        Ok(response.message)
    }

    /// Build tool definitions for this role's bound tools
    fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|tool| ToolDefinition::new(tool.name(), tool.description(), tool.input_schema()))
            .collect()
    }

    /// Execute every tool call in an assistant message
    ///
    /// An unknown tool name or a failed invocation becomes a failure
    /// result in the conversation, never a crash.
    async fn execute_tool_calls(&self, message: &Message) -> Vec<Message> {
        let mut results = Vec::new();

        for tool_use in message.tool_uses() {
            if let ContentBlock::ToolUse { id, name, input } = tool_use {
                let Some(tool) = self.tools.iter().find(|t| t.name() == name) else {
                    warn!(role = %self.role, tool = %name, "unknown tool requested");
                    results.push(Message::tool_error(
                        id.clone(),
                        format!("unknown tool: {name}"),
                    ));
                    continue;
                };

                info!(role = %self.role, tool = %name, "executing tool");
                match tool.execute(input.clone()).await {
                    Ok(result) => {
                        let result_str = serde_json::to_string(&result)
                            .unwrap_or_else(|_| result.to_string());
                        debug!(role = %self.role, tool = %name, length = result_str.len(), "tool succeeded");
                        results.push(Message::tool_result(id.clone(), result_str));
                    }
                    Err(e) => {
                        warn!(role = %self.role, tool = %name, error = %e, "tool failed");
                        results.push(Message::tool_error(id.clone(), format!("Error: {e}")));
                    }
                }
            }
        }

        results
    }

    /// Record a degraded placeholder report for this role
    fn degrade(&self, conversation: &mut Vec<Message>, reason: &str) -> Turn {
        let report = prompts::degraded_report(self.role, reason);
        conversation.push(Message::assistant(report.clone()));
        Turn::Completed {
            report,
            degraded: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use desk_llm::{
        CompletionResponse, MessageContent, ModelError, Role, StopReason, TokenUsage,
    };
    use serde_json::{Value, json};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ctx() -> PromptContext {
        PromptContext {
            symbol: "AAPL".to_string(),
            market: "US".to_string(),
            as_of: chrono::NaiveDate::from_ymd_opt(2026, 8, 6).unwrap(),
        }
    }

    fn text_response(text: &str) -> CompletionResponse {
        CompletionResponse {
            message: Message::assistant(text),
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage {
                input_tokens: 1,
                output_tokens: 1,
            },
        }
    }

    fn tool_call_response(tool: &str, id: &str) -> CompletionResponse {
        CompletionResponse {
            message: Message {
                role: Role::Assistant,
                content: Some(MessageContent::Blocks(vec![ContentBlock::ToolUse {
                    id: id.to_string(),
                    name: tool.to_string(),
                    input: json!({"symbol": "AAPL"}),
                }])),
            },
            stop_reason: StopReason::ToolUse,
            usage: TokenUsage {
                input_tokens: 1,
                output_tokens: 1,
            },
        }
    }

    /// Client that replays a fixed script of responses
    struct ScriptClient {
        responses: Mutex<Vec<CompletionResponse>>,
        continuation: bool,
        calls: AtomicUsize,
    }

    impl ScriptClient {
        fn new(responses: Vec<CompletionResponse>, continuation: bool) -> Self {
            Self {
                responses: Mutex::new(responses),
                continuation,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ModelClient for ScriptClient {
        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> desk_llm::Result<CompletionResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut responses = self.responses.lock().expect("script lock");
            if responses.is_empty() {
                return Err(ModelError::RequestFailed("script exhausted".to_string()));
            }
            Ok(responses.remove(0))
        }

        fn name(&self) -> &str {
            "script"
        }

        fn requires_continuation_after_tool(&self) -> bool {
            self.continuation
        }
    }

    /// Client that fails every call
    struct FailingClient;

    #[async_trait]
    impl ModelClient for FailingClient {
        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> desk_llm::Result<CompletionResponse> {
            Err(ModelError::RequestFailed("inference down".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    struct StaticTool {
        name: &'static str,
        fail: bool,
    }

    #[async_trait]
    impl Tool for StaticTool {
        async fn execute(&self, _params: Value) -> desk_core::Result<Value> {
            if self.fail {
                Err(desk_core::Error::Tool {
                    name: self.name.to_string(),
                    message: "upstream unavailable".to_string(),
                })
            } else {
                Ok(json!({"data": "ok"}))
            }
        }

        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "static test tool"
        }

        fn input_schema(&self) -> Value {
            json!({"type": "object", "properties": {}})
        }
    }

    fn node(client: Arc<dyn ModelClient>, tools: Vec<Arc<dyn Tool>>) -> AnalystNode {
        AnalystNode::new(AnalystRole::Market, client, tools, NodeConfig::default())
    }

    #[tokio::test]
    async fn test_terminal_text_completes_immediately() {
        let client = Arc::new(ScriptClient::new(vec![text_response("BUY - trend intact")], false));
        let node = node(client, vec![]);
        let mut conversation = vec![Message::user("analyze")];

        let turn = node.turn(&mut conversation, &ctx()).await;
        assert_eq!(
            turn,
            Turn::Completed {
                report: "BUY - trend intact".to_string(),
                degraded: false,
            }
        );
        // user message + assistant report
        assert_eq!(conversation.len(), 2);
    }

    #[tokio::test]
    async fn test_tool_call_yields_back_to_pipeline() {
        let client = Arc::new(ScriptClient::new(
            vec![tool_call_response("mkt", "call_1")],
            false,
        ));
        let tools: Vec<Arc<dyn Tool>> = vec![Arc::new(StaticTool {
            name: "mkt",
            fail: false,
        })];
        let node = node(client, tools);
        let mut conversation = vec![Message::user("analyze")];

        let turn = node.turn(&mut conversation, &ctx()).await;
        assert_eq!(turn, Turn::NeedsMoreWork);
        // user + assistant tool call + tool result
        assert_eq!(conversation.len(), 3);
        assert!(conversation_has_tool_output(&conversation));
    }

    #[tokio::test]
    async fn test_unknown_tool_becomes_failure_result() {
        let client = Arc::new(ScriptClient::new(
            vec![tool_call_response("nonexistent", "call_1")],
            false,
        ));
        let node = node(client, vec![]);
        let mut conversation = vec![Message::user("analyze")];

        let turn = node.turn(&mut conversation, &ctx()).await;
        assert_eq!(turn, Turn::NeedsMoreWork);
        // failure results do not count as completed tool output
        assert!(!conversation_has_tool_output(&conversation));
    }

    #[tokio::test]
    async fn test_failed_tool_becomes_failure_result() {
        let client = Arc::new(ScriptClient::new(
            vec![tool_call_response("mkt", "call_1"), text_response("HOLD")],
            false,
        ));
        let tools: Vec<Arc<dyn Tool>> = vec![Arc::new(StaticTool {
            name: "mkt",
            fail: true,
        })];
        let node = node(client, tools);
        let mut conversation = vec![Message::user("analyze")];

        assert_eq!(node.turn(&mut conversation, &ctx()).await, Turn::NeedsMoreWork);
        let turn = node.turn(&mut conversation, &ctx()).await;
        assert!(matches!(turn, Turn::Completed { degraded: false, .. }));
    }

    #[tokio::test]
    async fn test_inference_failure_degrades_report() {
        let node = node(Arc::new(FailingClient), vec![]);
        let mut conversation = vec![Message::user("analyze")];

        let turn = node.turn(&mut conversation, &ctx()).await;
        match turn {
            Turn::Completed { report, degraded } => {
                assert!(degraded);
                assert!(report.contains("market"));
            }
            Turn::NeedsMoreWork => panic!("expected degraded completion"),
        }
    }

    #[tokio::test]
    async fn test_continuation_loop_terminates_at_cap() {
        // A continuation-style provider that never stops requesting tools
        let script: Vec<CompletionResponse> = (0..20)
            .map(|i| tool_call_response("mkt", &format!("call_{i}")))
            .collect();
        let client = Arc::new(ScriptClient::new(script, true));
        let calls = Arc::clone(&client);
        let tools: Vec<Arc<dyn Tool>> = vec![Arc::new(StaticTool {
            name: "mkt",
            fail: false,
        })];
        let node = node(client, tools);
        let mut conversation = vec![Message::user("analyze")];

        let turn = node.turn(&mut conversation, &ctx()).await;
        match turn {
            Turn::Completed { degraded, .. } => assert!(degraded),
            Turn::NeedsMoreWork => panic!("continuation loop must not yield"),
        }
        // initial call + one per continuation round, bounded by the cap
        assert_eq!(
            calls.calls.load(Ordering::SeqCst),
            1 + NodeConfig::default().max_tool_rounds
        );
    }

    #[tokio::test]
    async fn test_continuation_loop_stops_on_terminal_text() {
        let client = Arc::new(ScriptClient::new(
            vec![
                tool_call_response("mkt", "call_1"),
                text_response("SELL - momentum rolling over"),
            ],
            true,
        ));
        let tools: Vec<Arc<dyn Tool>> = vec![Arc::new(StaticTool {
            name: "mkt",
            fail: false,
        })];
        let node = node(client, tools);
        let mut conversation = vec![Message::user("analyze")];

        let turn = node.turn(&mut conversation, &ctx()).await;
        assert_eq!(
            turn,
            Turn::Completed {
                report: "SELL - momentum rolling over".to_string(),
                degraded: false,
            }
        );
    }
}
