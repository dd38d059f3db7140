//! Analysis pipeline - sequences analyst roles over shared report state
//!
//! Roles run strictly one at a time. Each role gets a fresh conversation;
//! only the accumulated report carries across roles. A role that keeps
//! requesting tools is re-entered up to the per-role round budget, after
//! which the run is a deterministic failure rather than a hang.

use std::sync::Arc;

use desk_core::{AccumulatedReport, AnalysisRequest, AnalystRole, PipelineOutcome};
use desk_llm::{Message, ModelClient};
use desk_tools::ToolRegistry;
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::decision;
use crate::node::{AnalystNode, Turn};
use crate::prompts::{self, PromptContext};

/// Tools each role is allowed to call
pub fn role_tool_names(role: AnalystRole) -> &'static [&'static str] {
    match role {
        AnalystRole::Market => &["get_market_data"],
        AnalystRole::Fundamentals => &["get_fundamentals"],
        AnalystRole::News => &["get_company_news"],
        AnalystRole::Social => &["get_social_sentiment", "get_company_news"],
    }
}

/// Sequences analyst nodes against shared conversation/report state
pub struct AnalysisPipeline {
    client: Arc<dyn ModelClient>,
    registry: Arc<ToolRegistry>,
    config: PipelineConfig,
}

impl AnalysisPipeline {
    /// Create a pipeline
    pub fn new(
        client: Arc<dyn ModelClient>,
        registry: Arc<ToolRegistry>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            client,
            registry,
            config,
        }
    }

    /// Run every configured role and derive the final decision
    ///
    /// Failures of individual model or tool calls degrade the affected
    /// role's report and the run continues. The run itself fails only when
    /// a role exhausts its round budget or every role degraded (no usable
    /// signal remains).
    pub async fn run(&self, request: &AnalysisRequest) -> PipelineOutcome {
        let ctx = PromptContext {
            symbol: request.symbol.to_uppercase(),
            market: request.market.clone(),
            as_of: request.date_or_today(),
        };

        let mut reports = AccumulatedReport::new();
        let mut degraded_roles = 0usize;

        for &role in &self.config.roles {
            let tools = self.registry.resolve(role_tool_names(role));
            let node = AnalystNode::new(
                role,
                Arc::clone(&self.client),
                tools,
                self.config.node.clone(),
            );

            let mut conversation = vec![Message::user(prompts::initial_message(role, &ctx))];
            let mut completed = false;

            for round in 0..self.config.max_role_rounds {
                match node.turn(&mut conversation, &ctx).await {
                    Turn::Completed { report, degraded } => {
                        info!(role = %role, round, degraded, "role completed");
                        if degraded {
                            degraded_roles += 1;
                        }
                        reports.insert(role, report);
                        completed = true;
                        break;
                    }
                    Turn::NeedsMoreWork => {
                        info!(role = %role, round, "role needs another turn");
                    }
                }
            }

            if !completed {
                warn!(role = %role, budget = self.config.max_role_rounds, "role round budget exhausted");
                return PipelineOutcome::failure(
                    format!(
                        "role '{role}' exceeded its round budget of {} without a terminal report",
                        self.config.max_role_rounds
                    ),
                    reports,
                );
            }
        }

        // Node-local recovery keeps single-stage failures contained, but a
        // run where every stage degraded has no signal left to decide on
        if !self.config.roles.is_empty() && degraded_roles == self.config.roles.len() {
            return PipelineOutcome::failure(
                format!("all {degraded_roles} analyst stages degraded: model inference unavailable"),
                reports,
            );
        }

        let decision = decision::derive(&reports, self.config.include_risk_assessment);
        info!(action = %decision.action, confidence = decision.confidence, "pipeline decision derived");
        PipelineOutcome::success(decision, reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NodeConfig;
    use async_trait::async_trait;
    use desk_core::TradeAction;
    use desk_llm::{
        CompletionRequest, CompletionResponse, ContentBlock, MessageContent, ModelError, Role,
        StopReason, TokenUsage,
    };
    use serde_json::json;

    /// Client that returns terminal text for every call
    struct TerminalClient {
        text: &'static str,
    }

    #[async_trait]
    impl ModelClient for TerminalClient {
        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> desk_llm::Result<CompletionResponse> {
            Ok(CompletionResponse {
                message: Message::assistant(self.text),
                stop_reason: StopReason::EndTurn,
                usage: TokenUsage {
                    input_tokens: 1,
                    output_tokens: 1,
                },
            })
        }

        fn name(&self) -> &str {
            "terminal"
        }
    }

    /// Client that requests a tool on every call and never terminates
    struct ToolLoopClient;

    #[async_trait]
    impl ModelClient for ToolLoopClient {
        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> desk_llm::Result<CompletionResponse> {
            Ok(CompletionResponse {
                message: Message {
                    role: Role::Assistant,
                    content: Some(MessageContent::Blocks(vec![ContentBlock::ToolUse {
                        id: "call_1".to_string(),
                        name: "get_market_data".to_string(),
                        input: json!({"symbol": "AAPL"}),
                    }])),
                },
                stop_reason: StopReason::ToolUse,
                usage: TokenUsage {
                    input_tokens: 1,
                    output_tokens: 1,
                },
            })
        }

        fn name(&self) -> &str {
            "tool-loop"
        }
    }

    /// Client whose every call fails
    struct DownClient;

    #[async_trait]
    impl ModelClient for DownClient {
        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> desk_llm::Result<CompletionResponse> {
            Err(ModelError::RequestFailed("inference down".to_string()))
        }

        fn name(&self) -> &str {
            "down"
        }
    }

    fn pipeline(client: Arc<dyn ModelClient>, request: &AnalysisRequest) -> AnalysisPipeline {
        AnalysisPipeline::new(
            client,
            Arc::new(desk_tools::default_registry()),
            PipelineConfig::for_request(request, NodeConfig::default()),
        )
    }

    #[tokio::test]
    async fn test_all_roles_report_and_decision_derived() {
        let request = AnalysisRequest::new("AAPL", "US").with_research_depth(2);
        let outcome = pipeline(Arc::new(TerminalClient { text: "BUY" }), &request)
            .run(&request)
            .await;

        assert!(outcome.success);
        assert!(outcome.error.is_none());
        for role in AnalystRole::default_set() {
            assert_eq!(outcome.reports.get(role), Some("BUY"));
        }
        let decision = outcome.decision.unwrap();
        assert_eq!(decision.action, TradeAction::Buy);
        assert!((decision.confidence - 1.0).abs() < f64::EPSILON);
        assert!(decision.risk_assessment.is_some());
    }

    #[tokio::test]
    async fn test_roles_run_in_requested_order_only() {
        let request = AnalysisRequest::new("AAPL", "US")
            .with_analysts(vec![AnalystRole::News, AnalystRole::Market]);
        let outcome = pipeline(Arc::new(TerminalClient { text: "HOLD" }), &request)
            .run(&request)
            .await;

        assert!(outcome.success);
        assert_eq!(outcome.reports.len(), 2);
        assert!(outcome.reports.contains(AnalystRole::News));
        assert!(outcome.reports.contains(AnalystRole::Market));
        assert!(!outcome.reports.contains(AnalystRole::Social));
    }

    #[tokio::test]
    async fn test_round_budget_exhaustion_fails_run() {
        let request = AnalysisRequest::new("AAPL", "US").with_research_depth(1);
        let outcome = pipeline(Arc::new(ToolLoopClient), &request).run(&request).await;

        assert!(!outcome.success);
        let error = outcome.error.unwrap();
        assert!(error.contains("round budget"));
        assert!(error.contains("market"));
        // Nothing after the stuck role ran
        assert!(outcome.reports.is_empty());
    }

    #[tokio::test]
    async fn test_all_stages_degraded_fails_run() {
        let request = AnalysisRequest::new("AAPL", "US");
        let outcome = pipeline(Arc::new(DownClient), &request).run(&request).await;

        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("degraded"));
        // Every role still recorded its placeholder
        assert_eq!(outcome.reports.len(), AnalystRole::default_set().len());
    }

    /// Client that fails its first call, then produces terminal text
    struct FlakyClient {
        failed_once: std::sync::atomic::AtomicBool,
    }

    #[async_trait]
    impl ModelClient for FlakyClient {
        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> desk_llm::Result<CompletionResponse> {
            if !self
                .failed_once
                .swap(true, std::sync::atomic::Ordering::SeqCst)
            {
                return Err(ModelError::RequestFailed("transient".to_string()));
            }
            Ok(CompletionResponse {
                message: Message::assistant("HOLD"),
                stop_reason: StopReason::EndTurn,
                usage: TokenUsage {
                    input_tokens: 1,
                    output_tokens: 1,
                },
            })
        }

        fn name(&self) -> &str {
            "flaky"
        }
    }

    #[tokio::test]
    async fn test_single_degraded_stage_keeps_run_on_success_path() {
        let request = AnalysisRequest::new("AAPL", "US");
        let client = Arc::new(FlakyClient {
            failed_once: std::sync::atomic::AtomicBool::new(false),
        });
        let outcome = pipeline(client, &request).run(&request).await;

        assert!(outcome.success);
        assert!(outcome.decision.is_some());
        // The first role carries its placeholder, the rest report normally
        let market = outcome.reports.get(AnalystRole::Market).unwrap();
        assert!(market.contains("temporarily unavailable"));
        assert_eq!(outcome.reports.get(AnalystRole::News), Some("HOLD"));
    }

    #[tokio::test]
    async fn test_risk_assessment_respects_flag() {
        let mut request = AnalysisRequest::new("AAPL", "US");
        request.include_risk_assessment = false;
        let outcome = pipeline(Arc::new(TerminalClient { text: "SELL" }), &request)
            .run(&request)
            .await;

        assert!(outcome.decision.unwrap().risk_assessment.is_none());
    }

    #[test]
    fn test_every_role_has_tools() {
        let registry = desk_tools::default_registry();
        for role in AnalystRole::default_set() {
            assert!(
                !registry.resolve(role_tool_names(role)).is_empty(),
                "role {role} has no tools"
            );
        }
    }
}
