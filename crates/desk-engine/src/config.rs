//! Configuration for analyst nodes and the pipeline

use desk_core::{AnalysisRequest, AnalystRole};

/// Configuration for one analyst node's model calls
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Model to use
    pub model: String,

    /// Max tokens per completion
    pub max_tokens: usize,

    /// Temperature
    pub temperature: Option<f32>,

    /// Maximum tool-call rounds inside the node's internal continuation
    /// loop. Guarantees termination when the provider keeps requesting
    /// tools; exceeding it yields a degraded report, not a hang.
    pub max_tool_rounds: usize,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            max_tokens: 4096,
            temperature: Some(0.7),
            max_tool_rounds: 5,
        }
    }
}

/// Configuration for one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Ordered analyst roles to execute
    pub roles: Vec<AnalystRole>,

    /// Node configuration shared by every role
    pub node: NodeConfig,

    /// Maximum times the pipeline re-enters one role's node before the
    /// run is declared failed. Derived from research depth.
    pub max_role_rounds: usize,

    /// Whether the derived decision carries a risk assessment
    pub include_risk_assessment: bool,
}

impl PipelineConfig {
    /// Build a pipeline configuration for one submission
    ///
    /// The per-role round budget scales with research depth: two rounds
    /// per depth unit, never fewer than two (one fetch turn plus one
    /// analyze turn).
    pub fn for_request(request: &AnalysisRequest, node: NodeConfig) -> Self {
        Self {
            roles: request.roles(),
            node,
            max_role_rounds: (request.research_depth as usize * 2).max(2),
            include_risk_assessment: request.include_risk_assessment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_defaults() {
        let config = NodeConfig::default();
        assert_eq!(config.max_tool_rounds, 5);
        assert_eq!(config.max_tokens, 4096);
    }

    #[test]
    fn test_round_budget_scales_with_depth() {
        let request = AnalysisRequest::new("AAPL", "US").with_research_depth(3);
        let config = PipelineConfig::for_request(&request, NodeConfig::default());
        assert_eq!(config.max_role_rounds, 6);
        assert_eq!(config.roles, AnalystRole::default_set());
    }

    #[test]
    fn test_round_budget_floor() {
        let request = AnalysisRequest::new("AAPL", "US").with_research_depth(1);
        let config = PipelineConfig::for_request(&request, NodeConfig::default());
        assert_eq!(config.max_role_rounds, 2);
    }
}
