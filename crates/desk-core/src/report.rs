//! Accumulated reports, the derived decision, and the pipeline outcome

use crate::role::AnalystRole;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Report sections produced by completed analyst roles
///
/// Built incrementally as each role finishes; each role writes its section
/// at most once per run. Read-only once the pipeline returns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccumulatedReport {
    sections: BTreeMap<AnalystRole, String>,
}

impl AccumulatedReport {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a role's report section
    ///
    /// Returns false (and leaves the existing section untouched) if the
    /// role already wrote one; double writes are a caller bug.
    pub fn insert(&mut self, role: AnalystRole, text: impl Into<String>) -> bool {
        if self.sections.contains_key(&role) {
            debug_assert!(false, "report section for {role} written twice");
            return false;
        }
        self.sections.insert(role, text.into());
        true
    }

    /// Get a role's report section
    pub fn get(&self, role: AnalystRole) -> Option<&str> {
        self.sections.get(&role).map(String::as_str)
    }

    /// Whether the role has produced its section
    pub fn contains(&self, role: AnalystRole) -> bool {
        self.sections.contains_key(&role)
    }

    /// Iterate sections in role order
    pub fn iter(&self) -> impl Iterator<Item = (AnalystRole, &str)> {
        self.sections.iter().map(|(role, text)| (*role, text.as_str()))
    }

    /// Number of completed sections
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Whether no role has reported yet
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Target action derived from the analyst reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
}

impl TradeAction {
    /// Action name as it appears in reports and results
    pub fn as_str(self) -> &'static str {
        match self {
            TradeAction::Buy => "BUY",
            TradeAction::Sell => "SELL",
            TradeAction::Hold => "HOLD",
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decision object computed once all configured roles have completed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    /// Target action
    pub action: TradeAction,

    /// Share of report signals agreeing with the action, 0.0-1.0
    pub confidence: f64,

    /// One-line summary of how the action was reached
    pub rationale: String,

    /// Risk assessment text; present iff the request asked for one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_assessment: Option<String>,
}

/// Composite result of one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutcome {
    /// Whether the run produced a usable decision
    pub success: bool,

    /// Derived decision; None when the run failed before derivation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<Decision>,

    /// Report sections by role
    pub reports: AccumulatedReport,

    /// Failure description when success is false
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PipelineOutcome {
    /// Successful outcome with a decision and reports
    pub fn success(decision: Decision, reports: AccumulatedReport) -> Self {
        Self {
            success: true,
            decision: Some(decision),
            reports,
            error: None,
        }
    }

    /// Failed outcome, keeping whatever reports were produced before the failure
    pub fn failure(error: impl Into<String>, reports: AccumulatedReport) -> Self {
        Self {
            success: false,
            decision: None,
            reports,
            error: Some(error.into()),
        }
    }
}
