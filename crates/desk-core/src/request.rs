//! Analysis request parameters and submission validation

use crate::role::AnalystRole;
use crate::{Error, Result};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

fn default_research_depth() -> u32 {
    1
}

fn default_include_risk() -> bool {
    true
}

/// Parameters of one analysis submission
///
/// Optional fields fall back to defaults at submission time: `analysts`
/// defaults to the full role set, `analysis_date` to the current date,
/// `include_risk_assessment` to true.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Ticker symbol under analysis (required, non-empty)
    pub symbol: String,

    /// Market the symbol trades in, e.g. "US" (required, non-empty)
    pub market: String,

    /// How many rounds of evidence gathering each analyst is budgeted for
    #[serde(default = "default_research_depth")]
    pub research_depth: u32,

    /// Named model provider to use instead of the default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_provider: Option<String>,

    /// Ordered analyst roles to run; None means the default set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysts: Option<Vec<AnalystRole>>,

    /// As-of date for the analysis; None means today
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_date: Option<NaiveDate>,

    /// Whether the derived decision carries a risk assessment section
    #[serde(default = "default_include_risk")]
    pub include_risk_assessment: bool,
}

impl AnalysisRequest {
    /// Create a request with required fields only, defaults for the rest
    pub fn new(symbol: impl Into<String>, market: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            market: market.into(),
            research_depth: default_research_depth(),
            llm_provider: None,
            analysts: None,
            analysis_date: None,
            include_risk_assessment: default_include_risk(),
        }
    }

    /// Set the research depth
    pub fn with_research_depth(mut self, depth: u32) -> Self {
        self.research_depth = depth;
        self
    }

    /// Set the analyst role list
    pub fn with_analysts(mut self, analysts: Vec<AnalystRole>) -> Self {
        self.analysts = Some(analysts);
        self
    }

    /// Set the model provider override
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.llm_provider = Some(provider.into());
        self
    }

    /// Set the as-of date
    pub fn with_analysis_date(mut self, date: NaiveDate) -> Self {
        self.analysis_date = Some(date);
        self
    }

    /// Validate required fields
    ///
    /// Must pass before any job record is created; a failure here means no
    /// state was mutated anywhere.
    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(Error::InvalidRequest("symbol is required".to_string()));
        }
        if self.market.trim().is_empty() {
            return Err(Error::InvalidRequest("market is required".to_string()));
        }
        if self.research_depth < 1 {
            return Err(Error::InvalidRequest(
                "research_depth must be at least 1".to_string(),
            ));
        }
        if let Some(analysts) = &self.analysts {
            if analysts.is_empty() {
                return Err(Error::InvalidRequest(
                    "analysts must not be empty when given".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Ordered roles this request runs
    pub fn roles(&self) -> Vec<AnalystRole> {
        self.analysts
            .clone()
            .unwrap_or_else(AnalystRole::default_set)
    }

    /// As-of date, defaulting to today
    pub fn date_or_today(&self) -> NaiveDate {
        self.analysis_date
            .unwrap_or_else(|| Utc::now().date_naive())
    }
}
