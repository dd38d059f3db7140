//! Analyst roles - the named stages of the analysis pipeline

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named analyst stage in the pipeline
///
/// Each role produces one report section keyed by [`AnalystRole::report_key`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalystRole {
    /// Price action and technical signals
    Market,
    /// Company financials and valuation
    Fundamentals,
    /// News flow and event impact
    News,
    /// Retail investor sentiment from social platforms
    Social,
}

impl AnalystRole {
    /// All roles in canonical pipeline order
    pub const ALL: [AnalystRole; 4] = [
        AnalystRole::Market,
        AnalystRole::Fundamentals,
        AnalystRole::News,
        AnalystRole::Social,
    ];

    /// Default role set used when a submission does not name one
    pub fn default_set() -> Vec<AnalystRole> {
        Self::ALL.to_vec()
    }

    /// Role name as used in submissions and prompts
    pub fn as_str(self) -> &'static str {
        match self {
            AnalystRole::Market => "market",
            AnalystRole::Fundamentals => "fundamentals",
            AnalystRole::News => "news",
            AnalystRole::Social => "social",
        }
    }

    /// Key under which this role's report appears in the aggregated result
    pub fn report_key(self) -> &'static str {
        match self {
            AnalystRole::Market => "market_report",
            AnalystRole::Fundamentals => "fundamentals_report",
            AnalystRole::News => "news_report",
            AnalystRole::Social => "sentiment_report",
        }
    }
}

impl fmt::Display for AnalystRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalystRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "market" => Ok(AnalystRole::Market),
            "fundamentals" => Ok(AnalystRole::Fundamentals),
            "news" => Ok(AnalystRole::News),
            "social" => Ok(AnalystRole::Social),
            other => Err(Error::InvalidRequest(format!(
                "unknown analyst role: {other}"
            ))),
        }
    }
}
