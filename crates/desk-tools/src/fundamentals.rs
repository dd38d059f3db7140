//! Tool for fetching company fundamentals

use async_trait::async_trait;
use desk_core::{Error, Result};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::sample::{Lcg, seed};
use crate::tool::Tool;

const TOOL_NAME: &str = "get_fundamentals";

/// Tool producing valuation and balance-sheet metrics
pub struct FundamentalsTool;

#[derive(Debug, Deserialize)]
struct FundamentalsParams {
    symbol: String,
}

impl FundamentalsTool {
    /// Create a new fundamentals tool
    pub fn new() -> Self {
        Self
    }

    fn fetch(&self, params: FundamentalsParams) -> Value {
        let symbol = params.symbol.to_uppercase();
        let mut rng = Lcg::new(seed(&symbol) ^ 0x66_756e_6461);

        let pe_ratio = rng.next_range(8.0, 45.0);
        let forward_pe = pe_ratio * rng.next_range(0.8, 1.1);
        let eps = rng.next_range(0.5, 12.0);
        let revenue_growth_pct = rng.next_range(-10.0, 35.0);
        let gross_margin_pct = rng.next_range(20.0, 65.0);
        let debt_to_equity = rng.next_range(0.1, 2.5);
        let free_cash_flow_m = rng.next_range(-500.0, 8000.0);
        let dividend_yield_pct = if rng.next_unit() < 0.4 {
            rng.next_range(0.5, 4.0)
        } else {
            0.0
        };

        let valuation = if pe_ratio < 15.0 && revenue_growth_pct > 5.0 {
            "potentially undervalued"
        } else if pe_ratio > 35.0 && revenue_growth_pct < 10.0 {
            "richly valued"
        } else {
            "fairly valued"
        };

        let balance_sheet = if debt_to_equity > 1.8 {
            "highly leveraged"
        } else if debt_to_equity < 0.5 {
            "conservative"
        } else {
            "moderate leverage"
        };

        json!({
            "symbol": symbol,
            "metrics": {
                "pe_ratio": pe_ratio,
                "forward_pe": forward_pe,
                "eps": eps,
                "revenue_growth_pct": revenue_growth_pct,
                "gross_margin_pct": gross_margin_pct,
                "debt_to_equity": debt_to_equity,
                "free_cash_flow_m": free_cash_flow_m,
                "dividend_yield_pct": dividend_yield_pct,
            },
            "valuation_read": valuation,
            "balance_sheet_read": balance_sheet,
            "note": "Sample fundamentals. Wire a live filings provider behind this tool for production use.",
        })
    }
}

impl Default for FundamentalsTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for FundamentalsTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        let params: FundamentalsParams =
            serde_json::from_value(params).map_err(|e| Error::Tool {
                name: TOOL_NAME.to_string(),
                message: format!("invalid parameters: {e}"),
            })?;

        Ok(self.fetch(params))
    }

    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Fetch valuation and balance-sheet metrics for a company (P/E, EPS, revenue growth, leverage, cash flow) with a valuation read."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "symbol": {
                    "type": "string",
                    "description": "Ticker symbol, e.g. AAPL"
                }
            },
            "required": ["symbol"]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_execute_returns_metrics() {
        let tool = FundamentalsTool::new();
        let result = tool.execute(json!({"symbol": "aapl"})).await.unwrap();

        assert_eq!(result["symbol"], "AAPL");
        let metrics = &result["metrics"];
        assert!(metrics["pe_ratio"].as_f64().unwrap() >= 8.0);
        assert!(metrics["gross_margin_pct"].as_f64().unwrap() <= 65.0);
        assert!(result["valuation_read"].is_string());
    }

    #[tokio::test]
    async fn test_deterministic_per_symbol() {
        let tool = FundamentalsTool::new();
        let a = tool.execute(json!({"symbol": "AMZN"})).await.unwrap();
        let b = tool.execute(json!({"symbol": "AMZN"})).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_invalid_params_rejected() {
        let tool = FundamentalsTool::new();
        let result = tool.execute(json!({"ticker": "AAPL"})).await;
        assert!(matches!(result, Err(Error::Tool { .. })));
    }
}
