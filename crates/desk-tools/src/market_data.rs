//! Tool for fetching price history and technical signals

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use desk_core::{Error, Result};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::indicators::{self, MIN_SERIES_LEN};
use crate::sample;
use crate::tool::Tool;
use tracing::debug;

const TOOL_NAME: &str = "get_market_data";

/// Tool producing a price series and derived technical indicators
pub struct MarketDataTool;

#[derive(Debug, Deserialize)]
struct MarketDataParams {
    symbol: String,
    #[serde(default = "default_days")]
    days: usize,
    #[serde(default)]
    as_of: Option<NaiveDate>,
}

fn default_days() -> usize {
    60
}

impl MarketDataTool {
    /// Create a new market data tool
    pub fn new() -> Self {
        Self
    }

    fn fetch(&self, params: MarketDataParams) -> Result<Value> {
        let symbol = params.symbol.to_uppercase();
        let as_of = params.as_of.unwrap_or_else(|| Utc::now().date_naive());
        // Indicator math needs a minimum window regardless of what was asked
        let days = params.days.max(MIN_SERIES_LEN);

        debug!(symbol = %symbol, days, "generating market data sample");
        let series = sample::price_series(&symbol, as_of, days);
        let closes: Vec<f64> = series.iter().map(|p| p.close).collect();
        let highs: Vec<f64> = series.iter().map(|p| p.high).collect();
        let lows: Vec<f64> = series.iter().map(|p| p.low).collect();

        let summary = indicators::summarize(&closes).map_err(|e| Error::Tool {
            name: TOOL_NAME.to_string(),
            message: e.to_string(),
        })?;

        let first_close = closes.first().copied().unwrap_or(summary.latest_close);
        let change_pct = if first_close.abs() < f64::EPSILON {
            0.0
        } else {
            (summary.latest_close - first_close) / first_close * 100.0
        };

        let period_high = highs.iter().copied().fold(f64::MIN, f64::max);
        let period_low = lows.iter().copied().fold(f64::MAX, f64::min);

        let kdj = indicators::kdj(&highs, &lows, &closes).map(|kdj| {
            json!({
                "k": kdj.k,
                "d": kdj.d,
                "j": kdj.j,
                "signal": kdj.signal(),
            })
        });

        Ok(json!({
            "symbol": symbol,
            "as_of": as_of.to_string(),
            "period_days": days,
            "latest_close": summary.latest_close,
            "period_change_pct": change_pct,
            "period_high": period_high,
            "period_low": period_low,
            "indicators": {
                "sma_10": summary.sma_10,
                "ema_10": summary.ema_10,
                "rsi_14": summary.rsi_14,
                "macd": summary.macd,
                "macd_signal": summary.macd_signal,
                "macd_histogram": summary.macd_histogram,
                "signal": summary.signal(),
            },
            "kdj": kdj,
            "note": "Sample market data. Wire a live quote provider behind this tool for production use.",
        }))
    }
}

impl Default for MarketDataTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for MarketDataTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        let params: MarketDataParams =
            serde_json::from_value(params).map_err(|e| Error::Tool {
                name: TOOL_NAME.to_string(),
                message: format!("invalid parameters: {e}"),
            })?;

        self.fetch(params)
    }

    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Fetch recent daily price history for a ticker along with derived technical indicators (SMA, EMA, RSI, MACD, KDJ) and a momentum read."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "symbol": {
                    "type": "string",
                    "description": "Ticker symbol, e.g. AAPL"
                },
                "days": {
                    "type": "integer",
                    "description": "How many trading days of history to fetch (default 60)"
                },
                "as_of": {
                    "type": "string",
                    "description": "Series end date, YYYY-MM-DD (default today)"
                }
            },
            "required": ["symbol"]
        })
    }
}
