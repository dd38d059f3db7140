//! Tool for fetching company news and sentiment

use async_trait::async_trait;
use chrono::{Days, Utc};
use desk_core::{Error, Result};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::sample::{Lcg, seed};
use crate::tool::Tool;
use tracing::debug;

const TOOL_NAME: &str = "get_company_news";

const HEADLINE_TEMPLATES: [(&str, &str, f64); 8] = [
    ("{SYM} beats quarterly revenue estimates", "positive", 0.6),
    ("{SYM} announces expanded share buyback program", "positive", 0.5),
    ("Analysts raise price targets on {SYM}", "positive", 0.4),
    ("{SYM} unveils next-generation product line", "positive", 0.3),
    ("{SYM} faces regulatory scrutiny over market practices", "negative", -0.5),
    ("Supply chain pressure weighs on {SYM} margins", "negative", -0.4),
    ("{SYM} guidance comes in below consensus", "negative", -0.6),
    ("{SYM} trading flat ahead of earnings", "neutral", 0.0),
];

const SOURCES: [&str; 4] = ["Market Wire", "Financial Times", "Global Finance Daily", "The Street Journal"];

/// Tool producing recent company news with per-article sentiment
pub struct CompanyNewsTool;

#[derive(Debug, Deserialize)]
struct NewsParams {
    symbol: String,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    10
}

impl CompanyNewsTool {
    /// Create a new company news tool
    pub fn new() -> Self {
        Self
    }

    fn fetch(&self, params: NewsParams) -> Value {
        let symbol = params.symbol.to_uppercase();
        let mut rng = Lcg::new(seed(&symbol) ^ 0x6e65_7773);
        let today = Utc::now().date_naive();
        let limit = params.limit.clamp(1, HEADLINE_TEMPLATES.len());
        debug!(symbol = %symbol, limit, "generating news sample");

        let mut start = (rng.next_u64() % HEADLINE_TEMPLATES.len() as u64) as usize;
        let mut articles = Vec::with_capacity(limit);
        for i in 0..limit {
            let (template, sentiment, score) = HEADLINE_TEMPLATES[start];
            start = (start + 1) % HEADLINE_TEMPLATES.len();

            let published = today
                .checked_sub_days(Days::new(i as u64))
                .unwrap_or(today);
            articles.push(json!({
                "title": template.replace("{SYM}", &symbol),
                "source": rng.pick(&SOURCES),
                "published_at": published.to_string(),
                "summary": format!("Coverage of recent developments around {symbol}."),
                "sentiment": sentiment,
                "sentiment_score": score,
            }));
        }

        let positive = articles
            .iter()
            .filter(|a| a["sentiment"] == "positive")
            .count();
        let negative = articles
            .iter()
            .filter(|a| a["sentiment"] == "negative")
            .count();

        let overall_sentiment = if positive > negative {
            "positive"
        } else if negative > positive {
            "negative"
        } else {
            "neutral"
        };

        json!({
            "symbol": symbol,
            "news_count": articles.len(),
            "articles": articles,
            "overall_sentiment": overall_sentiment,
            "sentiment_breakdown": {
                "positive": positive,
                "negative": negative,
                "neutral": articles.len() - positive - negative,
            },
            "note": "Sample news feed. Wire a live news API behind this tool for production use.",
        })
    }
}

impl Default for CompanyNewsTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for CompanyNewsTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        let params: NewsParams = serde_json::from_value(params).map_err(|e| Error::Tool {
            name: TOOL_NAME.to_string(),
            message: format!("invalid parameters: {e}"),
        })?;

        Ok(self.fetch(params))
    }

    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Fetch recent news articles about a company with per-article sentiment and an overall sentiment breakdown."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "symbol": {
                    "type": "string",
                    "description": "Ticker symbol, e.g. AAPL"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of articles (default 10)"
                }
            },
            "required": ["symbol"]
        })
    }
}
