//! Tool for fetching retail investor sentiment from social platforms

use async_trait::async_trait;
use desk_core::{Error, Result};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::sample::{Lcg, seed};
use crate::tool::Tool;

const TOOL_NAME: &str = "get_social_sentiment";

const SUBREDDITS: [&str; 5] = ["stocks", "investing", "wallstreetbets", "economics", "finance"];

const POST_TEMPLATES: [(&str, &str); 6] = [
    ("{SYM} looking strong after earnings, anyone else loading up?", "bullish"),
    ("DD: why {SYM} is undervalued at current levels", "bullish"),
    ("Holding {SYM} long term, ignoring the noise", "bullish"),
    ("Is {SYM} overextended here? Thinking of trimming", "bearish"),
    ("{SYM} chart looks ugly, puts printing", "bearish"),
    ("What's everyone's take on {SYM} this week?", "neutral"),
];

/// Tool producing a social discussion feed with aggregate sentiment
pub struct SocialSentimentTool;

#[derive(Debug, Deserialize)]
struct SocialParams {
    symbol: String,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    15
}

impl SocialSentimentTool {
    /// Create a new social sentiment tool
    pub fn new() -> Self {
        Self
    }

    fn fetch(&self, params: SocialParams) -> Value {
        let symbol = params.symbol.to_uppercase();
        let mut rng = Lcg::new(seed(&symbol) ^ 0x7265_6464_6974);
        let limit = params.limit.clamp(1, 30);

        let mut posts = Vec::with_capacity(limit);
        let mut bullish = 0usize;
        let mut bearish = 0usize;
        let mut total_score = 0u64;
        let mut total_comments = 0u64;

        for _ in 0..limit {
            let (template, sentiment) =
                POST_TEMPLATES[(rng.next_u64() % POST_TEMPLATES.len() as u64) as usize];
            match sentiment {
                "bullish" => bullish += 1,
                "bearish" => bearish += 1,
                _ => {}
            }

            // Low-score posts are filtered out of the real feed, mirror that floor
            let score = 5 + rng.next_u64() % 2500;
            let num_comments = rng.next_u64() % 400;
            total_score += score;
            total_comments += num_comments;

            posts.push(json!({
                "title": template.replace("{SYM}", &symbol),
                "subreddit": rng.pick(&SUBREDDITS),
                "score": score,
                "num_comments": num_comments,
                "sentiment": sentiment,
            }));
        }

        let bullish_ratio = bullish as f64 / posts.len() as f64;
        let discussion_heat = if total_score + total_comments > 20_000 {
            "high"
        } else if total_score + total_comments > 5_000 {
            "moderate"
        } else {
            "low"
        };

        json!({
            "symbol": symbol,
            "post_count": posts.len(),
            "posts": posts,
            "bullish_count": bullish,
            "bearish_count": bearish,
            "neutral_count": posts.len() - bullish - bearish,
            "bullish_ratio": bullish_ratio,
            "discussion_heat": discussion_heat,
            "note": "Sample social feed. Wire a live social API behind this tool for production use.",
        })
    }
}

impl Default for SocialSentimentTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for SocialSentimentTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        let params: SocialParams = serde_json::from_value(params).map_err(|e| Error::Tool {
            name: TOOL_NAME.to_string(),
            message: format!("invalid parameters: {e}"),
        })?;

        Ok(self.fetch(params))
    }

    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Fetch recent retail investor discussion about a ticker from social platforms, with per-post and aggregate sentiment."
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
                    "description": "Maximum number of posts (default 15)"
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
    async fn test_execute_returns_posts_and_aggregates() {
        let tool = SocialSentimentTool::new();
        let result = tool.execute(json!({"symbol": "gme"})).await.unwrap();

        assert_eq!(result["symbol"], "GME");
        let count = result["post_count"].as_u64().unwrap() as usize;
        let posts = result["posts"].as_array().unwrap();
        assert_eq!(posts.len(), count);

        let bullish = result["bullish_count"].as_u64().unwrap() as usize;
        let bearish = result["bearish_count"].as_u64().unwrap() as usize;
        let neutral = result["neutral_count"].as_u64().unwrap() as usize;
        assert_eq!(bullish + bearish + neutral, count);
    }

    #[tokio::test]
    async fn test_scores_meet_noise_floor() {
        let tool = SocialSentimentTool::new();
        let result = tool.execute(json!({"symbol": "AAPL"})).await.unwrap();
        for post in result["posts"].as_array().unwrap() {
            assert!(post["score"].as_u64().unwrap() >= 5);
        }
    }

    #[tokio::test]
    async fn test_deterministic_per_symbol() {
        let tool = SocialSentimentTool::new();
        let a = tool.execute(json!({"symbol": "NVDA"})).await.unwrap();
        let b = tool.execute(json!({"symbol": "NVDA"})).await.unwrap();
        assert_eq!(a, b);
    }
}
