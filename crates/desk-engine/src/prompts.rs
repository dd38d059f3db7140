//! Per-role prompt framings
//!
//! Each analyst turn is framed one of two ways: before any tool output
//! exists the model is told it must fetch data first; once a tool result
//! is in the conversation it is told to analyze what was fetched. The
//! framing is recomputed every turn from the conversation itself.

use chrono::NaiveDate;
use desk_core::AnalystRole;

/// Subject context shared by every prompt in one job
#[derive(Debug, Clone)]
pub struct PromptContext {
    /// Ticker under analysis
    pub symbol: String,
    /// Market the ticker trades in
    pub market: String,
    /// As-of date for the analysis
    pub as_of: NaiveDate,
}

/// Which framing the turn uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// No tool output yet: the model must call a tool before answering
    GatherFirst,
    /// Tool output exists: write the report from it
    Analyze,
}

fn role_charter(role: AnalystRole) -> &'static str {
    match role {
        AnalystRole::Market => {
            "You are a market analyst specializing in price action and technical signals.\n\
             Your expertise includes trend identification, momentum indicators (RSI, MACD, KDJ),\n\
             moving averages, and support/resistance analysis."
        }
        AnalystRole::Fundamentals => {
            "You are a fundamental analyst specializing in company financials.\n\
             Your expertise includes valuation multiples, earnings quality, revenue growth,\n\
             balance-sheet strength, and cash flow analysis."
        }
        AnalystRole::News => {
            "You are a news analyst specializing in stock market events.\n\
             Your expertise includes event impact evaluation, sentiment assessment,\n\
             and separating material news from noise."
        }
        AnalystRole::Social => {
            "You are a social sentiment analyst covering retail investor discussion.\n\
             Your expertise includes gauging sentiment polarity, discussion heat,\n\
             and spotting crowd behavior that can move a stock."
        }
    }
}

fn analyze_instructions(role: AnalystRole) -> &'static str {
    match role {
        AnalystRole::Market => {
            "Write a detailed technical report covering:\n\
             1. Current trend direction and strength\n\
             2. What RSI, MACD and KDJ are signaling\n\
             3. Price relative to its moving averages\n\
             4. A clear trading stance (BUY, SELL or HOLD) with reasoning"
        }
        AnalystRole::Fundamentals => {
            "Write a detailed fundamental report covering:\n\
             1. Valuation versus growth (P/E against revenue growth)\n\
             2. Profitability and margin quality\n\
             3. Leverage and cash generation\n\
             4. A clear stance (BUY, SELL or HOLD) with reasoning"
        }
        AnalystRole::News => {
            "Write a detailed news report covering:\n\
             1. The key events and their materiality\n\
             2. Overall news sentiment and its trend\n\
             3. Likely price impact of the coverage\n\
             4. A clear stance (BUY, SELL or HOLD) with reasoning"
        }
        AnalystRole::Social => {
            "Write a detailed sentiment report covering:\n\
             1. Sentiment polarity: bullish versus bearish discussion\n\
             2. Discussion heat and how it is trending\n\
             3. Topics retail investors care about most\n\
             4. A clear stance (BUY, SELL or HOLD) with reasoning"
        }
    }
}

/// Build the system prompt for one analyst turn
pub fn system_prompt(
    role: AnalystRole,
    framing: Framing,
    ctx: &PromptContext,
    tool_names: &[String],
) -> String {
    let charter = role_charter(role);
    let subject = format!(
        "The subject is {} ({} market), as of {}.",
        ctx.symbol, ctx.market, ctx.as_of
    );

    match framing {
        Framing::GatherFirst => format!(
            "{charter}\n\n\
             {subject}\n\n\
             You MUST call a tool to fetch real data before answering.\n\
             Do not fabricate numbers; base everything on tool output.\n\
             Do not describe what you plan to do - call the tool now.\n\
             Available tools: {}.",
            tool_names.join(", ")
        ),
        Framing::Analyze => format!(
            "{charter}\n\n\
             {subject}\n\n\
             The data has been fetched successfully. Base your report on the\n\
             tool results above and cite specific figures from them.\n\n\
             {}",
            analyze_instructions(role)
        ),
    }
}

/// Build the user message that opens a role's conversation
pub fn initial_message(role: AnalystRole, ctx: &PromptContext) -> String {
    format!(
        "Produce the {} analysis for {} ({} market) as of {}.",
        role, ctx.symbol, ctx.market, ctx.as_of
    )
}

/// Placeholder report recorded when a role cannot complete
pub fn degraded_report(role: AnalystRole, reason: &str) -> String {
    format!(
        "The {role} analysis is temporarily unavailable ({reason}). \
         Treat this section as missing when weighing the overall decision."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> PromptContext {
        PromptContext {
            symbol: "AAPL".to_string(),
            market: "US".to_string(),
            as_of: NaiveDate::from_ymd_opt(2026, 8, 6).unwrap(),
        }
    }

    #[test]
    fn test_gather_framing_forbids_answering_without_tools() {
        let prompt = system_prompt(
            AnalystRole::Social,
            Framing::GatherFirst,
            &ctx(),
            &["get_social_sentiment".to_string()],
        );
        assert!(prompt.contains("MUST call a tool"));
        assert!(prompt.contains("get_social_sentiment"));
        assert!(prompt.contains("AAPL"));
    }

    #[test]
    fn test_analyze_framing_references_fetched_data() {
        let prompt = system_prompt(AnalystRole::Market, Framing::Analyze, &ctx(), &[]);
        assert!(prompt.contains("fetched successfully"));
        assert!(prompt.contains("BUY, SELL or HOLD"));
        assert!(!prompt.contains("MUST call a tool"));
    }

    #[test]
    fn test_initial_message_names_role_and_date() {
        let msg = initial_message(AnalystRole::News, &ctx());
        assert!(msg.contains("news"));
        assert!(msg.contains("2026-08-06"));
    }

    #[test]
    fn test_degraded_report_mentions_role() {
        let report = degraded_report(AnalystRole::Fundamentals, "inference unavailable");
        assert!(report.contains("fundamentals"));
        assert!(report.contains("inference unavailable"));
    }
}
