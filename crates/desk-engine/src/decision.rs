//! Deterministic decision derivation from analyst reports
//!
//! Each completed report casts one vote based on the signals it contains;
//! the target action is the majority vote and confidence is its share.
//! Keyword scoring keeps the derivation reproducible and auditable.

use desk_core::{AccumulatedReport, Decision, TradeAction};

const BULLISH_MARKERS: [&str; 8] = [
    "BUY",
    "bullish",
    "strong upward",
    "undervalued",
    "positive",
    "beats",
    "oversold",
    "accumulate",
];

const BEARISH_MARKERS: [&str; 8] = [
    "SELL",
    "bearish",
    "strong downward",
    "richly valued",
    "negative",
    "below consensus",
    "overbought",
    "trim",
];

fn count_markers(text: &str, markers: &[&str]) -> usize {
    let lowered = text.to_lowercase();
    markers
        .iter()
        .map(|marker| lowered.matches(&marker.to_lowercase()).count())
        .sum()
}

fn report_vote(text: &str) -> TradeAction {
    let bullish = count_markers(text, &BULLISH_MARKERS);
    let bearish = count_markers(text, &BEARISH_MARKERS);
    if bullish > bearish {
        TradeAction::Buy
    } else if bearish > bullish {
        TradeAction::Sell
    } else {
        TradeAction::Hold
    }
}

/// Derive the decision object from the accumulated reports
pub fn derive(reports: &AccumulatedReport, include_risk_assessment: bool) -> Decision {
    let mut buy = 0usize;
    let mut sell = 0usize;
    let mut hold = 0usize;

    for (_, text) in reports.iter() {
        match report_vote(text) {
            TradeAction::Buy => buy += 1,
            TradeAction::Sell => sell += 1,
            TradeAction::Hold => hold += 1,
        }
    }

    let total = reports.len().max(1);
    let (action, winning) = if buy > sell && buy > hold {
        (TradeAction::Buy, buy)
    } else if sell > buy && sell > hold {
        (TradeAction::Sell, sell)
    } else {
        (TradeAction::Hold, hold.max(buy.max(sell)))
    };

    let confidence = winning as f64 / total as f64;
    let rationale = format!(
        "{buy} bullish, {sell} bearish, {hold} neutral across {total} analyst reports"
    );

    let risk_assessment = include_risk_assessment.then(|| {
        let minority = total - winning;
        if minority == 0 {
            format!(
                "All {total} analysts agree on {action}; residual risk is limited to \
                 factors outside the analyzed data."
            )
        } else {
            format!(
                "{minority} of {total} analysts disagree with {action}; size any position \
                 to survive the minority case being right."
            )
        }
    });

    Decision {
        action,
        confidence,
        rationale,
        risk_assessment,
    }
}
