//! Result aggregation - flatten the pipeline outcome for consumers
//!
//! Consumers want one flat mapping, not the pipeline's nested shape. The
//! decision fields and the per-role report fields are merged at the top
//! level; on a name collision the decision field wins. Pure function, no
//! failure modes.

use desk_core::PipelineOutcome;
use serde_json::{Map, Value, json};

/// Flatten a pipeline outcome into the consumer-facing result map
pub fn aggregate(outcome: &PipelineOutcome) -> Value {
    let mut map = Map::new();

    // Report fields first so decision fields win any collision
    for (role, text) in outcome.reports.iter() {
        map.insert(role.report_key().to_string(), json!(text));
    }

    if let Some(decision) = &outcome.decision {
        map.insert("action".to_string(), json!(decision.action));
        map.insert("confidence".to_string(), json!(decision.confidence));
        map.insert("rationale".to_string(), json!(decision.rationale));
        if let Some(risk) = &decision.risk_assessment {
            map.insert("risk_assessment".to_string(), json!(risk));
        }
    }

    map.insert("success".to_string(), json!(outcome.success));
    if let Some(error) = &outcome.error {
        map.insert("error".to_string(), json!(error));
    }

    Value::Object(map)
}
