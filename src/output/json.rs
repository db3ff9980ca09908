use model_pricing::pricing::Resolved;
use model_pricing::{CostBreakdown, UsageSnapshot};

pub(crate) fn cost_json(model: &str, usage: &UsageSnapshot, cost: &CostBreakdown) -> String {
    let output = serde_json::json!({
        "model": model,
        "usage": usage,
        "cost": cost,
    });
    serde_json::to_string_pretty(&output).unwrap_or_default()
}

pub(crate) fn resolve_json(model: &str, resolved: Option<Resolved<'_>>) -> String {
    let output = match resolved {
        Some(hit) => serde_json::json!({
            "model": model,
            "found": true,
            "key": hit.key,
            "pricing": hit.entry,
        }),
        None => serde_json::json!({
            "model": model,
            "found": false,
        }),
    };
    serde_json::to_string_pretty(&output).unwrap_or_default()
}
