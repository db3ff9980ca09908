use serde::{Deserialize, Serialize};

use crate::consts::{LONG_CONTEXT_MARKER, LONG_CONTEXT_THRESHOLD};

use super::table::PricingTable;
use super::types::PricingEntry;

/// Token usage of a single request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageSnapshot {
    pub input_tokens: i64,
    pub output_tokens: i64,
    /// Aggregate cache-creation tokens (5m + 1h)
    pub cache_create_tokens: i64,
    pub cache_read_tokens: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_creation: Option<CacheCreationDetail>,
}

impl UsageSnapshot {
    pub fn total_input_tokens(&self) -> i64 {
        self.input_tokens
            .saturating_add(self.cache_create_tokens)
            .saturating_add(self.cache_read_tokens)
    }

    /// (5-minute, 1-hour) cache-creation tokens. Tokens not covered by an
    /// explicit split count as 5-minute.
    pub fn cache_creation_split(&self) -> (i64, i64) {
        let Some(detail) = self.cache_creation else {
            return (self.cache_create_tokens.max(0), 0);
        };
        let mut five = detail.ephemeral_5m_tokens;
        let one = detail.ephemeral_1h_tokens;
        let remaining = self
            .cache_create_tokens
            .saturating_sub(five)
            .saturating_sub(one);
        if remaining > 0 {
            five = five.saturating_add(remaining);
        }
        (five.max(0), one.max(0))
    }
}

/// Split of cache-creation tokens by ephemeral TTL
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheCreationDetail {
    pub ephemeral_5m_tokens: i64,
    pub ephemeral_1h_tokens: i64,
}

/// Itemized USD cost of one request
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub input_cost: f64,
    pub output_cost: f64,
    pub cache_create_cost: f64,
    pub cache_read_cost: f64,
    pub ephemeral_5m_cost: f64,
    pub ephemeral_1h_cost: f64,
    pub total_cost: f64,
    pub has_pricing: bool,
    pub is_long_context: bool,
}

/// Price `usage` for `model` against `table`. Never fails and does no I/O;
/// unknown models come back as a zero breakdown with `has_pricing == false`.
pub fn calculate_cost(table: &PricingTable, model: &str, usage: &UsageSnapshot) -> CostBreakdown {
    if model.is_empty() {
        return CostBreakdown::default();
    }

    let resolved = table.resolve(model);
    let long_context_model = model.to_lowercase().contains(LONG_CONTEXT_MARKER);
    let mut breakdown = CostBreakdown {
        has_pricing: resolved.is_some(),
        ..Default::default()
    };
    if resolved.is_none() && !long_context_model {
        return breakdown;
    }

    let fallback = PricingEntry::default();
    let entry = resolved.map_or(&fallback, |hit| hit.entry);

    let long_tier = if long_context_model && usage.total_input_tokens() > LONG_CONTEXT_THRESHOLD {
        table.long_context_tier(model)
    } else {
        None
    };
    match long_tier {
        Some(tier) => {
            breakdown.is_long_context = true;
            breakdown.input_cost = usage.input_tokens as f64 * tier.input;
            breakdown.output_cost = usage.output_tokens as f64 * tier.output;
        }
        None => {
            breakdown.input_cost = usage.input_tokens as f64 * entry.input_cost_per_token;
            breakdown.output_cost = usage.output_tokens as f64 * entry.output_cost_per_token;
        }
    }

    let (cache_5m_tokens, cache_1h_tokens) = usage.cache_creation_split();
    breakdown.ephemeral_5m_cost = cache_5m_tokens as f64 * entry.cache_creation_input_token_cost;
    breakdown.ephemeral_1h_cost = cache_1h_tokens as f64 * table.ephemeral_1h_rate(model);
    breakdown.cache_create_cost = breakdown.ephemeral_5m_cost + breakdown.ephemeral_1h_cost;
    breakdown.cache_read_cost = usage.cache_read_tokens as f64 * entry.cache_read_input_token_cost;

    breakdown.total_cost = breakdown.input_cost
        + breakdown.output_cost
        + breakdown.cache_create_cost
        + breakdown.cache_read_cost;
    if breakdown.total_cost > 0.0 {
        breakdown.has_pricing = true;
    }
    breakdown
}
