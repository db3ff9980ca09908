use serde::Serialize;

/// Per-model rates as published in the LiteLLM feed (USD per single token)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PricingEntry {
    pub input_cost_per_token: f64,
    pub output_cost_per_token: f64,
    pub cache_creation_input_token_cost: f64,
    pub cache_creation_input_token_cost_above_1hr: f64,
    pub cache_creation_input_token_cost_above_200k_tokens: f64,
    pub cache_read_input_token_cost: f64,
    pub input_cost_per_token_above_128k_tokens: f64,
    pub input_cost_per_token_above_200k_tokens: f64,
    pub output_cost_per_token_above_200k_tokens: f64,
}

impl PricingEntry {
    pub(super) fn from_value(value: &serde_json::Value) -> Self {
        let rate = |field: &str| value.get(field).and_then(|v| v.as_f64()).unwrap_or(0.0);
        Self {
            input_cost_per_token: rate("input_cost_per_token"),
            output_cost_per_token: rate("output_cost_per_token"),
            cache_creation_input_token_cost: rate("cache_creation_input_token_cost"),
            cache_creation_input_token_cost_above_1hr: rate(
                "cache_creation_input_token_cost_above_1hr",
            ),
            cache_creation_input_token_cost_above_200k_tokens: rate(
                "cache_creation_input_token_cost_above_200k_tokens",
            ),
            cache_read_input_token_cost: rate("cache_read_input_token_cost"),
            input_cost_per_token_above_128k_tokens: rate("input_cost_per_token_above_128k_tokens"),
            input_cost_per_token_above_200k_tokens: rate("input_cost_per_token_above_200k_tokens"),
            output_cost_per_token_above_200k_tokens: rate(
                "output_cost_per_token_above_200k_tokens",
            ),
        }
    }

    /// Derive missing cache rates from the base input rate (1.25x create, 0.1x read)
    pub(super) fn fill_cache_defaults(&mut self) {
        if self.input_cost_per_token <= 0.0 {
            return;
        }
        if self.cache_creation_input_token_cost == 0.0 {
            self.cache_creation_input_token_cost = self.input_cost_per_token * 1.25;
        }
        if self.cache_read_input_token_cost == 0.0 {
            self.cache_read_input_token_cost = self.input_cost_per_token * 0.1;
        }
    }
}

/// Input/output rates for the 1M-context tier
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LongContextPricing {
    pub input: f64,
    pub output: f64,
}
