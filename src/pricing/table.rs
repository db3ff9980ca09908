use std::collections::{BTreeMap, HashMap};

use crate::error::PricingError;

use super::types::{LongContextPricing, PricingEntry};

/// Immutable snapshot of the pricing feed plus its lookup indexes.
///
/// Built once per refresh and replaced wholesale; nothing mutates a table
/// after construction.
#[derive(Debug, Clone, Default)]
pub struct PricingTable {
    pub(super) entries: HashMap<String, PricingEntry>,
    /// normalized name -> raw key (first key in feed order wins)
    pub(super) normalized: HashMap<String, String>,
    pub(super) long_contexts: BTreeMap<String, LongContextPricing>,
    pub(super) ephemeral_1h: HashMap<String, f64>,
}

impl PricingTable {
    /// Parse a LiteLLM-style JSON object (`{"model": {...rates}}`).
    pub fn from_bytes(data: &[u8]) -> Result<Self, PricingError> {
        let raw: serde_json::Map<String, serde_json::Value> =
            serde_json::from_slice(data).map_err(PricingError::Parse)?;
        Ok(Self::from_raw(raw))
    }

    /// Keys are visited in sorted order, so collisions in the normalized
    /// index resolve the same way on every build.
    pub fn from_raw(raw: serde_json::Map<String, serde_json::Value>) -> Self {
        let mut entries = HashMap::with_capacity(raw.len());
        let mut normalized = HashMap::with_capacity(raw.len());

        for (key, value) in raw {
            if key == SCHEMA_KEY || !value.is_object() {
                continue;
            }
            let mut entry = PricingEntry::from_value(&value);
            entry.fill_cache_defaults();

            normalized.entry(normalize_name(&key)).or_insert_with(|| key.clone());
            entries.insert(key, entry);
        }

        Self {
            entries,
            normalized,
            long_contexts: builtin_long_context_pricing(),
            ephemeral_1h: builtin_ephemeral_1h_pricing(),
        }
    }

    /// Replace the long-context tier table
    pub fn with_long_contexts(
        mut self,
        tiers: impl IntoIterator<Item = (String, LongContextPricing)>,
    ) -> Self {
        self.long_contexts = tiers.into_iter().collect();
        self
    }

    pub fn get(&self, key: &str) -> Option<&PricingEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Long-context tier for `model`: exact match first, else the first
    /// configured tier.
    pub(super) fn long_context_tier(&self, model: &str) -> Option<LongContextPricing> {
        self.long_contexts
            .get(model)
            .or_else(|| self.long_contexts.values().next())
            .copied()
    }

    /// 1-hour ephemeral cache rate: exact table hit, else model family, else zero
    pub(super) fn ephemeral_1h_rate(&self, model: &str) -> f64 {
        if let Some(rate) = self.ephemeral_1h.get(model) {
            return *rate;
        }
        let name = model.to_lowercase();
        if name.contains("opus") {
            OPUS_1H_RATE
        } else if name.contains("sonnet") {
            SONNET_1H_RATE
        } else if name.contains("haiku") {
            HAIKU_1H_RATE
        } else {
            0.0
        }
    }
}

/// Field documentation object at the top of the LiteLLM feed
const SCHEMA_KEY: &str = "sample_spec";

const OPUS_1H_RATE: f64 = 0.00003; // $30/M
const SONNET_1H_RATE: f64 = 0.000006; // $6/M
const HAIKU_1H_RATE: f64 = 0.0000016; // $1.6/M

/// Lower-case and drop `- _ . : /` and spaces
pub(crate) fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '-' | '_' | '.' | ':' | '/' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

fn builtin_ephemeral_1h_pricing() -> HashMap<String, f64> {
    const OPUS: &[&str] = &[
        "claude-opus-4-1",
        "claude-opus-4-1-20250805",
        "claude-opus-4",
        "claude-opus-4-20250514",
        "claude-opus-4-5-20251101",
        "claude-3-opus",
        "claude-3-opus-latest",
        "claude-3-opus-20240229",
    ];
    const SONNET: &[&str] = &[
        "claude-3-5-sonnet",
        "claude-3-5-sonnet-latest",
        "claude-3-5-sonnet-20241022",
        "claude-3-5-sonnet-20240620",
        "claude-3-sonnet",
        "claude-3-sonnet-20240307",
        "claude-sonnet-3",
        "claude-sonnet-3-5",
        "claude-sonnet-3-7",
        "claude-sonnet-4",
        "claude-sonnet-4-20250514",
    ];
    const HAIKU: &[&str] = &[
        "claude-3-5-haiku",
        "claude-3-5-haiku-latest",
        "claude-3-5-haiku-20241022",
        "claude-3-haiku",
        "claude-3-haiku-20240307",
        "claude-haiku-3",
        "claude-haiku-3-5",
    ];

    let mut rates = HashMap::new();
    for (models, rate) in [(OPUS, OPUS_1H_RATE), (SONNET, SONNET_1H_RATE), (HAIKU, HAIKU_1H_RATE)] {
        for model in models {
            rates.insert((*model).to_string(), rate);
        }
    }
    rates
}

fn builtin_long_context_pricing() -> BTreeMap<String, LongContextPricing> {
    BTreeMap::from([(
        "claude-sonnet-4-20250514[1m]".to_string(),
        LongContextPricing {
            input: 0.000006,   // $6/M
            output: 0.0000225, // $22.50/M
        },
    )])
}
