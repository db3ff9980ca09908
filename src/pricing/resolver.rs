use super::table::{PricingTable, normalize_name};
use super::types::PricingEntry;

const REGION_PREFIXES: [&str; 3] = ["us.", "eu.", "apac."];
const PROVIDER_PREFIX: &str = "anthropic.";

/// A resolver hit: the raw feed key that matched and its rates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolved<'a> {
    pub key: &'a str,
    pub entry: &'a PricingEntry,
}

impl PricingTable {
    /// Resolve a free-form model name against the table, first hit wins:
    ///
    /// 1. exact key
    /// 2. `gpt-5-codex` alias to `gpt-5`
    /// 3. region prefix (`us.`, `eu.`, `apac.`) stripped
    /// 4. `anthropic.` provider prefix stripped as well
    /// 5. normalized-name index
    /// 6. substring match on normalized names, longest key wins
    ///
    /// `None` means no pricing is known for the model.
    pub fn resolve(&self, model: &str) -> Option<Resolved<'_>> {
        if model.is_empty() {
            return None;
        }

        if let Some(hit) = self.exact(model) {
            return Some(hit);
        }

        if model == "gpt-5-codex"
            && let Some(hit) = self.exact("gpt-5")
        {
            return Some(hit);
        }

        let without_region = strip_region_prefix(model);
        if let Some(hit) = self.exact(without_region) {
            return Some(hit);
        }

        let without_provider = without_region
            .strip_prefix(PROVIDER_PREFIX)
            .unwrap_or(without_region);
        if let Some(hit) = self.exact(without_provider) {
            return Some(hit);
        }

        let target = normalize_name(model);
        if let Some(key) = self.normalized.get(&target) {
            return self.exact(key);
        }

        self.partial(&target)
    }

    fn exact(&self, key: &str) -> Option<Resolved<'_>> {
        self.entries
            .get_key_value(key)
            .map(|(key, entry)| Resolved { key, entry })
    }

    fn partial(&self, target: &str) -> Option<Resolved<'_>> {
        if target.is_empty() {
            return None;
        }
        let mut candidates: Vec<(&String, &String)> = self
            .normalized
            .iter()
            .filter(|(norm, _)| {
                !norm.is_empty() && (norm.contains(target) || target.contains(norm.as_str()))
            })
            .collect();
        candidates.sort_by(|(a_norm, a_key), (b_norm, b_key)| {
            b_norm.len().cmp(&a_norm.len()).then_with(|| a_key.cmp(b_key))
        });

        let (_, key) = candidates.first()?;
        self.exact(key)
    }
}

/// Case-insensitive strip of a cloud region prefix
fn strip_region_prefix(name: &str) -> &str {
    for prefix in REGION_PREFIXES {
        if name.len() >= prefix.len()
            && name.is_char_boundary(prefix.len())
            && name[..prefix.len()].eq_ignore_ascii_case(prefix)
        {
            return &name[prefix.len()..];
        }
    }
    name
}
