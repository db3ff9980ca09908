use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::consts::CACHE_FILE_NAME;
use crate::error::PricingError;

/// On-disk envelope: `{"timestamp": <unix secs>, "data": <raw feed>}`
#[derive(Serialize, Deserialize)]
struct CacheEnvelope<'a> {
    timestamp: i64,
    #[serde(borrow)]
    data: &'a RawValue,
}

/// Raw feed bytes read back from the cache, with the time they were fetched
#[derive(Debug, Clone)]
pub(crate) struct CachedPricing {
    pub(crate) data: Vec<u8>,
    pub(crate) timestamp: DateTime<Utc>,
}

/// Per-user pricing cache file
#[derive(Debug, Clone)]
pub struct PricingCache {
    path: PathBuf,
}

impl PricingCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.cache/model-pricing/model_prices_and_context_window.json`
    pub fn default_path() -> Option<PathBuf> {
        let home = dirs::home_dir()?;
        Some(
            home.join(".cache")
                .join(env!("CARGO_PKG_NAME"))
                .join(CACHE_FILE_NAME),
        )
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cache. With `ttl` set, entries older than `ttl` (relative to
    /// `now`) are rejected as expired.
    pub(crate) fn load(
        &self,
        ttl: Option<Duration>,
        now: DateTime<Utc>,
    ) -> Result<CachedPricing, PricingError> {
        if !self.path.exists() {
            return Err(PricingError::CacheMissing {
                path: self.path.clone(),
            });
        }
        let bytes = fs::read(&self.path)?;
        let envelope: CacheEnvelope<'_> =
            serde_json::from_slice(&bytes).map_err(PricingError::CacheFormat)?;
        let timestamp = DateTime::from_timestamp(envelope.timestamp, 0).unwrap_or_default();

        if let Some(ttl) = ttl {
            let age = now.signed_duration_since(timestamp);
            let expired = age
                .to_std()
                .map(|age| age > ttl)
                .unwrap_or(false);
            if expired {
                return Err(PricingError::CacheExpired {
                    age_hours: age.num_seconds() as f64 / 3600.0,
                });
            }
        }

        Ok(CachedPricing {
            data: envelope.data.get().as_bytes().to_vec(),
            timestamp,
        })
    }

    /// Write `data` (a raw feed document) stamped with `now`
    pub(crate) fn save(&self, data: &[u8], now: DateTime<Utc>) -> Result<(), PricingError> {
        let data: &RawValue = serde_json::from_slice(data).map_err(PricingError::InvalidJson)?;
        let envelope = CacheEnvelope {
            timestamp: now.timestamp(),
            data,
        };
        let bytes = serde_json::to_vec(&envelope).map_err(PricingError::CacheFormat)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, bytes)?;
        Ok(())
    }
}
