//! Pricing data origins
//!
//! Each origin implements [`PricingSource`] and yields raw feed bytes.
//! Startup walks an ordered list (cache, remote, bundled snapshot) and takes
//! the first origin whose bytes parse into a table.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::PricingError;

use super::cache::PricingCache;
use super::provider::fetch_remote_pricing;
use super::table::PricingTable;

/// Snapshot of the LiteLLM feed shipped inside the binary
pub(crate) const BUNDLED_PRICING: &[u8] = include_bytes!("model_prices.json");

/// Raw feed bytes from one origin
#[derive(Debug, Clone)]
pub struct SourceData {
    pub data: Vec<u8>,
    /// When the data was fetched upstream; `None` for the bundled snapshot
    pub updated_at: Option<DateTime<Utc>>,
}

/// A pricing data origin
pub trait PricingSource: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    fn load(&self) -> Result<SourceData, PricingError>;
}

pub type BoxedSource = Box<dyn PricingSource>;

/// Local cache file, optionally rejected once older than `ttl`
#[derive(Debug, Clone)]
pub struct CacheSource {
    cache: PricingCache,
    ttl: Option<Duration>,
}

impl CacheSource {
    pub fn new(cache: PricingCache, ttl: Option<Duration>) -> Self {
        Self { cache, ttl }
    }
}

impl PricingSource for CacheSource {
    fn name(&self) -> &'static str {
        "cache"
    }

    fn load(&self) -> Result<SourceData, PricingError> {
        let cached = self.cache.load(self.ttl, Utc::now())?;
        Ok(SourceData {
            data: cached.data,
            updated_at: Some(cached.timestamp),
        })
    }
}

/// Remote feed; successful fetches are written through to the cache
#[derive(Debug, Clone)]
pub struct RemoteSource {
    url: String,
    timeout: Duration,
    cache: Option<PricingCache>,
}

impl RemoteSource {
    pub fn new(url: impl Into<String>, timeout: Duration, cache: Option<PricingCache>) -> Self {
        Self {
            url: url.into(),
            timeout,
            cache,
        }
    }
}

impl PricingSource for RemoteSource {
    fn name(&self) -> &'static str {
        "remote"
    }

    fn load(&self) -> Result<SourceData, PricingError> {
        let data = fetch_remote_pricing(&self.url, self.timeout)?;
        let now = Utc::now();
        if let Some(cache) = &self.cache {
            match cache.save(&data, now) {
                Ok(()) => debug!(path = %cache.path().display(), "saved pricing cache"),
                Err(error) => warn!(%error, "failed to save pricing cache"),
            }
        }
        Ok(SourceData {
            data,
            updated_at: Some(now),
        })
    }
}

/// The bundled snapshot; never fails
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedSource;

impl PricingSource for EmbeddedSource {
    fn name(&self) -> &'static str {
        "embedded"
    }

    fn load(&self) -> Result<SourceData, PricingError> {
        Ok(SourceData {
            data: BUNDLED_PRICING.to_vec(),
            updated_at: None,
        })
    }
}

/// Table built from the bundled snapshot
pub(crate) fn embedded_table() -> PricingTable {
    PricingTable::from_bytes(BUNDLED_PRICING).unwrap_or_else(|error| {
        warn!(%error, "bundled pricing snapshot is unreadable");
        PricingTable::from_raw(serde_json::Map::new())
    })
}

/// Try `sources` in order and build a table from the first that works.
/// Falls back to the bundled snapshot when every origin fails.
pub(crate) fn load_first_available(
    sources: &[BoxedSource],
) -> (PricingTable, Option<DateTime<Utc>>) {
    for source in sources {
        let loaded = source
            .load()
            .and_then(|loaded| Ok((PricingTable::from_bytes(&loaded.data)?, loaded.updated_at)));
        match loaded {
            Ok((table, updated_at)) => {
                info!(source = source.name(), models = table.len(), "loaded pricing");
                return (table, updated_at);
            }
            Err(error) => debug!(source = source.name(), %error, "pricing source unavailable"),
        }
    }

    warn!("no pricing source succeeded, using bundled snapshot");
    (embedded_table(), None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use tempfile::TempDir;

    /// Serve one HTTP 200 response with `body` on a local port
    fn serve_once(body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
        });
        format!("http://{addr}/prices.json")
    }

    struct Failing;

    impl PricingSource for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn load(&self) -> Result<SourceData, PricingError> {
            Err(PricingError::HttpStatus(503))
        }
    }

    struct Fixed(&'static [u8]);

    impl PricingSource for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn load(&self) -> Result<SourceData, PricingError> {
            Ok(SourceData {
                data: self.0.to_vec(),
                updated_at: Some(Utc::now()),
            })
        }
    }

    #[test]
    fn bundled_snapshot_parses() {
        let table = embedded_table();
        assert!(table.len() > 10);
        assert!(table.get("claude-sonnet-4-20250514").is_some());
        assert!(table.get("gpt-5").is_some());
    }

    #[test]
    fn bundled_snapshot_covers_common_providers() {
        let table = embedded_table();
        for model in [
            "claude-opus-4-5",
            "us.anthropic.claude-3-7-sonnet-20250219-v1:0",
            "vertex_ai/claude-sonnet-4@20250514",
            "gpt-4.1-mini",
            "o4-mini",
            "gemini/gemini-2.5-pro",
            "deepseek/deepseek-reasoner",
            "xai/grok-4",
        ] {
            assert!(table.resolve(model).is_some(), "no bundled pricing for {model}");
        }
        assert!(table.get("sample_spec").is_none());
    }

    #[test]
    fn first_working_source_wins() {
        let sources: Vec<BoxedSource> = vec![
            Box::new(Failing),
            Box::new(Fixed(br#"{"only-model": {"input_cost_per_token": 1e-6}}"#)),
            Box::new(EmbeddedSource),
        ];
        let (table, updated_at) = load_first_available(&sources);
        assert_eq!(table.len(), 1);
        assert!(table.get("only-model").is_some());
        assert!(updated_at.is_some());
    }

    #[test]
    fn unparseable_source_is_skipped() {
        let sources: Vec<BoxedSource> = vec![Box::new(Fixed(b"[1, 2]")), Box::new(EmbeddedSource)];
        let (table, updated_at) = load_first_available(&sources);
        assert!(table.get("gpt-4o").is_some());
        assert!(updated_at.is_none());
    }

    #[test]
    fn empty_list_still_yields_bundled_table() {
        let (table, updated_at) = load_first_available(&[]);
        assert!(!table.is_empty());
        assert!(updated_at.is_none());
    }

    #[test]
    fn cache_source_respects_ttl() {
        let dir = TempDir::new().unwrap();
        let cache = PricingCache::new(dir.path().join("prices.json"));
        cache
            .save(br#"{"m": {}}"#, Utc::now() - chrono::TimeDelta::hours(30))
            .unwrap();

        let fresh_only = CacheSource::new(cache.clone(), Some(Duration::from_secs(24 * 3600)));
        assert!(matches!(
            fresh_only.load(),
            Err(PricingError::CacheExpired { .. })
        ));

        let any_age = CacheSource::new(cache, None);
        let loaded = any_age.load().unwrap();
        assert_eq!(loaded.data, br#"{"m": {}}"#);
    }

    #[test]
    fn remote_failure_leaves_cache_untouched() {
        let dir = TempDir::new().unwrap();
        let cache = PricingCache::new(dir.path().join("prices.json"));
        let remote = RemoteSource::new(
            "http://127.0.0.1:9/prices.json",
            Duration::from_secs(2),
            Some(cache.clone()),
        );
        assert!(remote.load().is_err());
        assert!(!cache.path().exists());
    }

    #[test]
    fn remote_success_survives_unwritable_cache() {
        let dir = TempDir::new().unwrap();
        // parent of the cache file is a regular file, so the save fails
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();
        let cache = PricingCache::new(blocker.join("prices.json"));

        let url = serve_once(r#"{"served-model": {"input_cost_per_token": 1e-6}}"#);
        let remote = RemoteSource::new(url, Duration::from_secs(5), Some(cache.clone()));
        let loaded = remote.load().unwrap();
        assert!(loaded.updated_at.is_some());
        assert!(!cache.path().exists());

        let table = PricingTable::from_bytes(&loaded.data).unwrap();
        assert!(table.get("served-model").is_some());
    }

    #[test]
    fn remote_success_writes_cache() {
        let dir = TempDir::new().unwrap();
        let cache = PricingCache::new(dir.path().join("nested").join("prices.json"));

        let url = serve_once(r#"{"served-model": {"input_cost_per_token": 1e-6}}"#);
        let remote = RemoteSource::new(url, Duration::from_secs(5), Some(cache.clone()));
        remote.load().unwrap();

        let cached = CacheSource::new(cache, None).load().unwrap();
        assert!(PricingTable::from_bytes(&cached.data).unwrap().get("served-model").is_some());
    }
}
