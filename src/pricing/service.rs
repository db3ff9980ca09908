use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::consts::{FETCH_TIMEOUT, REMOTE_PRICING_URL, UPDATE_INTERVAL};
use crate::error::PricingError;

use super::cache::PricingCache;
use super::calculator::{CostBreakdown, UsageSnapshot, calculate_cost};
use super::refresher::{Refresher, first_delay, refresh_once};
use super::source::{
    BoxedSource, CacheSource, EmbeddedSource, PricingSource, RemoteSource, embedded_table,
    load_first_available,
};
use super::table::PricingTable;

/// Where pricing comes from and how often it is refreshed
#[derive(Debug, Clone)]
pub struct PricingOptions {
    pub remote_url: String,
    /// `None` disables the disk cache
    pub cache_path: Option<PathBuf>,
    pub fetch_timeout: Duration,
    pub cache_ttl: Duration,
    pub refresh_interval: Duration,
    /// Cache (any age) then bundled snapshot; no network, no timer
    pub offline: bool,
}

impl Default for PricingOptions {
    fn default() -> Self {
        Self {
            remote_url: REMOTE_PRICING_URL.to_string(),
            cache_path: PricingCache::default_path(),
            fetch_timeout: FETCH_TIMEOUT,
            cache_ttl: UPDATE_INTERVAL,
            refresh_interval: UPDATE_INTERVAL,
            offline: false,
        }
    }
}

impl PricingOptions {
    fn remote_source(&self) -> Option<RemoteSource> {
        if self.offline {
            return None;
        }
        Some(RemoteSource::new(
            self.remote_url.clone(),
            self.fetch_timeout,
            self.cache_path.clone().map(PricingCache::new),
        ))
    }

    /// Startup chain: cache, remote, bundled snapshot
    fn startup_sources(&self) -> Vec<BoxedSource> {
        let mut sources: Vec<BoxedSource> = Vec::new();
        if let Some(path) = &self.cache_path {
            let ttl = (!self.offline).then_some(self.cache_ttl);
            sources.push(Box::new(CacheSource::new(PricingCache::new(path.clone()), ttl)));
        }
        if let Some(remote) = self.remote_source() {
            sources.push(Box::new(remote));
        }
        sources.push(Box::new(EmbeddedSource));
        sources
    }
}

/// The currently published table. Readers clone the `Arc` under the read
/// lock; writers swap in a whole new table under the write lock.
#[derive(Debug)]
pub(crate) struct ActivePricing {
    current: RwLock<Published>,
}

#[derive(Debug, Clone)]
struct Published {
    table: Arc<PricingTable>,
    updated_at: Option<DateTime<Utc>>,
}

impl ActivePricing {
    pub(crate) fn new(table: PricingTable, updated_at: Option<DateTime<Utc>>) -> Self {
        Self {
            current: RwLock::new(Published {
                table: Arc::new(table),
                updated_at,
            }),
        }
    }

    pub(crate) fn table(&self) -> Arc<PricingTable> {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&current.table)
    }

    pub(crate) fn last_update(&self) -> Option<DateTime<Utc>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .updated_at
    }

    pub(crate) fn publish(&self, table: PricingTable, updated_at: Option<DateTime<Utc>>) {
        let next = Published {
            table: Arc::new(table),
            updated_at,
        };
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = next;
    }
}

/// Cost calculation over a live, periodically refreshed pricing table
pub struct Service {
    active: Arc<ActivePricing>,
    remote: Option<Arc<dyn PricingSource>>,
    refresh_interval: Duration,
    refresher: Mutex<Option<Refresher>>,
}

impl Service {
    /// Resolve pricing through cache, remote and bundled snapshot, then
    /// schedule periodic refresh (unless offline).
    pub fn start(options: PricingOptions) -> Self {
        let service = Self::load(options);
        service.start_periodic_update();
        service
    }

    /// Same startup resolution as [`Service::start`] without the timer
    pub fn load(options: PricingOptions) -> Self {
        let startup = options.startup_sources();
        Self::with_startup(&startup, &options)
    }

    /// Startup from local data only (cache of any age, then the bundled
    /// snapshot). The remote source is still wired up for
    /// [`Service::refresh_now`], so an immediate refresh fetches exactly once.
    pub fn load_local(options: PricingOptions) -> Self {
        let local = PricingOptions {
            offline: true,
            ..options.clone()
        };
        Self::with_startup(&local.startup_sources(), &options)
    }

    fn with_startup(startup: &[BoxedSource], options: &PricingOptions) -> Self {
        let (table, updated_at) = load_first_available(startup);
        let remote = options
            .remote_source()
            .map(|remote| Arc::new(remote) as Arc<dyn PricingSource>);

        Self {
            active: Arc::new(ActivePricing::new(table, updated_at)),
            remote,
            refresh_interval: options.refresh_interval,
            refresher: Mutex::new(None),
        }
    }

    /// Startup from an explicit source list; `remote` backs refreshes.
    /// No timer is started.
    pub fn from_sources(sources: &[BoxedSource], remote: Option<Arc<dyn PricingSource>>) -> Self {
        let (table, updated_at) = load_first_available(sources);
        Self {
            remote,
            ..Self::from_table(table, updated_at)
        }
    }

    /// Deterministic constructor: no cache, no network, no timer
    pub fn from_bytes(data: &[u8]) -> Result<Self, PricingError> {
        Ok(Self::from_table(PricingTable::from_bytes(data)?, None))
    }

    /// Service over the bundled snapshot only
    pub fn embedded() -> Self {
        Self::from_table(embedded_table(), None)
    }

    fn from_table(table: PricingTable, updated_at: Option<DateTime<Utc>>) -> Self {
        Self {
            active: Arc::new(ActivePricing::new(table, updated_at)),
            remote: None,
            refresh_interval: UPDATE_INTERVAL,
            refresher: Mutex::new(None),
        }
    }

    pub fn calculate_cost(&self, model: &str, usage: &UsageSnapshot) -> CostBreakdown {
        let table = self.active.table();
        calculate_cost(&table, model, usage)
    }

    /// The table currently in use
    pub fn table(&self) -> Arc<PricingTable> {
        self.active.table()
    }

    /// Fetch time of the active data; `None` for the bundled snapshot
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.active.last_update()
    }

    /// Run one refresh now. Returns the number of models in the new table.
    pub fn refresh_now(&self) -> Result<usize, PricingError> {
        let remote = self.remote.as_ref().ok_or(PricingError::Offline)?;
        refresh_once(&self.active, remote.as_ref())
    }

    /// Start the background refresh if there is a remote source and it is
    /// not already running. The first tick lines up with the last update.
    pub fn start_periodic_update(&self) {
        let Some(remote) = &self.remote else {
            return;
        };
        let mut refresher = self.refresher.lock().unwrap_or_else(PoisonError::into_inner);
        if refresher.is_some() {
            return;
        }

        let delay = first_delay(self.last_update(), Utc::now(), self.refresh_interval);
        match Refresher::spawn(
            Arc::clone(&self.active),
            Arc::clone(remote),
            delay,
            self.refresh_interval,
        ) {
            Ok(started) => *refresher = Some(started),
            Err(error) => warn!(%error, "could not start pricing refresh thread"),
        }
    }

    /// Stop the background refresh; safe to call repeatedly
    pub fn stop_periodic_update(&self) {
        let running = self
            .refresher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(refresher) = running {
            refresher.stop();
            debug!("pricing refresh stopped by caller");
        }
    }

    pub fn is_refreshing(&self) -> bool {
        self.refresher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

static DEFAULT_SERVICE: OnceLock<Service> = OnceLock::new();

/// Process-wide service with default options, built on first use
pub fn default_service() -> &'static Service {
    DEFAULT_SERVICE.get_or_init(|| Service::start(PricingOptions::default()))
}

/// Stop the default service's refresh thread, if it was ever started
pub fn stop_periodic_update() {
    if let Some(service) = DEFAULT_SERVICE.get() {
        service.stop_periodic_update();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::calculator::CacheCreationDetail;
    use crate::pricing::source::SourceData;
    use std::thread;
    use std::time::Instant;
    use tempfile::TempDir;

    const FEED: &[u8] = br#"{
        "test-model": {"input_cost_per_token": 0.000003, "output_cost_per_token": 0.000015},
        "claude-sonnet-4-20250514": {"input_cost_per_token": 0.000003, "output_cost_per_token": 0.000015}
    }"#;

    struct Fixed(&'static [u8]);

    impl PricingSource for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn load(&self) -> Result<SourceData, PricingError> {
            Ok(SourceData {
                data: self.0.to_vec(),
                updated_at: None,
            })
        }
    }

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn from_bytes_rejects_invalid_json() {
        assert!(matches!(
            Service::from_bytes(b"{oops"),
            Err(PricingError::Parse(_))
        ));
    }

    #[test]
    fn unknown_model_has_no_pricing() {
        let service = Service::from_bytes(FEED).unwrap();
        let usage = UsageSnapshot {
            input_tokens: 100,
            output_tokens: 50,
            ..Default::default()
        };
        let cost = service.calculate_cost("unknown-model-xyz", &usage);
        assert_eq!(cost, CostBreakdown::default());
    }

    #[test]
    fn basic_and_cached_costs() {
        let service = Service::from_bytes(FEED).unwrap();
        let usage = UsageSnapshot {
            input_tokens: 1000,
            output_tokens: 200,
            ..Default::default()
        };
        let cost = service.calculate_cost("test-model", &usage);
        assert!(approx_eq(cost.total_cost, 0.006));

        let usage = UsageSnapshot {
            cache_create_tokens: 500,
            ..usage
        };
        let cost = service.calculate_cost("test-model", &usage);
        assert!(approx_eq(cost.ephemeral_5m_cost, 0.001875));
        assert!(approx_eq(cost.cache_create_cost, 0.001875));
    }

    #[test]
    fn long_context_scenario() {
        let service = Service::from_bytes(FEED).unwrap();
        let usage = UsageSnapshot {
            input_tokens: 250_000,
            output_tokens: 1000,
            ..Default::default()
        };
        let cost = service.calculate_cost("claude-sonnet-4-20250514[1m]", &usage);
        assert!(cost.is_long_context);
        assert!(approx_eq(cost.input_cost, 1.5));
        assert!(approx_eq(cost.output_cost, 0.0225));
    }

    #[test]
    fn embedded_service_prices_bedrock_names() {
        let service = Service::embedded();
        let usage = UsageSnapshot {
            input_tokens: 1_000_000,
            cache_create_tokens: 10,
            cache_creation: Some(CacheCreationDetail {
                ephemeral_5m_tokens: 0,
                ephemeral_1h_tokens: 10,
            }),
            ..Default::default()
        };
        let cost = service.calculate_cost("us.anthropic.claude-sonnet-4-20250514-v1:0", &usage);
        assert!(cost.has_pricing);
        assert!(approx_eq(cost.input_cost, 3.0));
        assert!(service.last_update().is_none());
    }

    #[test]
    fn refresh_now_swaps_table() {
        let remote: Arc<dyn PricingSource> =
            Arc::new(Fixed(br#"{"brand-new": {"input_cost_per_token": 1e-6}}"#));
        let startup: Vec<BoxedSource> = vec![Box::new(Fixed(FEED))];
        let service = Service::from_sources(&startup, Some(remote));
        let before = service.table();
        assert!(before.get("brand-new").is_none());

        assert_eq!(service.refresh_now().unwrap(), 1);
        assert!(service.table().get("brand-new").is_some());
        assert!(service.last_update().is_some());
        // readers holding the old snapshot keep a consistent view
        assert!(before.get("test-model").is_some());
    }

    #[test]
    fn refresh_now_without_remote_is_offline() {
        let service = Service::from_bytes(FEED).unwrap();
        assert!(matches!(service.refresh_now(), Err(PricingError::Offline)));
    }

    #[test]
    fn periodic_update_start_and_stop() {
        let remote: Arc<dyn PricingSource> =
            Arc::new(Fixed(br#"{"brand-new": {"input_cost_per_token": 1e-6}}"#));
        let startup: Vec<BoxedSource> = vec![Box::new(Fixed(FEED))];
        let service = Service::from_sources(&startup, Some(remote));
        // unknown last update: first tick fires immediately
        service.start_periodic_update();
        assert!(service.is_refreshing());

        let deadline = Instant::now() + Duration::from_secs(5);
        while service.table().get("brand-new").is_none() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(service.table().get("brand-new").is_some());

        service.stop_periodic_update();
        assert!(!service.is_refreshing());
        service.stop_periodic_update();
    }

    #[test]
    fn periodic_update_needs_remote() {
        let service = Service::from_bytes(FEED).unwrap();
        service.start_periodic_update();
        assert!(!service.is_refreshing());
    }

    #[test]
    fn offline_start_uses_stale_cache() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prices.json");
        PricingCache::new(path.clone())
            .save(FEED, Utc::now() - chrono::TimeDelta::days(3))
            .unwrap();

        let service = Service::start(PricingOptions {
            cache_path: Some(path),
            offline: true,
            ..Default::default()
        });
        assert!(service.table().get("test-model").is_some());
        assert!(service.last_update().is_some());
        assert!(!service.is_refreshing());
    }

    #[test]
    fn offline_start_without_cache_uses_bundle() {
        let dir = TempDir::new().unwrap();
        let service = Service::start(PricingOptions {
            cache_path: Some(dir.path().join("missing.json")),
            offline: true,
            ..Default::default()
        });
        assert!(service.table().get("gpt-4o").is_some());
        assert!(service.last_update().is_none());
    }

    #[test]
    fn fresh_cache_skips_remote() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prices.json");
        PricingCache::new(path.clone())
            .save(FEED, Utc::now() - chrono::TimeDelta::hours(1))
            .unwrap();

        let service = Service::start(PricingOptions {
            cache_path: Some(path),
            remote_url: "http://127.0.0.1:9/unused.json".to_string(),
            ..Default::default()
        });
        assert!(service.table().get("test-model").is_some());
        // next refresh is ~23h away
        assert!(service.is_refreshing());
        service.stop_periodic_update();
    }

    #[test]
    fn load_never_starts_timer() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prices.json");
        PricingCache::new(path.clone())
            .save(FEED, Utc::now() - chrono::TimeDelta::hours(1))
            .unwrap();

        let service = Service::load(PricingOptions {
            cache_path: Some(path),
            remote_url: "http://127.0.0.1:9/unused.json".to_string(),
            ..Default::default()
        });
        assert!(service.table().get("test-model").is_some());
        assert!(!service.is_refreshing());
    }

    #[test]
    fn load_local_skips_remote_at_startup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prices.json");
        PricingCache::new(path.clone())
            .save(FEED, Utc::now() - chrono::TimeDelta::days(3))
            .unwrap();

        // stale cache is still used, the unreachable remote is not tried
        let service = Service::load_local(PricingOptions {
            cache_path: Some(path),
            remote_url: "http://127.0.0.1:9/unused.json".to_string(),
            fetch_timeout: Duration::from_secs(2),
            ..Default::default()
        });
        assert!(service.table().get("test-model").is_some());
        assert!(!service.is_refreshing());
        // remote is kept for an explicit refresh
        assert!(!matches!(service.refresh_now(), Err(PricingError::Offline)));
        assert!(service.table().get("test-model").is_some());
    }

    #[test]
    fn load_local_offline_has_no_remote() {
        let service = Service::load_local(PricingOptions {
            cache_path: None,
            offline: true,
            ..Default::default()
        });
        assert!(service.table().get("gpt-4o").is_some());
        assert!(matches!(service.refresh_now(), Err(PricingError::Offline)));
    }
}
