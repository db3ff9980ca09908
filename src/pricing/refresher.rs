use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::PricingError;

use super::service::ActivePricing;
use super::source::PricingSource;
use super::table::PricingTable;

/// Background thread that re-fetches pricing on a fixed cadence and
/// publishes each new table. Stopped explicitly or on drop.
pub(crate) struct Refresher {
    stop_tx: mpsc::Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl Refresher {
    pub(crate) fn spawn(
        active: Arc<ActivePricing>,
        source: Arc<dyn PricingSource>,
        first_delay: Duration,
        interval: Duration,
    ) -> std::io::Result<Self> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name("pricing-refresh".to_string())
            .spawn(move || {
                let mut delay = first_delay;
                loop {
                    match stop_rx.recv_timeout(delay) {
                        Err(RecvTimeoutError::Timeout) => {
                            if let Err(error) = refresh_once(&active, source.as_ref()) {
                                warn!(source = source.name(), %error, "pricing refresh failed, keeping previous table");
                            }
                            delay = interval;
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!("pricing refresh stopped");
            })?;

        debug!(first_delay_secs = first_delay.as_secs(), "pricing refresh scheduled");
        Ok(Self {
            stop_tx,
            handle: Some(handle),
        })
    }

    /// Signal the thread and wait for it. An in-flight fetch finishes first.
    pub(crate) fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let _ = self.stop_tx.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Refresher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// One refresh tick: load, build, publish. Returns the new model count.
pub(crate) fn refresh_once(
    active: &ActivePricing,
    source: &dyn PricingSource,
) -> Result<usize, PricingError> {
    let loaded = source.load()?;
    let table = PricingTable::from_bytes(&loaded.data)?;
    let models = table.len();
    active.publish(table, Some(loaded.updated_at.unwrap_or_else(Utc::now)));
    info!(source = source.name(), models, "pricing table refreshed");
    Ok(models)
}

/// Delay before the first tick: whatever is left of `interval` since the
/// last update, or zero when the update time is unknown or already past.
pub(crate) fn first_delay(
    last_update: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    interval: Duration,
) -> Duration {
    let Some(last_update) = last_update else {
        return Duration::ZERO;
    };
    match now.signed_duration_since(last_update).to_std() {
        Ok(elapsed) => interval.saturating_sub(elapsed),
        // clock skew: update is in the future, treat as just refreshed
        Err(_) => interval,
    }
}
