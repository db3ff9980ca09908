//! CLI argument definitions
//!
//! Global CLI options and configuration merging logic.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::warn;

use model_pricing::PricingOptions;

use crate::config::Config;

use super::commands::Commands;

#[derive(Parser)]
#[command(name = "model-pricing")]
#[command(about = "Cost breakdowns for LLM API usage from the LiteLLM pricing feed", version)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,

    /// Output as JSON
    #[arg(short, long, global = true)]
    pub(crate) json: bool,

    /// Use cached or bundled pricing only (skip fetching from LiteLLM)
    #[arg(short = 'O', long, global = true)]
    pub(crate) offline: bool,

    /// Price against a local LiteLLM-format JSON file instead of cache/remote
    #[arg(long, global = true, value_name = "PATH")]
    pub(crate) pricing_file: Option<PathBuf>,

    /// Remote pricing feed URL
    #[arg(long, global = true, value_name = "URL")]
    pub(crate) pricing_url: Option<String>,

    /// Enable debug logging on stderr
    #[arg(long, global = true)]
    pub(crate) debug: bool,

    #[arg(skip)]
    pub(crate) cache_path: Option<PathBuf>,

    #[arg(skip)]
    pub(crate) refresh_hours: Option<u64>,
}

impl Cli {
    /// Merge config file values into CLI (CLI args take precedence)
    pub(crate) fn with_config(mut self, config: &Config) -> Self {
        if !self.offline && config.offline {
            self.offline = true;
        }
        if !self.json && config.json {
            self.json = true;
        }
        if self.pricing_url.is_none() {
            self.pricing_url = config.pricing_url.clone();
        }
        if self.cache_path.is_none() {
            self.cache_path = config.cache_path.clone();
        }
        if self.refresh_hours.is_none() {
            self.refresh_hours = config.refresh_hours;
        }
        self
    }

    pub(crate) fn pricing_options(&self) -> PricingOptions {
        let mut options = PricingOptions {
            offline: self.offline,
            ..Default::default()
        };
        if let Some(url) = &self.pricing_url {
            options.remote_url = url.clone();
        }
        if let Some(path) = &self.cache_path {
            options.cache_path = Some(path.clone());
        }
        if let Some(hours) = self.refresh_hours.filter(|h| *h > 0) {
            match hours.checked_mul(60 * 60) {
                Some(secs) => {
                    let interval = Duration::from_secs(secs);
                    options.refresh_interval = interval;
                    options.cache_ttl = interval;
                }
                None => warn!(hours, "refresh_hours out of range, using default"),
            }
        }
        options
    }
}
