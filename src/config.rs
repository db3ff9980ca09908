use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

use tracing::{debug, warn};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Config {
    #[serde(default)]
    pub(crate) offline: bool,
    #[serde(default)]
    pub(crate) json: bool,
    /// Override for the remote pricing feed URL
    #[serde(default)]
    pub(crate) pricing_url: Option<String>,
    /// Override for the pricing cache file
    #[serde(default)]
    pub(crate) cache_path: Option<PathBuf>,
    /// Refresh cadence (and cache TTL) in hours
    #[serde(default)]
    pub(crate) refresh_hours: Option<u64>,
}

impl Config {
    pub(crate) fn load() -> Self {
        // Try config locations in order of priority
        for path in Self::get_config_paths() {
            if path.exists()
                && let Ok(content) = fs::read_to_string(&path)
            {
                match toml::from_str::<Config>(&content) {
                    Ok(config) => {
                        debug!(path = %path.display(), "loaded config");
                        return config;
                    }
                    Err(error) => {
                        warn!(path = %path.display(), %error, "failed to parse config");
                    }
                }
            }
        }

        Self::default()
    }

    fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // 1. XDG config: ~/.config/model-pricing/config.toml
        if let Some(home) = dirs::home_dir() {
            paths.push(
                home.join(".config")
                    .join(env!("CARGO_PKG_NAME"))
                    .join("config.toml"),
            );
        }

        // 2. Platform config dir (e.g. ~/Library/Application Support on macOS)
        if let Some(config_dir) = dirs::config_dir() {
            let platform_path = config_dir.join(env!("CARGO_PKG_NAME")).join("config.toml");
            if !paths.contains(&platform_path) {
                paths.push(platform_path);
            }
        }

        // 3. Home directory: ~/.model-pricing.toml
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(concat!(".", env!("CARGO_PKG_NAME"), ".toml")));
        }

        paths
    }
}
