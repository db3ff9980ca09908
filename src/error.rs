use std::path::PathBuf;

use thiserror::Error;

/// Failures of a single pricing data origin.
///
/// None of these are fatal: the startup chain falls through to the next
/// origin and the refresher keeps the previous table.
#[derive(Debug, Error)]
pub enum PricingError {
    #[error("Pricing cache not found at {}", path.display())]
    CacheMissing { path: PathBuf },

    #[error("Pricing cache expired ({age_hours:.1}h old)")]
    CacheExpired { age_hours: f64 },

    #[error("Pricing cache I/O error: {0}")]
    CacheIo(#[from] std::io::Error),

    #[error("Malformed pricing cache: {0}")]
    CacheFormat(serde_json::Error),

    #[error("Remote pricing request failed: {0}")]
    Http(Box<ureq::Error>),

    #[error("Remote pricing server returned status {0}")]
    HttpStatus(u16),

    #[error("Remote pricing data is not valid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("Failed to parse pricing data: {0}")]
    Parse(serde_json::Error),

    #[error("Remote fetching is disabled in offline mode")]
    Offline,
}

impl From<ureq::Error> for PricingError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => PricingError::HttpStatus(code),
            other => PricingError::Http(Box::new(other)),
        }
    }
}

/// Errors surfaced by the command line front end
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Failed to read pricing file {}: {source}", path.display())]
    PricingFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{0}")]
    Pricing(#[from] PricingError),
}
