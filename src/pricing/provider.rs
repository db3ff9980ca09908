use std::time::Duration;

use crate::error::PricingError;

/// Feed documents are a few MB; leave headroom over ureq's 10MB default
const MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;

/// Fetch the raw pricing feed. Anything but a 200 with a JSON object body
/// is rejected.
pub(crate) fn fetch_remote_pricing(url: &str, timeout: Duration) -> Result<Vec<u8>, PricingError> {
    let agent: ureq::Agent = ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build()
        .into();

    let response = agent.get(url).call()?;
    let status = response.status().as_u16();
    if status != 200 {
        return Err(PricingError::HttpStatus(status));
    }

    let mut body = response.into_body();
    let data = body.with_config().limit(MAX_BODY_BYTES).read_to_vec()?;
    validate_feed(&data)?;
    Ok(data)
}

/// Syntactic check only: the document must be a JSON object
pub(crate) fn validate_feed(data: &[u8]) -> Result<(), PricingError> {
    serde_json::from_slice::<serde_json::Map<String, serde_json::Value>>(data)
        .map(|_| ())
        .map_err(PricingError::InvalidJson)
}
