use std::time::Duration;

/// Community pricing feed (LiteLLM model price table)
pub const REMOTE_PRICING_URL: &str =
    "https://raw.githubusercontent.com/BerriAI/litellm/main/model_prices_and_context_window.json";

/// Cache file name under the per-user cache directory
pub const CACHE_FILE_NAME: &str = "model_prices_and_context_window.json";

pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Cache TTL and periodic refresh cadence
pub const UPDATE_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Input tokens (input + cache create + cache read) above which the 1M-context tier applies
pub const LONG_CONTEXT_THRESHOLD: i64 = 200_000;

/// Marker carried by model names that opt into the 1M-context tier
pub const LONG_CONTEXT_MARKER: &str = "[1m]";
