//! CLI subcommand definitions

use clap::{Args, Subcommand};

use model_pricing::{CacheCreationDetail, UsageSnapshot};

/// Main CLI commands
#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Price a single request
    Cost {
        /// Model name as reported by the API (e.g. "us.anthropic.claude-sonnet-4-20250514-v1:0")
        model: String,

        #[command(flatten)]
        usage: UsageArgs,
    },
    /// Show which pricing entry a model name resolves to
    Resolve {
        model: String,
    },
    /// Fetch the latest pricing feed and update the local cache
    Refresh,
}

/// Token counts for the `cost` command
#[derive(Debug, Clone, Default, Args)]
pub(crate) struct UsageArgs {
    /// Input tokens
    #[arg(short, long, default_value_t = 0)]
    pub(crate) input: i64,

    /// Output tokens
    #[arg(short, long, default_value_t = 0)]
    pub(crate) output: i64,

    /// Cache creation tokens (all TTLs)
    #[arg(long, default_value_t = 0)]
    pub(crate) cache_create: i64,

    /// Cache read tokens
    #[arg(long, default_value_t = 0)]
    pub(crate) cache_read: i64,

    /// Cache creation tokens with a 5-minute TTL
    #[arg(long, value_name = "N")]
    pub(crate) cache_5m: Option<i64>,

    /// Cache creation tokens with a 1-hour TTL
    #[arg(long, value_name = "N")]
    pub(crate) cache_1h: Option<i64>,
}

impl UsageArgs {
    /// An explicit TTL split is only attached when either TTL flag is given.
    /// Without `--cache-create`, the aggregate is the sum of the split.
    pub(crate) fn to_snapshot(&self) -> UsageSnapshot {
        let cache_creation = match (self.cache_5m, self.cache_1h) {
            (None, None) => None,
            (five, one) => Some(CacheCreationDetail {
                ephemeral_5m_tokens: five.unwrap_or(0),
                ephemeral_1h_tokens: one.unwrap_or(0),
            }),
        };
        let cache_create_tokens = match cache_creation {
            Some(detail) if self.cache_create == 0 => {
                detail.ephemeral_5m_tokens + detail.ephemeral_1h_tokens
            }
            _ => self.cache_create,
        };

        UsageSnapshot {
            input_tokens: self.input,
            output_tokens: self.output,
            cache_create_tokens,
            cache_read_tokens: self.cache_read,
            cache_creation,
        }
    }
}
