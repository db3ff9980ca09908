//! Usage-based cost calculation for LLM API calls.
//!
//! ```no_run
//! use model_pricing::{UsageSnapshot, default_service};
//!
//! let usage = UsageSnapshot {
//!     input_tokens: 1_000,
//!     output_tokens: 200,
//!     ..Default::default()
//! };
//! let cost = default_service().calculate_cost("claude-sonnet-4-20250514", &usage);
//! println!("${:.6}", cost.total_cost);
//! ```

pub mod consts;
pub mod error;
pub mod pricing;

pub use error::PricingError;
pub use pricing::{
    CacheCreationDetail, CostBreakdown, PricingOptions, PricingTable, Service, UsageSnapshot,
    default_service, stop_periodic_update,
};
