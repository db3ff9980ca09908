//! LLM API cost engine
//!
//! A [`PricingTable`] is an immutable snapshot of the LiteLLM pricing feed.
//! [`Service`] keeps the active table behind a read/write lock, serves
//! [`Service::calculate_cost`] from it, and swaps in a fresh table from the
//! remote feed on a 24h cadence.

mod cache;
mod calculator;
mod provider;
mod refresher;
mod resolver;
mod service;
mod source;
mod table;
mod types;

pub use cache::PricingCache;
pub use calculator::{CacheCreationDetail, CostBreakdown, UsageSnapshot, calculate_cost};
pub use resolver::Resolved;
pub use service::{PricingOptions, Service, default_service, stop_periodic_update};
pub use source::{
    BoxedSource, CacheSource, EmbeddedSource, PricingSource, RemoteSource, SourceData,
};
pub use table::PricingTable;
pub use types::{LongContextPricing, PricingEntry};
