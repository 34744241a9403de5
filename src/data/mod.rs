// =============================================================================
// Data Module
// =============================================================================
//
// Everything that crosses the engine's data boundary:
// - the `MarketData` provider trait (empty-on-failure contract)
// - the vendor feed client with column normalization and self-throttling
// - the keyed series cache (optional; its absence never changes scores)

pub mod cache;
pub mod feed;
pub mod provider;

pub use cache::SeriesCache;
pub use feed::{FeedClient, FeedConfig};
pub use provider::MarketData;
