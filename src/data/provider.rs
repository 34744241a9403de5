// =============================================================================
// Market Data Provider trait
// =============================================================================
//
// Abstracts over data sources so the engines can be exercised against canned
// fixtures in tests and against the live feed in production.
//
// Contract: no method propagates a transport or decoding failure. A failed
// call surfaces as an empty list or `None`, logged at the implementation; the
// screening run simply skips the entity and continues. Retries and backoff
// are the implementation's business, never the engine's.

use crate::types::{EntitySeries, MinuteBar, PeerQuote, SectorSnapshot};

pub trait MarketData {
    /// The live sector table, or empty on failure.
    fn sector_table(&self) -> impl std::future::Future<Output = Vec<SectorSnapshot>> + Send;

    /// Member quotes of one sector, or empty on failure.
    fn sector_members(
        &self,
        sector_code: &str,
    ) -> impl std::future::Future<Output = Vec<PeerQuote>> + Send;

    /// Daily bar history for an instrument over `lookback_days`, or `None`
    /// when unavailable (including a malformed series from the vendor).
    fn daily_history(
        &self,
        symbol: &str,
        lookback_days: u32,
    ) -> impl std::future::Future<Output = Option<EntitySeries>> + Send;

    /// Latest quote for one instrument, or `None` on failure.
    fn spot(&self, symbol: &str) -> impl std::future::Future<Output = Option<PeerQuote>> + Send;

    /// Today's minute bars for an instrument (oldest first), or empty on
    /// failure.
    fn minute_bars(
        &self,
        symbol: &str,
    ) -> impl std::future::Future<Output = Vec<MinuteBar>> + Send;
}
