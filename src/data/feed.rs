// =============================================================================
// Vendor Feed Client — rate-limited REST access with column normalization
// =============================================================================
//
// The quote vendor ships rows whose column names follow its own dashboard
// labels (CJK headers for prices, counts and turnover). Normalization happens
// once, at the serde boundary: every wire struct accepts both the vendor
// label and the normalized name via field aliases, and nothing past this file
// ever sees a vendor column name.
//
// Transport failures never cross the provider seam — each method logs and
// returns an empty result instead. A small rate gate spaces requests out so
// a full-universe scan stays under the vendor's per-minute ceiling.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::data::cache::SeriesCache;
use crate::data::provider::MarketData;
use crate::types::{Bar, EntitySeries, MinuteBar, PeerQuote, SectorSnapshot};

// =============================================================================
// Configuration
// =============================================================================

fn default_base_url() -> String {
    "https://quote.argusfeed.io".to_string()
}

fn default_request_interval_ms() -> u64 {
    300
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_history_lookback_days() -> u32 {
    90
}

fn default_cache_dir() -> Option<PathBuf> {
    Some(PathBuf::from("data/cache"))
}

fn default_cache_max_age_secs() -> u64 {
    3600
}

/// Feed client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Minimum spacing between consecutive requests.
    #[serde(default = "default_request_interval_ms")]
    pub request_interval_ms: u64,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// History window requested per instrument.
    #[serde(default = "default_history_lookback_days")]
    pub history_lookback_days: u32,

    /// Series cache directory; `None` disables the disk layer.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: Option<PathBuf>,

    #[serde(default = "default_cache_max_age_secs")]
    pub cache_max_age_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_interval_ms: default_request_interval_ms(),
            timeout_secs: default_timeout_secs(),
            history_lookback_days: default_history_lookback_days(),
            cache_dir: default_cache_dir(),
            cache_max_age_secs: default_cache_max_age_secs(),
        }
    }
}

// =============================================================================
// Rate gate
// =============================================================================

/// Spaces requests at least `min_interval` apart across all callers.
pub struct RateGate {
    min_interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl RateGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: Mutex::new(None),
        }
    }

    /// Wait until the next request slot opens, then claim it.
    pub async fn acquire(&self) {
        let mut last = self.last.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

// =============================================================================
// Wire rows (vendor column names normalized via aliases)
// =============================================================================

#[derive(Debug, Deserialize)]
struct SectorRow {
    #[serde(alias = "板块代码")]
    code: String,
    #[serde(alias = "板块名称")]
    name: String,
    #[serde(default, alias = "涨跌幅")]
    change_pct: f64,
    #[serde(default, alias = "上涨家数")]
    up_count: u32,
    #[serde(default, alias = "下跌家数")]
    down_count: u32,
    #[serde(default, alias = "换手率")]
    turnover_rate: f64,
    #[serde(default, alias = "总市值")]
    total_market_cap: f64,
    #[serde(default, alias = "领涨股票-涨跌幅")]
    leader_change_pct: f64,
}

impl From<SectorRow> for SectorSnapshot {
    fn from(row: SectorRow) -> Self {
        Self {
            code: row.code,
            name: row.name,
            change_pct: row.change_pct,
            up_count: row.up_count,
            down_count: row.down_count,
            turnover_rate: row.turnover_rate,
            total_market_cap: row.total_market_cap,
            leader_change_pct: row.leader_change_pct,
        }
    }
}

#[derive(Debug, Deserialize)]
struct QuoteRow {
    #[serde(alias = "代码")]
    symbol: String,
    #[serde(default, alias = "名称")]
    name: String,
    #[serde(default, alias = "最新价")]
    price: f64,
    #[serde(default, alias = "涨跌幅")]
    change_pct: f64,
}

impl From<QuoteRow> for PeerQuote {
    fn from(row: QuoteRow) -> Self {
        Self {
            symbol: row.symbol,
            name: row.name,
            price: row.price,
            change_pct: row.change_pct,
        }
    }
}

#[derive(Debug, Deserialize)]
struct HistoryRow {
    #[serde(alias = "日期")]
    date: String,
    #[serde(default, alias = "开盘")]
    open: f64,
    #[serde(default, alias = "最高")]
    high: f64,
    #[serde(default, alias = "最低")]
    low: f64,
    #[serde(default, alias = "收盘")]
    close: f64,
    #[serde(default, alias = "成交量")]
    volume: f64,
}

#[derive(Debug, Deserialize)]
struct MinuteRow {
    #[serde(alias = "时间")]
    time: String,
    #[serde(default, alias = "收盘")]
    close: f64,
    #[serde(default, alias = "成交量")]
    volume: f64,
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y%m%d"))
        .ok()
}

fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M"))
        .ok()
}

// =============================================================================
// FeedClient
// =============================================================================

/// REST client for the quote vendor.
pub struct FeedClient {
    cfg: FeedConfig,
    client: reqwest::Client,
    gate: RateGate,
    cache: SeriesCache,
}

impl FeedClient {
    pub fn new(cfg: FeedConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .expect("failed to build HTTP client");

        let gate = RateGate::new(Duration::from_millis(cfg.request_interval_ms));
        let cache = match cfg.cache_dir.clone() {
            Some(dir) => SeriesCache::new(Some(dir)),
            None => SeriesCache::memory_only(),
        };

        debug!(base_url = %cfg.base_url, "feed client initialised");
        Self {
            cfg,
            client,
            gate,
            cache,
        }
    }

    async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.gate.acquire().await;

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {url} failed"))?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("feed returned {status} for {url}");
        }

        resp.json::<T>()
            .await
            .with_context(|| format!("failed to decode response from {url}"))
    }

    fn history_to_series(symbol: &str, rows: Vec<HistoryRow>) -> Option<EntitySeries> {
        let mut bars = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(date) = parse_date(&row.date) else {
                warn!(symbol, raw = %row.date, "skipping bar with unparseable date");
                continue;
            };
            bars.push(Bar {
                date,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
            });
        }
        if bars.is_empty() {
            return None;
        }
        match EntitySeries::new(symbol, bars) {
            Ok(series) => Some(series),
            Err(e) => {
                warn!(symbol, error = %e, "vendor history rejected");
                None
            }
        }
    }
}

impl MarketData for FeedClient {
    async fn sector_table(&self) -> Vec<SectorSnapshot> {
        let url = format!("{}/api/v1/sectors", self.cfg.base_url);
        match self.fetch_json::<Vec<SectorRow>>(&url).await {
            Ok(rows) => rows.into_iter().map(SectorSnapshot::from).collect(),
            Err(e) => {
                warn!(error = %e, "sector table fetch failed");
                Vec::new()
            }
        }
    }

    async fn sector_members(&self, sector_code: &str) -> Vec<PeerQuote> {
        let url = format!("{}/api/v1/sectors/{sector_code}/members", self.cfg.base_url);
        match self.fetch_json::<Vec<QuoteRow>>(&url).await {
            Ok(rows) => rows.into_iter().map(PeerQuote::from).collect(),
            Err(e) => {
                warn!(sector_code, error = %e, "sector members fetch failed");
                Vec::new()
            }
        }
    }

    async fn daily_history(&self, symbol: &str, lookback_days: u32) -> Option<EntitySeries> {
        let key = format!("history_{symbol}_{lookback_days}");
        let max_age = Duration::from_secs(self.cfg.cache_max_age_secs);
        if let Some(series) = self.cache.get(&key, max_age) {
            return Some(series);
        }

        let url = format!(
            "{}/api/v1/history/{symbol}?days={lookback_days}",
            self.cfg.base_url
        );
        let rows = match self.fetch_json::<Vec<HistoryRow>>(&url).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(symbol, error = %e, "history fetch failed");
                return None;
            }
        };

        let series = Self::history_to_series(symbol, rows)?;
        self.cache.set(&key, &series);
        Some(series)
    }

    async fn spot(&self, symbol: &str) -> Option<PeerQuote> {
        let url = format!("{}/api/v1/spot/{symbol}", self.cfg.base_url);
        match self.fetch_json::<QuoteRow>(&url).await {
            Ok(row) => Some(PeerQuote::from(row)),
            Err(e) => {
                warn!(symbol, error = %e, "spot fetch failed");
                None
            }
        }
    }

    async fn minute_bars(&self, symbol: &str) -> Vec<MinuteBar> {
        let url = format!("{}/api/v1/minutes/{symbol}", self.cfg.base_url);
        let rows = match self.fetch_json::<Vec<MinuteRow>>(&url).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(symbol, error = %e, "minute bars fetch failed");
                return Vec::new();
            }
        };

        let mut bars: Vec<MinuteBar> = rows
            .into_iter()
            .filter_map(|row| {
                let time = parse_datetime(&row.time)?;
                Some(MinuteBar {
                    time,
                    close: row.close,
                    volume: row.volume,
                })
            })
            .collect();
        bars.sort_by_key(|b| b.time);
        bars
    }
}
