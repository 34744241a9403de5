// =============================================================================
// Shared types used across the Argus screening engine
// =============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Price series
// ---------------------------------------------------------------------------

/// A single daily OHLCV bar.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Errors raised when constructing an [`EntitySeries`].
#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("series '{id}': bars not in strictly increasing date order at {date}")]
    OutOfOrder { id: String, date: NaiveDate },
}

/// An entity identifier (sector code or instrument symbol) plus its ordered
/// bar history. Construction enforces strictly increasing dates; a duplicate
/// date is a defect in the upstream feed, not something scoring should paper
/// over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySeries {
    pub id: String,
    bars: Vec<Bar>,
}

impl EntitySeries {
    /// Build a series, validating date order.
    pub fn new(id: impl Into<String>, bars: Vec<Bar>) -> Result<Self, SeriesError> {
        let id = id.into();
        for pair in bars.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(SeriesError::OutOfOrder {
                    id,
                    date: pair[1].date,
                });
            }
        }
        Ok(Self { id, bars })
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars().is_empty()
    }

    pub fn latest(&self) -> Option<&Bar> {
        self.bars().last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }
}

// ---------------------------------------------------------------------------
// Vendor snapshot rows
// ---------------------------------------------------------------------------

/// One row of the vendor's live sector table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectorSnapshot {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub change_pct: f64,
    #[serde(default)]
    pub up_count: u32,
    #[serde(default)]
    pub down_count: u32,
    #[serde(default)]
    pub turnover_rate: f64,
    /// Total market capitalization in units of 100 million.
    #[serde(default)]
    pub total_market_cap: f64,
    /// Percent change of the sector's leading gainer.
    #[serde(default)]
    pub leader_change_pct: f64,
}

impl SectorSnapshot {
    pub fn member_count(&self) -> u32 {
        self.up_count + self.down_count
    }

    /// Share of members that are up today, as a percentage in [0, 100].
    /// Returns 50.0 when the snapshot carries no breadth fields.
    pub fn up_ratio(&self) -> f64 {
        let total = self.member_count();
        if total == 0 {
            50.0
        } else {
            f64::from(self.up_count) / f64::from(total) * 100.0
        }
    }
}

/// One member row of a sector's peer list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerQuote {
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub change_pct: f64,
}

/// One intraday minute bar, used by the opening-window monitor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MinuteBar {
    pub time: chrono::NaiveDateTime,
    pub close: f64,
    pub volume: f64,
}

// ---------------------------------------------------------------------------
// Classification enums
// ---------------------------------------------------------------------------

/// Coarse risk bucket assigned to a sector from its industry profile.
/// The aggregator applies a small multiplier per bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskBucket {
    Low,
    Medium,
    High,
}

impl RiskBucket {
    /// Score multiplier applied after the weighted sum in the sector scope.
    pub fn multiplier(self) -> f64 {
        match self {
            Self::Low => 1.05,
            Self::Medium => 1.00,
            Self::High => 0.95,
        }
    }
}

impl std::fmt::Display for RiskBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Five-bucket risk grade derived from a candidate's total score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    MediumLow,
    Medium,
    MediumHigh,
    High,
}

impl RiskLevel {
    /// Bucket a total score (0-100) into a risk grade. The 80 and 50 edges
    /// bound the lowest- and highest-risk grades; 65 marks the start of the
    /// second grade so that scores just past the mid-60s read as buy-grade.
    pub fn from_score(total_score: f64) -> Self {
        if total_score >= 80.0 {
            Self::Low
        } else if total_score >= 65.0 {
            Self::MediumLow
        } else if total_score >= 55.0 {
            Self::Medium
        } else if total_score >= 50.0 {
            Self::MediumHigh
        } else {
            Self::High
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::MediumLow => write!(f, "medium-low"),
            Self::Medium => write!(f, "medium"),
            Self::MediumHigh => write!(f, "medium-high"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Broad market condition used to parameterize the buy-decision profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketCondition {
    Normal,
    Bull,
    Bear,
    Volatile,
}

impl Default for MarketCondition {
    fn default() -> Self {
        Self::Normal
    }
}

impl std::fmt::Display for MarketCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Bull => write!(f, "bull"),
            Self::Bear => write!(f, "bear"),
            Self::Volatile => write!(f, "volatile"),
        }
    }
}

/// Terminal state of the buy-decision machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeAction {
    AggressiveBuy,
    CautiousBuy,
    Watch,
}

impl std::fmt::Display for TradeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AggressiveBuy => write!(f, "aggressive-buy"),
            Self::CautiousBuy => write!(f, "cautious-buy"),
            Self::Watch => write!(f, "watch"),
        }
    }
}

/// A positive condition matched by the signal generator. The number of
/// matched tags is the entry strength that drives the buy-decision machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryTag {
    TrendUp,
    SteadyMomentum,
    VolumeSurge,
}

impl std::fmt::Display for EntryTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TrendUp => write!(f, "trend-up"),
            Self::SteadyMomentum => write!(f, "steady-momentum"),
            Self::VolumeSurge => write!(f, "volume-surge"),
        }
    }
}

// ---------------------------------------------------------------------------
// Screening output
// ---------------------------------------------------------------------------

/// Execution plan attached to a candidate by the buy-decision machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyPlan {
    pub action: TradeAction,
    /// Suggested limit band (low, high); (0, 0) when the action is Watch.
    pub buy_price_range: (f64, f64),
    /// Fraction of total capital to commit.
    pub position_fraction: f64,
    pub holding_days: u32,
}

/// A fully scored, ranked screening candidate. Immutable once created — a new
/// evaluation run produces new candidates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change_pct: f64,
    pub sector_code: String,
    pub total_score: f64,
    pub risk_level: RiskLevel,
    pub entry_signal: Vec<EntryTag>,
    pub stop_loss: f64,
    pub target_price: f64,
    pub risk_reward_ratio: f64,
    pub rank_reasons: Vec<String>,
    pub plan: BuyPlan,
}

impl Candidate {
    /// Render the entry tags as a single pipe-separated label, or "watch"
    /// when no positive condition matched.
    pub fn entry_signal_text(&self) -> String {
        if self.entry_signal.is_empty() {
            "watch".to_string()
        } else {
            self.entry_signal
                .iter()
                .map(|t| t.to_string())
                .collect::<Vec<_>>()
                .join(" | ")
        }
    }
}
