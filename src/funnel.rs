// =============================================================================
// Funnel Filter — hard pre-filter, then one of two gate policies
// =============================================================================
//
// Stage 1 (pre-filter) removes rows that should never reach scoring: names
// carrying delist/risk markers, prices outside the configured band, and
// single-day moves pinned at the limit-up/limit-down extremes.
//
// Stage 2 applies exactly one gate policy per invocation:
//   Strict  — ANY-fail across category gates: a bearish MA stack, an
//             excessive 5-day run, a high volatility band, or a price parked
//             at the top of its range each reject on their own, regardless of
//             the total score.
//   Lenient — accept iff total_score >= threshold.
//
// The two policies are intentionally not reconcilable: an all-baseline
// analysis trips no strict gate yet sits below the lenient threshold. Both
// behaviours are load-bearing and covered by tests.
//
// Empty input is a valid input; the funnel never fails on it.

use serde::{Deserialize, Serialize};

use crate::config::ScreeningConfig;
use crate::scoring::momentum::MomentumBand;
use crate::scoring::position::PositionZone;
use crate::scoring::trend::TrendAlignment;
use crate::scoring::volatility::VolatilityBand;
use crate::scoring::AnalysisResult;
use crate::types::PeerQuote;

/// Gate policy selected per invocation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GatePolicy {
    Strict,
    Lenient { threshold: f64 },
}

/// Why a scored entity was turned away at the gate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GateRejection {
    BearishTrend,
    ExcessiveMomentum,
    HighVolatility,
    NearRangeHigh,
    BelowThreshold { total: f64, threshold: f64 },
}

impl std::fmt::Display for GateRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BearishTrend => write!(f, "bearish MA alignment"),
            Self::ExcessiveMomentum => write!(f, "5-day change beyond band"),
            Self::HighVolatility => write!(f, "volatility above ceiling"),
            Self::NearRangeHigh => write!(f, "price near range high"),
            Self::BelowThreshold { total, threshold } => {
                write!(f, "total {total:.1} below threshold {threshold:.1}")
            }
        }
    }
}

/// Stage 1: drop peers that should never be scored.
pub fn pre_filter(peers: &[PeerQuote], cfg: &ScreeningConfig) -> Vec<PeerQuote> {
    peers
        .iter()
        .filter(|p| !name_blacklisted(&p.name, &cfg.name_blacklist))
        .filter(|p| p.price >= cfg.min_price && p.price <= cfg.max_price)
        .filter(|p| p.change_pct.abs() < cfg.limit_move_pct)
        .cloned()
        .collect()
}

fn name_blacklisted(name: &str, blacklist: &[String]) -> bool {
    let upper = name.to_uppercase();
    blacklist.iter().any(|marker| upper.contains(&marker.to_uppercase()))
}

/// Stage 2: evaluate the selected gate policy. `None` means pass; the first
/// failing gate reports why.
pub fn evaluate_gate(
    policy: GatePolicy,
    analysis: &AnalysisResult,
    total_score: f64,
) -> Option<GateRejection> {
    match policy {
        GatePolicy::Strict => {
            if analysis
                .trend
                .as_ref()
                .is_some_and(|t| t.alignment == Some(TrendAlignment::AlignedBearish))
            {
                return Some(GateRejection::BearishTrend);
            }
            if analysis
                .momentum
                .as_ref()
                .is_some_and(|m| m.band == Some(MomentumBand::Excessive))
            {
                return Some(GateRejection::ExcessiveMomentum);
            }
            if analysis
                .volatility
                .as_ref()
                .is_some_and(|v| v.band == Some(VolatilityBand::High))
            {
                return Some(GateRejection::HighVolatility);
            }
            if analysis
                .position
                .as_ref()
                .is_some_and(|p| p.zone == Some(PositionZone::NearHigh))
            {
                return Some(GateRejection::NearRangeHigh);
            }
            None
        }
        GatePolicy::Lenient { threshold } => {
            if total_score >= threshold {
                None
            } else {
                Some(GateRejection::BelowThreshold {
                    total: total_score,
                    threshold,
                })
            }
        }
    }
}
