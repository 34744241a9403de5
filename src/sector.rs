// =============================================================================
// Sector Analyzer — four-factor scoring over the live sector table
// =============================================================================
//
// The sector scope runs the same funnel shape as the instrument scope but on
// snapshot fields instead of bar history:
//
//   momentum  — today's percent change, 10 points per percent off 50
//   breadth   — share of members trading up
//   attention — turnover rate versus a 2% baseline
//   stability — market-cap weight plus how orderly the leader's move is
//
// Each factor is clamped to [0, 100]; the weighted total goes through the
// shared `weighted_total` bounds point with the sector's risk-bucket
// multiplier applied. Ranking and the best-3 fallback reuse the ranker.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{ConfigError, SectorConfig};
use crate::rank::{rank_with_fallback, Ranked};
use crate::scoring::weighted_total;
use crate::types::{RiskBucket, SectorSnapshot};

/// Turnover rate treated as "normal attention".
const TURNOVER_BASELINE: f64 = 2.0;
/// Leader gain considered ideally orderly.
const IDEAL_LEADER_CHANGE: f64 = 5.0;
/// Bounds for the market-cap contribution to stability.
const CAP_TERM_LIMIT: f64 = 20.0;

// Name fragments mapping a sector to a risk bucket.
const LOW_RISK_KEYWORDS: [&str; 8] = [
    "bank", "coal", "power", "utilit", "food", "beverage", "insurance", "securities",
];
const HIGH_RISK_KEYWORDS: [&str; 8] = [
    "semiconductor", "software", "internet", "tech", "chip", "biotech", "gaming", "media",
];

/// Scored sector row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectorScore {
    pub code: String,
    pub name: String,
    pub momentum_score: f64,
    pub breadth_score: f64,
    pub attention_score: f64,
    pub stability_score: f64,
    pub total_score: f64,
    pub risk_bucket: RiskBucket,
    pub change_pct: f64,
    pub up_ratio: f64,
    pub turnover_rate: f64,
    pub member_count: u32,
}

impl Ranked for SectorScore {
    fn ranking_score(&self) -> f64 {
        self.total_score
    }

    fn tie_key(&self) -> &str {
        &self.code
    }
}

/// Strength grade attached to a recommended sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectorStrength {
    Strong,
    Firm,
    Neutral,
    Soft,
    Weak,
}

impl SectorStrength {
    pub fn from_score(score: f64) -> Self {
        if score >= 75.0 {
            Self::Strong
        } else if score >= 65.0 {
            Self::Firm
        } else if score >= 55.0 {
            Self::Neutral
        } else if score >= 45.0 {
            Self::Soft
        } else {
            Self::Weak
        }
    }

    /// Operator guidance matching the grade.
    pub fn advice(self) -> &'static str {
        match self {
            Self::Strong => "priority focus",
            Self::Firm => "active watch",
            Self::Neutral => "moderate watch",
            Self::Soft => "careful watch",
            Self::Weak => "stand aside",
        }
    }
}

impl std::fmt::Display for SectorStrength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Strong => write!(f, "strong"),
            Self::Firm => write!(f, "firm"),
            Self::Neutral => write!(f, "neutral"),
            Self::Soft => write!(f, "soft"),
            Self::Weak => write!(f, "weak"),
        }
    }
}

/// A sector the screener recommends drilling into.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectorRecommendation {
    pub sector: SectorScore,
    pub strength: SectorStrength,
    pub reason: String,
}

/// Map a sector name to its risk bucket by industry keywords.
pub fn classify_risk_bucket(name: &str) -> RiskBucket {
    let lower = name.to_lowercase();
    if LOW_RISK_KEYWORDS.iter().any(|k| lower.contains(k)) {
        RiskBucket::Low
    } else if HIGH_RISK_KEYWORDS.iter().any(|k| lower.contains(k)) {
        RiskBucket::High
    } else {
        RiskBucket::Medium
    }
}

/// Sector-scope screening engine.
pub struct SectorAnalyzer {
    cfg: SectorConfig,
}

impl SectorAnalyzer {
    /// Build an analyzer, validating the config eagerly.
    pub fn new(cfg: SectorConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    /// Score a single snapshot row. Pure: no shared state, no IO.
    pub fn score_snapshot(&self, snap: &SectorSnapshot) -> SectorScore {
        let momentum_score = (50.0 + nan_to_zero(snap.change_pct) * 10.0).clamp(0.0, 100.0);
        let breadth_score = snap.up_ratio().clamp(0.0, 100.0);
        let attention_score =
            (50.0 + (nan_to_zero(snap.turnover_rate) - TURNOVER_BASELINE) * 10.0).clamp(0.0, 100.0);

        // Stability: larger caps damp swings; a leader running far past the
        // ideal gain reads as chase risk.
        let mut stability_score = 50.0;
        if snap.total_market_cap > 0.0 {
            let cap_term = (snap.total_market_cap.log10() - 2.0) * 10.0;
            stability_score += cap_term.clamp(-CAP_TERM_LIMIT, CAP_TERM_LIMIT);
        }
        if snap.leader_change_pct.is_finite() {
            stability_score -= (snap.leader_change_pct.abs() - IDEAL_LEADER_CHANGE).max(0.0);
        }
        let stability_score = stability_score.clamp(0.0, 100.0);

        let risk_bucket = classify_risk_bucket(&snap.name);
        let w = self.cfg.weights;
        let total_score = weighted_total(
            [
                (momentum_score, w.momentum),
                (breadth_score, w.breadth),
                (attention_score, w.attention),
                (stability_score, w.stability),
            ],
            Some(risk_bucket),
        );

        SectorScore {
            code: snap.code.clone(),
            name: snap.name.clone(),
            momentum_score,
            breadth_score,
            attention_score,
            stability_score,
            total_score,
            risk_bucket,
            change_pct: nan_to_zero(snap.change_pct),
            up_ratio: snap.up_ratio(),
            turnover_rate: nan_to_zero(snap.turnover_rate),
            member_count: snap.member_count(),
        }
    }

    /// Pre-filter, score and order the whole sector table, capped at the
    /// configured analysis width.
    pub fn rank_sectors(&self, snapshots: &[SectorSnapshot]) -> Vec<SectorScore> {
        let mut scored: Vec<SectorScore> = snapshots
            .iter()
            .filter(|s| !self.name_excluded(&s.name))
            .filter(|s| s.member_count() == 0 || s.member_count() >= self.cfg.min_member_count)
            .map(|s| self.score_snapshot(s))
            .collect();

        scored.sort_by(|a, b| {
            b.total_score
                .total_cmp(&a.total_score)
                .then_with(|| a.code.cmp(&b.code))
        });
        scored.truncate(self.cfg.max_sectors_to_analyze);

        debug!(
            analyzed = scored.len(),
            input = snapshots.len(),
            "sector table filtered and ranked"
        );
        scored
    }

    /// The sectors worth drilling into: top-N at or above the score floor,
    /// or the best three available when the whole market is weak.
    pub fn top_sectors(&self, snapshots: &[SectorSnapshot]) -> Vec<SectorRecommendation> {
        let ranked = self.rank_sectors(snapshots);
        if ranked.is_empty() {
            info!("no sectors survived filtering");
            return Vec::new();
        }

        let accepted: Vec<SectorScore> = ranked
            .iter()
            .filter(|s| s.total_score >= self.cfg.min_sector_score)
            .cloned()
            .collect();
        if accepted.is_empty() {
            info!(
                floor = self.cfg.min_sector_score,
                "no sector cleared the score floor; falling back to best available"
            );
        }
        let selected = rank_with_fallback(accepted, ranked, self.cfg.top_sectors, 3);

        selected
            .into_iter()
            .map(|sector| {
                let strength = SectorStrength::from_score(sector.total_score);
                let reason = recommendation_reason(&sector);
                SectorRecommendation {
                    sector,
                    strength,
                    reason,
                }
            })
            .collect()
    }

    fn name_excluded(&self, name: &str) -> bool {
        let upper = name.to_uppercase();
        self.cfg
            .name_blacklist
            .iter()
            .any(|marker| upper.contains(&marker.to_uppercase()))
    }
}

fn nan_to_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

fn recommendation_reason(sector: &SectorScore) -> String {
    let mut parts = Vec::new();
    if sector.change_pct >= 0.0 {
        parts.push(format!("sector up {:.2}%", sector.change_pct));
    } else {
        parts.push(format!("sector down {:.2}%", sector.change_pct.abs()));
    }
    if sector.up_ratio > 60.0 {
        parts.push(format!("{:.0}% of members advancing", sector.up_ratio));
    }
    if sector.turnover_rate > 3.0 {
        parts.push(format!("turnover {:.1}% (active)", sector.turnover_rate));
    }
    parts.join(", ")
}
