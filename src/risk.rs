// =============================================================================
// Position Sizing — flat per-trade fractions with an exposure cap
// =============================================================================
//
// Sizing is deliberately simple: the buy plan's fraction, capped by a
// per-risk-grade ceiling, scaled by the candidate's score, and bounded by the
// remaining portfolio headroom. There is no portfolio optimization here and
// none is planned.

use serde::{Deserialize, Serialize};

use crate::types::{Candidate, RiskLevel};

/// Portfolio-wide ceiling on committed capital.
const MAX_TOTAL_EXPOSURE: f64 = 0.8;

/// Per-instrument ceiling by risk grade.
fn grade_ceiling(level: RiskLevel) -> f64 {
    match level {
        RiskLevel::Low | RiskLevel::MediumLow => 0.10,
        RiskLevel::Medium | RiskLevel::MediumHigh => 0.07,
        RiskLevel::High => 0.04,
    }
}

/// A sized position suggestion for one candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Allocation {
    pub symbol: String,
    pub fraction: f64,
}

/// Flat per-trade position sizer.
#[derive(Debug, Clone)]
pub struct PositionSizer {
    max_total_exposure: f64,
}

impl Default for PositionSizer {
    fn default() -> Self {
        Self {
            max_total_exposure: MAX_TOTAL_EXPOSURE,
        }
    }
}

impl PositionSizer {
    /// Suggested capital fraction for one candidate given what is already
    /// committed. Zero for watch-grade plans or when the portfolio is full.
    pub fn size(&self, candidate: &Candidate, committed_fraction: f64) -> f64 {
        let base = candidate
            .plan
            .position_fraction
            .min(grade_ceiling(candidate.risk_level));
        let scaled = base * (candidate.total_score / 100.0).clamp(0.0, 1.0);
        let headroom = (self.max_total_exposure - committed_fraction).max(0.0);
        scaled.min(headroom).max(0.0)
    }

    /// Size a ranked candidate list in order, accumulating committed capital.
    pub fn allocate(&self, candidates: &[Candidate]) -> Vec<Allocation> {
        let mut committed = 0.0;
        let mut allocations = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let fraction = self.size(candidate, committed);
            committed += fraction;
            allocations.push(Allocation {
                symbol: candidate.symbol.clone(),
                fraction,
            });
        }
        allocations
    }
}
