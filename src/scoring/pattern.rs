// =============================================================================
// Pattern Scorer — basic structure recognition
// =============================================================================
//
// Rules (baseline 50):
//   narrow 10-bar range (range / mean < 5%)   => consolidation      +5
//   price > MA(20) > MA(60)                   => uptrend-structure +10
//
// The 60-bar structural MA simply stays unread on shorter histories; the
// consolidation check still runs.

use serde::{Deserialize, Serialize};

use crate::indicators::range::{rolling_high, rolling_low};
use crate::indicators::sma::sma;
use crate::scoring::{clamp_category, BASELINE_SCORE};

/// Minimum bars before any pattern reading is attempted.
const MIN_BARS: usize = 20;
const CONSOLIDATION_WINDOW: usize = 10;
const NARROW_RANGE_FRACTION: f64 = 0.05;
const STRUCTURE_MA_MID: usize = 20;
const STRUCTURE_MA_LONG: usize = 60;

/// Pattern category result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternScore {
    pub score: f64,
    pub consolidation: bool,
    pub uptrend_structure: bool,
}

impl PatternScore {
    fn baseline() -> Self {
        Self {
            score: BASELINE_SCORE,
            consolidation: false,
            uptrend_structure: false,
        }
    }
}

pub fn score(closes: &[f64]) -> PatternScore {
    if closes.len() < MIN_BARS {
        return PatternScore::baseline();
    }

    let mut score = BASELINE_SCORE;

    // --- Consolidation: narrow recent range ---------------------------------
    let consolidation = match (
        rolling_high(closes, CONSOLIDATION_WINDOW),
        rolling_low(closes, CONSOLIDATION_WINDOW),
        sma(closes, CONSOLIDATION_WINDOW),
    ) {
        (Some(high), Some(low), Some(mean)) if mean > 0.0 => {
            (high - low) / mean < NARROW_RANGE_FRACTION
        }
        _ => false,
    };
    if consolidation {
        score += 5.0;
    }

    // --- Uptrend structure: price above stacked structural MAs --------------
    let uptrend_structure = match (
        closes.last(),
        sma(closes, STRUCTURE_MA_MID),
        sma(closes, STRUCTURE_MA_LONG),
    ) {
        (Some(&price), Some(ma_mid), Some(ma_long)) => price > ma_mid && ma_mid > ma_long,
        _ => false,
    };
    if uptrend_structure {
        score += 10.0;
    }

    PatternScore {
        score: clamp_category(score),
        consolidation,
        uptrend_structure,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_history_returns_baseline() {
        let result = score(&[100.0; 10]);
        assert!((result.score - 50.0).abs() < f64::EPSILON);
        assert!(!result.consolidation);
    }

    #[test]
    fn tight_range_is_consolidation() {
        // 20 bars drifting within +-1% of 100.
        let closes: Vec<f64> = (0..20)
            .map(|i| 100.0 + if i % 2 == 0 { 0.5 } else { -0.5 })
            .collect();
        let result = score(&closes);
        assert!(result.consolidation);
        assert!(!result.uptrend_structure);
        assert!((result.score - 55.0).abs() < f64::EPSILON);
    }

    #[test]
    fn wide_swings_are_not_consolidation() {
        let closes: Vec<f64> = (0..20)
            .map(|i| 100.0 + if i % 2 == 0 { 10.0 } else { -10.0 })
            .collect();
        let result = score(&closes);
        assert!(!result.consolidation);
    }

    #[test]
    fn long_rise_has_uptrend_structure() {
        let closes: Vec<f64> = (0..70).map(|i| 100.0 + f64::from(i)).collect();
        let result = score(&closes);
        assert!(result.uptrend_structure);
        assert!((result.score - 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn structure_needs_sixty_bars() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + f64::from(i)).collect();
        let result = score(&closes);
        assert!(!result.uptrend_structure);
    }
}
