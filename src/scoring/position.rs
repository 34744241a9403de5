// =============================================================================
// Position Scorer — where price sits inside the recent range
// =============================================================================
//
// Rules (baseline 50):
//   range position in [0.3, 0.7]  => safe-zone +15
//   above 0.7                     => near-high -10
//   below 0.3                     => near-low  -5
//
// A flat range yields no position reading and leaves the baseline untouched.

use serde::{Deserialize, Serialize};

use crate::config::ScreeningConfig;
use crate::indicators::range::range_position;
use crate::scoring::{clamp_category, BASELINE_SCORE};

const SAFE_ZONE_LOW: f64 = 0.3;
const SAFE_ZONE_HIGH: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionZone {
    SafeZone,
    NearHigh,
    NearLow,
}

/// Position category result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionScore {
    pub score: f64,
    pub zone: Option<PositionZone>,
    pub ratio: Option<f64>,
}

impl PositionScore {
    fn baseline() -> Self {
        Self {
            score: BASELINE_SCORE,
            zone: None,
            ratio: None,
        }
    }
}

pub fn score(closes: &[f64], highs: &[f64], lows: &[f64], cfg: &ScreeningConfig) -> PositionScore {
    let window = cfg.position_window;
    if closes.len() < window {
        return PositionScore::baseline();
    }

    let Some(ratio) = range_position(closes, highs, lows, window) else {
        return PositionScore::baseline();
    };

    let mut score = BASELINE_SCORE;
    let zone = if ratio > SAFE_ZONE_HIGH {
        score -= 10.0;
        PositionZone::NearHigh
    } else if ratio < SAFE_ZONE_LOW {
        score -= 5.0;
        PositionZone::NearLow
    } else {
        score += 15.0;
        PositionZone::SafeZone
    };

    PositionScore {
        score: clamp_category(score),
        zone: Some(zone),
        ratio: Some(ratio),
    }
}
