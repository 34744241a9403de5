// =============================================================================
// Volume Scorer — price/volume confirmation
// =============================================================================
//
// Rules (baseline 50):
//   ratio above threshold and price rising   => volume-confirmed-up   +15
//   ratio above threshold and price falling  => volume-confirmed-down -10
//   ratio below 0.8 and price falling        => quiet-pullback        +5
//   recent 5-bar volume mean above the older reference mean           +5

use serde::{Deserialize, Serialize};

use crate::config::ScreeningConfig;
use crate::indicators::momentum::pct_change;
use crate::indicators::volume::volume_ratio;
use crate::scoring::{clamp_category, BASELINE_SCORE};

/// Trailing window for the volume ratio baseline.
const VOLUME_WINDOW: usize = 20;
/// Price-change horizon paired against the volume reading.
const PRICE_HORIZON: usize = 5;
/// Below this ratio volume counts as dried-up.
const QUIET_RATIO: f64 = 0.8;

/// Price/volume relationship classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeState {
    ConfirmedUp,
    ConfirmedDown,
    QuietPullback,
    Flat,
}

/// Volume category result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeScore {
    pub score: f64,
    pub state: Option<VolumeState>,
    pub ratio: Option<f64>,
    /// Recent 5-bar volume mean above the older reference mean.
    pub trend_rising: Option<bool>,
}

impl VolumeScore {
    fn baseline() -> Self {
        Self {
            score: BASELINE_SCORE,
            state: None,
            ratio: None,
            trend_rising: None,
        }
    }
}

pub fn score(closes: &[f64], volumes: &[f64], cfg: &ScreeningConfig) -> VolumeScore {
    if volumes.len() < VOLUME_WINDOW || closes.len() < VOLUME_WINDOW {
        return VolumeScore::baseline();
    }

    let Some(ratio) = volume_ratio(volumes, VOLUME_WINDOW) else {
        // Degenerate volume data (all-zero trailing mean).
        return VolumeScore::baseline();
    };
    let price_change = pct_change(closes, PRICE_HORIZON).unwrap_or(0.0);

    let mut score = BASELINE_SCORE;

    let state = if ratio > cfg.volume_ratio_threshold && price_change > 0.0 {
        score += 15.0;
        VolumeState::ConfirmedUp
    } else if ratio > cfg.volume_ratio_threshold && price_change < 0.0 {
        score -= 10.0;
        VolumeState::ConfirmedDown
    } else if ratio < QUIET_RATIO && price_change < 0.0 {
        score += 5.0;
        VolumeState::QuietPullback
    } else {
        VolumeState::Flat
    };

    // Volume trend: last 5 bars versus the oldest 5 bars of the window.
    let n = volumes.len();
    let recent = volumes[n - 5..].iter().sum::<f64>() / 5.0;
    let older = volumes[n - VOLUME_WINDOW..n - VOLUME_WINDOW + 5].iter().sum::<f64>() / 5.0;
    let trend_rising = recent > older;
    if trend_rising {
        score += 5.0;
    }

    VolumeScore {
        score: clamp_category(score),
        state: Some(state),
        ratio: Some(ratio),
        trend_rising: Some(trend_rising),
    }
}
