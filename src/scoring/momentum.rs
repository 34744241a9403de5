// =============================================================================
// Momentum Scorer — banded 5-day change, 20-day confirmation, RSI sanity
// =============================================================================
//
// Rules (baseline 50):
//   5-day change inside [min, max] band  => moderate   +15
//   above the band                       => excessive  -10
//   below the band                       => insufficient -5
//   20-day change at or above the floor  => confirmed  +10, else -5
//   RSI-14 in [30, 70]                   => healthy    +5, else -5
//
// A sub-rule whose input is undefined applies no delta at all; there is no
// silent zero standing in for a missing reading.

use serde::{Deserialize, Serialize};

use crate::config::ScreeningConfig;
use crate::indicators::momentum::pct_change;
use crate::indicators::rsi::rsi;
use crate::scoring::{clamp_category, BASELINE_SCORE};

const RSI_PERIOD: usize = 14;
const SHORT_HORIZON: usize = 5;
const LONG_HORIZON: usize = 20;

/// Where the 5-day change sits relative to the configured band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MomentumBand {
    Moderate,
    Excessive,
    Insufficient,
}

/// RSI classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RsiZone {
    Healthy,
    Overbought,
    Oversold,
}

/// Momentum category result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MomentumScore {
    pub score: f64,
    pub band: Option<MomentumBand>,
    /// Whether the 20-day change cleared the confirmation floor.
    pub long_confirmed: Option<bool>,
    pub rsi_zone: Option<RsiZone>,
    pub change_5d: Option<f64>,
    pub change_20d: Option<f64>,
    pub rsi: Option<f64>,
}

impl MomentumScore {
    fn baseline() -> Self {
        Self {
            score: BASELINE_SCORE,
            band: None,
            long_confirmed: None,
            rsi_zone: None,
            change_5d: None,
            change_20d: None,
            rsi: None,
        }
    }
}

pub fn score(closes: &[f64], cfg: &ScreeningConfig) -> MomentumScore {
    if closes.len() < cfg.ma_windows.long {
        return MomentumScore::baseline();
    }

    let mut score = BASELINE_SCORE;

    // --- 5-day band ----------------------------------------------------------
    let change_5d = pct_change(closes, SHORT_HORIZON);
    let band = change_5d.map(|c| {
        if c > cfg.max_5d_change {
            score -= 10.0;
            MomentumBand::Excessive
        } else if c >= cfg.min_5d_change {
            score += 15.0;
            MomentumBand::Moderate
        } else {
            score -= 5.0;
            MomentumBand::Insufficient
        }
    });

    // --- 20-day confirmation -------------------------------------------------
    let change_20d = pct_change(closes, LONG_HORIZON);
    let long_confirmed = change_20d.map(|c| {
        let confirmed = c >= cfg.min_20d_change;
        score += if confirmed { 10.0 } else { -5.0 };
        confirmed
    });

    // --- RSI sanity ----------------------------------------------------------
    let rsi_value = rsi(closes, RSI_PERIOD);
    let rsi_zone = rsi_value.map(|v| {
        if v > 70.0 {
            score -= 5.0;
            RsiZone::Overbought
        } else if v < 30.0 {
            score -= 5.0;
            RsiZone::Oversold
        } else {
            score += 5.0;
            RsiZone::Healthy
        }
    });

    MomentumScore {
        score: clamp_category(score),
        band,
        long_confirmed,
        rsi_zone,
        change_5d,
        change_20d,
        rsi: rsi_value,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> ScreeningConfig {
        ScreeningConfig::default()
    }

    #[test]
    fn short_history_returns_baseline() {
        let closes = vec![100.0; 10];
        let result = score(&closes, &cfg());
        assert!((result.score - 50.0).abs() < f64::EPSILON);
        assert!(result.band.is_none());
    }

    #[test]
    fn steady_rise_is_moderate_and_confirmed() {
        // 100..=120: 5d change = 120/115 - 1 = +4.35%, 20d = +20%.
        let closes: Vec<f64> = (100..=120).map(f64::from).collect();
        let result = score(&closes, &cfg());
        assert_eq!(result.band, Some(MomentumBand::Moderate));
        assert_eq!(result.long_confirmed, Some(true));
        assert_eq!(result.rsi_zone, Some(RsiZone::Overbought));
        // 50 + 15 + 10 - 5
        assert!((result.score - 70.0).abs() < f64::EPSILON);
        assert!((result.change_5d.unwrap() - 4.3478).abs() < 1e-3);
    }

    #[test]
    fn spike_is_excessive() {
        // Flat for 20 bars, then a 20% jump inside 5 days.
        let mut closes = vec![100.0; 20];
        closes.extend_from_slice(&[104.0, 108.0, 112.0, 116.0, 120.0]);
        let result = score(&closes, &cfg());
        assert_eq!(result.band, Some(MomentumBand::Excessive));
    }

    #[test]
    fn flat_series_is_insufficient_with_healthy_rsi() {
        let closes = vec![100.0; 25];
        let result = score(&closes, &cfg());
        assert_eq!(result.band, Some(MomentumBand::Insufficient));
        assert_eq!(result.long_confirmed, Some(false));
        assert_eq!(result.rsi_zone, Some(RsiZone::Healthy));
        // 50 - 5 - 5 + 5
        assert!((result.score - 45.0).abs() < f64::EPSILON);
    }

    #[test]
    fn exactly_twenty_bars_has_no_long_reading() {
        // 20 closes support the 5-day horizon but not the 20-day one; the
        // confirmation sub-rule applies no delta rather than a penalty.
        let closes: Vec<f64> = (101..=120).map(f64::from).collect();
        let result = score(&closes, &cfg());
        assert!(result.long_confirmed.is_none());
        assert_eq!(result.band, Some(MomentumBand::Moderate));
        // 50 + 15 (moderate) - 5 (overbought RSI)
        assert!((result.score - 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn oversold_rsi_penalised() {
        let closes: Vec<f64> = (0..25).map(|i| 200.0 - f64::from(i)).collect();
        let result = score(&closes, &cfg());
        assert_eq!(result.rsi_zone, Some(RsiZone::Oversold));
    }
}
