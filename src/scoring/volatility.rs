// =============================================================================
// Volatility Scorer — annualized volatility band and drawdown control
// =============================================================================
//
// Rules (baseline 50):
//   annualized volatility <= 0.25       => low    +15
//   <= configured ceiling               => medium +5
//   above the ceiling                   => high   -15
//   max drawdown < 10%                  => shallow  +10
//   < 15%                               => moderate +5
//   >= 15%                              => deep     -10

use serde::{Deserialize, Serialize};

use crate::config::ScreeningConfig;
use crate::indicators::volatility::{annualized_volatility, max_drawdown};
use crate::scoring::{clamp_category, BASELINE_SCORE};

/// Minimum bars before a volatility reading is attempted.
const MIN_BARS: usize = 20;
/// Below this annualized volatility an instrument counts as calm.
const LOW_VOL_CEILING: f64 = 0.25;
const SHALLOW_DRAWDOWN: f64 = 0.10;
const MODERATE_DRAWDOWN: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolatilityBand {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawdownBand {
    Shallow,
    Moderate,
    Deep,
}

/// Volatility category result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolatilityScore {
    pub score: f64,
    pub band: Option<VolatilityBand>,
    pub drawdown_band: Option<DrawdownBand>,
    pub annualized: Option<f64>,
    pub max_drawdown: Option<f64>,
}

impl VolatilityScore {
    fn baseline() -> Self {
        Self {
            score: BASELINE_SCORE,
            band: None,
            drawdown_band: None,
            annualized: None,
            max_drawdown: None,
        }
    }
}

pub fn score(closes: &[f64], cfg: &ScreeningConfig) -> VolatilityScore {
    if closes.len() < MIN_BARS {
        return VolatilityScore::baseline();
    }

    let mut score = BASELINE_SCORE;

    let annualized = annualized_volatility(closes);
    let band = annualized.map(|vol| {
        if vol <= LOW_VOL_CEILING {
            score += 15.0;
            VolatilityBand::Low
        } else if vol <= cfg.max_volatility {
            score += 5.0;
            VolatilityBand::Medium
        } else {
            score -= 15.0;
            VolatilityBand::High
        }
    });

    let drawdown = max_drawdown(closes);
    let drawdown_band = drawdown.map(|dd| {
        if dd < SHALLOW_DRAWDOWN {
            score += 10.0;
            DrawdownBand::Shallow
        } else if dd < MODERATE_DRAWDOWN {
            score += 5.0;
            DrawdownBand::Moderate
        } else {
            score -= 10.0;
            DrawdownBand::Deep
        }
    });

    VolatilityScore {
        score: clamp_category(score),
        band,
        drawdown_band,
        annualized,
        max_drawdown: drawdown,
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

    /// Geometric series with alternating +pct / -pct daily moves.
    fn alternating(pct: f64, n: usize) -> Vec<f64> {
        let mut closes = vec![100.0];
        for i in 0..n {
            let last = *closes.last().unwrap();
            closes.push(last * if i % 2 == 0 { 1.0 + pct } else { 1.0 - pct });
        }
        closes
    }

    #[test]
    fn short_history_returns_baseline() {
        let result = score(&[100.0; 10], &cfg());
        assert!((result.score - 50.0).abs() < f64::EPSILON);
        assert!(result.band.is_none());
    }

    #[test]
    fn calm_rising_series_is_low_band() {
        let closes: Vec<f64> = (100..=120).map(f64::from).collect();
        let result = score(&closes, &cfg());
        assert_eq!(result.band, Some(VolatilityBand::Low));
        assert_eq!(result.drawdown_band, Some(DrawdownBand::Shallow));
        // +15 low vol, +10 shallow drawdown.
        assert!((result.score - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn wild_series_is_high_band() {
        // +-5% daily: annualized volatility ~0.79, far above the 0.40 ceiling.
        let closes = alternating(0.05, 30);
        let result = score(&closes, &cfg());
        assert_eq!(result.band, Some(VolatilityBand::High));
        assert!(result.annualized.unwrap() > cfg().max_volatility);
    }

    #[test]
    fn medium_band_between_ceilings() {
        // +-2% daily: annualized volatility ~0.32, between 0.25 and 0.40.
        let closes = alternating(0.02, 30);
        let result = score(&closes, &cfg());
        assert_eq!(result.band, Some(VolatilityBand::Medium));
        let vol = result.annualized.unwrap();
        assert!(vol > LOW_VOL_CEILING && vol <= cfg().max_volatility);
    }

    #[test]
    fn deep_drawdown_penalised() {
        // Calm rise, then a 20% slide.
        let mut closes: Vec<f64> = (100..=120).map(f64::from).collect();
        for i in 1..=10 {
            closes.push(120.0 - f64::from(i) * 2.4);
        }
        let result = score(&closes, &cfg());
        assert_eq!(result.drawdown_band, Some(DrawdownBand::Deep));
    }
}
