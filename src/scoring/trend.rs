// =============================================================================
// Trend Scorer — moving-average alignment and long-MA slope
// =============================================================================
//
// Rules (baseline 50):
//   MA(short) > MA(mid) > MA(long) and price > MA(short)  => aligned-bullish +20
//   price > MA(long) only                                 => above-long     +10
//   anything else                                         => aligned-bearish -15
//   long MA above its own value 5 bars back               => +5

use serde::{Deserialize, Serialize};

use crate::config::ScreeningConfig;
use crate::indicators::sma::{sma, sma_ago};
use crate::scoring::{clamp_category, BASELINE_SCORE};

/// How far back the long MA is compared against itself for the slope bonus.
const SLOPE_LOOKBACK: usize = 5;

/// Moving-average stack classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendAlignment {
    AlignedBullish,
    AboveLong,
    AlignedBearish,
}

/// Trend category result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendScore {
    pub score: f64,
    /// `None` when the history is too short to read the MA stack.
    pub alignment: Option<TrendAlignment>,
    /// `None` when the long MA has no history `SLOPE_LOOKBACK` bars back.
    pub long_ma_rising: Option<bool>,
    pub ma_short: Option<f64>,
    pub ma_mid: Option<f64>,
    pub ma_long: Option<f64>,
}

impl TrendScore {
    fn baseline() -> Self {
        Self {
            score: BASELINE_SCORE,
            alignment: None,
            long_ma_rising: None,
            ma_short: None,
            ma_mid: None,
            ma_long: None,
        }
    }
}

pub fn score(closes: &[f64], cfg: &ScreeningConfig) -> TrendScore {
    let windows = cfg.ma_windows;

    let (Some(ma_short), Some(ma_mid), Some(ma_long)) = (
        sma(closes, windows.short),
        sma(closes, windows.mid),
        sma(closes, windows.long),
    ) else {
        return TrendScore::baseline();
    };
    let Some(&price) = closes.last() else {
        return TrendScore::baseline();
    };

    let mut score = BASELINE_SCORE;

    let alignment = if ma_short > ma_mid && ma_mid > ma_long && price > ma_short {
        score += 20.0;
        TrendAlignment::AlignedBullish
    } else if price > ma_long {
        score += 10.0;
        TrendAlignment::AboveLong
    } else {
        score -= 15.0;
        TrendAlignment::AlignedBearish
    };

    let long_ma_rising = sma_ago(closes, windows.long, SLOPE_LOOKBACK)
        .filter(|past| *past > 0.0)
        .map(|past| ma_long > past);
    if long_ma_rising == Some(true) {
        score += 5.0;
    }

    TrendScore {
        score: clamp_category(score),
        alignment: Some(alignment),
        long_ma_rising,
        ma_short: Some(ma_short),
        ma_mid: Some(ma_mid),
        ma_long: Some(ma_long),
    }
}
