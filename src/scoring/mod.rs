// =============================================================================
// Category Scoring Module
// =============================================================================
//
// The multi-factor evaluation pipeline for a single entity: seven independent
// scorers, each starting at a baseline of 50 and applying additive deltas
// from closed-enum rules, clamped to [0, 100]. Per-entity analysis is a pure
// function of the series and config — no shared state, safe to run across a
// worker pool.
//
// String-labelled states are deliberately absent: every scorer exposes its
// classification as a typed variant so that downstream gates match
// exhaustively instead of comparing substrings.

pub mod aggregate;
pub mod money_flow;
pub mod momentum;
pub mod pattern;
pub mod position;
pub mod trend;
pub mod volatility;
pub mod volume;

use serde::{Deserialize, Serialize};

use crate::config::ScreeningConfig;
use crate::types::EntitySeries;

pub use aggregate::{aggregate, weighted_total, AggregateScore, ScoreBreakdown};

/// Score every category starts from before rule deltas apply.
pub const BASELINE_SCORE: f64 = 50.0;

/// The seven scoring dimensions of the instrument scope.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Trend,
    Momentum,
    Volume,
    Volatility,
    Position,
    MoneyFlow,
    Pattern,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Trend,
        Category::Momentum,
        Category::Volume,
        Category::Volatility,
        Category::Position,
        Category::MoneyFlow,
        Category::Pattern,
    ];
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trend => write!(f, "trend"),
            Self::Momentum => write!(f, "momentum"),
            Self::Volume => write!(f, "volume"),
            Self::Volatility => write!(f, "volatility"),
            Self::Position => write!(f, "position"),
            Self::MoneyFlow => write!(f, "money-flow"),
            Self::Pattern => write!(f, "pattern"),
        }
    }
}

/// Clamp a category score into its contract range. Scorers call this once,
/// right before returning.
pub(crate) fn clamp_category(score: f64) -> f64 {
    score.clamp(0.0, 100.0)
}

/// The complete multi-factor evaluation of one entity at one point in time.
///
/// A `None` category was not evaluated at all; a present category with
/// insufficient history carries the baseline score instead. Either way the
/// aggregator reads it through [`AnalysisResult::normalized_score`], the one
/// place where missing or non-finite inputs collapse to the baseline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub trend: Option<trend::TrendScore>,
    pub momentum: Option<momentum::MomentumScore>,
    pub volume: Option<volume::VolumeScore>,
    pub volatility: Option<volatility::VolatilityScore>,
    pub position: Option<position::PositionScore>,
    pub money_flow: Option<money_flow::MoneyFlowScore>,
    pub pattern: Option<pattern::PatternScore>,
}

impl AnalysisResult {
    /// Raw score for a category, if it was evaluated.
    pub fn score_of(&self, category: Category) -> Option<f64> {
        match category {
            Category::Trend => self.trend.as_ref().map(|s| s.score),
            Category::Momentum => self.momentum.as_ref().map(|s| s.score),
            Category::Volume => self.volume.as_ref().map(|s| s.score),
            Category::Volatility => self.volatility.as_ref().map(|s| s.score),
            Category::Position => self.position.as_ref().map(|s| s.score),
            Category::MoneyFlow => self.money_flow.as_ref().map(|s| s.score),
            Category::Pattern => self.pattern.as_ref().map(|s| s.score),
        }
    }

    /// Normalized score for aggregation: a missing or non-finite category
    /// reads as the baseline. This is the single fallback path — no other
    /// component applies its own default.
    pub fn normalized_score(&self, category: Category) -> f64 {
        self.score_of(category)
            .filter(|s| s.is_finite())
            .unwrap_or(BASELINE_SCORE)
    }
}

/// Run all seven category scorers over one entity series.
///
/// Pure and side-effect-free: identical inputs produce identical results, so
/// callers may fan entities out across threads freely.
pub fn analyze_series(series: &EntitySeries, cfg: &ScreeningConfig) -> AnalysisResult {
    let closes = series.closes();
    let volumes = series.volumes();
    let highs = series.highs();
    let lows = series.lows();

    AnalysisResult {
        trend: Some(trend::score(&closes, cfg)),
        momentum: Some(momentum::score(&closes, cfg)),
        volume: Some(volume::score(&closes, &volumes, cfg)),
        volatility: Some(volatility::score(&closes, cfg)),
        position: Some(position::score(&closes, &highs, &lows, cfg)),
        money_flow: Some(money_flow::score(&closes, &volumes)),
        pattern: Some(pattern::score(&closes)),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Bar;
    use chrono::NaiveDate;

    fn series(closes: &[f64]) -> EntitySeries {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let bars: Vec<Bar> = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar {
                date: start + chrono::Days::new(i as u64),
                open: c,
                high: c,
                low: c,
                close: c,
                volume: 1_000_000.0,
            })
            .collect();
        EntitySeries::new("600000", bars).unwrap()
    }

    #[test]
    fn one_bar_series_scores_baseline_everywhere() {
        let cfg = ScreeningConfig::default();
        let analysis = analyze_series(&series(&[10.0]), &cfg);
        for category in Category::ALL {
            assert!(
                (analysis.normalized_score(category) - BASELINE_SCORE).abs() < f64::EPSILON,
                "category {category} should sit at baseline for a 1-bar series"
            );
        }
    }

    #[test]
    fn normalized_score_defaults_missing_categories() {
        let analysis = AnalysisResult::default();
        assert!((analysis.normalized_score(Category::Trend) - 50.0).abs() < f64::EPSILON);
        assert!(analysis.score_of(Category::Trend).is_none());
    }

    #[test]
    fn rescoring_is_idempotent() {
        let cfg = ScreeningConfig::default();
        let closes: Vec<f64> = (0..60).map(|i| 50.0 + (i as f64 * 0.7).sin() * 3.0).collect();
        let s = series(&closes);
        let a = analyze_series(&s, &cfg);
        let b = analyze_series(&s, &cfg);
        for category in Category::ALL {
            assert_eq!(a.score_of(category), b.score_of(category));
        }
    }

    #[test]
    fn category_display_names() {
        assert_eq!(Category::MoneyFlow.to_string(), "money-flow");
        assert_eq!(Category::Trend.to_string(), "trend");
    }

    #[test]
    fn clamp_category_bounds() {
        assert_eq!(clamp_category(120.0), 100.0);
        assert_eq!(clamp_category(-5.0), 0.0);
        assert_eq!(clamp_category(62.5), 62.5);
    }
}
