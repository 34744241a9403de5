// =============================================================================
// Weighted Aggregator — category scores to one total
// =============================================================================
//
// total = sum(category_score * weight) over the configured weight map. A
// category the analysis did not produce contributes the baseline 50 through
// `AnalysisResult::normalized_score`, the one normalization path.
//
// The sector scope passes a risk bucket whose multiplier applies after the
// weighted sum. Clamping to [0, 100] and rounding to one decimal happen HERE
// and nowhere else — no other component re-clamps the total.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::scoring::{AnalysisResult, Category};
use crate::types::RiskBucket;

/// One category's contribution to the total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub category: Category,
    pub raw_score: f64,
    pub weight: f64,
    pub weighted: f64,
}

/// Aggregation output: the final bounded total plus its per-category makeup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateScore {
    pub total: f64,
    pub breakdown: Vec<ScoreBreakdown>,
}

/// Weighted sum with the optional risk-bucket multiplier, clamped to
/// [0, 100] and rounded to one decimal. Both screening scopes funnel their
/// totals through here — this is the single point where the total's bounds
/// are enforced.
pub fn weighted_total<I>(scores_and_weights: I, risk_bucket: Option<RiskBucket>) -> f64
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let mut total = 0.0;
    for (score, weight) in scores_and_weights {
        total += score * weight;
    }

    if let Some(bucket) = risk_bucket {
        total *= bucket.multiplier();
    }

    (total.clamp(0.0, 100.0) * 10.0).round() / 10.0
}

/// Combine an analysis into a single total score.
pub fn aggregate(
    analysis: &AnalysisResult,
    weights: &BTreeMap<Category, f64>,
    risk_bucket: Option<RiskBucket>,
) -> AggregateScore {
    let mut breakdown = Vec::with_capacity(weights.len());

    for (&category, &weight) in weights {
        let raw_score = analysis.normalized_score(category);
        breakdown.push(ScoreBreakdown {
            category,
            raw_score,
            weight,
            weighted: raw_score * weight,
        });
    }

    let total = weighted_total(
        breakdown.iter().map(|b| (b.raw_score, b.weight)),
        risk_bucket,
    );

    AggregateScore { total, breakdown }
}
