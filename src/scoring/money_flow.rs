// =============================================================================
// Money-Flow Scorer — joint price/volume advance count
// =============================================================================
//
// Counts the bars among the last five where price and volume both rose
// versus the prior bar (a crude net-inflow proxy).
//
// Rules (baseline 50):
//   >= 3 such bars => inflow  +10
//   <= 1 such bar  => outflow -10
//   otherwise      => balanced

use serde::{Deserialize, Serialize};

use crate::scoring::{clamp_category, BASELINE_SCORE};

/// Bars inspected for the inflow count.
const FLOW_LOOKBACK: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowDirection {
    Inflow,
    Outflow,
    Balanced,
}

/// Money-flow category result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoneyFlowScore {
    pub score: f64,
    pub direction: Option<FlowDirection>,
    pub inflow_days: Option<u32>,
}

impl MoneyFlowScore {
    fn baseline() -> Self {
        Self {
            score: BASELINE_SCORE,
            direction: None,
            inflow_days: None,
        }
    }
}

pub fn score(closes: &[f64], volumes: &[f64]) -> MoneyFlowScore {
    // FLOW_LOOKBACK deltas need one extra bar.
    if closes.len() < FLOW_LOOKBACK + 1 || volumes.len() < FLOW_LOOKBACK + 1 {
        return MoneyFlowScore::baseline();
    }

    let n = closes.len();
    let mut inflow_days = 0u32;
    for i in n - FLOW_LOOKBACK..n {
        let price_up = closes[i] > closes[i - 1];
        let volume_up = volumes[i] > volumes[i - 1];
        if price_up && volume_up {
            inflow_days += 1;
        }
    }

    let mut score = BASELINE_SCORE;
    let direction = if inflow_days >= 3 {
        score += 10.0;
        FlowDirection::Inflow
    } else if inflow_days <= 1 {
        score -= 10.0;
        FlowDirection::Outflow
    } else {
        FlowDirection::Balanced
    };

    MoneyFlowScore {
        score: clamp_category(score),
        direction: Some(direction),
        inflow_days: Some(inflow_days),
    }
}
