// =============================================================================
// Signal Generator — entry tags, stops, targets, and the buy-decision machine
// =============================================================================
//
// Turns one entity's analysis plus its latest quote into everything a trader
// acts on:
//
//   * risk grade (five buckets over the total score)
//   * entry tags (at most three positive conditions; none means "watch")
//   * stop loss: 20-bar rolling low discounted by 3%
//   * a three-state buy decision keyed on (total_score, entry_strength),
//     where entry strength is the count of matched tags
//   * per-state price band, position fraction and holding period, all
//     parameterized by the market condition profile
//   * target price and a guarded risk/reward ratio
//
// Every division here is guarded; no NaN or infinity leaves this module.

use serde::{Deserialize, Serialize};

use crate::indicators::range::rolling_low;
use crate::scoring::momentum::MomentumBand;
use crate::scoring::trend::TrendAlignment;
use crate::scoring::volatility::{DrawdownBand, VolatilityBand};
use crate::scoring::volume::VolumeState;
use crate::scoring::AnalysisResult;
use crate::types::{BuyPlan, EntryTag, MarketCondition, RiskLevel, TradeAction};

/// Stop sits 3% under the rolling low.
const STOP_LOSS_DISCOUNT: f64 = 0.97;
/// Substituted when `price - stop_loss <= 0` would break the ratio.
const FALLBACK_RISK_REWARD: f64 = 3.0;
/// At most this many tags make it into the entry signal.
const MAX_ENTRY_TAGS: usize = 3;
const MAX_RANK_REASONS: usize = 3;

// Buy-decision thresholds.
const AGGRESSIVE_SCORE: f64 = 75.0;
const AGGRESSIVE_STRENGTH: u32 = 2;
const CAUTIOUS_SCORE: f64 = 65.0;
const CAUTIOUS_STRENGTH: u32 = 1;

/// Per-condition strategy profile: capital fraction, holding period, and
/// profit target.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConditionProfile {
    pub position_fraction: f64,
    pub holding_days: u32,
    pub target_pct: f64,
}

impl MarketCondition {
    /// Strategy parameters per market condition.
    pub fn profile(self) -> ConditionProfile {
        match self {
            // Normal tape: standard size, standard patience.
            Self::Normal => ConditionProfile {
                position_fraction: 0.05,
                holding_days: 5,
                target_pct: 0.08,
            },
            // Bull tape: bigger size, faster targets.
            Self::Bull => ConditionProfile {
                position_fraction: 0.07,
                holding_days: 3,
                target_pct: 0.12,
            },
            // Bear tape: small size, low expectations, longer runway.
            Self::Bear => ConditionProfile {
                position_fraction: 0.03,
                holding_days: 7,
                target_pct: 0.05,
            },
            // Choppy tape: reduced size, modest target.
            Self::Volatile => ConditionProfile {
                position_fraction: 0.04,
                holding_days: 4,
                target_pct: 0.06,
            },
        }
    }
}

/// Full signal output for one entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub risk_level: RiskLevel,
    pub entry_signal: Vec<EntryTag>,
    pub entry_strength: u32,
    pub rank_reasons: Vec<String>,
    pub plan: BuyPlan,
    pub target_price: f64,
    pub risk_reward_ratio: f64,
}

/// Stop-loss level: the low of the last `window` bars (or of the whole
/// history when shorter) discounted by 3%. `None` only for an empty series.
pub fn stop_loss(lows: &[f64], window: usize) -> Option<f64> {
    if lows.is_empty() || window == 0 {
        return None;
    }
    let take = window.min(lows.len());
    rolling_low(lows, take).map(|low| low * STOP_LOSS_DISCOUNT)
}

/// Positive conditions matched by this analysis, in display order.
pub fn entry_tags(analysis: &AnalysisResult) -> Vec<EntryTag> {
    let mut tags = Vec::new();

    if analysis
        .trend
        .as_ref()
        .is_some_and(|t| t.alignment == Some(TrendAlignment::AlignedBullish))
    {
        tags.push(EntryTag::TrendUp);
    }
    if analysis
        .momentum
        .as_ref()
        .is_some_and(|m| m.band == Some(MomentumBand::Moderate))
    {
        tags.push(EntryTag::SteadyMomentum);
    }
    if analysis
        .volume
        .as_ref()
        .is_some_and(|v| v.state == Some(VolumeState::ConfirmedUp))
    {
        tags.push(EntryTag::VolumeSurge);
    }

    tags.truncate(MAX_ENTRY_TAGS);
    tags
}

/// Human-readable highlights for the ranking report, strongest first.
pub fn rank_reasons(analysis: &AnalysisResult) -> Vec<String> {
    let mut reasons = Vec::new();

    if let Some(trend) = &analysis.trend {
        match trend.alignment {
            Some(TrendAlignment::AlignedBullish) => {
                reasons.push("bullish MA alignment".to_string())
            }
            Some(TrendAlignment::AboveLong) => {
                reasons.push("holding above the long MA".to_string())
            }
            _ => {}
        }
    }
    if let Some(momentum) = &analysis.momentum {
        if momentum.band == Some(MomentumBand::Moderate) {
            reasons.push("steady short-term momentum".to_string());
        }
        if momentum.long_confirmed == Some(true) {
            reasons.push("medium-term trend intact".to_string());
        }
    }
    if let Some(volume) = &analysis.volume {
        if volume.state == Some(VolumeState::ConfirmedUp) {
            reasons.push("volume backs the move".to_string());
        }
    }
    if let Some(volatility) = &analysis.volatility {
        if volatility.band == Some(VolatilityBand::Low) {
            reasons.push("low volatility".to_string());
        }
        if volatility.drawdown_band == Some(DrawdownBand::Shallow) {
            reasons.push("drawdown well contained".to_string());
        }
    }

    reasons.truncate(MAX_RANK_REASONS);
    reasons
}

/// The buy-decision state machine: (total_score, entry_strength) to one of
/// three terminal states.
pub fn decide(total_score: f64, entry_strength: u32) -> TradeAction {
    if total_score >= AGGRESSIVE_SCORE && entry_strength >= AGGRESSIVE_STRENGTH {
        TradeAction::AggressiveBuy
    } else if total_score >= CAUTIOUS_SCORE && entry_strength >= CAUTIOUS_STRENGTH {
        TradeAction::CautiousBuy
    } else {
        TradeAction::Watch
    }
}

/// Estimate the prior close by reversing today's percent change off the
/// current price. Falls back to the current price when the change is
/// degenerate (at or beyond -100%).
fn estimate_prior_close(price: f64, change_pct: f64) -> f64 {
    let divisor = 1.0 + change_pct / 100.0;
    if divisor <= 0.0 || !divisor.is_finite() {
        return price;
    }
    let prior = price / divisor;
    if prior.is_finite() {
        prior
    } else {
        price
    }
}

/// Build the complete signal for one scored entity.
pub fn generate(
    analysis: &AnalysisResult,
    total_score: f64,
    price: f64,
    change_pct: f64,
    stop: f64,
    condition: MarketCondition,
) -> Signal {
    let profile = condition.profile();
    let tags = entry_tags(analysis);
    let entry_strength = tags.len() as u32;
    let action = decide(total_score, entry_strength);

    let prior_close = estimate_prior_close(price, change_pct);
    let plan = match action {
        TradeAction::AggressiveBuy => BuyPlan {
            action,
            buy_price_range: (prior_close * 0.99, prior_close * 1.02),
            position_fraction: profile.position_fraction,
            // One day of the move is already gone.
            holding_days: profile.holding_days.saturating_sub(1).max(1),
        },
        TradeAction::CautiousBuy => BuyPlan {
            action,
            buy_price_range: (prior_close * 0.985, prior_close * 1.01),
            position_fraction: profile.position_fraction * 0.7,
            holding_days: profile.holding_days,
        },
        TradeAction::Watch => BuyPlan {
            action,
            buy_price_range: (0.0, 0.0),
            position_fraction: 0.0,
            holding_days: 0,
        },
    };

    let target_price = price * (1.0 + profile.target_pct);
    let risk = price - stop;
    let reward = target_price - price;
    let risk_reward_ratio = if risk > 0.0 && reward.is_finite() {
        let ratio = reward / risk;
        if ratio.is_finite() {
            ratio
        } else {
            FALLBACK_RISK_REWARD
        }
    } else {
        FALLBACK_RISK_REWARD
    };

    Signal {
        risk_level: RiskLevel::from_score(total_score),
        entry_signal: tags,
        entry_strength,
        rank_reasons: rank_reasons(analysis),
        plan,
        target_price,
        risk_reward_ratio,
    }
}
