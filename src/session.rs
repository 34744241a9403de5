// =============================================================================
// Session Clock — which analysis mode to run right now
// =============================================================================
//
// The trading day splits into four windows:
//   before 09:30        pre-market analysis (plan the day)
//   09:30 - 09:45       opening-window monitor (confirm the plan live)
//   09:45 - 15:00       intraday analysis
//   after 15:00         post-market analysis (review on closed data)
//
// Operators can pin a mode through ARGUS_MODE instead of the clock.

use chrono::NaiveTime;

/// Analysis mode selected for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    PreMarket,
    OpenMonitor,
    Intraday,
    PostMarket,
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PreMarket => write!(f, "pre-market"),
            Self::OpenMonitor => write!(f, "open-monitor"),
            Self::Intraday => write!(f, "intraday"),
            Self::PostMarket => write!(f, "post-market"),
        }
    }
}

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).expect("valid session boundary")
}

/// Map a wall-clock time onto the session window.
pub fn choose_mode(now: NaiveTime) -> RunMode {
    if now < t(9, 30) {
        RunMode::PreMarket
    } else if now < t(9, 45) {
        RunMode::OpenMonitor
    } else if now < t(15, 0) {
        RunMode::Intraday
    } else {
        RunMode::PostMarket
    }
}

/// Parse an operator-supplied mode override.
pub fn parse_mode(raw: &str) -> Option<RunMode> {
    match raw.trim().to_lowercase().as_str() {
        "premarket" | "pre-market" => Some(RunMode::PreMarket),
        "open" | "open-monitor" | "monitor" => Some(RunMode::OpenMonitor),
        "intraday" => Some(RunMode::Intraday),
        "postmarket" | "post-market" => Some(RunMode::PostMarket),
        _ => None,
    }
}

/// Parse an operator-supplied market condition.
pub fn parse_condition(raw: &str) -> Option<crate::types::MarketCondition> {
    use crate::types::MarketCondition;
    match raw.trim().to_lowercase().as_str() {
        "normal" => Some(MarketCondition::Normal),
        "bull" => Some(MarketCondition::Bull),
        "bear" => Some(MarketCondition::Bear),
        "volatile" => Some(MarketCondition::Volatile),
        _ => None,
    }
}
