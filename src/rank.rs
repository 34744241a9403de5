// =============================================================================
// Ranker — deterministic ordering and truncation
// =============================================================================
//
// Sort is by score descending with ties broken by entity id ascending. The
// tie-break is part of the contract: two runs over the same data produce the
// same order no matter how discovery shuffled the input.
//
// When the gate turned everything away, `rank_with_fallback` returns the
// best-available top-K from the full scored set instead of an empty list —
// a deliberate escape hatch for uniformly weak sessions, not a bug.

use std::cmp::Ordering;

use crate::types::Candidate;

/// Anything the ranker can order: a score plus a stable identity key.
pub trait Ranked {
    fn ranking_score(&self) -> f64;
    /// Deterministic secondary key; ascending lexicographic order wins ties.
    fn tie_key(&self) -> &str;
}

impl Ranked for Candidate {
    fn ranking_score(&self) -> f64 {
        self.total_score
    }

    fn tie_key(&self) -> &str {
        &self.symbol
    }
}

fn compare<T: Ranked>(a: &T, b: &T) -> Ordering {
    b.ranking_score()
        .total_cmp(&a.ranking_score())
        .then_with(|| a.tie_key().cmp(b.tie_key()))
}

/// Sort descending by score (ties by id ascending) and keep the top `max`.
/// An empty input yields an empty output.
pub fn rank<T: Ranked>(mut items: Vec<T>, max: usize) -> Vec<T> {
    items.sort_by(compare);
    items.truncate(max);
    items
}

/// Rank the gate survivors, or — when none survived — the best `fallback_k`
/// of the full scored set.
pub fn rank_with_fallback<T: Ranked>(
    accepted: Vec<T>,
    all_scored: Vec<T>,
    max: usize,
    fallback_k: usize,
) -> Vec<T> {
    if accepted.is_empty() {
        rank(all_scored, fallback_k)
    } else {
        rank(accepted, max)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BuyPlan, RiskLevel, TradeAction};

    fn candidate(symbol: &str, total_score: f64) -> Candidate {
        Candidate {
            symbol: symbol.into(),
            name: symbol.into(),
            price: 20.0,
            change_pct: 1.0,
            sector_code: "BK0001".into(),
            total_score,
            risk_level: RiskLevel::from_score(total_score),
            entry_signal: Vec::new(),
            stop_loss: 18.0,
            target_price: 21.6,
            risk_reward_ratio: 0.8,
            rank_reasons: Vec::new(),
            plan: BuyPlan {
                action: TradeAction::Watch,
                buy_price_range: (0.0, 0.0),
                position_fraction: 0.0,
                holding_days: 0,
            },
        }
    }

    fn symbols(items: &[Candidate]) -> Vec<&str> {
        items.iter().map(|c| c.symbol.as_str()).collect()
    }

    #[test]
    fn higher_score_ranks_strictly_first() {
        let ranked = rank(
            vec![candidate("A", 61.0), candidate("B", 74.0), candidate("C", 68.5)],
            10,
        );
        assert_eq!(symbols(&ranked), ["B", "C", "A"]);
    }

    #[test]
    fn equal_scores_break_ties_by_symbol_ascending() {
        // Two candidates at exactly 72.3: output order follows the documented
        // tie-break (symbol ascending), not the insertion order.
        let forward = rank(vec![candidate("600100", 72.3), candidate("600050", 72.3)], 10);
        let reverse = rank(vec![candidate("600050", 72.3), candidate("600100", 72.3)], 10);
        assert_eq!(symbols(&forward), ["600050", "600100"]);
        assert_eq!(symbols(&forward), symbols(&reverse));
    }

    #[test]
    fn truncates_to_max() {
        let items: Vec<Candidate> = (0..8)
            .map(|i| candidate(&format!("60000{i}"), 50.0 + f64::from(i)))
            .collect();
        let ranked = rank(items, 3);
        assert_eq!(symbols(&ranked), ["600007", "600006", "600005"]);
    }

    #[test]
    fn empty_input_is_a_valid_terminal_output() {
        let ranked: Vec<Candidate> = rank(Vec::new(), 5);
        assert!(ranked.is_empty());
        let ranked = rank_with_fallback(Vec::<Candidate>::new(), Vec::new(), 5, 3);
        assert!(ranked.is_empty());
    }

    #[test]
    fn fallback_returns_best_available_when_gate_empties_the_set() {
        let all = vec![
            candidate("A", 42.0),
            candidate("B", 55.0),
            candidate("C", 48.0),
            candidate("D", 39.0),
        ];
        let ranked = rank_with_fallback(Vec::new(), all, 10, 3);
        assert_eq!(symbols(&ranked), ["B", "C", "A"]);
    }

    #[test]
    fn fallback_not_used_when_gate_accepted_candidates() {
        let accepted = vec![candidate("A", 62.0)];
        let all = vec![candidate("A", 62.0), candidate("B", 90.0)];
        let ranked = rank_with_fallback(accepted, all, 10, 3);
        assert_eq!(symbols(&ranked), ["A"]);
    }
}
