// =============================================================================
// Momentum — percent change over a fixed lookback
// =============================================================================

/// Percent change of the last value versus the value `horizon` entries
/// earlier: `(last / closes[len-1-horizon] - 1) * 100`.
///
/// Returns `None` when `horizon` is zero, the slice is too short, or the
/// reference value is non-positive (a zero base would make the ratio
/// meaningless).
pub fn pct_change(closes: &[f64], horizon: usize) -> Option<f64> {
    if horizon == 0 || closes.len() < horizon + 1 {
        return None;
    }
    let last = *closes.last()?;
    let base = closes[closes.len() - 1 - horizon];
    if base <= 0.0 {
        return None;
    }
    let change = (last / base - 1.0) * 100.0;
    change.is_finite().then_some(change)
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pct_change_empty() {
        assert!(pct_change(&[], 5).is_none());
    }

    #[test]
    fn pct_change_horizon_zero() {
        assert!(pct_change(&[1.0, 2.0], 0).is_none());
    }

    #[test]
    fn pct_change_needs_horizon_plus_one() {
        // 5 closes support a 4-day change but not a 5-day change.
        let v = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!(pct_change(&v, 5).is_none());
        assert!(pct_change(&v, 4).is_some());
    }

    #[test]
    fn pct_change_basic() {
        let v = [100.0, 101.0, 102.0, 110.0];
        // 3 days back: 110 / 100 - 1 = +10%.
        assert!((pct_change(&v, 3).unwrap() - 10.0).abs() < 1e-10);
        // 1 day back: 110 / 102 - 1.
        let expected = (110.0 / 102.0 - 1.0) * 100.0;
        assert!((pct_change(&v, 1).unwrap() - expected).abs() < 1e-10);
    }

    #[test]
    fn pct_change_negative_move() {
        let v = [100.0, 90.0];
        assert!((pct_change(&v, 1).unwrap() + 10.0).abs() < 1e-10);
    }

    #[test]
    fn pct_change_zero_base_rejected() {
        let v = [0.0, 10.0];
        assert!(pct_change(&v, 1).is_none());
    }
}
