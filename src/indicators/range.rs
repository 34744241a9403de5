// =============================================================================
// Rolling Range — window extremes and relative position
// =============================================================================

/// Lowest value over the last `window` entries.
pub fn rolling_low(values: &[f64], window: usize) -> Option<f64> {
    if window == 0 || values.len() < window {
        return None;
    }
    values[values.len() - window..]
        .iter()
        .copied()
        .fold(None, |acc: Option<f64>, v| match acc {
            Some(lo) if lo <= v => Some(lo),
            _ => Some(v),
        })
        .filter(|v| v.is_finite())
}

/// Highest value over the last `window` entries.
pub fn rolling_high(values: &[f64], window: usize) -> Option<f64> {
    if window == 0 || values.len() < window {
        return None;
    }
    values[values.len() - window..]
        .iter()
        .copied()
        .fold(None, |acc: Option<f64>, v| match acc {
            Some(hi) if hi >= v => Some(hi),
            _ => Some(v),
        })
        .filter(|v| v.is_finite())
}

/// Where the current close sits inside the recent high/low range:
/// `(close - low) / (high - low)`, in [0, 1].
///
/// Highs and lows are taken over the last `window` bars. Returns `None` on
/// insufficient data or a degenerate (flat) range, so callers never divide by
/// zero here.
pub fn range_position(
    closes: &[f64],
    highs: &[f64],
    lows: &[f64],
    window: usize,
) -> Option<f64> {
    let current = *closes.last()?;
    let high = rolling_high(highs, window)?;
    let low = rolling_low(lows, window)?;
    if high <= low {
        return None;
    }
    let ratio = (current - low) / (high - low);
    ratio.is_finite().then(|| ratio.clamp(0.0, 1.0))
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rolling_extremes_basic() {
        let v = [5.0, 1.0, 4.0, 2.0, 3.0];
        assert!((rolling_low(&v, 3).unwrap() - 2.0).abs() < 1e-12);
        assert!((rolling_high(&v, 3).unwrap() - 4.0).abs() < 1e-12);
        // Full window includes the leading 5 and 1.
        assert!((rolling_low(&v, 5).unwrap() - 1.0).abs() < 1e-12);
        assert!((rolling_high(&v, 5).unwrap() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn rolling_extremes_insufficient() {
        assert!(rolling_low(&[1.0, 2.0], 3).is_none());
        assert!(rolling_high(&[], 1).is_none());
        assert!(rolling_low(&[1.0], 0).is_none());
    }

    #[test]
    fn range_position_midpoint() {
        let highs = vec![110.0; 20];
        let lows = vec![90.0; 20];
        let mut closes = vec![100.0; 20];
        *closes.last_mut().unwrap() = 100.0;
        let p = range_position(&closes, &highs, &lows, 20).unwrap();
        assert!((p - 0.5).abs() < 1e-12);
    }

    #[test]
    fn range_position_at_extremes() {
        let highs = vec![110.0; 20];
        let lows = vec![90.0; 20];
        let mut closes = vec![100.0; 20];
        *closes.last_mut().unwrap() = 110.0;
        assert!((range_position(&closes, &highs, &lows, 20).unwrap() - 1.0).abs() < 1e-12);
        *closes.last_mut().unwrap() = 90.0;
        assert!(range_position(&closes, &highs, &lows, 20).unwrap().abs() < 1e-12);
    }

    #[test]
    fn range_position_flat_range_is_none() {
        let flat = vec![100.0; 20];
        assert!(range_position(&flat, &flat, &flat, 20).is_none());
    }

    #[test]
    fn range_position_clamps_outside_window_extremes() {
        // Close above the rolling high of the high series (gap day).
        let highs = vec![110.0; 20];
        let lows = vec![90.0; 20];
        let mut closes = vec![100.0; 20];
        *closes.last_mut().unwrap() = 115.0;
        assert!((range_position(&closes, &highs, &lows, 20).unwrap() - 1.0).abs() < 1e-12);
    }
}
