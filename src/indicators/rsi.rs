// =============================================================================
// Relative Strength Index (RSI) — simple-average variant
// =============================================================================
//
// Measures the speed and magnitude of recent price changes. This variant
// averages gains and losses with a plain mean over the last `period` deltas
// (no exponential smoothing):
//
//   avg_gain = mean(positive deltas), avg_loss = mean(|negative deltas|)
//   RS  = avg_gain / avg_loss
//   RSI = 100 - 100 / (1 + RS)
//
// Readings above 70 are conventionally overbought, below 30 oversold.

/// RSI over the last `period` price deltas, in [0, 100].
///
/// # Edge cases
/// - `period == 0` or fewer than `period + 1` closes => `None`
/// - no movement at all (both averages zero) => 50.0
/// - only gains (average loss zero) => 100.0
pub fn rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    let deltas = &closes[closes.len() - period - 1..];
    let (mut sum_gain, mut sum_loss) = (0.0_f64, 0.0_f64);
    for pair in deltas.windows(2) {
        let d = pair[1] - pair[0];
        if d > 0.0 {
            sum_gain += d;
        } else {
            sum_loss += -d;
        }
    }

    let avg_gain = sum_gain / period as f64;
    let avg_loss = sum_loss / period as f64;

    let value = if avg_gain == 0.0 && avg_loss == 0.0 {
        50.0 // No movement at all.
    } else if avg_loss == 0.0 {
        100.0 // Only gains.
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    };

    value.is_finite().then_some(value)
}
