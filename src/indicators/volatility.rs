// =============================================================================
// Volatility Metrics — annualized volatility and maximum drawdown
// =============================================================================

/// Trading days per year used to annualize daily return volatility.
const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Annualized volatility: sample standard deviation of daily simple returns
/// multiplied by sqrt(252).
///
/// Pairs with a non-positive base price are skipped; at least two usable
/// returns are required. A flat series legitimately yields 0.0.
pub fn annualized_volatility(closes: &[f64]) -> Option<f64> {
    let returns: Vec<f64> = closes
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .filter(|r| r.is_finite())
        .collect();

    if returns.len() < 2 {
        return None;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let vol = variance.sqrt() * TRADING_DAYS_PER_YEAR.sqrt();

    vol.is_finite().then_some(vol)
}

/// Maximum peak-to-trough decline over the series, as a positive fraction
/// (0.25 means a 25 % drawdown). Zero for a monotonically rising series.
pub fn max_drawdown(closes: &[f64]) -> Option<f64> {
    if closes.len() < 2 {
        return None;
    }

    let mut peak = f64::MIN;
    let mut worst = 0.0_f64;
    for &c in closes {
        if c > peak {
            peak = c;
        }
        if peak > 0.0 {
            let dd = (peak - c) / peak;
            if dd > worst {
                worst = dd;
            }
        }
    }

    worst.is_finite().then_some(worst)
}
