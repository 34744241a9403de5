// =============================================================================
// Simple Moving Average
// =============================================================================

/// Mean of the last `window` values.
///
/// Returns `None` when `window` is zero or the slice is shorter than the
/// window.
pub fn sma(values: &[f64], window: usize) -> Option<f64> {
    if window == 0 || values.len() < window {
        return None;
    }
    let slice = &values[values.len() - window..];
    let mean = slice.iter().sum::<f64>() / window as f64;
    mean.is_finite().then_some(mean)
}

/// Mean of a `window`-length slice ending `ago` values before the last one.
///
/// `sma_ago(v, w, 0)` is identical to `sma(v, w)`. Used to read a moving
/// average's own history, e.g. the 20-bar mean as it stood five bars back.
pub fn sma_ago(values: &[f64], window: usize, ago: usize) -> Option<f64> {
    if window == 0 || values.len() < window + ago {
        return None;
    }
    let end = values.len() - ago;
    let slice = &values[end - window..end];
    let mean = slice.iter().sum::<f64>() / window as f64;
    mean.is_finite().then_some(mean)
}
