// =============================================================================
// Volume Ratio — latest volume versus its trailing mean
// =============================================================================

/// Latest volume divided by the mean volume of the last `window` bars
/// (the latest bar is part of the window, matching a rolling mean read on
/// the most recent bar).
///
/// Returns `None` on insufficient data or a non-positive trailing mean.
pub fn volume_ratio(volumes: &[f64], window: usize) -> Option<f64> {
    if window == 0 || volumes.len() < window {
        return None;
    }
    let latest = *volumes.last()?;
    let mean = volumes[volumes.len() - window..].iter().sum::<f64>() / window as f64;
    if mean <= 0.0 {
        return None;
    }
    let ratio = latest / mean;
    ratio.is_finite().then_some(ratio)
}
