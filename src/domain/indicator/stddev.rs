//! Population standard deviation of closing prices over a window.

use crate::domain::ohlcv::PriceBar;

/// Mean and population standard deviation of the closes in `window`.
pub(crate) fn mean_and_stddev(window: &[PriceBar]) -> (f64, f64) {
    let n = window.len() as f64;
    let mean = window.iter().map(|b| b.close).sum::<f64>() / n;
    let variance = window
        .iter()
        .map(|b| (b.close - mean).powi(2))
        .sum::<f64>()
        / n;
    (mean, variance.sqrt())
}
