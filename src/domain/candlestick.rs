//! Candlestick shape classification and EMA trend filter.
//!
//! Shape ratios are defined once for every pattern:
//! - `body_ratio`: maximum body as a fraction of the bar range
//! - `tail_ratio`: minimum lower tail as a multiple of the body
//! - `wick_ratio`: maximum upper wick as a multiple of the body
//!
//! A degenerate bar (high == low) matches no shape.

use crate::domain::indicator::IndicatorSeries;
use crate::domain::ohlcv::PriceBar;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HammerShape {
    pub body_ratio: f64,
    pub tail_ratio: f64,
    pub wick_ratio: f64,
}

impl Default for HammerShape {
    fn default() -> Self {
        HammerShape {
            body_ratio: 0.3,
            tail_ratio: 2.0,
            wick_ratio: 0.1,
        }
    }
}

/// Small body near the top of the range with a long lower tail.
fn has_hammer_geometry(bar: &PriceBar, shape: &HammerShape) -> bool {
    if bar.is_degenerate() {
        return false;
    }
    let body = bar.body();
    body <= bar.range() * shape.body_ratio
        && bar.lower_tail() >= body * shape.tail_ratio
        && bar.upper_wick() <= body * shape.wick_ratio
}

pub fn is_bullish_hammer(bar: &PriceBar, shape: &HammerShape) -> bool {
    bar.is_bullish() && has_hammer_geometry(bar, shape)
}

/// Hammer geometry closing below its open.
pub fn is_bearish_hanging_man(bar: &PriceBar, shape: &HammerShape) -> bool {
    bar.is_bearish() && has_hammer_geometry(bar, shape)
}

/// Near-zero body whose upper wick is no longer than the body.
pub fn is_dragonfly_doji(bar: &PriceBar, body_ratio: f64) -> bool {
    if bar.is_degenerate() {
        return false;
    }
    let body = bar.body();
    body <= bar.range() * body_ratio && bar.upper_wick() <= body
}

/// Close below a falling EMA. Needs EMA values for `index` and `index - 1`.
pub fn is_downtrend(bars: &[PriceBar], ema: &IndicatorSeries, index: usize) -> bool {
    match trend_points(ema, index) {
        Some((prev, curr)) => bars[index].close < curr && curr < prev,
        None => false,
    }
}

/// Close above a rising EMA. Needs EMA values for `index` and `index - 1`.
pub fn is_uptrend(bars: &[PriceBar], ema: &IndicatorSeries, index: usize) -> bool {
    match trend_points(ema, index) {
        Some((prev, curr)) => bars[index].close > curr && curr > prev,
        None => false,
    }
}

fn trend_points(ema: &IndicatorSeries, index: usize) -> Option<(f64, f64)> {
    let prev = ema.simple_at(index.checked_sub(1)?)?;
    let curr = ema.simple_at(index)?;
    Some((prev, curr))
}
