//! OHLCV price bar representation.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    /// high - low
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// |close - open|
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// Distance from the top of the body to the high.
    pub fn upper_wick(&self) -> f64 {
        self.high - self.open.max(self.close)
    }

    /// Distance from the bottom of the body to the low.
    pub fn lower_tail(&self) -> f64 {
        self.open.min(self.close) - self.low
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// A bar with no price range cannot be classified by shape.
    pub fn is_degenerate(&self) -> bool {
        self.range() <= 0.0
    }
}
