//! Indicators over closing prices, one point per bar.
//!
//! Points inside an indicator's warm-up are present but marked invalid, so a
//! series always lines up index for index with the bars it was computed from.

pub mod bollinger;
pub mod ema;
pub mod sma;
pub mod stddev;

use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: IndicatorValue,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Bollinger { upper: f64, middle: f64, lower: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Bollinger { period: usize, dev_factor: f64 },
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// Value of a single-line indicator at `index`, `None` during warmup or out of range.
    pub fn simple_at(&self, index: usize) -> Option<f64> {
        match self.values.get(index) {
            Some(IndicatorPoint {
                valid: true,
                value: IndicatorValue::Simple(v),
                ..
            }) => Some(*v),
            _ => None,
        }
    }

    /// (upper, middle, lower) at `index`, `None` during warmup or out of range.
    pub fn bands_at(&self, index: usize) -> Option<(f64, f64, f64)> {
        match self.values.get(index) {
            Some(IndicatorPoint {
                valid: true,
                value:
                    IndicatorValue::Bollinger {
                        upper,
                        middle,
                        lower,
                    },
                ..
            }) => Some((*upper, *middle, *lower)),
            _ => None,
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Bollinger { period, dev_factor } => {
                write!(f, "BOLLINGER({},{})", period, dev_factor)
            }
        }
    }
}
