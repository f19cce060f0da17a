//! Exponential Moving Average indicator, used as the candlestick trend filter.
//!
//! alpha = 2/(n+1). The first valid value (index n-1) is the SMA of the first
//! n closes; after that EMA[i] = EMA[i-1] + alpha * (C[i] - EMA[i-1]).

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::PriceBar;

pub fn calculate_ema(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    let indicator_type = IndicatorType::Ema(period);
    if period == 0 {
        return IndicatorSeries {
            indicator_type,
            values: Vec::new(),
        };
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut seed_sum = 0.0;
    let mut current: Option<f64> = None;

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            current = match current {
                Some(prev) => Some(prev + alpha * (bar.close - prev)),
                None => {
                    seed_sum += bar.close;
                    (i + 1 == period).then(|| seed_sum / period as f64)
                }
            };
            IndicatorPoint {
                date: bar.date,
                valid: current.is_some(),
                value: IndicatorValue::Simple(current.unwrap_or(0.0)),
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn closes(prices: &[f64]) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 10.0,
            })
            .collect()
    }

    #[test]
    fn seeded_with_sma() {
        let series = calculate_ema(&closes(&[2.0, 4.0, 6.0, 8.0]), 3);
        assert_eq!(series.simple_at(0), None);
        assert_eq!(series.simple_at(1), None);
        assert_relative_eq!(series.simple_at(2).unwrap(), 4.0);
    }

    #[test]
    fn recursion_after_seed() {
        let series = calculate_ema(&closes(&[2.0, 4.0, 6.0, 8.0, 3.0]), 3);
        // alpha = 0.5
        let e3 = 4.0 + 0.5 * (8.0 - 4.0);
        let e4 = e3 + 0.5 * (3.0 - e3);
        assert_relative_eq!(series.simple_at(3).unwrap(), e3);
        assert_relative_eq!(series.simple_at(4).unwrap(), e4);
    }

    #[test]
    fn falling_prices_give_falling_ema() {
        let series = calculate_ema(&closes(&[20.0, 19.0, 18.0, 17.0, 16.0, 15.0]), 2);
        for i in 2..6 {
            assert!(series.simple_at(i).unwrap() < series.simple_at(i - 1).unwrap());
        }
    }

    #[test]
    fn short_series_never_valid() {
        let series = calculate_ema(&closes(&[1.0, 2.0]), 14);
        assert_eq!(series.values.len(), 2);
        assert!(series.values.iter().all(|p| !p.valid));
        assert_eq!(series.indicator_type, IndicatorType::Ema(14));
    }

    #[test]
    fn zero_period_is_empty() {
        assert!(calculate_ema(&closes(&[1.0, 2.0]), 0).values.is_empty());
    }
}
