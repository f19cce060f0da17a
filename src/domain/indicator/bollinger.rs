//! Bollinger bands: `middle = SMA(period)`, `upper/lower = middle ± dev_factor * sd`,
//! with `sd` the population standard deviation of the same window.

use crate::domain::indicator::stddev::mean_and_stddev;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::PriceBar;

pub fn calculate_bollinger(bars: &[PriceBar], period: usize, dev_factor: f64) -> IndicatorSeries {
    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let window = (period > 0 && i + 1 >= period).then(|| &bars[i + 1 - period..=i]);
            let value = match window {
                Some(window) => {
                    let (middle, sd) = mean_and_stddev(window);
                    IndicatorValue::Bollinger {
                        upper: middle + dev_factor * sd,
                        middle,
                        lower: middle - dev_factor * sd,
                    }
                }
                None => IndicatorValue::Bollinger {
                    upper: 0.0,
                    middle: 0.0,
                    lower: 0.0,
                },
            };
            IndicatorPoint {
                date: bar.date,
                valid: window.is_some(),
                value,
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Bollinger { period, dev_factor },
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
                volume: 500.0,
            })
            .collect()
    }

    #[test]
    fn first_full_window_is_first_valid_point() {
        let series = calculate_bollinger(&closes(&[10.0, 20.0, 30.0, 40.0, 50.0]), 3, 2.0);
        let valid: Vec<bool> = series.values.iter().map(|p| p.valid).collect();
        assert_eq!(valid, vec![false, false, true, true, true]);
        assert_eq!(series.values.len(), 5);
    }

    #[test]
    fn flat_prices_give_zero_width_bands() {
        let series = calculate_bollinger(&closes(&[100.0, 100.0, 100.0]), 3, 2.0);
        assert_eq!(series.bands_at(2), Some((100.0, 100.0, 100.0)));
    }

    #[test]
    fn bands_are_symmetric_around_the_mean() {
        let series = calculate_bollinger(&closes(&[10.0, 20.0, 30.0]), 3, 1.5);
        let (upper, middle, lower) = series.bands_at(2).unwrap();

        // squared deviations 100 + 0 + 100 over 3 bars
        let sd = (200.0_f64 / 3.0).sqrt();
        assert_relative_eq!(middle, 20.0);
        assert_relative_eq!(upper, 20.0 + 1.5 * sd, epsilon = 1e-10);
        assert_relative_eq!(lower, 20.0 - 1.5 * sd, epsilon = 1e-10);
    }

    #[test]
    fn zero_period_is_never_valid() {
        let series = calculate_bollinger(&closes(&[1.0, 2.0]), 0, 2.0);
        assert!(series.values.iter().all(|p| !p.valid));
    }
}
