//! Data quality summary of a loaded price series.

use chrono::NaiveDate;

use super::ohlcv::PriceBar;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const IQR_FENCE: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl Column {
    pub const ALL: [Column; 5] = [
        Column::Open,
        Column::High,
        Column::Low,
        Column::Close,
        Column::Volume,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Column::Open => "open",
            Column::High => "high",
            Column::Low => "low",
            Column::Close => "close",
            Column::Volume => "volume",
        }
    }

    fn get(&self, bar: &PriceBar) -> f64 {
        match self {
            Column::Open => bar.open,
            Column::High => bar.high,
            Column::Low => bar.low,
            Column::Close => bar.close,
            Column::Volume => bar.volume,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStats {
    pub column: Column,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Values outside `[q1 - 1.5 iqr, q3 + 1.5 iqr]`.
    pub outliers: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataScan {
    pub bars: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub columns: Vec<ColumnStats>,
    /// Bars with `high <= low`; no candle shape can match them.
    pub zero_range_bars: usize,
    /// Bars whose high/low do not bracket open and close.
    pub inconsistent_bars: usize,
    pub peak_volume_date: Option<NaiveDate>,
    /// Sample stddev of close-to-close returns, annualised.
    pub annualized_volatility: f64,
}

pub fn scan(bars: &[PriceBar]) -> DataScan {
    let columns = if bars.is_empty() {
        Vec::new()
    } else {
        Column::ALL
            .iter()
            .map(|&column| column_stats(bars, column))
            .collect()
    };

    let zero_range_bars = bars.iter().filter(|b| b.is_degenerate()).count();
    let inconsistent_bars = bars
        .iter()
        .filter(|b| b.high < b.open.max(b.close) || b.low > b.open.min(b.close))
        .count();

    // earliest bar wins a tie
    let peak_volume_date = bars
        .iter()
        .reduce(|best, b| if b.volume > best.volume { b } else { best })
        .map(|b| b.date);

    DataScan {
        bars: bars.len(),
        first_date: bars.first().map(|b| b.date),
        last_date: bars.last().map(|b| b.date),
        columns,
        zero_range_bars,
        inconsistent_bars,
        peak_volume_date,
        annualized_volatility: annualized_volatility(bars),
    }
}

fn column_stats(bars: &[PriceBar], column: Column) -> ColumnStats {
    let mut values: Vec<f64> = bars.iter().map(|b| column.get(b)).collect();
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.sort_by(f64::total_cmp);

    let q1 = quantile(&values, 0.25);
    let q3 = quantile(&values, 0.75);
    let iqr = q3 - q1;
    let (lower, upper) = (q1 - IQR_FENCE * iqr, q3 + IQR_FENCE * iqr);
    let outliers = values.iter().filter(|&&v| v < lower || v > upper).count();

    ColumnStats {
        column,
        min: values[0],
        max: values[values.len() - 1],
        mean,
        outliers,
    }
}

/// Linear-interpolated quantile of sorted, non-empty data.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

fn annualized_volatility(bars: &[PriceBar]) -> f64 {
    let returns: Vec<f64> = bars
        .windows(2)
        .filter(|w| w[0].close > 0.0)
        .map(|w| w[1].close / w[0].close - 1.0)
        .collect();
    if returns.len() < 2 {
        return 0.0;
    }
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt() * TRADING_DAYS_PER_YEAR.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn bar(day: u32, open: f64, high: f64, low: f64, close: f64, volume: f64) -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            open,
            high,
            low,
            close,
            volume,
        }
    }

    #[test]
    fn empty_series() {
        let s = scan(&[]);
        assert_eq!(s.bars, 0);
        assert!(s.first_date.is_none());
        assert!(s.columns.is_empty());
        assert_relative_eq!(s.annualized_volatility, 0.0);
    }

    #[test]
    fn counts_and_ranges() {
        let bars = vec![
            bar(1, 10.0, 11.0, 9.0, 10.5, 100.0),
            bar(2, 10.5, 10.5, 10.5, 10.5, 0.0),
            bar(3, 10.5, 10.0, 9.0, 9.5, 300.0),
        ];
        let s = scan(&bars);
        assert_eq!(s.bars, 3);
        assert_eq!(s.first_date, Some(bars[0].date));
        assert_eq!(s.last_date, Some(bars[2].date));
        assert_eq!(s.zero_range_bars, 1);
        // bar 3: high 10.0 below open 10.5
        assert_eq!(s.inconsistent_bars, 1);
        assert_eq!(s.peak_volume_date, Some(bars[2].date));

        let volume = &s.columns[4];
        assert_eq!(volume.column, Column::Volume);
        assert_relative_eq!(volume.min, 0.0);
        assert_relative_eq!(volume.max, 300.0);
        assert_relative_eq!(volume.mean, 400.0 / 3.0);
    }

    #[test]
    fn peak_volume_tie_keeps_first_date() {
        let bars = vec![
            bar(1, 10.0, 11.0, 9.0, 10.0, 50.0),
            bar(2, 10.0, 11.0, 9.0, 10.0, 500.0),
            bar(3, 10.0, 11.0, 9.0, 10.0, 200.0),
            bar(4, 10.0, 11.0, 9.0, 10.0, 500.0),
        ];
        assert_eq!(scan(&bars).peak_volume_date, Some(bars[1].date));
    }

    #[test]
    fn quantile_interpolates() {
        let data = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(quantile(&data, 0.25), 1.75);
        assert_relative_eq!(quantile(&data, 0.75), 3.25);
        assert_relative_eq!(quantile(&[5.0], 0.5), 5.0);
    }

    #[test]
    fn iqr_flags_spike() {
        let mut bars: Vec<PriceBar> = (1..=9)
            .map(|d| bar(d, 10.0, 10.5, 9.5, 10.0 + d as f64 * 0.01, 100.0))
            .collect();
        bars.push(bar(10, 10.0, 10.5, 9.5, 10.1, 10_000.0));
        let s = scan(&bars);
        assert_eq!(s.columns[4].outliers, 1);
    }

    #[test]
    fn volatility_of_constant_growth_is_zero() {
        let bars: Vec<PriceBar> = (1..=5)
            .map(|d| {
                let close = 100.0 * 1.01_f64.powi(d as i32);
                bar(d, close, close, close, close, 1.0)
            })
            .collect();
        assert!(scan(&bars).annualized_volatility < 1e-9);
    }
}
