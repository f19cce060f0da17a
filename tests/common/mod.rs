#![allow(dead_code)]

use chrono::NaiveDate;
use std::io::Write;
use sweeptrader::domain::error::SweeptraderError;
pub use sweeptrader::domain::ohlcv::PriceBar;
use sweeptrader::ports::data_port::DataPort;

pub struct MockDataPort {
    pub bars: Vec<PriceBar>,
}

impl DataPort for MockDataPort {
    fn load_series(&self, source: &str) -> Result<Vec<PriceBar>, SweeptraderError> {
        if source.is_empty() {
            return Err(SweeptraderError::data_format("empty source"));
        }
        Ok(self.bars.clone())
    }
}

pub fn day(offset: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(offset as i64)
}

pub fn make_bar(offset: usize, open: f64, high: f64, low: f64, close: f64) -> PriceBar {
    PriceBar {
        date: day(offset),
        open,
        high,
        low,
        close,
        volume: 1_000.0,
    }
}

/// Bars with open equal to close and a one-unit range either side.
pub fn bars_from_closes(closes: &[f64]) -> Vec<PriceBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_bar(i, c, c + 1.0, c - 1.0, c))
        .collect()
}

/// Deterministic zig-zag series long enough for every strategy to trade.
///
/// Falling legs are built from bearish candles; every seventh bar is a
/// bullish hammer so candle strategies find entries inside downtrends.
pub fn synthetic_series(len: usize) -> Vec<PriceBar> {
    let mut bars = Vec::with_capacity(len);
    let mut price = 50.0_f64;
    for i in 0..len {
        let leg = (i / 12) % 2 == 0;
        let drift = if leg { -0.6 } else { 0.7 };
        let wobble = ((i * 37) % 11) as f64 / 10.0 - 0.5;
        price = (price + drift + wobble * 0.4).max(5.0);

        let bar = if i % 7 == 6 {
            // long lower tail, tiny body, no upper wick
            let open = price - 0.2;
            make_bar(i, open, price, open - 1.5, price)
        } else if leg {
            make_bar(i, price + 0.5, price + 0.8, price - 0.3, price)
        } else {
            make_bar(i, price - 0.5, price + 0.3, price - 0.8, price)
        };
        bars.push(bar);
    }
    bars
}

pub fn series_csv(bars: &[PriceBar]) -> String {
    let mut out = String::from("date,open,high,low,close,volume\n");
    for b in bars {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.date, b.open, b.high, b.low, b.close, b.volume
        ));
    }
    out
}

pub fn write_temp_file(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    path
}
