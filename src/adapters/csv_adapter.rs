//! CSV file data adapter.
//!
//! Columns are located by header name (case-insensitive, any order); extra
//! columns are ignored. Dates are `YYYY-MM-DD`, optionally followed by a time
//! which is discarded.

use crate::domain::error::SweeptraderError;
use crate::domain::ohlcv::PriceBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

const COLUMNS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    /// Relative sources are resolved against `base_path`.
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn resolve(&self, source: &str) -> PathBuf {
        let path = Path::new(source);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_path.join(path)
        }
    }
}

impl DataPort for CsvAdapter {
    fn load_series(&self, source: &str) -> Result<Vec<PriceBar>, SweeptraderError> {
        let path = self.resolve(source);
        let file = File::open(&path).map_err(|e| {
            SweeptraderError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to open {}: {e}", path.display()),
            ))
        })?;
        let bars = parse_series(file)?;
        debug!(path = %path.display(), bars = bars.len(), "series loaded");
        Ok(bars)
    }
}

/// Parse and validate a complete series from CSV text.
pub fn parse_series<R: Read>(reader: R) -> Result<Vec<PriceBar>, SweeptraderError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| SweeptraderError::data_format(format!("CSV header error: {e}")))?
        .clone();
    let mut positions = [0usize; 6];
    for (slot, name) in positions.iter_mut().zip(COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| SweeptraderError::data_format(format!("missing column {name}")))?;
    }
    let [date_col, open_col, high_col, low_col, close_col, volume_col] = positions;

    let mut bars: Vec<PriceBar> = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        // header is line 1
        let line = i + 2;
        let record = result
            .map_err(|e| SweeptraderError::data_format(format!("line {line}: {e}")))?;
        let field = |col: usize, name: &str| {
            record.get(col).ok_or_else(|| {
                SweeptraderError::data_format(format!("line {line}: missing {name} value"))
            })
        };

        let date = parse_date(field(date_col, "date")?)
            .ok_or_else(|| SweeptraderError::data_format(format!("line {line}: invalid date")))?;
        let bar = PriceBar {
            date,
            open: parse_number(field(open_col, "open")?, "open", line)?,
            high: parse_number(field(high_col, "high")?, "high", line)?,
            low: parse_number(field(low_col, "low")?, "low", line)?,
            close: parse_number(field(close_col, "close")?, "close", line)?,
            volume: parse_number(field(volume_col, "volume")?, "volume", line)?,
        };

        for (name, price) in [
            ("open", bar.open),
            ("high", bar.high),
            ("low", bar.low),
            ("close", bar.close),
        ] {
            if price <= 0.0 {
                return Err(SweeptraderError::data_format(format!(
                    "line {line}: {name} must be positive, got {price}"
                )));
            }
        }
        if bar.volume < 0.0 {
            return Err(SweeptraderError::data_format(format!(
                "line {line}: volume must be non-negative, got {}",
                bar.volume
            )));
        }
        if let Some(prev) = bars.last() {
            if bar.date <= prev.date {
                return Err(SweeptraderError::data_format(format!(
                    "line {line}: date {} does not follow {}",
                    bar.date, prev.date
                )));
            }
        }
        bars.push(bar);
    }

    Ok(bars)
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let day = s.split(|c: char| c == ' ' || c == 'T').next()?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn parse_number(s: &str, name: &str, line: usize) -> Result<f64, SweeptraderError> {
    s.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| {
            SweeptraderError::data_format(format!("line {line}: invalid {name} value '{s}'"))
        })
}
