//! Plain-text table formatting for console reports.
//!
//! Provides functions to render:
//! - the trade log of one run
//! - the metrics summary
//! - 2-D heatmap slices of a sweep grid
//! - a data scan summary

use crate::domain::metrics::Metrics;
use crate::domain::param_range::CartesianProduct;
use crate::domain::position::TradeRecord;
use crate::domain::scan::DataScan;
use crate::domain::sweep::{Best, ResultGrid};

/// Slices beyond this many are summarised instead of printed.
pub const MAX_HEATMAP_SLICES: usize = 12;

fn format_pct(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else {
        format!("{:+.2}%", value * 100.0)
    }
}

pub fn format_trades_table(trades: &[TradeRecord]) -> String {
    if trades.is_empty() {
        return "No trades executed.\n".to_string();
    }

    let mut out = format!(
        "{:<10}  {:<4}  {:>12}  {:>10}  {:>10}  {:>14}  {:>10}\n",
        "Date", "Side", "Price", "Size", "Fee", "Value", "Position"
    );
    for trade in trades {
        out.push_str(&format!(
            "{:<10}  {:<4}  {:>12.6}  {:>10}  {:>10.2}  {:>14.2}  {:>10}\n",
            trade.date.to_string(),
            trade.side.to_string(),
            trade.price,
            trade.size,
            trade.fee,
            trade.portfolio_value,
            trade.position
        ));
    }
    out
}

pub fn format_metrics_table(metrics: &Metrics) -> String {
    let rows = [
        ("Total Return", format_pct(metrics.total_return)),
        ("Sharpe Ratio", format!("{:.3}", metrics.sharpe_ratio)),
        ("Max Drawdown", format_pct(-metrics.max_drawdown)),
        (
            "Max Drawdown Duration",
            format!("{} bars", metrics.max_drawdown_duration),
        ),
        ("Entries", metrics.entry_count.to_string()),
        ("Round Trips", metrics.round_trips.to_string()),
        (
            "Won / Lost",
            format!("{} / {}", metrics.trades_won, metrics.trades_lost),
        ),
        ("Win Rate", format!("{:.1}%", metrics.win_rate * 100.0)),
        ("Profit Factor", format!("{:.2}", metrics.profit_factor)),
        ("Total Fees", format!("{:.2}", metrics.total_fees)),
    ];

    rows.iter()
        .map(|(label, value)| format!("{label:<22} {value:>14}\n"))
        .collect()
}

/// One table per combination of the leading dimensions, rows over the
/// second-to-last dimension and columns over the last.
pub fn format_heatmaps(grid: &ResultGrid) -> String {
    let dims = &grid.dimensions;
    match dims.len() {
        0 => format!("Return: {}\n", grid.values.first().map_or("-".into(), |v| format_pct(*v))),
        1 => {
            let mut out = format!("{:>12}  {:>10}\n", dims[0].name, "Return");
            for (value, ret) in dims[0].values.iter().zip(&grid.values) {
                out.push_str(&format!("{:>12.4}  {:>10}\n", value, format_pct(*ret)));
            }
            out
        }
        n => {
            let (row, col) = (n - 2, n - 1);
            let leading: Vec<usize> = dims[..row].iter().map(|d| d.len()).collect();
            let total = CartesianProduct::new(&leading).count();

            let mut out = String::new();
            for fixed in CartesianProduct::new(&leading).take(MAX_HEATMAP_SLICES) {
                if !fixed.is_empty() {
                    let title: Vec<String> = fixed
                        .iter()
                        .zip(dims)
                        .map(|(&i, d)| format!("{} = {}", d.name, d.values[i]))
                        .collect();
                    out.push_str(&format!("[{}]\n", title.join(", ")));
                }
                let mut index = fixed.clone();
                index.extend([0, 0]);
                if let Some(cells) = grid.slice_2d(row, col, &index) {
                    out.push_str(&format_slice(grid, row, col, &cells));
                }
                out.push('\n');
            }
            if total > MAX_HEATMAP_SLICES {
                out.push_str(&format!(
                    "... {} more slices not shown\n",
                    total - MAX_HEATMAP_SLICES
                ));
            }
            out
        }
    }
}

fn format_slice(grid: &ResultGrid, row: usize, col: usize, cells: &[Vec<f64>]) -> String {
    let rows = &grid.dimensions[row];
    let cols = &grid.dimensions[col];

    let mut out = format!("{:>12} \\ {:<10}", rows.name, cols.name);
    for value in &cols.values {
        out.push_str(&format!(" {:>9.4}", value));
    }
    out.push('\n');
    for (value, line) in rows.values.iter().zip(cells) {
        out.push_str(&format!("{:>25.4}", value));
        for ret in line {
            out.push_str(&format!(" {:>9}", format_pct(*ret)));
        }
        out.push('\n');
    }
    out
}

pub fn format_best(best: Option<&Best>) -> String {
    match best {
        None => "No valid combination.\n".to_string(),
        Some(best) => {
            let params: Vec<String> = best
                .params
                .iter()
                .map(|(name, value)| format!("{name} = {value}"))
                .collect();
            format!(
                "Best combination: {} -> {}\n",
                if params.is_empty() {
                    "(base)".to_string()
                } else {
                    params.join(", ")
                },
                format_pct(best.value)
            )
        }
    }
}

pub fn format_scan(source: &str, scan: &DataScan) -> String {
    let mut out = format!("Data Quality Report: {source}\n");
    out.push_str(&format!("Bars: {}\n", scan.bars));
    if let (Some(first), Some(last)) = (scan.first_date, scan.last_date) {
        out.push_str(&format!("Date Range: {first} to {last}\n"));
    }
    if !scan.columns.is_empty() {
        out.push_str(&format!(
            "\n{:<8} {:>16} {:>16} {:>16} {:>9}\n",
            "Column", "Low", "High", "Mean", "Outliers"
        ));
        for c in &scan.columns {
            out.push_str(&format!(
                "{:<8} {:>16.6} {:>16.6} {:>16.6} {:>9}\n",
                c.column.name(),
                c.min,
                c.max,
                c.mean,
                c.outliers
            ));
        }
        out.push('\n');
    }
    out.push_str(&format!("Zero-range bars: {}\n", scan.zero_range_bars));
    out.push_str(&format!("Inconsistent bars: {}\n", scan.inconsistent_bars));
    if let Some(date) = scan.peak_volume_date {
        out.push_str(&format!("Highest Volume Day: {date}\n"));
    }
    out.push_str(&format!(
        "Annualized Volatility: {:.2}%\n",
        scan.annualized_volatility * 100.0
    ));
    out
}
