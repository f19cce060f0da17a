//! Console report adapter.
//!
//! Renders results as plain-text tables onto any writer, stdout by default.
//! Formatting lives in [`tables`]; this module only sequences the sections.

pub mod tables;

use std::io::{self, Stdout, Write};

use crate::domain::backtest::BacktestResult;
use crate::domain::error::SweeptraderError;
use crate::domain::metrics::Metrics;
use crate::domain::scan::DataScan;
use crate::domain::strategy::StrategyConfig;
use crate::domain::sweep::{Best, ResultGrid};
use crate::ports::report_port::ReportPort;

pub struct ConsoleReportAdapter<W: Write> {
    out: W,
}

impl ConsoleReportAdapter<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleReportAdapter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ReportPort for ConsoleReportAdapter<W> {
    fn write_backtest(
        &mut self,
        strategy: &StrategyConfig,
        result: &BacktestResult,
        metrics: &Metrics,
    ) -> Result<(), SweeptraderError> {
        writeln!(self.out, "Strategy: {strategy}")?;
        writeln!(self.out, "Starting Portfolio Value: {:.2}", result.initial_cash)?;
        writeln!(self.out)?;
        write!(self.out, "{}", tables::format_trades_table(&result.trades))?;
        writeln!(self.out)?;
        write!(self.out, "{}", tables::format_metrics_table(metrics))?;
        if let Some(position) = &result.open_position {
            writeln!(
                self.out,
                "Open position: {} @ {:.6} since {}",
                position.size, position.entry_price, position.entry_date
            )?;
        }
        writeln!(self.out, "Final Portfolio Value: {:.2}", result.final_value)?;
        Ok(())
    }

    fn write_sweep(
        &mut self,
        strategy: &StrategyConfig,
        grid: &ResultGrid,
        best: Option<&Best>,
    ) -> Result<(), SweeptraderError> {
        writeln!(self.out, "Sweep: {} ({} combinations)", strategy.kind(), grid.len())?;
        writeln!(self.out)?;
        write!(self.out, "{}", tables::format_heatmaps(grid))?;
        write!(self.out, "{}", tables::format_best(best))?;
        Ok(())
    }

    fn write_scan(&mut self, source: &str, scan: &DataScan) -> Result<(), SweeptraderError> {
        write!(self.out, "{}", tables::format_scan(source, scan))?;
        Ok(())
    }
}
