//! Report output port.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::SweeptraderError;
use crate::domain::metrics::Metrics;
use crate::domain::scan::DataScan;
use crate::domain::strategy::StrategyConfig;
use crate::domain::sweep::{Best, ResultGrid};

/// Port for presenting run results.
pub trait ReportPort {
    fn write_backtest(
        &mut self,
        strategy: &StrategyConfig,
        result: &BacktestResult,
        metrics: &Metrics,
    ) -> Result<(), SweeptraderError>;

    fn write_sweep(
        &mut self,
        strategy: &StrategyConfig,
        grid: &ResultGrid,
        best: Option<&Best>,
    ) -> Result<(), SweeptraderError>;

    fn write_scan(&mut self, source: &str, scan: &DataScan) -> Result<(), SweeptraderError>;
}
