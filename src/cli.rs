//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

use crate::adapters::console_report::ConsoleReportAdapter;
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::npy_adapter::save_npy;
use crate::domain::backtest::{run_backtest as run_single, BacktestConfig};
use crate::domain::config_validation::{
    load_backtest_config, load_data_file, load_strategy_config, load_sweep_ranges,
};
use crate::domain::error::SweeptraderError;
use crate::domain::metrics::Metrics;
use crate::domain::ohlcv::PriceBar;
use crate::domain::scan::scan;
use crate::domain::strategy::StrategyConfig;
use crate::domain::sweep::{argbest, cell_configs, sweep_with, Evaluation};
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(
    name = "sweeptrader",
    about = "Single-asset strategy backtester and parameter sweeper"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one backtest with the configured strategy parameters
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Price CSV, overriding [backtest] data_file
        #[arg(short, long)]
        data: Option<PathBuf>,
    },
    /// Run every combination of the [sweep] ranges and report the best
    Sweep {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// Save the result grid as a .npy array
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Evaluate cells one at a time on the calling thread
        #[arg(long)]
        sequential: bool,
    },
    /// Check a configuration file without running anything
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print a data quality summary of a price series
    Info {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        data: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match execute(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Run one subcommand, reports to stdout.
pub fn execute(command: Command) -> Result<(), SweeptraderError> {
    match command {
        Command::Backtest { config, data } => run_backtest(&config, data.as_deref()),
        Command::Sweep {
            config,
            data,
            output,
            sequential,
        } => {
            let evaluation = if sequential {
                Evaluation::Sequential
            } else {
                Evaluation::Parallel
            };
            run_sweep(&config, data.as_deref(), output.as_deref(), evaluation)
        }
        Command::Validate { config } => run_validate(&config),
        Command::Info { config, data } => run_info(config.as_deref(), data.as_deref()),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, SweeptraderError> {
    info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path).map_err(|e| match e {
        SweeptraderError::Io(io) => SweeptraderError::ConfigParse {
            file: path.display().to_string(),
            reason: io.to_string(),
        },
        other => other,
    })
}

/// Load the series named by `data_override`, or by `[backtest] data_file`
/// relative to the config file's directory.
pub fn load_series(
    config: &FileConfigAdapter,
    config_path: &Path,
    data_override: Option<&Path>,
) -> Result<Vec<PriceBar>, SweeptraderError> {
    let (adapter, source) = match data_override {
        Some(path) => (
            CsvAdapter::new(PathBuf::from(".")),
            path.display().to_string(),
        ),
        None => {
            let base = config_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            (CsvAdapter::new(base), load_data_file(config)?)
        }
    };
    let bars = adapter.load_series(&source)?;
    if let (Some(first), Some(last)) = (bars.first(), bars.last()) {
        info!(%source, bars = bars.len(), from = %first.date, to = %last.date, "series loaded");
    } else {
        warn!(%source, "series is empty");
    }
    Ok(bars)
}

struct Setup {
    bars: Vec<PriceBar>,
    backtest: BacktestConfig,
    strategy: StrategyConfig,
    config: FileConfigAdapter,
}

fn setup(config_path: &Path, data: Option<&Path>) -> Result<Setup, SweeptraderError> {
    let config = load_config(config_path)?;
    let backtest = load_backtest_config(&config)?;
    let strategy = load_strategy_config(&config)?;
    let bars = load_series(&config, config_path, data)?;
    if bars.len() < strategy.warmup() {
        warn!(
            bars = bars.len(),
            warmup = strategy.warmup(),
            "series shorter than the strategy warm-up, no signals possible"
        );
    }
    Ok(Setup {
        bars,
        backtest,
        strategy,
        config,
    })
}

fn run_backtest(config_path: &Path, data: Option<&Path>) -> Result<(), SweeptraderError> {
    let setup = setup(config_path, data)?;
    info!(strategy = %setup.strategy, "running backtest");

    let result = run_single(&setup.bars, &setup.strategy, &setup.backtest);
    let metrics = Metrics::compute(&result, setup.backtest.risk_free_rate);

    ConsoleReportAdapter::stdout().write_backtest(&setup.strategy, &result, &metrics)
}

fn run_sweep(
    config_path: &Path,
    data: Option<&Path>,
    output: Option<&Path>,
    evaluation: Evaluation,
) -> Result<(), SweeptraderError> {
    let setup = setup(config_path, data)?;
    let ranges = load_sweep_ranges(&setup.config)?;
    if ranges.is_empty() {
        warn!("no [sweep] dimensions configured, sweeping the base parameters only");
    }

    let grid = sweep_with(
        &setup.bars,
        &setup.strategy,
        &ranges,
        &setup.backtest,
        evaluation,
    )?;
    let best = argbest(&grid);

    ConsoleReportAdapter::stdout().write_sweep(&setup.strategy, &grid, best.as_ref())?;
    if let Some(path) = output {
        save_npy(path, &grid)?;
    }
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), SweeptraderError> {
    let config = load_config(config_path)?;
    let data_file = load_data_file(&config)?;
    let backtest = load_backtest_config(&config)?;
    let strategy = load_strategy_config(&config)?;
    let ranges = load_sweep_ranges(&config)?;
    let cells = cell_configs(&strategy, &ranges)?;

    println!("Data file:  {data_file}");
    println!(
        "Backtest:   initial_cash={} fee_rate={} fill={:?} risk_free_rate={}",
        backtest.initial_cash,
        backtest.execution.fee_rate,
        backtest.execution.fill,
        backtest.risk_free_rate
    );
    println!("Strategy:   {strategy}");
    for range in &ranges {
        println!("Sweep:      {} ({} values)", range.name, range.len());
    }
    if !ranges.is_empty() {
        println!("Cells:      {}", cells.len());
    }
    println!("Configuration is valid.");
    Ok(())
}

fn run_info(config_path: Option<&Path>, data: Option<&Path>) -> Result<(), SweeptraderError> {
    let (bars, source) = match (config_path, data) {
        (_, Some(path)) => (
            CsvAdapter::new(PathBuf::from(".")).load_series(&path.display().to_string())?,
            path.display().to_string(),
        ),
        (Some(config_path), None) => {
            let config = load_config(config_path)?;
            let bars = load_series(&config, config_path, None)?;
            (bars, load_data_file(&config)?)
        }
        (None, None) => {
            return Err(SweeptraderError::ConfigMissing {
                section: "backtest".into(),
                key: "data_file (use --data or --config)".into(),
            });
        }
    };

    ConsoleReportAdapter::stdout().write_scan(&source, &scan(&bars))
}
