//! CLI integration tests for the subcommand orchestration.
//!
//! Tests cover:
//! - Argument parsing for every subcommand
//! - backtest, sweep, validate and info against real INI and CSV files on disk
//! - Data file resolution relative to the config directory
//! - Error variants surfaced for bad configuration and bad data

mod common;

use clap::Parser;
use common::*;
use std::path::PathBuf;
use sweeptrader::adapters::npy_adapter::npy_header;
use sweeptrader::cli::{self, Cli, Command};
use sweeptrader::domain::error::SweeptraderError;

const SWEEP_INI: &str = r#"
[backtest]
data_file = prices.csv
initial_cash = 100000
fee_rate = 0.001
fill = close

[strategy]
kind = hammer
trend_period = 5
holding_period = 3

[sweep]
dimensions = holding_period, tail_ratio
holding_period = 2, 3, 4
tail_ratio = linspace(1.0, 2.0, 3)
"#;

struct Workspace {
    dir: tempfile::TempDir,
}

impl Workspace {
    fn new(ini: &str) -> Self {
        let dir = tempfile::TempDir::new().unwrap();
        write_temp_file(&dir, "config.ini", ini);
        write_temp_file(&dir, "prices.csv", &series_csv(&synthetic_series(80)));
        Workspace { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn config(&self) -> String {
        self.path("config.ini").display().to_string()
    }
}

fn execute(args: &[&str]) -> Result<(), SweeptraderError> {
    let mut argv = vec!["sweeptrader"];
    argv.extend_from_slice(args);
    cli::execute(Cli::parse_from(argv).command)
}

mod parsing {
    use super::*;

    #[test]
    fn sweep_flags() {
        let cli = Cli::parse_from([
            "sweeptrader",
            "sweep",
            "-c",
            "run.ini",
            "--data",
            "WMT.csv",
            "-o",
            "grid.npy",
            "--sequential",
        ]);
        match cli.command {
            Command::Sweep {
                config,
                data,
                output,
                sequential,
            } => {
                assert_eq!(config, PathBuf::from("run.ini"));
                assert_eq!(data, Some(PathBuf::from("WMT.csv")));
                assert_eq!(output, Some(PathBuf::from("grid.npy")));
                assert!(sequential);
            }
            other => panic!("expected sweep, got {other:?}"),
        }
    }

    #[test]
    fn info_arguments_are_optional() {
        let cli = Cli::parse_from(["sweeptrader", "info"]);
        assert!(matches!(
            cli.command,
            Command::Info {
                config: None,
                data: None
            }
        ));
    }

    #[test]
    fn backtest_requires_config() {
        assert!(Cli::try_parse_from(["sweeptrader", "backtest"]).is_err());
    }
}

mod commands {
    use super::*;

    #[test]
    fn backtest_runs_with_relative_data_file() {
        let ws = Workspace::new(SWEEP_INI);
        execute(&["backtest", "--config", &ws.config()]).unwrap();
    }

    #[test]
    fn backtest_data_override() {
        let ws = Workspace::new(SWEEP_INI);
        write_temp_file(
            &ws.dir,
            "other.csv",
            &series_csv(&bars_from_closes(&[10.0, 11.0, 9.0, 8.0, 12.0])),
        );
        let other = ws.path("other.csv").display().to_string();
        execute(&["backtest", "-c", &ws.config(), "-d", &other]).unwrap();
    }

    #[test]
    fn sweep_writes_grid() {
        let ws = Workspace::new(SWEEP_INI);
        let output = ws.path("grid.npy");
        execute(&[
            "sweep",
            "-c",
            &ws.config(),
            "-o",
            &output.display().to_string(),
        ])
        .unwrap();

        let bytes = std::fs::read(&output).unwrap();
        let header = npy_header(&[3, 3]);
        assert_eq!(&bytes[..header.len()], header.as_slice());
        assert_eq!(bytes.len(), header.len() + 9 * 8);
    }

    #[test]
    fn sequential_sweep_writes_identical_grid() {
        let ws = Workspace::new(SWEEP_INI);
        let parallel = ws.path("parallel.npy");
        let sequential = ws.path("sequential.npy");
        execute(&["sweep", "-c", &ws.config(), "-o", &parallel.display().to_string()]).unwrap();
        execute(&[
            "sweep",
            "-c",
            &ws.config(),
            "-o",
            &sequential.display().to_string(),
            "--sequential",
        ])
        .unwrap();
        assert_eq!(
            std::fs::read(&parallel).unwrap(),
            std::fs::read(&sequential).unwrap()
        );
    }

    #[test]
    fn sweep_without_section_runs_base_cell() {
        let ini = "[backtest]\ndata_file = prices.csv\n\n[strategy]\nkind = bollinger\n";
        let ws = Workspace::new(ini);
        let output = ws.path("base.npy");
        execute(&["sweep", "-c", &ws.config(), "-o", &output.display().to_string()]).unwrap();

        let bytes = std::fs::read(&output).unwrap();
        assert_eq!(bytes.len(), npy_header(&[]).len() + 8);
    }

    #[test]
    fn validate_accepts_good_config() {
        let ws = Workspace::new(SWEEP_INI);
        execute(&["validate", "-c", &ws.config()]).unwrap();
    }

    #[test]
    fn info_from_config_or_data() {
        let ws = Workspace::new(SWEEP_INI);
        execute(&["info", "-c", &ws.config()]).unwrap();
        let data = ws.path("prices.csv").display().to_string();
        execute(&["info", "--data", &data]).unwrap();
    }

    #[test]
    fn load_series_resolves_against_config_directory() {
        let ws = Workspace::new(SWEEP_INI);
        let config_path = ws.path("config.ini");
        let config = cli::load_config(&config_path).unwrap();
        let bars = cli::load_series(&config, &config_path, None).unwrap();
        assert_eq!(bars.len(), 80);
    }
}

mod errors {
    use super::*;

    #[test]
    fn missing_config_file_is_parse_error() {
        let err = execute(&["validate", "-c", "/nonexistent/sweeptrader.ini"]).unwrap_err();
        assert!(matches!(err, SweeptraderError::ConfigParse { .. }));
    }

    #[test]
    fn missing_data_file_key() {
        let ws = Workspace::new("[strategy]\nkind = hammer\n");
        let err = execute(&["backtest", "-c", &ws.config()]).unwrap_err();
        assert!(matches!(
            err,
            SweeptraderError::ConfigMissing { ref section, ref key }
                if section == "backtest" && key == "data_file"
        ));
    }

    #[test]
    fn unknown_strategy_kind() {
        let ws = Workspace::new("[backtest]\ndata_file = prices.csv\n[strategy]\nkind = macd\n");
        let err = execute(&["validate", "-c", &ws.config()]).unwrap_err();
        assert!(matches!(
            err,
            SweeptraderError::ConfigInvalid { ref key, .. } if key == "kind"
        ));
    }

    #[test]
    fn out_of_range_fee() {
        let ws = Workspace::new(
            "[backtest]\ndata_file = prices.csv\nfee_rate = 1.5\n[strategy]\nkind = hammer\n",
        );
        let err = execute(&["backtest", "-c", &ws.config()]).unwrap_err();
        assert!(matches!(
            err,
            SweeptraderError::ConfigInvalid { ref key, .. } if key == "fee_rate"
        ));
    }

    #[test]
    fn empty_sweep_range() {
        let ws = Workspace::new(
            "[backtest]\ndata_file = prices.csv\n\
             [strategy]\nkind = hammer\n\
             [sweep]\ndimensions = tail_ratio\ntail_ratio = linspace(1.0, 2.0, 0)\n",
        );
        let err = execute(&["sweep", "-c", &ws.config()]).unwrap_err();
        assert!(matches!(
            err,
            SweeptraderError::EmptyRange { ref parameter } if parameter == "tail_ratio"
        ));
    }

    #[test]
    fn unlisted_dimension_value_missing() {
        let ws = Workspace::new(
            "[backtest]\ndata_file = prices.csv\n\
             [strategy]\nkind = hammer\n\
             [sweep]\ndimensions = cooldown\n",
        );
        let err = execute(&["validate", "-c", &ws.config()]).unwrap_err();
        assert!(matches!(
            err,
            SweeptraderError::ConfigMissing { ref key, .. } if key == "cooldown"
        ));
    }

    #[test]
    fn malformed_csv_is_data_format() {
        let ws = Workspace::new(SWEEP_INI);
        write_temp_file(
            &ws.dir,
            "prices.csv",
            "date,open,high,low,close,volume\n2024-01-02,1,1,1,1,0\n2024-01-01,1,1,1,1,0\n",
        );
        let err = execute(&["backtest", "-c", &ws.config()]).unwrap_err();
        assert!(matches!(err, SweeptraderError::DataFormat { .. }));
    }

    #[test]
    fn missing_csv_is_io_error() {
        let err = execute(&["info", "-d", "/nonexistent/prices.csv"]).unwrap_err();
        assert!(matches!(err, SweeptraderError::Io(_)));
    }

    #[test]
    fn info_needs_a_source() {
        let err = execute(&["info"]).unwrap_err();
        assert!(matches!(err, SweeptraderError::ConfigMissing { .. }));
    }
}
