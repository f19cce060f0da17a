//! Configuration loading and validation.
//!
//! Turns the untyped `[backtest]`, `[strategy]` and `[sweep]` sections into
//! typed configuration, rejecting bad values before any run starts.

use std::str::FromStr;

use tracing::warn;

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::SweeptraderError;
use crate::domain::execution::{ExecutionConfig, Fill};
use crate::domain::param_range::ParamRange;
use crate::domain::strategy::{StrategyConfig, StrategyKind};
use crate::ports::config_port::ConfigPort;

const BACKTEST: &str = "backtest";
const STRATEGY: &str = "strategy";
const SWEEP: &str = "sweep";

pub fn load_data_file(config: &dyn ConfigPort) -> Result<String, SweeptraderError> {
    config
        .get_string(BACKTEST, "data_file")
        .ok_or_else(|| missing(BACKTEST, "data_file"))
}

pub fn load_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, SweeptraderError> {
    let defaults = BacktestConfig::default();

    let initial_cash = number(config, BACKTEST, "initial_cash", defaults.initial_cash)?;
    if initial_cash <= 0.0 {
        return Err(invalid(BACKTEST, "initial_cash", "initial_cash must be positive"));
    }

    let fee_rate = number(config, BACKTEST, "fee_rate", defaults.execution.fee_rate)?;
    if !(0.0..1.0).contains(&fee_rate) {
        return Err(invalid(BACKTEST, "fee_rate", "fee_rate must be in [0, 1)"));
    }

    let fill = match config.get_string(BACKTEST, "fill") {
        Some(s) => Fill::from_str(&s).map_err(|reason| invalid(BACKTEST, "fill", reason))?,
        None => defaults.execution.fill,
    };

    let risk_free_rate = number(config, BACKTEST, "risk_free_rate", defaults.risk_free_rate)?;
    if !(0.0..1.0).contains(&risk_free_rate) {
        return Err(invalid(
            BACKTEST,
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }

    Ok(BacktestConfig {
        initial_cash,
        execution: ExecutionConfig { fee_rate, fill },
        risk_free_rate,
    })
}

/// Start from the defaults of `kind` and apply every parameter key present.
pub fn load_strategy_config(config: &dyn ConfigPort) -> Result<StrategyConfig, SweeptraderError> {
    let kind_str = config
        .get_string(STRATEGY, "kind")
        .ok_or_else(|| missing(STRATEGY, "kind"))?;
    let kind =
        StrategyKind::from_str(&kind_str).map_err(|reason| invalid(STRATEGY, "kind", reason))?;

    let mut strategy = kind.default_config();
    for name in strategy.parameter_names() {
        if config.get_string(STRATEGY, name).is_none() {
            continue;
        }
        let value = number(config, STRATEGY, name, f64::NAN)?;
        strategy = strategy
            .with_parameter(name, value)
            .map_err(|e| as_config_error(STRATEGY, e))?;
    }

    for key in config.keys(STRATEGY) {
        if key != "kind" && !strategy.parameter_names().contains(&key.as_str()) {
            warn!(%key, strategy = %kind, "ignoring unknown strategy parameter");
        }
    }

    strategy
        .validate()
        .map_err(|e| as_config_error(STRATEGY, e))?;
    Ok(strategy)
}

/// Ranges in the order given by `[sweep] dimensions`. Empty when there is no
/// `[sweep]` section.
pub fn load_sweep_ranges(config: &dyn ConfigPort) -> Result<Vec<ParamRange>, SweeptraderError> {
    if !config.has_section(SWEEP) {
        return Ok(Vec::new());
    }
    let dimensions = config
        .get_string(SWEEP, "dimensions")
        .ok_or_else(|| missing(SWEEP, "dimensions"))?;

    let mut ranges = Vec::new();
    for name in dimensions.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let name = name.to_lowercase();
        let text = config
            .get_string(SWEEP, &name)
            .ok_or_else(|| missing(SWEEP, &name))?;
        ranges.push(ParamRange::parse(&name, &text)?);
    }

    for key in config.keys(SWEEP) {
        if key != "dimensions" && !ranges.iter().any(|r| r.name == key) {
            warn!(%key, "sweep key not listed in dimensions, ignored");
        }
    }
    Ok(ranges)
}

fn number(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, SweeptraderError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(s) => s
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| invalid(section, key, format!("'{s}' is not a number"))),
    }
}

fn as_config_error(section: &str, err: SweeptraderError) -> SweeptraderError {
    match err {
        SweeptraderError::InvalidParameter { name, reason } => invalid(section, &name, reason),
        other => other,
    }
}

fn missing(section: &str, key: &str) -> SweeptraderError {
    SweeptraderError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    }
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> SweeptraderError {
    SweeptraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::strategy::HammerParams;
    use std::collections::HashMap;

    struct MockConfig {
        values: HashMap<(String, String), String>,
    }

    impl MockConfig {
        fn new(entries: &[(&str, &str, &str)]) -> Self {
            let values = entries
                .iter()
                .map(|(s, k, v)| ((s.to_string(), k.to_string()), v.to_string()))
                .collect();
            Self { values }
        }
    }

    impl ConfigPort for MockConfig {
        fn get_string(&self, section: &str, key: &str) -> Option<String> {
            self.values
                .get(&(section.to_string(), key.to_string()))
                .cloned()
        }

        fn keys(&self, section: &str) -> Vec<String> {
            let mut keys: Vec<String> = self
                .values
                .keys()
                .filter(|(s, _)| s == section)
                .map(|(_, k)| k.clone())
                .collect();
            keys.sort();
            keys
        }
    }

    #[test]
    fn backtest_defaults_when_absent() {
        let config = MockConfig::new(&[]);
        let bt = load_backtest_config(&config).unwrap();
        assert_eq!(bt, BacktestConfig::default());
    }

    #[test]
    fn backtest_reads_all_keys() {
        let config = MockConfig::new(&[
            ("backtest", "initial_cash", "5000"),
            ("backtest", "fee_rate", "0.001"),
            ("backtest", "fill", "close"),
            ("backtest", "risk_free_rate", "0.05"),
        ]);
        let bt = load_backtest_config(&config).unwrap();
        assert!((bt.initial_cash - 5_000.0).abs() < f64::EPSILON);
        assert!((bt.execution.fee_rate - 0.001).abs() < f64::EPSILON);
        assert_eq!(bt.execution.fill, Fill::Close);
        assert!((bt.risk_free_rate - 0.05).abs() < f64::EPSILON);
    }

    #[test]
    fn backtest_rejects_bad_values() {
        for (key, value) in [
            ("initial_cash", "0"),
            ("initial_cash", "lots"),
            ("fee_rate", "1.0"),
            ("fee_rate", "-0.1"),
            ("fill", "vwap"),
            ("risk_free_rate", "1.5"),
        ] {
            let config = MockConfig::new(&[("backtest", key, value)]);
            let err = load_backtest_config(&config).unwrap_err();
            assert!(
                matches!(err, SweeptraderError::ConfigInvalid { key: ref k, .. } if k == key),
                "{key} = {value} gave {err:?}"
            );
        }
    }

    #[test]
    fn data_file_is_required() {
        let config = MockConfig::new(&[]);
        assert!(matches!(
            load_data_file(&config),
            Err(SweeptraderError::ConfigMissing { .. })
        ));
        let config = MockConfig::new(&[("backtest", "data_file", "WMT.csv")]);
        assert_eq!(load_data_file(&config).unwrap(), "WMT.csv");
    }

    #[test]
    fn strategy_overrides_defaults() {
        let config = MockConfig::new(&[
            ("strategy", "kind", "hammer"),
            ("strategy", "holding_period", "10"),
            ("strategy", "wick_ratio", "0.5"),
        ]);
        let strategy = load_strategy_config(&config).unwrap();
        let StrategyConfig::Hammer(p) = strategy else {
            panic!("expected hammer config");
        };
        assert_eq!(p.holding_period, 10);
        assert!((p.shape.wick_ratio - 0.5).abs() < f64::EPSILON);
        assert_eq!(p.trend_period, HammerParams::default().trend_period);
    }

    #[test]
    fn strategy_requires_known_kind() {
        let config = MockConfig::new(&[]);
        assert!(matches!(
            load_strategy_config(&config),
            Err(SweeptraderError::ConfigMissing { .. })
        ));
        let config = MockConfig::new(&[("strategy", "kind", "martingale")]);
        assert!(matches!(
            load_strategy_config(&config),
            Err(SweeptraderError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn strategy_rejects_invalid_parameter() {
        let config = MockConfig::new(&[
            ("strategy", "kind", "sma_crossover"),
            ("strategy", "short_period", "2.5"),
        ]);
        let err = load_strategy_config(&config).unwrap_err();
        assert!(
            matches!(err, SweeptraderError::ConfigInvalid { ref key, .. } if key == "short_period")
        );

        let config = MockConfig::new(&[
            ("strategy", "kind", "bollinger"),
            ("strategy", "dev_factor", "0"),
        ]);
        assert!(load_strategy_config(&config).is_err());
    }

    #[test]
    fn sweep_ranges_follow_dimension_order() {
        let config = MockConfig::new(&[
            ("sweep", "dimensions", "holding_period, wick_ratio"),
            ("sweep", "wick_ratio", "linspace(0.5, 3.0, 5)"),
            ("sweep", "holding_period", "3, 5, 7"),
        ]);
        let ranges = load_sweep_ranges(&config).unwrap();
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0].name, "holding_period");
        assert_eq!(ranges[0].values, vec![3.0, 5.0, 7.0]);
        assert_eq!(ranges[1].name, "wick_ratio");
        assert_eq!(ranges[1].len(), 5);
    }

    #[test]
    fn sweep_dimension_without_values_is_missing() {
        let config = MockConfig::new(&[("sweep", "dimensions", "cooldown")]);
        assert!(matches!(
            load_sweep_ranges(&config),
            Err(SweeptraderError::ConfigMissing { ref key, .. }) if key == "cooldown"
        ));
    }

    #[test]
    fn no_sweep_section_means_no_ranges() {
        let config = MockConfig::new(&[("strategy", "kind", "hammer")]);
        assert!(load_sweep_ranges(&config).unwrap().is_empty());
    }
}
