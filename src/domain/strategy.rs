//! Strategy configuration and signal predicates.
//!
//! A [`StrategyConfig`] is a tagged variant holding every parameter of one
//! strategy. [`StrategyConfig::prepare`] computes the indicators the strategy
//! needs over a series once, and the resulting [`PreparedStrategy`] answers
//! [`PreparedStrategy::signal`] for any bar without further allocation.

use std::fmt;
use std::str::FromStr;

use crate::domain::candlestick::{
    is_bearish_hanging_man, is_bullish_hammer, is_downtrend, is_dragonfly_doji, is_uptrend,
    HammerShape,
};
use crate::domain::error::SweeptraderError;
use crate::domain::indicator::bollinger::calculate_bollinger;
use crate::domain::indicator::ema::calculate_ema;
use crate::domain::indicator::sma::calculate_sma;
use crate::domain::indicator::IndicatorSeries;
use crate::domain::ohlcv::PriceBar;
use crate::domain::position::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    None,
    Enter,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    SmaCrossover,
    Bollinger,
    Hammer,
    CandleReversal,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::SmaCrossover => "sma_crossover",
            StrategyKind::Bollinger => "bollinger",
            StrategyKind::Hammer => "hammer",
            StrategyKind::CandleReversal => "candle_reversal",
        }
    }

    /// Configuration with every parameter at its default.
    pub fn default_config(&self) -> StrategyConfig {
        match self {
            StrategyKind::SmaCrossover => StrategyConfig::SmaCrossover(SmaCrossoverParams::default()),
            StrategyKind::Bollinger => StrategyConfig::Bollinger(BollingerParams::default()),
            StrategyKind::Hammer => StrategyConfig::Hammer(HammerParams::default()),
            StrategyKind::CandleReversal => {
                StrategyConfig::CandleReversal(CandleReversalParams::default())
            }
        }
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sma_crossover" | "ma_crossover" => Ok(StrategyKind::SmaCrossover),
            "bollinger" => Ok(StrategyKind::Bollinger),
            "hammer" => Ok(StrategyKind::Hammer),
            "candle_reversal" => Ok(StrategyKind::CandleReversal),
            other => Err(format!(
                "unknown strategy kind '{other}' (expected sma_crossover, bollinger, hammer or candle_reversal)"
            )),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SmaCrossoverParams {
    pub short_period: usize,
    pub long_period: usize,
}

impl Default for SmaCrossoverParams {
    fn default() -> Self {
        SmaCrossoverParams {
            short_period: 10,
            long_period: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerParams {
    pub period: usize,
    pub dev_factor: f64,
}

impl Default for BollingerParams {
    fn default() -> Self {
        BollingerParams {
            period: 20,
            dev_factor: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HammerParams {
    pub shape: HammerShape,
    pub trend_period: usize,
    /// Bars a trade lasts, counted from the entry signal bar inclusive.
    pub holding_period: usize,
    /// Bars after an entry signal during which new entries are ignored.
    pub cooldown: usize,
}

impl Default for HammerParams {
    fn default() -> Self {
        HammerParams {
            shape: HammerShape::default(),
            trend_period: 14,
            holding_period: 7,
            cooldown: 7,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CandleReversalParams {
    pub shape: HammerShape,
    pub doji_body_ratio: f64,
    pub trend_period: usize,
    pub cooldown: usize,
    /// Fractional drop from entry that forces an exit; 0 disables.
    pub stop_loss: f64,
    /// Fractional gain from entry that forces an exit; 0 disables.
    pub take_profit: f64,
}

impl Default for CandleReversalParams {
    fn default() -> Self {
        CandleReversalParams {
            shape: HammerShape::default(),
            doji_body_ratio: 0.1,
            trend_period: 14,
            cooldown: 7,
            stop_loss: 0.2,
            take_profit: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StrategyConfig {
    SmaCrossover(SmaCrossoverParams),
    Bollinger(BollingerParams),
    Hammer(HammerParams),
    CandleReversal(CandleReversalParams),
}

const SMA_PARAMS: &[&str] = &["short_period", "long_period"];
const BOLLINGER_PARAMS: &[&str] = &["period", "dev_factor"];
const HAMMER_PARAMS: &[&str] = &[
    "body_ratio",
    "tail_ratio",
    "wick_ratio",
    "trend_period",
    "holding_period",
    "cooldown",
];
const CANDLE_REVERSAL_PARAMS: &[&str] = &[
    "body_ratio",
    "tail_ratio",
    "wick_ratio",
    "doji_body_ratio",
    "trend_period",
    "cooldown",
    "stop_loss",
    "take_profit",
];

impl StrategyConfig {
    pub fn kind(&self) -> StrategyKind {
        match self {
            StrategyConfig::SmaCrossover(_) => StrategyKind::SmaCrossover,
            StrategyConfig::Bollinger(_) => StrategyKind::Bollinger,
            StrategyConfig::Hammer(_) => StrategyKind::Hammer,
            StrategyConfig::CandleReversal(_) => StrategyKind::CandleReversal,
        }
    }

    /// Names accepted by [`StrategyConfig::with_parameter`], in display order.
    pub fn parameter_names(&self) -> &'static [&'static str] {
        match self {
            StrategyConfig::SmaCrossover(_) => SMA_PARAMS,
            StrategyConfig::Bollinger(_) => BOLLINGER_PARAMS,
            StrategyConfig::Hammer(_) => HAMMER_PARAMS,
            StrategyConfig::CandleReversal(_) => CANDLE_REVERSAL_PARAMS,
        }
    }

    /// Returns a copy with `name` set to `value`.
    ///
    /// Integer parameters must be whole non-negative numbers; range checks are
    /// left to [`StrategyConfig::validate`].
    pub fn with_parameter(&self, name: &str, value: f64) -> Result<Self, SweeptraderError> {
        if !value.is_finite() {
            return Err(SweeptraderError::invalid_parameter(name, "value must be finite"));
        }
        let mut next = self.clone();
        match &mut next {
            StrategyConfig::SmaCrossover(p) => match name {
                "short_period" => p.short_period = whole(name, value)?,
                "long_period" => p.long_period = whole(name, value)?,
                _ => return Err(unknown(name, self.kind())),
            },
            StrategyConfig::Bollinger(p) => match name {
                "period" => p.period = whole(name, value)?,
                "dev_factor" => p.dev_factor = value,
                _ => return Err(unknown(name, self.kind())),
            },
            StrategyConfig::Hammer(p) => match name {
                "body_ratio" => p.shape.body_ratio = value,
                "tail_ratio" => p.shape.tail_ratio = value,
                "wick_ratio" => p.shape.wick_ratio = value,
                "trend_period" => p.trend_period = whole(name, value)?,
                "holding_period" => p.holding_period = whole(name, value)?,
                "cooldown" => p.cooldown = whole(name, value)?,
                _ => return Err(unknown(name, self.kind())),
            },
            StrategyConfig::CandleReversal(p) => match name {
                "body_ratio" => p.shape.body_ratio = value,
                "tail_ratio" => p.shape.tail_ratio = value,
                "wick_ratio" => p.shape.wick_ratio = value,
                "doji_body_ratio" => p.doji_body_ratio = value,
                "trend_period" => p.trend_period = whole(name, value)?,
                "cooldown" => p.cooldown = whole(name, value)?,
                "stop_loss" => p.stop_loss = value,
                "take_profit" => p.take_profit = value,
                _ => return Err(unknown(name, self.kind())),
            },
        }
        Ok(next)
    }

    /// Current value of a named parameter.
    pub fn parameter(&self, name: &str) -> Option<f64> {
        let value = match self {
            StrategyConfig::SmaCrossover(p) => match name {
                "short_period" => p.short_period as f64,
                "long_period" => p.long_period as f64,
                _ => return None,
            },
            StrategyConfig::Bollinger(p) => match name {
                "period" => p.period as f64,
                "dev_factor" => p.dev_factor,
                _ => return None,
            },
            StrategyConfig::Hammer(p) => match name {
                "body_ratio" => p.shape.body_ratio,
                "tail_ratio" => p.shape.tail_ratio,
                "wick_ratio" => p.shape.wick_ratio,
                "trend_period" => p.trend_period as f64,
                "holding_period" => p.holding_period as f64,
                "cooldown" => p.cooldown as f64,
                _ => return None,
            },
            StrategyConfig::CandleReversal(p) => match name {
                "body_ratio" => p.shape.body_ratio,
                "tail_ratio" => p.shape.tail_ratio,
                "wick_ratio" => p.shape.wick_ratio,
                "doji_body_ratio" => p.doji_body_ratio,
                "trend_period" => p.trend_period as f64,
                "cooldown" => p.cooldown as f64,
                "stop_loss" => p.stop_loss,
                "take_profit" => p.take_profit,
                _ => return None,
            },
        };
        Some(value)
    }

    pub fn validate(&self) -> Result<(), SweeptraderError> {
        match self {
            StrategyConfig::SmaCrossover(p) => {
                at_least_one("short_period", p.short_period)?;
                at_least_one("long_period", p.long_period)?;
            }
            StrategyConfig::Bollinger(p) => {
                at_least_one("period", p.period)?;
                positive("dev_factor", p.dev_factor)?;
            }
            StrategyConfig::Hammer(p) => {
                validate_shape(&p.shape)?;
                at_least_one("trend_period", p.trend_period)?;
                at_least_one("holding_period", p.holding_period)?;
            }
            StrategyConfig::CandleReversal(p) => {
                validate_shape(&p.shape)?;
                positive("doji_body_ratio", p.doji_body_ratio)?;
                if p.doji_body_ratio > 1.0 {
                    return Err(SweeptraderError::invalid_parameter(
                        "doji_body_ratio",
                        "must not exceed 1",
                    ));
                }
                at_least_one("trend_period", p.trend_period)?;
                if !(0.0..1.0).contains(&p.stop_loss) {
                    return Err(SweeptraderError::invalid_parameter(
                        "stop_loss",
                        "must be in [0, 1)",
                    ));
                }
                if p.take_profit < 0.0 {
                    return Err(SweeptraderError::invalid_parameter(
                        "take_profit",
                        "must be non-negative",
                    ));
                }
            }
        }
        Ok(())
    }

    /// Bars of history needed before the first signal can fire.
    pub fn warmup(&self) -> usize {
        match self {
            StrategyConfig::SmaCrossover(p) => p.short_period.max(p.long_period),
            StrategyConfig::Bollinger(p) => p.period,
            // the trend filter compares two consecutive EMA values
            StrategyConfig::Hammer(p) => p.trend_period.saturating_add(1),
            StrategyConfig::CandleReversal(p) => p.trend_period.saturating_add(1),
        }
    }

    /// Compute the indicators this strategy reads over `bars`.
    pub fn prepare<'a>(&'a self, bars: &'a [PriceBar]) -> PreparedStrategy<'a> {
        let indicators = match self {
            StrategyConfig::SmaCrossover(p) => Indicators::Crossover {
                short: calculate_sma(bars, p.short_period),
                long: calculate_sma(bars, p.long_period),
            },
            StrategyConfig::Bollinger(p) => {
                Indicators::Bands(calculate_bollinger(bars, p.period, p.dev_factor))
            }
            StrategyConfig::Hammer(p) => Indicators::Trend(calculate_ema(bars, p.trend_period)),
            StrategyConfig::CandleReversal(p) => {
                Indicators::Trend(calculate_ema(bars, p.trend_period))
            }
        };
        PreparedStrategy {
            config: self,
            bars,
            indicators,
        }
    }
}

impl fmt::Display for StrategyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.kind())?;
        for (i, name) in self.parameter_names().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            let value = self.parameter(name).unwrap_or(f64::NAN);
            write!(f, "{name}={value}")?;
        }
        f.write_str(")")
    }
}

/// Largest value accepted for a bar-count parameter.
pub const MAX_BAR_COUNT: usize = 1_000_000;

fn whole(name: &str, value: f64) -> Result<usize, SweeptraderError> {
    if value < 0.0 || value.fract() != 0.0 {
        return Err(SweeptraderError::invalid_parameter(
            name,
            format!("expected a whole non-negative number, got {value}"),
        ));
    }
    if value > MAX_BAR_COUNT as f64 {
        return Err(SweeptraderError::invalid_parameter(
            name,
            format!("must not exceed {MAX_BAR_COUNT}, got {value}"),
        ));
    }
    Ok(value as usize)
}

fn unknown(name: &str, kind: StrategyKind) -> SweeptraderError {
    SweeptraderError::invalid_parameter(name, format!("not a parameter of {kind}"))
}

fn at_least_one(name: &str, value: usize) -> Result<(), SweeptraderError> {
    if value == 0 {
        return Err(SweeptraderError::invalid_parameter(name, "must be at least 1"));
    }
    Ok(())
}

fn positive(name: &str, value: f64) -> Result<(), SweeptraderError> {
    if value <= 0.0 || !value.is_finite() {
        return Err(SweeptraderError::invalid_parameter(name, "must be positive"));
    }
    Ok(())
}

fn validate_shape(shape: &HammerShape) -> Result<(), SweeptraderError> {
    positive("body_ratio", shape.body_ratio)?;
    positive("tail_ratio", shape.tail_ratio)?;
    positive("wick_ratio", shape.wick_ratio)
}

enum Indicators {
    Crossover {
        short: IndicatorSeries,
        long: IndicatorSeries,
    },
    Bands(IndicatorSeries),
    Trend(IndicatorSeries),
}

/// What the replay loop exposes to a predicate for one bar.
#[derive(Debug, Clone, Copy)]
pub struct SignalContext<'a> {
    pub index: usize,
    pub position: Option<&'a Position>,
    /// Bar index of the most recent entry signal. While long this is the
    /// signal that opened the position.
    pub last_entry_signal: Option<usize>,
}

pub struct PreparedStrategy<'a> {
    config: &'a StrategyConfig,
    bars: &'a [PriceBar],
    indicators: Indicators,
}

impl PreparedStrategy<'_> {
    /// Entry signals are only produced while flat, exit signals only while long.
    pub fn signal(&self, ctx: &SignalContext<'_>) -> Signal {
        if ctx.index >= self.bars.len() {
            return Signal::None;
        }
        let fired = match ctx.position {
            None => self.should_enter(ctx),
            Some(position) => self.should_exit(ctx, position),
        };
        match (fired, ctx.position) {
            (false, _) => Signal::None,
            (true, None) => Signal::Enter,
            (true, Some(_)) => Signal::Exit,
        }
    }

    fn should_enter(&self, ctx: &SignalContext<'_>) -> bool {
        let i = ctx.index;
        let bar = &self.bars[i];
        match (self.config, &self.indicators) {
            (StrategyConfig::SmaCrossover(_), Indicators::Crossover { short, long }) => {
                crossed(short, long, i)
            }
            (StrategyConfig::Bollinger(_), Indicators::Bands(bands)) => bands
                .bands_at(i)
                .is_some_and(|(_, _, lower)| bar.close < lower),
            (StrategyConfig::Hammer(p), Indicators::Trend(ema)) => {
                cooled_down(ctx, p.cooldown)
                    && is_bullish_hammer(bar, &p.shape)
                    && is_downtrend(self.bars, ema, i)
            }
            (StrategyConfig::CandleReversal(p), Indicators::Trend(ema)) => {
                cooled_down(ctx, p.cooldown)
                    && (is_dragonfly_doji(bar, p.doji_body_ratio)
                        || is_bullish_hammer(bar, &p.shape))
                    && is_downtrend(self.bars, ema, i)
            }
            _ => false,
        }
    }

    fn should_exit(&self, ctx: &SignalContext<'_>, position: &Position) -> bool {
        let i = ctx.index;
        let bar = &self.bars[i];
        let signal = ctx.last_entry_signal.unwrap_or(position.entry_index);
        match (self.config, &self.indicators) {
            (StrategyConfig::SmaCrossover(_), Indicators::Crossover { short, long }) => {
                crossed(long, short, i)
            }
            (StrategyConfig::Bollinger(_), Indicators::Bands(bands)) => bands
                .bands_at(i)
                .is_some_and(|(upper, _, _)| bar.close > upper),
            (StrategyConfig::Hammer(p), Indicators::Trend(_)) => {
                i.saturating_sub(signal) >= p.holding_period.saturating_sub(1)
            }
            (StrategyConfig::CandleReversal(p), Indicators::Trend(ema)) => {
                // stop and target are set from the signal bar's close, not the fill
                let anchor = self.bars.get(signal).map_or(position.entry_price, |b| b.close);
                let stopped = p.stop_loss > 0.0 && bar.close <= anchor * (1.0 - p.stop_loss);
                let target_hit =
                    p.take_profit > 0.0 && bar.close >= anchor * (1.0 + p.take_profit);
                stopped
                    || target_hit
                    || (is_bearish_hanging_man(bar, &p.shape) && is_uptrend(self.bars, ema, i))
            }
            _ => false,
        }
    }
}

/// `fast` moved from at-or-below `slow` on the previous bar to above it on this one.
fn crossed(fast: &IndicatorSeries, slow: &IndicatorSeries, i: usize) -> bool {
    let Some(prev) = i.checked_sub(1) else {
        return false;
    };
    match (
        fast.simple_at(prev),
        slow.simple_at(prev),
        fast.simple_at(i),
        slow.simple_at(i),
    ) {
        (Some(fp), Some(sp), Some(fc), Some(sc)) => fp <= sp && fc > sc,
        _ => false,
    }
}

fn cooled_down(ctx: &SignalContext<'_>, cooldown: usize) -> bool {
    ctx.last_entry_signal
        .is_none_or(|last| ctx.index >= last.saturating_add(cooldown))
}
