//! Single-run backtest: replays a series bar by bar under one strategy configuration.
//!
//! Each bar is processed in three steps:
//! 1. fill the order left pending by the previous bar at this bar's open
//! 2. evaluate the strategy signal (skipped while an order is pending)
//! 3. record mark-to-market equity at the close

use tracing::{debug, trace};

use crate::domain::execution::{
    enter_long, exit_position, EntryResult, ExecutionConfig, ExitResult, Fill,
};
use crate::domain::ohlcv::PriceBar;
use crate::domain::position::{Position, Side, TradeRecord};
use crate::domain::simulation::{EquityPoint, PendingOrder, SimulationState};
use crate::domain::strategy::{Signal, SignalContext, StrategyConfig};

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_cash: f64,
    pub execution: ExecutionConfig,
    pub risk_free_rate: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_cash: 100_000.0,
            execution: ExecutionConfig::default(),
            risk_free_rate: 0.0,
        }
    }
}

/// Outcome of one run. Every field is populated whether or not any trade happened.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub initial_cash: f64,
    /// Cash plus any open position marked at the last close.
    pub final_value: f64,
    pub total_return: f64,
    pub trades: Vec<TradeRecord>,
    pub equity_curve: Vec<EquityPoint>,
    pub total_fees: f64,
    pub entry_count: usize,
    pub open_position: Option<Position>,
}

impl BacktestResult {
    fn from_state(state: SimulationState) -> Self {
        let final_value = state
            .equity_curve
            .last()
            .map_or(state.initial_cash, |p| p.equity);
        let total_return = if state.initial_cash > 0.0 {
            (final_value - state.initial_cash) / state.initial_cash
        } else {
            0.0
        };
        BacktestResult {
            initial_cash: state.initial_cash,
            final_value,
            total_return,
            trades: state.trades,
            equity_curve: state.equity_curve,
            total_fees: state.total_fees,
            entry_count: state.entry_count,
            open_position: state.position,
        }
    }
}

pub fn run_backtest(
    bars: &[PriceBar],
    strategy: &StrategyConfig,
    config: &BacktestConfig,
) -> BacktestResult {
    let prepared = strategy.prepare(bars);
    let execution = &config.execution;
    let mut state = SimulationState::new(config.initial_cash);

    for (index, bar) in bars.iter().enumerate() {
        if let Some(order) = state.pending.take() {
            execute(&mut state, order.side, bar.open, bar, index, execution);
        }

        if state.pending.is_none() {
            let signal = prepared.signal(&SignalContext {
                index,
                position: state.position.as_ref(),
                last_entry_signal: state.last_entry_signal,
            });
            let side = match signal {
                Signal::None => None,
                Signal::Enter => {
                    state.last_entry_signal = Some(index);
                    Some(Side::Buy)
                }
                Signal::Exit => Some(Side::Sell),
            };
            if let Some(side) = side {
                trace!(date = %bar.date, ?side, "signal");
                match execution.fill {
                    Fill::Close => execute(&mut state, side, bar.close, bar, index, execution),
                    Fill::NextOpen => {
                        state.pending = Some(PendingOrder {
                            side,
                            signal_index: index,
                        })
                    }
                }
            }
        }

        let equity = state.equity(bar.close);
        state.record_equity(bar.date, equity);
    }

    if let Some(order) = state.pending {
        debug!(
            signal_index = order.signal_index,
            side = ?order.side,
            "order still pending at end of series, dropped"
        );
    }

    BacktestResult::from_state(state)
}

fn execute(
    state: &mut SimulationState,
    side: Side,
    price: f64,
    bar: &PriceBar,
    index: usize,
    execution: &ExecutionConfig,
) {
    match side {
        Side::Buy if state.is_flat() => {
            match enter_long(state, price, bar.date, index, execution) {
                EntryResult::Entered { size, cost, fee, .. } => {
                    trace!(index, size, cost, fee, cash = state.cash, "position opened");
                }
                EntryResult::InsufficientCash => {
                    trace!(index, cash = state.cash, "entry signal unfilled");
                }
            }
        }
        Side::Sell => match exit_position(state, price, bar.date, execution) {
            Some(ExitResult {
                size,
                proceeds,
                fee,
                pnl,
                ..
            }) => {
                trace!(index, size, proceeds, fee, pnl, cash = state.cash, "position closed");
            }
            None => trace!(index, "exit signal while flat, ignored"),
        },
        Side::Buy => {}
    }
}
