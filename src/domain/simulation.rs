//! Mutable state of one backtest run.
//!
//! The replay loop owns exactly one `SimulationState`; nothing in it is shared
//! between runs.

use chrono::NaiveDate;

use super::position::{Position, Side, TradeRecord};

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

/// An order waiting for the next bar's open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingOrder {
    pub side: Side,
    pub signal_index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationState {
    pub cash: f64,
    pub initial_cash: f64,
    pub position: Option<Position>,
    pub pending: Option<PendingOrder>,
    pub last_entry_signal: Option<usize>,
    pub trades: Vec<TradeRecord>,
    pub equity_curve: Vec<EquityPoint>,
    pub total_fees: f64,
    pub entry_count: usize,
}

impl SimulationState {
    pub fn new(initial_cash: f64) -> Self {
        SimulationState {
            cash: initial_cash,
            initial_cash,
            position: None,
            pending: None,
            last_entry_signal: None,
            trades: Vec::new(),
            equity_curve: Vec::new(),
            total_fees: 0.0,
            entry_count: 0,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.position.is_none()
    }

    pub fn position_size(&self) -> u64 {
        self.position.as_ref().map_or(0, |p| p.size)
    }

    /// Cash plus the open position marked at `price`.
    pub fn equity(&self, price: f64) -> f64 {
        self.cash + self.position.as_ref().map_or(0.0, |p| p.market_value(price))
    }

    pub fn record_trade(&mut self, trade: TradeRecord) {
        self.trades.push(trade);
    }

    pub fn record_equity(&mut self, date: NaiveDate, equity: f64) {
        self.equity_curve.push(EquityPoint { date, equity });
    }
}
