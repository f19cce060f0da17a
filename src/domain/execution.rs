//! Fill simulation: all-cash sizing, proportional fees, full liquidation.

use chrono::NaiveDate;
use tracing::debug;

use super::position::{Position, Side, TradeRecord};
use super::simulation::SimulationState;

/// Which price a signal executes at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fill {
    /// Queue the order and execute it at the next bar's open.
    #[default]
    NextOpen,
    /// Execute immediately at the signal bar's close.
    Close,
}

impl std::str::FromStr for Fill {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "next_open" | "open" => Ok(Fill::NextOpen),
            "close" => Ok(Fill::Close),
            other => Err(format!("unknown fill '{other}' (expected next_open or close)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionConfig {
    /// Fraction of traded value charged on every fill, in [0, 1).
    pub fee_rate: f64,
    pub fill: Fill,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            fee_rate: 0.0,
            fill: Fill::NextOpen,
        }
    }
}

pub fn calculate_fee(trade_value: f64, config: &ExecutionConfig) -> f64 {
    trade_value * config.fee_rate
}

/// Largest whole size whose cost plus fee fits in `cash`. Zero for a non-positive price.
pub fn affordable_size(cash: f64, price: f64, config: &ExecutionConfig) -> u64 {
    if price <= 0.0 || cash <= 0.0 {
        return 0;
    }
    let size = (cash / (price * (1.0 + config.fee_rate))).floor();
    if size.is_finite() { size as u64 } else { 0 }
}

fn total_cost(size: u64, price: f64, config: &ExecutionConfig) -> f64 {
    let cost = size as f64 * price;
    cost + calculate_fee(cost, config)
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Entered { size: u64, price: f64, cost: f64, fee: f64 },
    InsufficientCash,
}

/// Open a long position with all available cash.
///
/// A size of zero is not an error: nothing is bought and nothing is recorded.
pub fn enter_long(
    state: &mut SimulationState,
    price: f64,
    date: NaiveDate,
    index: usize,
    config: &ExecutionConfig,
) -> EntryResult {
    let mut size = affordable_size(state.cash, price, config);
    // floor() can still land one unit over budget after rounding
    while size > 0 && total_cost(size, price, config) > state.cash {
        size -= 1;
    }
    if size == 0 {
        debug!(%date, price, cash = state.cash, "entry skipped: insufficient cash");
        return EntryResult::InsufficientCash;
    }

    let cost = size as f64 * price;
    let fee = calculate_fee(cost, config);

    state.cash -= cost + fee;
    state.total_fees += fee;
    state.entry_count += 1;
    state.position = Some(Position {
        size,
        entry_price: price,
        entry_date: date,
        entry_index: index,
    });

    let portfolio_value = state.equity(price);
    state.record_trade(TradeRecord {
        date,
        side: Side::Buy,
        price,
        size,
        fee,
        portfolio_value,
        position: size,
    });
    debug!(%date, price, size, fee, "BUY filled");

    EntryResult::Entered {
        size,
        price,
        cost,
        fee,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExitResult {
    pub size: u64,
    pub price: f64,
    pub proceeds: f64,
    pub fee: f64,
    pub pnl: f64,
}

/// Liquidate the whole position. `None` when already flat.
pub fn exit_position(
    state: &mut SimulationState,
    price: f64,
    date: NaiveDate,
    config: &ExecutionConfig,
) -> Option<ExitResult> {
    let position = state.position.take()?;

    let proceeds = position.market_value(price);
    let fee = calculate_fee(proceeds, config);
    let entry_fee = calculate_fee(position.market_value(position.entry_price), config);
    let pnl = position.unrealized_pnl(price) - entry_fee - fee;

    state.cash += proceeds - fee;
    state.total_fees += fee;

    let portfolio_value = state.cash;
    state.record_trade(TradeRecord {
        date,
        side: Side::Sell,
        price,
        size: position.size,
        fee,
        portfolio_value,
        position: 0,
    });
    debug!(%date, price, size = position.size, fee, pnl, "SELL filled");

    Some(ExitResult {
        size: position.size,
        price,
        proceeds,
        fee,
        pnl,
    })
}
