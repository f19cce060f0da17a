//! Open position and trade log records.

use chrono::NaiveDate;
use std::fmt;

/// A long position. Flat is represented by the absence of a `Position`.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub size: u64,
    pub entry_price: f64,
    pub entry_date: NaiveDate,
    /// Index of the bar the entry filled on.
    pub entry_index: usize,
}

impl Position {
    pub fn market_value(&self, price: f64) -> f64 {
        self.size as f64 * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.size as f64 * (price - self.entry_price)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => f.write_str("BUY"),
            Side::Sell => f.write_str("SELL"),
        }
    }
}

/// One executed fill. `portfolio_value` and `position` are the state right after the fill.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub date: NaiveDate,
    pub side: Side,
    pub price: f64,
    pub size: u64,
    pub fee: f64,
    pub portfolio_value: f64,
    pub position: u64,
}

/// A completed buy/sell pair, derived from the trade log.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundTrip {
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub size: u64,
    pub entry_price: f64,
    pub exit_price: f64,
    /// Net of both fees.
    pub pnl: f64,
}

/// Pair each SELL with the BUY before it. An unmatched trailing BUY is ignored.
pub fn round_trips(trades: &[TradeRecord]) -> Vec<RoundTrip> {
    let mut trips = Vec::new();
    let mut open: Option<&TradeRecord> = None;

    for trade in trades {
        match (trade.side, open) {
            (Side::Buy, _) => open = Some(trade),
            (Side::Sell, Some(buy)) => {
                let gross = trade.size as f64 * (trade.price - buy.price);
                trips.push(RoundTrip {
                    entry_date: buy.date,
                    exit_date: trade.date,
                    size: trade.size,
                    entry_price: buy.price,
                    exit_price: trade.price,
                    pnl: gross - buy.fee - trade.fee,
                });
                open = None;
            }
            (Side::Sell, None) => {}
        }
    }

    trips
}
