//! Core domain types and logic.

pub mod ohlcv;
pub mod position;
pub mod simulation;
pub mod execution;
pub mod indicator;
pub mod candlestick;
pub mod strategy;
pub mod backtest;
pub mod param_range;
pub mod sweep;
pub mod metrics;
pub mod scan;
pub mod config_validation;
pub mod error;
