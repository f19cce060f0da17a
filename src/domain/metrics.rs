//! Summary statistics of one backtest run.

use super::backtest::BacktestResult;
use super::position::round_trips;
use super::simulation::EquityPoint;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub total_return: f64,
    pub sharpe_ratio: f64,
    /// Largest peak-to-trough fall as a fraction of the peak.
    pub max_drawdown: f64,
    /// Longest run of bars spent below a previous peak.
    pub max_drawdown_duration: usize,
    pub round_trips: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub total_fees: f64,
    pub entry_count: usize,
}

impl Metrics {
    pub fn compute(result: &BacktestResult, risk_free_rate: f64) -> Self {
        let (max_drawdown, max_drawdown_duration) = compute_drawdown(&result.equity_curve);
        let sharpe_ratio =
            compute_sharpe(&result.equity_curve, risk_free_rate / TRADING_DAYS_PER_YEAR);

        let trips = round_trips(&result.trades);
        let mut trades_won = 0usize;
        let mut trades_lost = 0usize;
        let mut gross_wins = 0.0_f64;
        let mut gross_losses = 0.0_f64;
        for trip in &trips {
            if trip.pnl > 0.0 {
                trades_won += 1;
                gross_wins += trip.pnl;
            } else if trip.pnl < 0.0 {
                trades_lost += 1;
                gross_losses -= trip.pnl;
            }
        }

        let win_rate = if trips.is_empty() {
            0.0
        } else {
            trades_won as f64 / trips.len() as f64
        };

        let profit_factor = if gross_losses > 0.0 {
            gross_wins / gross_losses
        } else if gross_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        Metrics {
            total_return: result.total_return,
            sharpe_ratio,
            max_drawdown,
            max_drawdown_duration,
            round_trips: trips.len(),
            trades_won,
            trades_lost,
            win_rate,
            profit_factor,
            total_fees: result.total_fees,
            entry_count: result.entry_count,
        }
    }
}

fn compute_drawdown(equity_curve: &[EquityPoint]) -> (f64, usize) {
    let Some(first) = equity_curve.first() else {
        return (0.0, 0);
    };

    let mut peak = first.equity;
    let mut max_dd = 0.0_f64;
    let mut duration = 0usize;
    let mut max_duration = 0usize;

    for point in equity_curve {
        if point.equity >= peak {
            peak = point.equity;
            duration = 0;
        } else if peak > 0.0 {
            max_dd = max_dd.max((peak - point.equity) / peak);
            duration += 1;
            max_duration = max_duration.max(duration);
        }
    }

    (max_dd, max_duration)
}

fn compute_sharpe(equity_curve: &[EquityPoint], per_bar_rf: f64) -> f64 {
    if equity_curve.len() < 2 {
        return 0.0;
    }

    let returns: Vec<f64> = equity_curve
        .windows(2)
        .map(|w| {
            if w[0].equity > 0.0 {
                (w[1].equity - w[0].equity) / w[0].equity
            } else {
                0.0
            }
        })
        .collect();

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let stddev = (returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n).sqrt();

    if stddev > 0.0 {
        (mean - per_bar_rf) / stddev * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    }
}
