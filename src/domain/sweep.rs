//! Parameter sweep over a Cartesian grid and best-cell selection.
//!
//! Every cell configuration is built and validated before the first backtest
//! runs, so a bad range fails the whole sweep without partial output. Cells
//! are independent; with the `parallel` feature they run on the rayon pool and
//! are collected in cell order, which keeps the grid identical to a
//! sequential run.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, info};

use crate::domain::backtest::{run_backtest, BacktestConfig};
use crate::domain::error::SweeptraderError;
use crate::domain::ohlcv::PriceBar;
use crate::domain::param_range::{CartesianProduct, ParamRange};
use crate::domain::strategy::StrategyConfig;

/// How the cells of a sweep are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Evaluation {
    Sequential,
    /// Uses the rayon pool when built with the `parallel` feature, otherwise
    /// the same as `Sequential`.
    #[default]
    Parallel,
}

/// Dense N-dimensional grid of returns, row-major (last dimension fastest).
#[derive(Debug, Clone, PartialEq)]
pub struct ResultGrid {
    pub dimensions: Vec<ParamRange>,
    pub values: Vec<f64>,
}

impl ResultGrid {
    pub fn shape(&self) -> Vec<usize> {
        self.dimensions.iter().map(ParamRange::len).collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Flat offset of an index tuple, `None` when out of bounds.
    pub fn flat_index(&self, index: &[usize]) -> Option<usize> {
        if index.len() != self.dimensions.len() {
            return None;
        }
        let mut flat = 0;
        for (i, dim) in index.iter().zip(&self.dimensions) {
            if *i >= dim.len() {
                return None;
            }
            flat = flat * dim.len() + i;
        }
        Some(flat)
    }

    /// Index tuple of a flat offset.
    pub fn unravel(&self, mut flat: usize) -> Vec<usize> {
        let mut index = vec![0; self.dimensions.len()];
        for (slot, dim) in index.iter_mut().zip(&self.dimensions).rev() {
            *slot = flat % dim.len();
            flat /= dim.len();
        }
        index
    }

    pub fn get(&self, index: &[usize]) -> Option<f64> {
        self.flat_index(index).map(|flat| self.values[flat])
    }

    /// Parameter values of the cell at `index`.
    pub fn params_at(&self, index: &[usize]) -> Vec<(String, f64)> {
        self.dimensions
            .iter()
            .zip(index)
            .map(|(dim, &i)| (dim.name.clone(), dim.values[i]))
            .collect()
    }

    /// 2-D slice over dimensions `row` and `col`, holding every other
    /// dimension at its position in `fixed`.
    pub fn slice_2d(&self, row: usize, col: usize, fixed: &[usize]) -> Option<Vec<Vec<f64>>> {
        if row == col || row >= self.dimensions.len() || col >= self.dimensions.len() {
            return None;
        }
        let mut index = fixed.to_vec();
        index.resize(self.dimensions.len(), 0);

        let mut rows = Vec::with_capacity(self.dimensions[row].len());
        for r in 0..self.dimensions[row].len() {
            index[row] = r;
            let mut cells = Vec::with_capacity(self.dimensions[col].len());
            for c in 0..self.dimensions[col].len() {
                index[col] = c;
                cells.push(self.get(&index)?);
            }
            rows.push(cells);
        }
        Some(rows)
    }
}

/// The highest-return cell of a grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Best {
    pub index: Vec<usize>,
    pub params: Vec<(String, f64)>,
    pub value: f64,
}

/// Maximum over the grid. Ties go to the first cell in row-major order; NaN
/// cells are never selected. `None` when no cell holds a number.
pub fn argbest(grid: &ResultGrid) -> Option<Best> {
    let mut best: Option<(usize, f64)> = None;
    for (flat, &value) in grid.values.iter().enumerate() {
        if value.is_nan() {
            continue;
        }
        if best.is_none_or(|(_, current)| value > current) {
            best = Some((flat, value));
        }
    }
    best.map(|(flat, value)| {
        let index = grid.unravel(flat);
        Best {
            params: grid.params_at(&index),
            index,
            value,
        }
    })
}

/// Build the strategy configuration of every cell, in row-major order.
pub fn cell_configs(
    base: &StrategyConfig,
    ranges: &[ParamRange],
) -> Result<Vec<StrategyConfig>, SweeptraderError> {
    for (i, range) in ranges.iter().enumerate() {
        if range.is_empty() {
            return Err(SweeptraderError::EmptyRange {
                parameter: range.name.clone(),
            });
        }
        if ranges[..i].iter().any(|r| r.name == range.name) {
            return Err(SweeptraderError::invalid_parameter(
                &range.name,
                "swept more than once",
            ));
        }
    }

    CartesianProduct::over(ranges)
        .map(|index| {
            let mut config = base.clone();
            for (range, &i) in ranges.iter().zip(&index) {
                config = config.with_parameter(&range.name, range.values[i])?;
            }
            config.validate()?;
            Ok(config)
        })
        .collect()
}

pub fn sweep(
    bars: &[PriceBar],
    base: &StrategyConfig,
    ranges: &[ParamRange],
    config: &BacktestConfig,
) -> Result<ResultGrid, SweeptraderError> {
    sweep_with(bars, base, ranges, config, Evaluation::default())
}

pub fn sweep_with(
    bars: &[PriceBar],
    base: &StrategyConfig,
    ranges: &[ParamRange],
    config: &BacktestConfig,
    evaluation: Evaluation,
) -> Result<ResultGrid, SweeptraderError> {
    let cells = cell_configs(base, ranges)?;
    info!(
        strategy = %base.kind(),
        dimensions = ranges.len(),
        cells = cells.len(),
        bars = bars.len(),
        ?evaluation,
        "sweep started"
    );

    let evaluate = |cell: &StrategyConfig| {
        let result = run_backtest(bars, cell, config);
        debug!(%cell, total_return = result.total_return, "cell done");
        result.total_return
    };

    let values: Vec<f64> = match evaluation {
        #[cfg(feature = "parallel")]
        Evaluation::Parallel => cells.par_iter().map(evaluate).collect(),
        _ => cells.iter().map(evaluate).collect(),
    };

    Ok(ResultGrid {
        dimensions: ranges.to_vec(),
        values,
    })
}
