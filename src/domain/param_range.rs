//! Sweep dimensions and their Cartesian product.
//!
//! A [`ParamRange`] is a named, ordered list of candidate values for one
//! strategy parameter. Ranges are written in one of three forms:
//!
//! ```text
//! 3, 5, 7, 10          explicit list
//! linspace(0.5, 3, 5)  count evenly spaced values, both ends included
//! range(5, 30, 5)      start, start + step, ... while below stop
//! ```

use crate::domain::error::SweeptraderError;

/// Upper bound on values a single `range(..)` may expand to.
const MAX_RANGE_VALUES: usize = 100_000;

#[derive(Debug, Clone, PartialEq)]
pub struct ParamRange {
    pub name: String,
    pub values: Vec<f64>,
}

impl ParamRange {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        ParamRange {
            name: name.into(),
            values,
        }
    }

    /// `count` evenly spaced values from `start` to `stop` inclusive.
    pub fn linspace(name: impl Into<String>, start: f64, stop: f64, count: usize) -> Self {
        let values = match count {
            0 => Vec::new(),
            1 => vec![start],
            n => {
                let step = (stop - start) / (n - 1) as f64;
                (0..n)
                    .map(|k| if k == n - 1 { stop } else { start + k as f64 * step })
                    .collect()
            }
        };
        ParamRange::new(name, values)
    }

    /// Values `start + k * step` strictly below `stop`.
    pub fn stepped(
        name: impl Into<String>,
        start: f64,
        stop: f64,
        step: f64,
    ) -> Result<Self, SweeptraderError> {
        let name = name.into();
        if step <= 0.0 || !step.is_finite() {
            return Err(SweeptraderError::invalid_parameter(&name, "range step must be positive"));
        }
        let mut values = Vec::new();
        let mut k = 0usize;
        loop {
            let value = start + k as f64 * step;
            if value >= stop {
                break;
            }
            if values.len() == MAX_RANGE_VALUES {
                return Err(SweeptraderError::invalid_parameter(
                    &name,
                    format!("range expands to more than {MAX_RANGE_VALUES} values"),
                ));
            }
            values.push(value);
            k += 1;
        }
        Ok(ParamRange::new(name, values))
    }

    /// Parse one of the three textual forms.
    pub fn parse(name: &str, text: &str) -> Result<Self, SweeptraderError> {
        let text = text.trim();
        if let Some(args) = call_args(text, "linspace") {
            let [start, stop, count] = three_numbers(name, "linspace", &args)?;
            if count < 0.0 || count.fract() != 0.0 {
                return Err(SweeptraderError::invalid_parameter(
                    name,
                    format!("linspace count must be a whole number, got {count}"),
                ));
            }
            if count > MAX_RANGE_VALUES as f64 {
                return Err(SweeptraderError::invalid_parameter(
                    name,
                    format!("linspace count must not exceed {MAX_RANGE_VALUES}, got {count}"),
                ));
            }
            return Ok(ParamRange::linspace(name, start, stop, count as usize));
        }
        if let Some(args) = call_args(text, "range") {
            let [start, stop, step] = three_numbers(name, "range", &args)?;
            return ParamRange::stepped(name, start, stop, step);
        }

        let values = text
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| number(name, s))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ParamRange::new(name, values))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn call_args<'a>(text: &'a str, func: &str) -> Option<Vec<&'a str>> {
    let rest = text.strip_prefix(func)?.trim_start();
    let inner = rest.strip_prefix('(')?.strip_suffix(')')?;
    Some(inner.split(',').map(str::trim).collect())
}

fn three_numbers(name: &str, func: &str, args: &[&str]) -> Result<[f64; 3], SweeptraderError> {
    if args.len() != 3 {
        return Err(SweeptraderError::invalid_parameter(
            name,
            format!("{func} takes 3 arguments, got {}", args.len()),
        ));
    }
    Ok([
        number(name, args[0])?,
        number(name, args[1])?,
        number(name, args[2])?,
    ])
}

fn number(name: &str, s: &str) -> Result<f64, SweeptraderError> {
    s.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| SweeptraderError::invalid_parameter(name, format!("'{s}' is not a number")))
}

/// Row-major walk over every index tuple of a grid with the given shape.
///
/// The last dimension varies fastest. A shape with no dimensions has exactly
/// one (empty) cell; a shape containing a zero has none.
#[derive(Debug, Clone)]
pub struct CartesianProduct {
    shape: Vec<usize>,
    next: Option<Vec<usize>>,
}

impl CartesianProduct {
    pub fn new(shape: &[usize]) -> Self {
        let next = if shape.contains(&0) {
            None
        } else {
            Some(vec![0; shape.len()])
        };
        CartesianProduct {
            shape: shape.to_vec(),
            next,
        }
    }

    pub fn over(ranges: &[ParamRange]) -> Self {
        let shape: Vec<usize> = ranges.iter().map(ParamRange::len).collect();
        CartesianProduct::new(&shape)
    }
}

impl Iterator for CartesianProduct {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let current = self.next.take()?;
        let mut following = current.clone();
        for dim in (0..self.shape.len()).rev() {
            following[dim] += 1;
            if following[dim] < self.shape[dim] {
                self.next = Some(following);
                break;
            }
            following[dim] = 0;
        }
        Some(current)
    }
}
