//! Price series access port.

use crate::domain::error::SweeptraderError;
use crate::domain::ohlcv::PriceBar;

pub trait DataPort {
    /// Load a complete series, oldest bar first. Dates are strictly increasing.
    fn load_series(&self, source: &str) -> Result<Vec<PriceBar>, SweeptraderError>;
}
