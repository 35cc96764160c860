//! Global volatility flag: a price is flagged when it sits more than two sample
//! standard deviations above the mean of the whole series.

use crate::error::PipelineError;
use crate::stats::{mean, sample_stdev};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolatilityThreshold {
    pub mean: f64,
    pub stdev: f64,
}

impl VolatilityThreshold {
    /// Computed once over every price in the series.
    pub fn from_prices(prices: &[f64]) -> Result<Self, PipelineError> {
        let insufficient = PipelineError::InsufficientSampleSize {
            needed: 2,
            found: prices.len(),
        };
        let stdev = sample_stdev(prices).ok_or(insufficient)?;
        let mean = mean(prices).unwrap_or(f64::NAN);

        debug!(mean, stdev, threshold = mean + 2.0 * stdev, "volatility threshold");
        Ok(Self { mean, stdev })
    }

    pub fn value(&self) -> f64 {
        self.mean + 2.0 * self.stdev
    }

    pub fn is_alert(&self, price: f64) -> bool {
        price > self.value()
    }
}
