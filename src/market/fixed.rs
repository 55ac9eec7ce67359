//! Fixed-dataset market data.

use crate::calc::period::day_periods;
use crate::market::MarketDataPoint;

/// Serves a constant dataset, ignoring the requested day. Useful for
/// air-gapped deployments and as a deterministic test double.
#[derive(Debug, Clone, Default)]
pub struct FixedProvider {
    data: Vec<MarketDataPoint>,
}

impl FixedProvider {
    /// Wraps an arbitrary dataset.
    pub fn new(data: Vec<MarketDataPoint>) -> Self {
        Self { data }
    }

    /// Builds the built-in triangular day profile: volume rises towards
    /// noon and falls off afterwards, price simply inverse to volume.
    pub fn with_defaults() -> Self {
        let data = day_periods()
            .into_iter()
            .enumerate()
            .map(|(index, period)| {
                let hour = index / 4;
                let ramp = if hour > 12 { 24 - hour } else { hour };
                let volume = 30.0 + (ramp * 2) as f64;
                MarketDataPoint {
                    period,
                    volume,
                    price: 120.0 - volume,
                }
            })
            .collect();
        Self { data }
    }

    /// Returns a copy of the dataset.
    pub fn dataset(&self) -> Vec<MarketDataPoint> {
        self.data.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_covers_the_day() {
        let data = FixedProvider::with_defaults().dataset();
        assert_eq!(data.len(), 96);
        assert_eq!(data[0].volume, 30.0);
        // Noon periods carry the peak.
        let max = data.iter().map(|p| p.volume).fold(0.0_f64, f64::max);
        assert_eq!(max, 54.0);
        assert_eq!(data[48].volume, max);
    }

    #[test]
    fn dataset_is_stable_across_calls() {
        let provider = FixedProvider::with_defaults();
        assert_eq!(provider.dataset(), provider.dataset());
    }

    #[test]
    fn price_inverse_to_volume() {
        for point in FixedProvider::with_defaults().dataset() {
            assert_eq!(point.price, 120.0 - point.volume);
        }
    }
}
