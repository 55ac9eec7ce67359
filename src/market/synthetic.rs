//! Synthetic day-periodic market data.

use std::f64::consts::PI;

use chrono::{Datelike, NaiveDate};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::calc::period::day_periods;
use crate::market::MarketDataPoint;

/// Generates a smooth day-periodic volume/price profile with seeded
/// jitter. Output is deterministic for a given seed and day.
#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    seed: u64,
}

impl SyntheticProvider {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Produces the full 96-period dataset for `day`.
    pub fn generate(&self, day: NaiveDate) -> Vec<MarketDataPoint> {
        // Re-seed per day so consecutive days differ but reruns match.
        let day_seed = self.seed ^ u64::from(day.num_days_from_ce().unsigned_abs());
        let mut rng = StdRng::seed_from_u64(day_seed);

        day_periods()
            .into_iter()
            .enumerate()
            .map(|(index, period)| {
                let t = index as f64 * 0.25;

                // Daily demand pattern peaking around noon, plus a faster
                // harmonic and a little noise.
                let base_volume = 70.0 + 30.0 * ((t - 6.0) * PI / 12.0).sin();
                let ripple = 10.0 * (t * PI / 3.0).sin();
                let volume = (base_volume + ripple + gaussian(&mut rng) * 1.5).max(20.0);

                // Price loosely inverse to volume.
                let base_price = 120.0 - (volume - 50.0) * 0.8;
                let swing = 20.0 * (t * PI / 2.0).sin();
                let price = (base_price + swing + gaussian(&mut rng) * 3.0).max(10.0);

                MarketDataPoint {
                    period,
                    volume: (volume * 10.0).round() / 10.0,
                    price: (price * 100.0).round() / 100.0,
                }
            })
            .collect()
    }
}

/// Gaussian-ish sample via Box-Muller.
fn gaussian(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.random::<f64>().clamp(1e-9, 1.0);
    let u2: f64 = rng.random::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}
