//! Power computation strategies.
//!
//! Both strategies are pure functions of their explicit inputs so they
//! can be exercised against fixtures without any clock or I/O setup. A
//! returned value of 0 means "no data for this instant" and signals the
//! caller to fall back to the configured floor; it is not an error.

mod curve;
mod market;
pub mod period;

pub use curve::TimeCurve;
pub use market::MarketProportional;

use chrono::NaiveTime;

use crate::config::{Config, Strategy};
use crate::market::MarketDataPoint;

/// The configured power-computation strategy.
#[derive(Debug, Clone)]
pub enum PowerStrategy {
    /// Rule-of-three scaling against the day's market volumes.
    Market(MarketProportional),
    /// Deterministic time-of-day curve; ignores the dataset.
    Curve(TimeCurve),
}

impl PowerStrategy {
    /// Builds the strategy selected by the configuration.
    pub fn from_config(config: &Config) -> Self {
        match config.strategy {
            Strategy::Market => Self::Market(MarketProportional),
            Strategy::Curve => Self::Curve(TimeCurve::new(config.alpha)),
        }
    }

    /// Computes the target power in microwatts for the given wall-clock
    /// time. Returns 0 when the strategy has no data for this instant.
    pub fn compute(&self, reference_max_uw: f64, now: NaiveTime, data: &[MarketDataPoint]) -> u64 {
        match self {
            Self::Market(calc) => calc.compute(reference_max_uw, now, data),
            Self::Curve(curve) => curve.compute(reference_max_uw, now),
        }
    }
}
