//! Market-proportional power computation (rule of three).

use chrono::NaiveTime;

use crate::calc::period::period_label;
use crate::market::MarketDataPoint;

/// Scales the reference maximum by the current period's share of the
/// day's maximum volume: `target / reference = volume / max_volume`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarketProportional;

impl MarketProportional {
    /// Computes the target power in microwatts, rounded to the nearest
    /// integer.
    ///
    /// Returns 0 when the current period is absent from the dataset, its
    /// volume is not positive, or the dataset has no positive volume at
    /// all. A zero here means "no data", not an error.
    pub fn compute(
        &self,
        reference_max_uw: f64,
        now: NaiveTime,
        data: &[MarketDataPoint],
    ) -> u64 {
        let current = period_label(now);
        let Some(volume) = data
            .iter()
            .find(|point| point.period == current)
            .map(|point| point.volume)
        else {
            return 0;
        };
        if volume <= 0.0 {
            return 0;
        }

        let max_volume = data
            .iter()
            .map(|point| point.volume)
            .fold(0.0_f64, f64::max);
        if max_volume <= 0.0 {
            return 0;
        }

        ((volume / max_volume) * reference_max_uw).round() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(period: &str, volume: f64, price: f64) -> MarketDataPoint {
        MarketDataPoint {
            period: period.to_string(),
            volume,
            price,
        }
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).expect("valid test time")
    }

    #[test]
    fn peak_period_maps_to_reference_max() {
        let data = vec![
            point("00:00-00:15", 66.3, 31.91),
            point("12:00-12:15", 93.8, 42.15),
        ];
        let power = MarketProportional.compute(40_000_000.0, t(12, 5), &data);
        assert_eq!(power, 40_000_000);
    }

    #[test]
    fn off_peak_period_scales_proportionally() {
        let data = vec![
            point("00:00-00:15", 50.0, 31.91),
            point("12:00-12:15", 100.0, 42.15),
        ];
        let power = MarketProportional.compute(40_000_000.0, t(0, 7), &data);
        assert_eq!(power, 20_000_000);
    }

    #[test]
    fn absent_period_yields_zero() {
        let data = vec![point("00:00-00:15", 66.3, 31.91)];
        let power = MarketProportional.compute(40_000_000.0, t(17, 30), &data);
        assert_eq!(power, 0);
    }

    #[test]
    fn empty_dataset_yields_zero() {
        let power = MarketProportional.compute(40_000_000.0, t(12, 0), &[]);
        assert_eq!(power, 0);
    }

    #[test]
    fn zero_volume_period_yields_zero() {
        let data = vec![
            point("12:00-12:15", 0.0, 42.15),
            point("12:15-12:30", 80.0, 40.00),
        ];
        let power = MarketProportional.compute(40_000_000.0, t(12, 5), &data);
        assert_eq!(power, 0);
    }

    #[test]
    fn all_zero_volumes_yield_zero() {
        let data = vec![
            point("12:00-12:15", 0.0, 42.15),
            point("12:15-12:30", 0.0, 40.00),
        ];
        let power = MarketProportional.compute(40_000_000.0, t(12, 20), &data);
        assert_eq!(power, 0);
    }

    #[test]
    fn result_rounds_to_nearest_integer() {
        let data = vec![
            point("12:00-12:15", 1.0, 10.0),
            point("12:15-12:30", 3.0, 10.0),
        ];
        // 1/3 of 100 rounds to 33.
        let power = MarketProportional.compute(100.0, t(12, 0), &data);
        assert_eq!(power, 33);
    }
}
