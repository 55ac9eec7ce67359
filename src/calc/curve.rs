//! Deterministic time-of-day power curve.

use std::f64::consts::PI;

use chrono::{NaiveTime, Timelike};

/// Default phase offset in hours: the curve leaves zero at 04:00 and
/// peaks at 12:00.
pub const DEFAULT_PHASE_HOURS: f64 = 4.0;

/// Power follows `reference_max * max(0, sin(PI/16 * (t - phase)))^alpha`
/// where `t` is the fractional hour of day.
///
/// The sine is clamped before exponentiation, so the curve is exactly 0
/// outside its positive half-cycle regardless of `alpha`.
#[derive(Debug, Clone, Copy)]
pub struct TimeCurve {
    /// Exponent shaping the curve's steepness.
    pub alpha: f64,
    /// Phase offset in hours.
    pub phase_hours: f64,
}

impl TimeCurve {
    /// Creates a curve with the given exponent and the default phase.
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            phase_hours: DEFAULT_PHASE_HOURS,
        }
    }

    /// Computes the target power in microwatts at the given wall-clock
    /// time, rounded to the nearest integer.
    pub fn compute(&self, reference_max_uw: f64, now: NaiveTime) -> u64 {
        let t = f64::from(now.hour()) + f64::from(now.minute()) / 60.0;
        let sine = ((PI / 16.0) * (t - self.phase_hours)).sin().max(0.0);
        let power = reference_max_uw * sine.powf(self.alpha);
        if power <= 0.0 {
            0
        } else {
            power.round() as u64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).expect("valid test time")
    }

    #[test]
    fn zero_outside_positive_half_cycle_for_even_alpha() {
        let curve = TimeCurve::new(4.0);
        // sin(PI/16 * (t - 4)) is negative for t < 4 and t > 20.
        assert_eq!(curve.compute(40_000_000.0, t(0, 0)), 0);
        assert_eq!(curve.compute(40_000_000.0, t(3, 59)), 0);
        assert_eq!(curve.compute(40_000_000.0, t(21, 0)), 0);
        assert_eq!(curve.compute(40_000_000.0, t(23, 45)), 0);
    }

    #[test]
    fn rises_monotonically_toward_noon_peak() {
        let curve = TimeCurve::new(4.0);
        let mut previous = 0;
        for hour in 5..=12 {
            let power = curve.compute(40_000_000.0, t(hour, 0));
            assert!(
                power > previous,
                "power should rise at {hour}:00, got {power} after {previous}"
            );
            previous = power;
        }
    }

    #[test]
    fn peak_equals_reference_max() {
        let curve = TimeCurve::new(4.0);
        // sin(PI/16 * 8) = 1 at t = 12.
        assert_eq!(curve.compute(40_000_000.0, t(12, 0)), 40_000_000);
    }

    #[test]
    fn curve_is_symmetric_around_peak() {
        let curve = TimeCurve::new(4.0);
        let morning = curve.compute(40_000_000.0, t(8, 0));
        let evening = curve.compute(40_000_000.0, t(16, 0));
        assert_eq!(morning, evening);
    }

    #[test]
    fn higher_alpha_narrows_the_curve() {
        let wide = TimeCurve::new(2.0);
        let narrow = TimeCurve::new(8.0);
        let at_nine = t(9, 0);
        assert!(narrow.compute(40_000_000.0, at_nine) < wide.compute(40_000_000.0, at_nine));
    }
}
