//! Fixed-width market period bucketing.
//!
//! Market samples arrive in quarter-hour buckets labelled `HH:MM-HH:MM`.
//! The day's final bucket is labelled `23:45-24:00` rather than wrapping
//! to `00:00`, matching the convention of market result tables.

use chrono::{NaiveTime, Timelike};

/// Width of one market period in minutes.
pub const PERIOD_MINUTES: u32 = 15;

/// Number of periods in one day.
pub const PERIODS_PER_DAY: usize = (24 * 60 / PERIOD_MINUTES) as usize;

/// Returns the label of the period containing the given wall-clock time.
pub fn period_label(time: NaiveTime) -> String {
    let hour = time.hour();
    let start = (time.minute() / PERIOD_MINUTES) * PERIOD_MINUTES;
    let end = start + PERIOD_MINUTES;

    if hour == 23 && start == 45 {
        return "23:45-24:00".to_string();
    }
    if end == 60 {
        format!("{hour:02}:{start:02}-{:02}:00", (hour + 1) % 24)
    } else {
        format!("{hour:02}:{start:02}-{hour:02}:{end:02}")
    }
}

/// Returns the ordered labels of all periods in a day.
pub fn day_periods() -> Vec<String> {
    let mut labels = Vec::with_capacity(PERIODS_PER_DAY);
    for hour in 0..24 {
        for quarter in 0..4 {
            let time = NaiveTime::from_hms_opt(hour, quarter * PERIOD_MINUTES, 0)
                .unwrap_or_default();
            labels.push(period_label(time));
        }
    }
    labels
}
