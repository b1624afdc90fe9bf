//! Helpers shared by the provider mappings: rounding, day labels and the
//! daily sampling of the 3-hour forecast series.

use chrono::{DateTime, TimeZone, Utc};

/// Samples per day in a 3-hour series.
pub const SAMPLES_PER_DAY: usize = 8;

/// Days kept from the forecast series.
pub const FORECAST_DAYS: usize = 5;

/// Round a temperature to whole degrees. Halves go toward positive infinity.
pub fn round_temp(value: f64) -> i32 {
    // `value - floor` is exact, unlike `value + 0.5`.
    let floor = value.floor();
    if value - floor >= 0.5 {
        (floor + 1.0) as i32
    } else {
        floor as i32
    }
}

/// Pick one sample per day: index 0, 8, 16, ... and at most [`FORECAST_DAYS`].
///
/// Assumes the series starts near the same hour each day; this is not a
/// daily min/max aggregate.
pub fn daily_samples<T>(series: &[T]) -> impl Iterator<Item = &T> {
    series.iter().step_by(SAMPLES_PER_DAY).take(FORECAST_DAYS)
}

/// Short label such as `Mon, Jan 15` for `dt` as seen in `tz`.
pub fn day_label<Tz>(dt: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    dt.with_timezone(tz).format("%a, %b %-d").to_string()
}
