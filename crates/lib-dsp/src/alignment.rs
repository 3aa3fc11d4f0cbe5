//! Time shifting and sample-grid alignment.
//!
//! Every unit response is delayed by its subfault's rupture onset before it
//! is summed sample-for-sample with others. Start times are snapped to whole
//! multiples of the sample interval in integer microseconds, so two series
//! shifted by unrelated onsets still land on a common grid and repeated
//! snapping never drifts.

use lib_types::timeseries::TimeSeries;
use lib_types::units::Seconds;

/// Check if two time steps are compatible (within a relative tolerance).
#[inline]
pub fn are_compatible_dt(dt1: Seconds, dt2: Seconds, relative_tolerance: f64) -> bool {
    let max_dt = dt1.0.max(dt2.0);
    if max_dt == 0.0 {
        return dt1.0 == dt2.0;
    }
    (dt1.0 - dt2.0).abs() / max_dt < relative_tolerance
}

/// Return a copy of `series` whose start is moved by `offset` (positive = later).
pub fn shift(series: &TimeSeries, offset: Seconds) -> TimeSeries {
    let mut shifted = series.clone();
    shift_in_place(&mut shifted, offset);
    shifted
}

/// Move the start of `series` by `offset` without copying samples.
#[inline]
pub fn shift_in_place(series: &mut TimeSeries, offset: Seconds) {
    series.t_start = series.t_start + offset;
}

/// Nearest multiple of `interval` to `t`, computed in whole microseconds.
///
/// Intervals shorter than a microsecond cannot be represented on that grid
/// and leave `t` untouched.
pub fn round_to_interval(t: Seconds, interval: Seconds) -> Seconds {
    let interval_us = interval.as_micros();
    if interval_us <= 0 {
        return t;
    }
    let t_us = t.as_micros();
    let intervals = (t_us as f64 / interval_us as f64).round() as i64;
    Seconds::from_micros(intervals * interval_us)
}

/// Copy of `series` with its start snapped to the nearest multiple of `interval`.
pub fn round_start_time(series: &TimeSeries, interval: Seconds) -> TimeSeries {
    let mut rounded = series.clone();
    round_start_time_in_place(&mut rounded, interval);
    rounded
}

/// In-place variant of [`round_start_time`].
#[inline]
pub fn round_start_time_in_place(series: &mut TimeSeries, interval: Seconds) {
    series.t_start = round_to_interval(series.t_start, interval);
}

/// Shift by `offset` then snap to the series' own sample interval.
pub fn delay_and_align(series: &mut TimeSeries, offset: Seconds) {
    shift_in_place(series, offset);
    let dt = series.dt;
    round_start_time_in_place(series, dt);
}
