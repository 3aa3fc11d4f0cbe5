//! Weighted superposition of time series over their union window.
//!
//! Two records rarely cover the same interval: a unit response delayed by a
//! late rupture onset starts after the accumulator, and the accumulator may
//! run past the end of a short response. Both operands are therefore
//! extended to the union window before summing:
//!
//! - the front is zero-padded (nothing has arrived yet);
//! - the tail is padded with the mean of the samples just before the
//!   operand's final one, so a record that has already settled to its static
//!   offset keeps that offset instead of dropping to zero.
//!
//! Nothing from either operand is truncated.

use crate::alignment::{are_compatible_dt, round_start_time_in_place};
use crate::error::{DspError, DspResult};
use lib_types::timeseries::TimeSeries;
use lib_types::units::Seconds;

/// Relative tolerance for two intervals to be summed sample-for-sample.
pub const DT_TOLERANCE: f64 = 1e-6;

/// How many trailing samples set the tail padding value of each operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PadPolicy {
    /// Tail window of the first operand.
    pub lead_tail_window: usize,

    /// Tail window of the second operand.
    pub trail_tail_window: usize,
}

impl Default for PadPolicy {
    fn default() -> Self {
        Self {
            lead_tail_window: 60,
            trail_tail_window: 20,
        }
    }
}

impl PadPolicy {
    /// Same window for both operands.
    pub fn symmetric(window: usize) -> Self {
        Self {
            lead_tail_window: window,
            trail_tail_window: window,
        }
    }
}

/// Sum `weight_a * a + weight_b * b` over the union of their time windows.
///
/// An empty operand stands in as zeros shaped like the other one; two empty
/// operands are an error, as are operands sampled at different intervals.
/// The result carries `a`'s stats (or `b`'s when `a` is empty), `a`'s
/// interval and the union start time.
pub fn combine(
    a: &TimeSeries,
    b: &TimeSeries,
    weight_a: f64,
    weight_b: f64,
    policy: &PadPolicy,
) -> DspResult<TimeSeries> {
    let (mut a, mut b) = match (a.is_empty(), b.is_empty()) {
        (true, true) => return Err(DspError::EmptyOperands),
        (true, false) => (b.zeroed(), b.clone()),
        (false, true) => (a.clone(), a.zeroed()),
        (false, false) => (a.clone(), b.clone()),
    };

    if !are_compatible_dt(a.dt, b.dt, DT_TOLERANCE) {
        tracing::warn!(left = a.dt.0, right = b.dt.0, "Refusing to combine series with different intervals");
        return Err(DspError::ShapeMismatch {
            left: a.dt,
            right: b.dt,
        });
    }

    let dt = a.dt;
    b = b.rebased(a.stats.reference);
    round_start_time_in_place(&mut a, dt);
    round_start_time_in_place(&mut b, dt);

    let start = a.t_start.min(b.t_start);
    let end = a.t_end().max(b.t_end());
    let len = window_len(start, end, dt);

    let extended_a = extend(&a, start, len, policy.lead_tail_window);
    let extended_b = extend(&b, start, len, policy.trail_tail_window);

    let samples = extended_a
        .iter()
        .zip(extended_b.iter())
        .map(|(x, y)| weight_a * x + weight_b * y)
        .collect();

    Ok(TimeSeries {
        samples,
        dt,
        t_start: start,
        stats: a.stats,
    })
}

/// Fold `(1, 1)` combines over `series`, starting from an empty record.
///
/// Returns `EmptyOperands` if every input is empty (or there are none).
pub fn superpose<'a, I>(series: I, policy: &PadPolicy) -> DspResult<TimeSeries>
where
    I: IntoIterator<Item = &'a TimeSeries>,
{
    let mut iter = series.into_iter();
    let first = match iter.next() {
        Some(first) => first,
        None => return Err(DspError::EmptyOperands),
    };
    iter.try_fold(first.clone(), |acc, next| combine(&acc, next, 1.0, 1.0, policy))
        .and_then(|total| {
            if total.is_empty() {
                Err(DspError::EmptyOperands)
            } else {
                Ok(total)
            }
        })
}

/// Number of samples spanning `[start, end]` inclusive at `dt`.
fn window_len(start: Seconds, end: Seconds, dt: Seconds) -> usize {
    ((end.0 - start.0) / dt.0).round().max(0.0) as usize + 1
}

/// Zero-pad `series` in front to begin at `start`, then edge-pad its tail to
/// `len` samples with [`TimeSeries::tail_mean`] over `tail_window`.
fn extend(series: &TimeSeries, start: Seconds, len: usize, tail_window: usize) -> Vec<f64> {
    let lead = ((series.t_start.0 - start.0) / series.dt.0).round().max(0.0) as usize;
    let fill = series.tail_mean(tail_window);

    let mut out = Vec::with_capacity(len.max(lead + series.len()));
    out.resize(lead, 0.0);
    out.extend_from_slice(&series.samples);
    if out.len() < len {
        out.resize(len, fill);
    }
    out
}
