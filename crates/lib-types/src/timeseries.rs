//! Time-tagged, uniformly sampled signals.
//!
//! # Sample Semantics
//!
//! Samples in a `TimeSeries` are **point measurements**. For a series with `N`
//! samples the sample times are:
//!
//! ```text
//! t[i] = reference + t_start + i * dt,  for i = 0, 1, ..., N-1
//! ```
//!
//! `t_start` is kept relative to `stats.reference` (the trace's reference
//! epoch, usually the rupture origin time), so shifting a series by a rupture
//! onset only touches `t_start`. `t_end()` is the time of the last sample.

use crate::units::Seconds;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Metadata that travels with a series through superposition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TraceStats {
    /// Station code.
    pub station: String,

    /// Component label (e.g. `e`, `n`, `z`).
    pub component: String,

    /// Reference epoch that `t_start` is measured from.
    pub reference: NaiveDateTime,
}

impl Default for TraceStats {
    fn default() -> Self {
        Self {
            station: String::new(),
            component: String::new(),
            reference: NaiveDateTime::default(),
        }
    }
}

/// A uniformly-sampled time series.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Sample values.
    pub samples: Vec<f64>,

    /// Time step between consecutive samples.
    pub dt: Seconds,

    /// Time of the first sample relative to `stats.reference`.
    pub t_start: Seconds,

    /// Station/component tags and reference epoch.
    pub stats: TraceStats,
}

impl TimeSeries {
    /// Create a new series with default stats.
    pub fn new(samples: Vec<f64>, dt: Seconds, t_start: Seconds) -> Self {
        Self {
            samples,
            dt,
            t_start,
            stats: TraceStats::default(),
        }
    }

    /// Attach stats.
    pub fn with_stats(mut self, stats: TraceStats) -> Self {
        self.stats = stats;
        self
    }

    /// An empty series, the starting point of every accumulator.
    pub fn empty(dt: Seconds) -> Self {
        Self::new(Vec::new(), dt, Seconds::ZERO)
    }

    /// All-zero copy with the same shape and metadata.
    pub fn zeroed(&self) -> Self {
        Self {
            samples: vec![0.0; self.samples.len()],
            dt: self.dt,
            t_start: self.t_start,
            stats: self.stats.clone(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Total duration (`N * dt`).
    #[inline]
    pub fn duration(&self) -> Seconds {
        Seconds(self.samples.len() as f64 * self.dt.0)
    }

    /// Time of the last sample, or `t_start` if empty.
    #[inline]
    pub fn t_end(&self) -> Seconds {
        if self.samples.is_empty() {
            return self.t_start;
        }
        Seconds(self.t_start.0 + (self.samples.len() - 1) as f64 * self.dt.0)
    }

    /// Time of a given sample index.
    #[inline]
    pub fn time_at(&self, index: usize) -> Seconds {
        Seconds(self.t_start.0 + index as f64 * self.dt.0)
    }

    /// Linearly interpolate the value at `t`.
    ///
    /// Returns `None` outside `[t_start, t_end]`; this never extrapolates.
    /// A tolerance of a millionth of a sample absorbs grid round-off at the
    /// edges.
    pub fn interpolate_at(&self, t: Seconds) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let offset = (t.0 - self.t_start.0) / self.dt.0;
        let last = (self.samples.len() - 1) as f64;
        if offset < -1e-6 || offset > last + 1e-6 {
            return None;
        }
        let offset = offset.clamp(0.0, last);
        let idx = offset.floor() as usize;
        if idx + 1 >= self.samples.len() {
            return self.samples.last().copied();
        }
        let frac = offset - idx as f64;
        Some(self.samples[idx] * (1.0 - frac) + self.samples[idx + 1] * frac)
    }

    /// Mean of the `window - 1` samples before the final one.
    ///
    /// The window counts back from the end (clamped to the record) but the
    /// final sample itself is left out. When that leaves nothing to average
    /// (one-sample record, or `window <= 1`) the final sample is returned.
    pub fn tail_mean(&self, window: usize) -> f64 {
        let n = self.samples.len();
        let Some(&last) = self.samples.last() else {
            return 0.0;
        };
        let head = &self.samples[n - window.min(n)..n - 1];
        if head.is_empty() {
            return last;
        }
        head.iter().sum::<f64>() / head.len() as f64
    }

    /// Express `t_start` relative to another reference epoch.
    pub fn rebased(mut self, reference: NaiveDateTime) -> Self {
        if self.stats.reference != reference {
            let delta = self.stats.reference - reference;
            let shift = delta
                .num_microseconds()
                .map(Seconds::from_micros)
                .unwrap_or_else(|| Seconds::from_ms(delta.num_milliseconds() as f64));
            self.t_start = self.t_start + shift;
            self.stats.reference = reference;
        }
        self
    }

    /// Scale all samples by a factor.
    pub fn scale(&mut self, factor: f64) {
        for sample in &mut self.samples {
            *sample *= factor;
        }
    }

    /// Minimum and maximum sample, `(0, 0)` if empty.
    pub fn min_max(&self) -> (f64, f64) {
        if self.samples.is_empty() {
            return (0.0, 0.0);
        }
        self.samples
            .iter()
            .fold((f64::MAX, f64::MIN), |(min, max), &v| (min.min(v), max.max(v)))
    }

    /// Arithmetic mean, `0` if empty.
    pub fn mean(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_series_basics() {
        let ts = TimeSeries::new(vec![0.0, 0.5, 1.0, 0.5, 0.0], Seconds(0.5), Seconds(2.0));

        assert_eq!(ts.len(), 5);
        assert!((ts.duration().0 - 2.5).abs() < 1e-12);
        assert!((ts.t_end().0 - 4.0).abs() < 1e-12);
        assert!((ts.time_at(2).0 - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_interpolation_inside_domain() {
        let ts = TimeSeries::new(vec![0.0, 1.0, 0.0], Seconds(1.0), Seconds::ZERO);

        assert!((ts.interpolate_at(Seconds(0.5)).unwrap() - 0.5).abs() < 1e-12);
        assert!((ts.interpolate_at(Seconds(1.5)).unwrap() - 0.5).abs() < 1e-12);
        assert_eq!(ts.interpolate_at(Seconds(2.0)), Some(0.0));
    }

    #[test]
    fn test_interpolation_refuses_extrapolation() {
        let ts = TimeSeries::new(vec![1.0, 2.0], Seconds(1.0), Seconds::ZERO);

        assert_eq!(ts.interpolate_at(Seconds(-0.5)), None);
        assert_eq!(ts.interpolate_at(Seconds(1.5)), None);
        assert_eq!(TimeSeries::empty(Seconds(1.0)).interpolate_at(Seconds::ZERO), None);
    }

    #[test]
    fn test_tail_mean_short_series() {
        let ts = TimeSeries::new(vec![1.0, 2.0, 3.0, 4.0], Seconds(1.0), Seconds::ZERO);

        assert!((ts.tail_mean(2) - 3.0).abs() < 1e-12);
        assert!((ts.tail_mean(60) - 2.0).abs() < 1e-12);
        assert_eq!(ts.tail_mean(1), 4.0);
        assert_eq!(TimeSeries::new(vec![7.0], Seconds(1.0), Seconds::ZERO).tail_mean(60), 7.0);
        assert_eq!(TimeSeries::empty(Seconds(1.0)).tail_mean(20), 0.0);
    }

    #[test]
    fn test_rebase_moves_start() {
        let origin = NaiveDate::from_ymd_opt(2014, 4, 1)
            .unwrap()
            .and_hms_opt(23, 46, 47)
            .unwrap();
        let later = origin + chrono::Duration::seconds(10);

        let ts = TimeSeries::new(vec![1.0], Seconds(1.0), Seconds(2.0)).with_stats(TraceStats {
            reference: later,
            ..TraceStats::default()
        });
        let rebased = ts.rebased(origin);

        assert!((rebased.t_start.0 - 12.0).abs() < 1e-9);
        assert_eq!(rebased.stats.reference, origin);
    }
}
