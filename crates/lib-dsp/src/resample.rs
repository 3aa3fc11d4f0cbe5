//! Resampling unit responses to a common sample interval.
//!
//! Green's functions are computed at the corpus' native rate; a run may ask
//! for a different output rate. Going coarser first low-passes the record in
//! the frequency domain at the new Nyquist frequency and then picks samples
//! on the new grid; going finer interpolates linearly between the original
//! samples. Both keep the first sample's time, and every output sample sits
//! exactly at `t_start + k * target_dt`, so decimated responses still sum
//! sample-for-sample with each other.
//!
//! Interpolation is restricted to `[t_start, t_end]`: upsampling produces only
//! the new grid points that fall inside the original record, and asking for
//! a value beyond it is an error rather than an extrapolation.

use crate::alignment::are_compatible_dt;
use crate::error::{DspError, DspResult};
use crate::fft::FftEngine;
use crate::window::{apply_lowpass, WindowType};
use lib_types::timeseries::TimeSeries;
use lib_types::units::Seconds;

/// Resampling configuration.
#[derive(Clone, Debug)]
pub struct ResampleConfig {
    /// Window shaping the anti-alias roll-off before decimation.
    pub window: WindowType,

    /// Fraction of the retained band spent rolling off.
    pub taper_fraction: f64,

    /// Relative tolerance under which two intervals count as equal.
    pub dt_tolerance: f64,
}

impl Default for ResampleConfig {
    fn default() -> Self {
        Self {
            window: WindowType::Hann,
            taper_fraction: 0.2,
            dt_tolerance: 1e-10,
        }
    }
}

/// Which way a resample goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResampleDirection {
    Unchanged,
    Down,
    Up,
}

/// Classify a resample from `current` to `target` interval.
pub fn direction(current: Seconds, target: Seconds, tolerance: f64) -> ResampleDirection {
    if are_compatible_dt(current, target, tolerance) {
        ResampleDirection::Unchanged
    } else if target.0 > current.0 {
        ResampleDirection::Down
    } else {
        ResampleDirection::Up
    }
}

/// Resample `series` to `target_dt`.
///
/// Coarser targets decimate in the frequency domain, finer targets
/// interpolate linearly, equal targets return a copy.
pub fn resample(
    series: &TimeSeries,
    target_dt: Seconds,
    config: &ResampleConfig,
    engine: &mut FftEngine,
) -> DspResult<TimeSeries> {
    if series.is_empty() {
        return Err(DspError::InsufficientData { needed: 1, got: 0 });
    }

    if target_dt.0 <= 0.0 || !target_dt.0.is_finite() {
        return Err(DspError::InvalidConfig(format!(
            "target interval must be positive, got {}",
            target_dt.0
        )));
    }

    match direction(series.dt, target_dt, config.dt_tolerance) {
        ResampleDirection::Unchanged => Ok(series.clone()),
        ResampleDirection::Down => decimate(series, target_dt, config, engine),
        ResampleDirection::Up => upsample(series, target_dt),
    }
}

/// Anti-aliased decimation to a coarser interval.
///
/// The spectrum is cut at the new Nyquist frequency with `config`'s roll-off,
/// transformed back at the original length, and sampled on the new grid
/// inside `[t_start, t_end]`.
pub fn decimate(
    series: &TimeSeries,
    target_dt: Seconds,
    config: &ResampleConfig,
    engine: &mut FftEngine,
) -> DspResult<TimeSeries> {
    let n = series.len();
    if n == 0 {
        return Err(DspError::InsufficientData { needed: 1, got: 0 });
    }

    // Bin k sits at k / (n * dt); the new Nyquist is 1 / (2 * target_dt).
    let cutoff_bin = (n as f64 * series.dt.0 / (2.0 * target_dt.0) + 1e-9).floor() as usize;

    tracing::trace!(
        "decimate: n={}, dt={:.4}s -> {:.4}s, cutoff bin {}",
        n,
        series.dt.0,
        target_dt.0,
        cutoff_bin
    );

    let mut spectrum = engine.rfft(&series.samples)?;
    apply_lowpass(&mut spectrum, config.window, cutoff_bin, config.taper_fraction);
    let filtered = TimeSeries {
        samples: engine.irfft(&spectrum, n)?,
        dt: series.dt,
        t_start: series.t_start,
        stats: series.stats.clone(),
    };

    resample_grid(&filtered, target_dt)
}

/// Linear interpolation onto a finer grid inside the original record.
pub fn upsample(series: &TimeSeries, target_dt: Seconds) -> DspResult<TimeSeries> {
    if series.is_empty() {
        return Err(DspError::InsufficientData { needed: 1, got: 0 });
    }
    resample_grid(series, target_dt)
}

/// Sample `series` at `t_start + k * target_dt` for every grid point inside
/// the record.
fn resample_grid(series: &TimeSeries, target_dt: Seconds) -> DspResult<TimeSeries> {
    let span = series.t_end().0 - series.t_start.0;
    let new_len = (span / target_dt.0 + 1e-6).floor() as usize + 1;

    let samples = (0..new_len)
        .map(|i| value_at(series, Seconds(series.t_start.0 + i as f64 * target_dt.0)))
        .collect::<DspResult<Vec<f64>>>()?;

    Ok(TimeSeries {
        samples,
        dt: target_dt,
        t_start: series.t_start,
        stats: series.stats.clone(),
    })
}

/// Linearly interpolated value at `t`, or `OutOfDomain` outside the record.
pub fn value_at(series: &TimeSeries, t: Seconds) -> DspResult<f64> {
    series.interpolate_at(t).ok_or(DspError::OutOfDomain {
        t,
        start: series.t_start,
        end: series.t_end(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gaussian(len: usize, dt: f64, center: f64, sigma: f64) -> TimeSeries {
        let samples = (0..len)
            .map(|i| {
                let t = i as f64 * dt - center;
                (-(t * t) / (2.0 * sigma * sigma)).exp()
            })
            .collect();
        TimeSeries::new(samples, Seconds(dt), Seconds::ZERO)
    }

    #[test]
    fn test_resample_identity() {
        let ts = TimeSeries::new(vec![1.0, 2.0, 3.0, 4.0, 5.0], Seconds(0.1), Seconds(2.0));
        let mut engine = FftEngine::new();

        let out = resample(&ts, Seconds(0.1), &ResampleConfig::default(), &mut engine).unwrap();
        assert_eq!(out, ts);
    }

    #[test]
    fn test_upsample_keeps_endpoints() {
        let ts = TimeSeries::new(vec![0.0, 1.0, 0.0, -1.0, 0.0], Seconds(1.0), Seconds(3.0));
        let up = upsample(&ts, Seconds(0.5)).unwrap();

        assert_eq!(up.len(), 9);
        assert!((up.t_start.0 - 3.0).abs() < 1e-12);
        assert!((up.t_end().0 - ts.t_end().0).abs() < 1e-9);
        assert!((up.samples[1] - 0.5).abs() < 1e-12);
        assert!((up.samples[8] - 0.0).abs() < 1e-12);
    }

    #[test]
    fn test_upsample_never_extrapolates() {
        // 0.3 does not divide the 1 s span; last point stays inside it.
        let ts = TimeSeries::new(vec![0.0, 1.0], Seconds(1.0), Seconds::ZERO);
        let up = upsample(&ts, Seconds(0.3)).unwrap();

        assert_eq!(up.len(), 4);
        assert!(up.t_end().0 <= ts.t_end().0);
        assert!((up.samples[3] - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_value_outside_domain_errors() {
        let ts = TimeSeries::new(vec![1.0, 2.0, 3.0], Seconds(1.0), Seconds::ZERO);
        assert!(matches!(value_at(&ts, Seconds(2.5)), Err(DspError::OutOfDomain { .. })));
        assert!(matches!(value_at(&ts, Seconds(-0.1)), Err(DspError::OutOfDomain { .. })));
    }

    #[test]
    fn test_decimate_length_and_dc() {
        let ts = TimeSeries::new(vec![2.0; 100], Seconds(0.1), Seconds(1.0));
        let mut engine = FftEngine::new();
        let down = decimate(&ts, Seconds(0.5), &ResampleConfig::default(), &mut engine).unwrap();

        assert_eq!(down.len(), 20);
        assert!((down.t_start.0 - 1.0).abs() < 1e-12);
        for v in &down.samples {
            assert!((v - 2.0).abs() < 1e-9, "constant should survive decimation, got {}", v);
        }
    }

    #[test]
    fn test_up_then_down_recovers_original() {
        let original = gaussian(64, 1.0, 31.0, 6.0);
        let mut engine = FftEngine::new();
        let config = ResampleConfig::default();

        let up = resample(&original, Seconds(0.5), &config, &mut engine).unwrap();
        assert_eq!(up.len(), 127);

        let back = resample(&up, Seconds(1.0), &config, &mut engine).unwrap();
        assert!((back.dt.0 - 1.0).abs() < 1e-12);
        assert_eq!(back.len(), original.len());

        for (i, (orig, rec)) in original.samples.iter().zip(back.samples.iter()).enumerate() {
            assert!(
                (orig - rec).abs() < 0.03,
                "sample {} differs: {} vs {}",
                i,
                orig,
                rec
            );
        }
    }

    #[test]
    fn test_rejects_bad_target() {
        let ts = TimeSeries::new(vec![1.0, 2.0], Seconds(1.0), Seconds::ZERO);
        let mut engine = FftEngine::new();

        assert!(matches!(
            resample(&ts, Seconds(0.0), &ResampleConfig::default(), &mut engine),
            Err(DspError::InvalidConfig(_))
        ));
        assert!(matches!(
            resample(&TimeSeries::empty(Seconds(1.0)), Seconds(2.0), &ResampleConfig::default(), &mut engine),
            Err(DspError::InsufficientData { .. })
        ));
    }
}
