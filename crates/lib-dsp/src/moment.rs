//! Rigidity, moment-rate functions and moment magnitude.
//!
//! These feed moment-rate analyses of a rupture; the waveform synthesis
//! path does not use them.

use crate::error::{DspError, DspResult};
use lib_types::fault::{RuptureModel, Subfault};
use lib_types::structure::VelocityModel;
use lib_types::units::{Kilometers, Meters, NewtonMeters, Pascals, Seconds};
use ndarray::Array1;

/// Samples in a single triangular source-time function.
pub const STF_SAMPLES: usize = 1000;

/// Samples on the common grid when two source-time functions are summed.
pub const STF_SUM_SAMPLES: usize = 10_000;

/// Shear modulus at `depth`: `(1000·Vs)²·ρ·1000` of the enclosing layer.
///
/// Velocities are in km/s and densities in g/cm³, so the factors of 1000
/// bring both to SI.
pub fn rigidity(model: &VelocityModel, depth: Kilometers) -> Pascals {
    let layer = model.layer_index(depth);
    let vs = 1000.0 * model.shear_velocity(layer);
    Pascals(vs * vs * model.density(layer) * 1000.0)
}

/// Moment rate sampled on a time axis.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceTimeFunction {
    pub times: Array1<f64>,
    pub rate: Array1<f64>,
}

impl SourceTimeFunction {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Largest moment rate and the time it occurs.
    pub fn peak(&self) -> Option<(Seconds, f64)> {
        self.times
            .iter()
            .zip(self.rate.iter())
            .fold(None, |best: Option<(f64, f64)>, (&t, &r)| match best {
                Some((_, br)) if br >= r => best,
                _ => Some((t, r)),
            })
            .map(|(t, r)| (Seconds(t), r))
    }

    /// Trapezoidal integral of the moment rate.
    pub fn total_moment(&self) -> NewtonMeters {
        let total = self
            .times
            .windows(2)
            .into_iter()
            .zip(self.rate.windows(2))
            .map(|(t, r)| 0.5 * (t[1] - t[0]) * (r[0] + r[1]))
            .sum();
        NewtonMeters(total)
    }

    /// Linear interpolation that is zero outside the sampled span.
    pub fn rate_at(&self, t: f64) -> f64 {
        let n = self.times.len();
        if n == 0 || t < self.times[0] || t > self.times[n - 1] {
            return 0.0;
        }
        let upper = self
            .times
            .as_slice()
            .map(|times| times.partition_point(|&x| x < t))
            .unwrap_or_else(|| self.times.iter().take_while(|&&x| x < t).count());
        if upper == 0 {
            return self.rate[0];
        }
        let (t0, t1) = (self.times[upper - 1], self.times[upper]);
        let (r0, r1) = (self.rate[upper - 1], self.rate[upper]);
        if t1 == t0 {
            return r1;
        }
        r0 + (r1 - r0) * (t - t0) / (t1 - t0)
    }
}

/// Symmetric triangular moment-rate function over `[t0, t0 + rise_time]`.
///
/// The rate climbs with slope `4·mu·area/rise²` to a peak at the midpoint and
/// falls back to zero, so it integrates to `mu·area·slip`.
pub fn triangle_source_time_function(
    mu: Pascals,
    area: f64,
    rise_time: Seconds,
    t0: Seconds,
    slip: Meters,
) -> DspResult<SourceTimeFunction> {
    if rise_time.0 <= 0.0 || !rise_time.0.is_finite() {
        return Err(DspError::InvalidConfig(format!(
            "rise time must be positive, got {}",
            rise_time.0
        )));
    }

    let m = 4.0 * mu.0 * area / (rise_time.0 * rise_time.0);
    let midpoint = t0.0 + rise_time.0 / 2.0;
    let up_intercept = -m * t0.0;
    let down_intercept = m * (t0.0 + rise_time.0);

    let times = Array1::linspace(t0.0, t0.0 + rise_time.0, STF_SAMPLES);
    let rate = times.mapv(|t| {
        let mdot = if t <= midpoint {
            m * t + up_intercept
        } else {
            -m * t + down_intercept
        };
        mdot * slip.0
    });

    Ok(SourceTimeFunction { times, rate })
}

/// Sum two source-time functions on a common grid spanning both.
pub fn add_source_time_functions(
    a: &SourceTimeFunction,
    b: &SourceTimeFunction,
) -> DspResult<SourceTimeFunction> {
    if a.is_empty() && b.is_empty() {
        return Err(DspError::EmptyOperands);
    }
    let first = |stf: &SourceTimeFunction| stf.times.first().copied();
    let last = |stf: &SourceTimeFunction| stf.times.last().copied();

    let start = first(a).into_iter().chain(first(b)).fold(f64::INFINITY, f64::min);
    let end = last(a).into_iter().chain(last(b)).fold(f64::NEG_INFINITY, f64::max);

    let times = Array1::linspace(start, end, STF_SUM_SAMPLES);
    let rate = times.mapv(|t| a.rate_at(t) + b.rate_at(t));
    Ok(SourceTimeFunction { times, rate })
}

/// Rigidity for one subfault: its own column if present, else from `model`.
pub fn subfault_rigidity(subfault: &Subfault, model: Option<&VelocityModel>) -> DspResult<Pascals> {
    match (subfault.rigidity, model) {
        (Some(mu), _) => Ok(mu),
        (None, Some(model)) => Ok(rigidity(model, subfault.depth)),
        (None, None) => Err(DspError::InvalidConfig(format!(
            "{} has no rigidity and no velocity model was given",
            subfault.tag()
        ))),
    }
}

/// Scalar moment `Σ mu·area·slip` over every row of the rupture.
pub fn seismic_moment(rupture: &RuptureModel, model: Option<&VelocityModel>) -> DspResult<NewtonMeters> {
    rupture
        .subfaults
        .iter()
        .map(|sf| {
            let mu = subfault_rigidity(sf, model)?;
            Ok(NewtonMeters(mu.0 * sf.area() * sf.slip().0))
        })
        .sum::<DspResult<NewtonMeters>>()
}

/// `Mw = 2/3 (log10 M0 − 9.1)`.
pub fn moment_magnitude(moment: NewtonMeters) -> f64 {
    (2.0 / 3.0) * (moment.0.log10() - 9.1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn model() -> VelocityModel {
        VelocityModel::new(array![
            [2.0, 2.0, 3.5, 2.2],
            [8.0, 3.4, 6.0, 2.7],
            [0.0, 4.5, 8.0, 3.3],
        ])
        .unwrap()
    }

    #[test]
    fn test_rigidity_layer_selection() {
        let m = model();
        let expected = |vs: f64, rho: f64| (1000.0 * vs) * (1000.0 * vs) * rho * 1000.0;

        assert!((rigidity(&m, Kilometers(1.0)).0 - expected(2.0, 2.2)).abs() < 1.0);
        assert!((rigidity(&m, Kilometers(6.0)).0 - expected(3.4, 2.7)).abs() < 1.0);
        assert!((rigidity(&m, Kilometers(30.0)).0 - expected(4.5, 3.3)).abs() < 1.0);
    }

    #[test]
    fn test_rigidity_halfspace() {
        let hs = VelocityModel::new(array![[0.0, 3.0, 5.2, 2.5]]).unwrap();
        let mu = rigidity(&hs, Kilometers(100.0));
        assert!((mu.as_gpa() - 22.5).abs() < 1e-9);
    }

    #[test]
    fn test_triangle_peak_and_area() {
        let mu = Pascals(30e9);
        let area = 10e3 * 5e3;
        let stf = triangle_source_time_function(mu, area, Seconds(4.0), Seconds(2.0), Meters(1.5))
            .unwrap();

        assert_eq!(stf.len(), STF_SAMPLES);
        assert!((stf.times[0] - 2.0).abs() < 1e-12);
        assert!((stf.times[STF_SAMPLES - 1] - 6.0).abs() < 1e-12);
        assert!(stf.rate[0].abs() < 1e-3 * stf.rate.iter().cloned().fold(0.0, f64::max));

        let (t_peak, peak) = stf.peak().unwrap();
        assert!((t_peak.0 - 4.0).abs() < 0.01);
        let expected_peak = 2.0 * mu.0 * area / 4.0 * 1.5;
        assert!((peak - expected_peak).abs() / expected_peak < 1e-2);

        let expected_moment = mu.0 * area * 1.5;
        assert!((stf.total_moment().0 - expected_moment).abs() / expected_moment < 1e-3);
    }

    #[test]
    fn test_triangle_rejects_zero_rise() {
        let result = triangle_source_time_function(Pascals(1.0), 1.0, Seconds(0.0), Seconds::ZERO, Meters(1.0));
        assert!(matches!(result, Err(DspError::InvalidConfig(_))));
    }

    #[test]
    fn test_add_source_time_functions() {
        let a = triangle_source_time_function(Pascals(1.0), 1.0, Seconds(2.0), Seconds(0.0), Meters(1.0)).unwrap();
        let b = triangle_source_time_function(Pascals(1.0), 1.0, Seconds(2.0), Seconds(5.0), Meters(2.0)).unwrap();

        let sum = add_source_time_functions(&a, &b).unwrap();

        assert_eq!(sum.len(), STF_SUM_SAMPLES);
        assert!((sum.times[0] - 0.0).abs() < 1e-12);
        assert!((sum.times[STF_SUM_SAMPLES - 1] - 7.0).abs() < 1e-12);
        // gap between the two triangles
        assert!(sum.rate_at(3.5).abs() < 1e-12);

        let expected = a.total_moment().0 + b.total_moment().0;
        assert!((sum.total_moment().0 - expected).abs() / expected < 1e-3);
    }

    #[test]
    fn test_rate_at_zero_outside() {
        let stf = SourceTimeFunction {
            times: array![1.0, 2.0, 3.0],
            rate: array![0.0, 4.0, 0.0],
        };
        assert_eq!(stf.rate_at(0.5), 0.0);
        assert_eq!(stf.rate_at(3.5), 0.0);
        assert!((stf.rate_at(1.5) - 2.0).abs() < 1e-12);
        assert!((stf.rate_at(2.0) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_moment_magnitude() {
        // 1e21 N·m ≈ Mw 7.93
        let mw = moment_magnitude(NewtonMeters(1e21));
        assert!((mw - (2.0 / 3.0) * (21.0 - 9.1)).abs() < 1e-12);
    }
}
