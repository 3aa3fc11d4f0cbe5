//! Window functions for spectral resampling.
//!
//! Decimation removes everything above the new Nyquist frequency before
//! picking samples; rolling the passband edge off along a window instead of
//! cutting it keeps the truncation from ringing through the decimated trace.

use num_complex::Complex64;
use std::f64::consts::PI;

/// Window function types.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WindowType {
    /// No windowing (rectangular window).
    Rectangular,

    /// Hann (raised cosine) window.
    Hann,

    /// Hamming window.
    Hamming,

    /// Blackman window.
    Blackman,

    /// Kaiser-Bessel window with configurable beta parameter.
    Kaiser { beta: f64 },
}

impl Default for WindowType {
    fn default() -> Self {
        Self::Hann
    }
}

/// Compute the zeroth-order modified Bessel function of the first kind, I_0(x).
///
/// Uses the polynomial approximation for efficiency.
fn bessel_i0(x: f64) -> f64 {
    let ax = x.abs();

    if ax < 3.75 {
        let t = (x / 3.75).powi(2);
        1.0 + t * (3.5156229
            + t * (3.0899424
                + t * (1.2067492
                    + t * (0.2659732
                        + t * (0.0360768 + t * 0.0045813)))))
    } else {
        let t = 3.75 / ax;
        (ax.exp() / ax.sqrt())
            * (0.39894228
                + t * (0.01328592
                    + t * (0.00225319
                        + t * (-0.00157565
                            + t * (0.00916281
                                + t * (-0.02057706
                                    + t * (0.02635537
                                        + t * (-0.01647633 + t * 0.00392377))))))))
    }
}

/// Generate symmetric window coefficients.
///
/// Symmetric windows start and end on the same value and peak at the
/// center.
pub fn generate_window(window_type: WindowType, length: usize) -> Vec<f64> {
    if length == 0 {
        return Vec::new();
    }
    if length == 1 {
        return vec![1.0];
    }

    let n = length as f64;
    let mut window = Vec::with_capacity(length);

    match window_type {
        WindowType::Rectangular => {
            window.resize(length, 1.0);
        }

        WindowType::Hann => {
            for i in 0..length {
                let x = i as f64 / (n - 1.0);
                window.push(0.5 * (1.0 - (2.0 * PI * x).cos()));
            }
        }

        WindowType::Hamming => {
            for i in 0..length {
                let x = i as f64 / (n - 1.0);
                window.push(0.54 - 0.46 * (2.0 * PI * x).cos());
            }
        }

        WindowType::Blackman => {
            for i in 0..length {
                let x = i as f64 / (n - 1.0);
                window.push(
                    0.42 - 0.5 * (2.0 * PI * x).cos() + 0.08 * (4.0 * PI * x).cos(),
                );
            }
        }

        WindowType::Kaiser { beta } => {
            let denom = bessel_i0(beta);
            for i in 0..length {
                let x = 2.0 * i as f64 / (n - 1.0) - 1.0;
                let arg = beta * (1.0 - x * x).max(0.0).sqrt();
                window.push(bessel_i0(arg) / denom);
            }
        }
    }

    window
}

/// Low-pass weights for the rfft bins of a record being decimated.
///
/// Bins up to `cutoff_bin` pass; the top `taper_fraction` of that band rolls
/// off along the descending half of `window_type`; bins above the cutoff are
/// removed. A rectangular window gives a brick-wall filter.
pub fn lowpass_taper(
    window_type: WindowType,
    cutoff_bin: usize,
    taper_fraction: f64,
    bins: usize,
) -> Vec<f64> {
    let taper_len = if matches!(window_type, WindowType::Rectangular) {
        0
    } else {
        ((cutoff_bin as f64 * taper_fraction.clamp(0.0, 1.0)).ceil() as usize).min(cutoff_bin)
    };
    let full_window = generate_window(window_type, 2 * taper_len + 1);
    let taper_start = cutoff_bin - taper_len;

    (0..bins)
        .map(|k| {
            if k > cutoff_bin {
                0.0
            } else if k <= taper_start {
                1.0
            } else {
                full_window[taper_len + (k - taper_start)]
            }
        })
        .collect()
}

/// Multiply rfft bins in place by [`lowpass_taper`].
pub fn apply_lowpass(
    spectrum: &mut [Complex64],
    window_type: WindowType,
    cutoff_bin: usize,
    taper_fraction: f64,
) {
    let weights = lowpass_taper(window_type, cutoff_bin, taper_fraction, spectrum.len());
    for (bin, w) in spectrum.iter_mut().zip(weights) {
        *bin *= w;
    }
}
