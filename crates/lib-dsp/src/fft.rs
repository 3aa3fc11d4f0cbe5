//! Real FFT operations using realfft.
//!
//! Thin wrapper that caches plans across the many equal-length transforms a
//! station run performs when every unit response is decimated.

use crate::error::{DspError, DspResult};
use num_complex::Complex64;
use realfft::RealFftPlanner;

/// FFT engine with a cached real planner.
pub struct FftEngine {
    planner: RealFftPlanner<f64>,
}

impl FftEngine {
    /// Create a new FFT engine.
    pub fn new() -> Self {
        Self {
            planner: RealFftPlanner::new(),
        }
    }

    /// Forward real-to-complex FFT.
    ///
    /// Input: N real samples (any N > 0)
    /// Output: N/2 + 1 complex bins, unnormalized
    pub fn rfft(&mut self, data: &[f64]) -> DspResult<Vec<Complex64>> {
        if data.is_empty() {
            return Err(DspError::InsufficientData { needed: 1, got: 0 });
        }

        let r2c = self.planner.plan_fft_forward(data.len());
        let mut input = data.to_vec();
        let mut output = r2c.make_output_vec();

        r2c.process(&mut input, &mut output)
            .map_err(|e| DspError::NumericalInstability(e.to_string()))?;

        Ok(output)
    }

    /// Inverse complex-to-real FFT, normalized by `1 / output_len`.
    ///
    /// Input: output_len/2 + 1 complex bins. The imaginary parts of the DC
    /// bin (and of the Nyquist bin for even lengths) are discarded.
    pub fn irfft(&mut self, data: &[Complex64], output_len: usize) -> DspResult<Vec<f64>> {
        if output_len == 0 {
            return Err(DspError::InsufficientData { needed: 1, got: 0 });
        }

        let expected_input_len = output_len / 2 + 1;
        if data.len() != expected_input_len {
            return Err(DspError::LengthMismatch {
                expected: expected_input_len,
                actual: data.len(),
            });
        }

        let c2r = self.planner.plan_fft_inverse(output_len);
        let mut input = data.to_vec();
        input[0].im = 0.0;
        if output_len % 2 == 0 {
            input[expected_input_len - 1].im = 0.0;
        }
        let mut output = c2r.make_output_vec();

        c2r.process(&mut input, &mut output)
            .map_err(|e| DspError::NumericalInstability(e.to_string()))?;

        let scale = 1.0 / output_len as f64;
        for x in output.iter_mut() {
            *x *= scale;
        }

        Ok(output)
    }
}

impl Default for FftEngine {
    fn default() -> Self {
        Self::new()
    }
}
