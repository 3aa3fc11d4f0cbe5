//! # lib-dsp
//!
//! Signal processing core for slip-model forward synthesis.
//!
//! - **Alignment**: shifting by rupture onsets, snapping start times to the
//!   sample grid
//! - **Resampling**: FFT decimation and linear upsampling
//! - **Superposition**: weighted sums over the union window with zero/edge
//!   padding
//! - **Rake**: slip rotation, rake angle, zero-slip detection
//! - **Moment**: rigidity, source-time functions, moment magnitude

pub mod alignment;
pub mod error;
pub mod fft;
pub mod moment;
pub mod rake;
pub mod resample;
pub mod superposition;
pub mod window;

pub use error::{DspError, DspResult};
pub use fft::FftEngine;
pub use resample::{resample, ResampleConfig};
pub use superposition::{combine, superpose, PadPolicy};
pub use window::WindowType;
