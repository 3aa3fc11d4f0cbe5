//! Error types for DSP operations.

use lib_types::units::Seconds;
use thiserror::Error;

/// Errors that can occur during DSP operations.
#[derive(Debug, Error)]
pub enum DspError {
    /// Both operands of a superposition were empty.
    #[error("Cannot combine two empty time series")]
    EmptyOperands,

    /// Operands have incompatible sample intervals.
    #[error("Sample interval mismatch: {left:?} vs {right:?}")]
    ShapeMismatch { left: Seconds, right: Seconds },

    /// Requested a value outside the sampled time domain.
    #[error("Time {t:?} outside sampled domain [{start:?}, {end:?}]")]
    OutOfDomain { t: Seconds, start: Seconds, end: Seconds },

    /// Input length mismatch.
    #[error("Input length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Insufficient data for operation.
    #[error("Insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid configuration parameter.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Numerical instability detected.
    #[error("Numerical instability: {0}")]
    NumericalInstability(String),
}

/// Result type for DSP operations.
pub type DspResult<T> = Result<T, DspError>;
