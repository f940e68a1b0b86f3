//! Error type for packing and encrypted control.

use thiserror::Error;

use crate::params::Scale;

/// All errors that can occur while packing, evaluating, or unpacking.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControlError {
    #[error("invalid packing width {tau}: need a power of two at most ring dimension {ring_dim}")]
    InvalidPackingWidth { tau: usize, ring_dim: usize },

    #[error("dimension violation: {0}")]
    DimensionViolation(String),

    #[error("scale mismatch: expected {expected}, got {actual}")]
    ScaleMismatch { expected: Scale, actual: Scale },

    #[error("packing width mismatch: context uses {expected}, ciphertext packed with {actual}")]
    PackingWidthMismatch { expected: usize, actual: usize },

    #[error("value {value} exceeds modulus headroom (|v| must not exceed {bound})")]
    ModulusOverflow { value: i64, bound: u64 },

    #[error("cannot quantize {value} with step {step}")]
    Quantization { value: f64, step: f64 },

    #[error("no key-switching key for Galois element {0}")]
    MissingGaloisKey(usize),

    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("matrix entry ({row}, {col}) = {value} is not an integer")]
    NonIntegerMatrix { row: usize, col: usize, value: f64 },
}

pub type Result<T> = std::result::Result<T, ControlError>;
