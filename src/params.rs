//! Parameter sets for the lattice backend and the fixed-point encoding.
//!
//! `RingParams` fixes the ring R_q and the noise/gadget settings used by the
//! lattice backend. `ScalingParameters` fixes the three quantization steps of
//! the controller encoding, and `Scale` tracks which product of those steps a
//! ciphertext's integer unit stands for.

use std::fmt;
use std::ops::Mul;

use serde::{Deserialize, Serialize};

use crate::error::{ControlError, Result};
use crate::math::{NttContext, DEFAULT_Q, DEFAULT_SIGMA};
use crate::rgsw::GadgetVector;

/// Ring and noise parameters for the lattice backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RingParams {
    /// Ring dimension d (power of two)
    pub ring_dim: usize,

    /// Ciphertext modulus q
    /// Must be NTT-friendly: q ≡ 1 (mod 2d)
    pub q: u64,

    /// Standard deviation for Gaussian error sampling
    pub sigma: f64,

    /// Gadget decomposition base z (power of two)
    pub gadget_base: u64,

    /// Number of digits in gadget decomposition: ℓ = ⌈log_z(q)⌉
    pub gadget_len: usize,
}

impl RingParams {
    /// Parameters used by the reference controller run: d = 2048, 60-bit q
    pub fn control_d2048() -> Self {
        // q = 2^60 - 2^14 + 1 = 1152921504606830593, q ≡ 1 (mod 2^14)
        let gadget_base: u64 = 1 << 8;
        let gadget_len = ((DEFAULT_Q as f64).log2() / 8.0).ceil() as usize; // 8

        Self {
            ring_dim: 2048,
            q: DEFAULT_Q,
            sigma: DEFAULT_SIGMA,
            gadget_base,
            gadget_len,
        }
    }

    /// Small ring for tests and benchmarks. Not secure.
    pub fn insecure_d256() -> Self {
        Self {
            ring_dim: 256,
            ..Self::control_d2048()
        }
    }

    /// Check if parameters are valid
    pub fn validate(&self) -> Result<()> {
        if !self.ring_dim.is_power_of_two() || self.ring_dim < 2 {
            return Err(ControlError::InvalidParams(format!(
                "ring_dim {} must be a power of two",
                self.ring_dim
            )));
        }

        if self.q % (2 * self.ring_dim as u64) != 1 {
            return Err(ControlError::InvalidParams(
                "q must be ≡ 1 (mod 2d) for NTT".into(),
            ));
        }

        if !(self.sigma.is_finite() && self.sigma > 0.0) {
            return Err(ControlError::InvalidParams(format!(
                "sigma {} must be positive",
                self.sigma
            )));
        }

        if !self.gadget_base.is_power_of_two() || self.gadget_base < 2 {
            return Err(ControlError::InvalidParams(format!(
                "gadget_base {} must be a power of two ≥ 2",
                self.gadget_base
            )));
        }

        // z^ℓ must cover q so every coefficient decomposes exactly
        let digit_bits = self.gadget_base.trailing_zeros() as usize;
        let q_bits = 64 - self.q.leading_zeros() as usize;
        if self.gadget_len == 0 || digit_bits * self.gadget_len < q_bits {
            return Err(ControlError::InvalidParams(format!(
                "gadget {}^{} does not cover a {}-bit modulus",
                self.gadget_base, self.gadget_len, q_bits
            )));
        }

        Ok(())
    }

    /// Build the NTT context for this ring
    pub fn ntt_context(&self) -> NttContext {
        NttContext::new(self.ring_dim, self.q)
    }

    /// Gadget vector for RGSW and key-switching keys
    pub fn gadget(&self) -> GadgetVector {
        GadgetVector::new(self.gadget_base, self.gadget_len, self.q)
    }
}

impl Default for RingParams {
    fn default() -> Self {
        Self::control_d2048()
    }
}

/// Quantization steps of the fixed-point controller encoding.
///
/// * `state_step` (s): resolution of the controller matrices G, R, H
/// * `signal_step` (r): resolution of sensor and actuator signals
/// * `encoding_step` (L): extra resolution applied when encrypting;
///   `1/L` must be an integer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalingParameters {
    pub state_step: f64,
    pub signal_step: f64,
    pub encoding_step: f64,
}

impl ScalingParameters {
    /// s = 1e-4, r = 1e-3, L = 1e-3
    pub fn reference() -> Self {
        Self {
            state_step: 1e-4,
            signal_step: 1e-3,
            encoding_step: 1e-3,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, step) in [
            ("state_step", self.state_step),
            ("signal_step", self.signal_step),
            ("encoding_step", self.encoding_step),
        ] {
            if !(step.is_finite() && step > 0.0) {
                return Err(ControlError::InvalidParams(format!(
                    "{} must be positive and finite, got {}",
                    name, step
                )));
            }
        }
        self.lift().map(|_| ())
    }

    /// Integer factor `1/L` applied to quantized values before encryption.
    pub fn lift(&self) -> Result<u64> {
        let inv = 1.0 / self.encoding_step;
        let rounded = inv.round();
        if !(rounded >= 1.0 && rounded < u32::MAX as f64) || (inv - rounded).abs() > 1e-6 * rounded
        {
            return Err(ControlError::InvalidParams(format!(
                "encoding_step {} is not the reciprocal of an integer",
                self.encoding_step
            )));
        }
        Ok(rounded as u64)
    }
}

impl Default for ScalingParameters {
    fn default() -> Self {
        Self::reference()
    }
}

/// Real value of one integer unit of an encrypted quantity, stored as
/// exponents: `state_step^state · signal_step^signal · encoding_step^encoding`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Scale {
    pub state: i32,
    pub signal: i32,
    pub encoding: i32,
}

impl Scale {
    pub const UNIT: Scale = Scale::new(0, 0, 0);
    pub const STATE: Scale = Scale::new(1, 0, 0);
    pub const SIGNAL: Scale = Scale::new(0, 1, 0);
    pub const ENCODING: Scale = Scale::new(0, 0, 1);

    pub const fn new(state: i32, signal: i32, encoding: i32) -> Self {
        Self {
            state,
            signal,
            encoding,
        }
    }

    /// Real value of one unit under the given steps
    pub fn value(&self, steps: &ScalingParameters) -> f64 {
        steps.state_step.powi(self.state)
            * steps.signal_step.powi(self.signal)
            * steps.encoding_step.powi(self.encoding)
    }
}

impl Mul for Scale {
    type Output = Scale;

    fn mul(self, rhs: Scale) -> Scale {
        Scale {
            state: self.state + rhs.state,
            signal: self.signal + rhs.signal,
            encoding: self.encoding + rhs.encoding,
        }
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Scale::UNIT {
            return write!(f, "1");
        }
        let mut first = true;
        for (name, exp) in [
            ("s", self.state),
            ("r", self.signal),
            ("L", self.encoding),
        ] {
            if exp == 0 {
                continue;
            }
            if !first {
                write!(f, "·")?;
            }
            first = false;
            if exp == 1 {
                write!(f, "{}", name)?;
            } else {
                write!(f, "{}^{}", name, exp)?;
            }
        }
        Ok(())
    }
}
