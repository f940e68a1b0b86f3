//! Packing context: width, slot permutation, and unpack round tables.

use tracing::info;

use crate::backend::HomomorphicBackend;
use crate::error::{ControlError, Result};
use crate::math::ModQ;
use crate::params::ScalingParameters;

use super::slots::{permutation, SlotPermutation};

/// Automorphism and monomial used by one unpack round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoldRound {
    /// g = τ/2^r + 1
    pub galois_element: usize,
    /// Exponent of X^(-(N/τ)·2^r), stored as 2N - (N/τ)·2^r
    pub monomial_exponent: usize,
}

/// Everything fixed at setup: the backend with its Galois keys, the packing
/// width, the slot permutation, the per-round fold tables, and the scaling.
///
/// One context owns both the packer's layout and the unpacker's tables, so
/// the two cannot disagree on `tau`.
pub struct PackingContext<B: HomomorphicBackend> {
    pub(crate) backend: B,
    pub(crate) tau: usize,
    pub(crate) stride: usize,
    pub(crate) permutation: SlotPermutation,
    pub(crate) rounds: Vec<FoldRound>,
    pub(crate) tau_inv: u64,
    pub(crate) scaling: ScalingParameters,
    pub(crate) lift: u64,
}

impl<B: HomomorphicBackend> PackingContext<B> {
    /// Fix packing width `tau` and generate the Galois keys its unpack
    /// rounds need.
    pub fn setup(mut backend: B, tau: usize, scaling: ScalingParameters) -> Result<Self> {
        let ring_dim = backend.ring_dim();
        let q = backend.modulus();

        if !tau.is_power_of_two() || tau > ring_dim {
            return Err(ControlError::InvalidPackingWidth { tau, ring_dim });
        }
        scaling.validate()?;
        let lift = scaling.lift()?;

        let permutation = permutation(tau)?;
        let stride = ring_dim / tau;
        let rounds = fold_rounds(tau, ring_dim);

        let tau_inv = ModQ::inv(tau as u64 % q, q).ok_or_else(|| {
            ControlError::InvalidParams(format!("packing width {} is not invertible mod q", tau))
        })?;

        let elements: Vec<usize> = rounds.iter().map(|r| r.galois_element).collect();
        backend.generate_galois_keys(&elements)?;

        info!(
            tau,
            ring_dim,
            rounds = rounds.len(),
            "packing context ready"
        );

        Ok(Self {
            backend,
            tau,
            stride,
            permutation,
            rounds,
            tau_inv,
            scaling,
            lift,
        })
    }

    /// Set up with the smallest power-of-two width covering all three
    /// controller dimensions.
    pub fn for_dimensions(
        backend: B,
        state_dim: usize,
        output_dim: usize,
        input_dim: usize,
        scaling: ScalingParameters,
    ) -> Result<Self> {
        if state_dim == 0 || output_dim == 0 || input_dim == 0 {
            return Err(ControlError::DimensionViolation(
                "controller dimensions must be positive".into(),
            ));
        }
        let tau = packing_width(state_dim.max(output_dim).max(input_dim));
        Self::setup(backend, tau, scaling)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn tau(&self) -> usize {
        self.tau
    }

    /// Spacing N/τ between packed slots
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn permutation(&self) -> &SlotPermutation {
        &self.permutation
    }

    pub fn rounds(&self) -> &[FoldRound] {
        &self.rounds
    }

    pub fn scaling(&self) -> &ScalingParameters {
        &self.scaling
    }

    /// Integer 1/L applied to quantized values before encryption
    pub fn lift(&self) -> u64 {
        self.lift
    }

    pub(crate) fn check_tau(&self, actual: usize) -> Result<()> {
        if actual != self.tau {
            return Err(ControlError::PackingWidthMismatch {
                expected: self.tau,
                actual,
            });
        }
        Ok(())
    }
}

/// Smallest power of two ≥ `max_dim`
pub fn packing_width(max_dim: usize) -> usize {
    max_dim.max(1).next_power_of_two()
}

fn fold_rounds(tau: usize, ring_dim: usize) -> Vec<FoldRound> {
    let stride = ring_dim / tau;
    let log_tau = tau.trailing_zeros();
    (0..log_tau)
        .map(|r| FoldRound {
            galois_element: (tau >> r) + 1,
            monomial_exponent: 2 * ring_dim - (stride << r),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::PlainBackend;
    use crate::math::DEFAULT_Q;

    fn backend() -> PlainBackend {
        PlainBackend::new(64, DEFAULT_Q).unwrap()
    }

    #[test]
    fn test_packing_width() {
        assert_eq!(packing_width(1), 1);
        assert_eq!(packing_width(3), 4);
        assert_eq!(packing_width(4), 4);
        assert_eq!(packing_width(5), 8);
    }

    #[test]
    fn test_fold_rounds() {
        let ctx = PackingContext::setup(backend(), 8, ScalingParameters::reference()).unwrap();
        assert_eq!(ctx.stride(), 8);
        assert_eq!(
            ctx.rounds(),
            &[
                FoldRound {
                    galois_element: 9,
                    monomial_exponent: 120
                },
                FoldRound {
                    galois_element: 5,
                    monomial_exponent: 112
                },
                FoldRound {
                    galois_element: 3,
                    monomial_exponent: 96
                },
            ]
        );
        assert_eq!(ModQ::mul(ctx.tau_inv, 8, DEFAULT_Q), 1);
        assert_eq!(ctx.lift(), 1000);
    }

    #[test]
    fn test_width_one_has_no_rounds() {
        let ctx = PackingContext::setup(backend(), 1, ScalingParameters::reference()).unwrap();
        assert!(ctx.rounds().is_empty());
        assert_eq!(ctx.stride(), 64);
    }

    #[test]
    fn test_rejects_bad_width() {
        for tau in [0, 3, 128] {
            assert!(matches!(
                PackingContext::setup(backend(), tau, ScalingParameters::reference()),
                Err(ControlError::InvalidPackingWidth { .. })
            ));
        }
    }

    #[test]
    fn test_for_dimensions() {
        let ctx =
            PackingContext::for_dimensions(backend(), 4, 2, 3, ScalingParameters::reference())
                .unwrap();
        assert_eq!(ctx.tau(), 4);
        assert!(PackingContext::for_dimensions(
            backend(),
            0,
            2,
            2,
            ScalingParameters::reference()
        )
        .is_err());
    }

    #[test]
    fn test_rejects_fractional_lift() {
        let scaling = ScalingParameters {
            encoding_step: 0.3,
            ..ScalingParameters::reference()
        };
        assert!(PackingContext::setup(backend(), 4, scaling).is_err());
    }
}
