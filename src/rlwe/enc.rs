//! RLWE encryption and decryption
//!
//! Implements encryption: b = -a·s + e + Δ·m

use crate::math::{GaussianSampler, ModQ, NttContext, Poly};
use crate::params::RingParams;

use super::types::{RlweCiphertext, RlweSecretKey};

impl RlweSecretKey {
    /// Generate a secret key from Gaussian distribution
    pub fn generate(params: &RingParams, sampler: &mut GaussianSampler) -> Self {
        let coeffs: Vec<u64> = (0..params.ring_dim)
            .map(|_| ModQ::from_signed(sampler.sample(), params.q))
            .collect();
        Self {
            poly: Poly::from_coeffs(coeffs, params.q),
        }
    }
}

impl RlweCiphertext {
    /// Encrypt a message polynomial
    ///
    /// Computes: (a, b) where b = -a·s + e + Δ·m
    ///
    /// # Arguments
    /// * `sk` - Secret key
    /// * `message_poly` - Message polynomial
    /// * `delta` - Scaling factor Δ (1 for the fixed-point controller encoding)
    /// * `a_random` - Random polynomial a ∈ R_q
    /// * `error` - Error polynomial e sampled from Gaussian
    /// * `ctx` - NTT context for polynomial multiplication
    pub fn encrypt(
        sk: &RlweSecretKey,
        message_poly: &Poly,
        delta: u64,
        a_random: Poly,
        error: &Poly,
        ctx: &NttContext,
    ) -> Self {
        let scaled_msg = message_poly.scalar_mul(delta);
        let neg_a_s = -a_random.mul_ntt(&sk.poly, ctx);
        let b = &(&neg_a_s + error) + &scaled_msg;

        Self { a: a_random, b }
    }

    /// Decryption phase b + a·s = Δ·m + e
    ///
    /// With Δ = 1 the phase is the message plus noise; callers read it
    /// through [`Poly::coeff_signed`].
    pub fn decrypt_phase(&self, sk: &RlweSecretKey, ctx: &NttContext) -> Poly {
        let a_s = self.a.mul_ntt(&sk.poly, ctx);
        &a_s + &self.b
    }

    /// Homomorphic addition: decrypts to m1 + m2
    pub fn add(&self, other: &RlweCiphertext) -> RlweCiphertext {
        RlweCiphertext {
            a: &self.a + &other.a,
            b: &self.b + &other.b,
        }
    }

    /// Homomorphic subtraction: decrypts to m1 - m2
    pub fn sub(&self, other: &RlweCiphertext) -> RlweCiphertext {
        RlweCiphertext {
            a: &self.a - &other.a,
            b: &self.b - &other.b,
        }
    }

    /// Multiply ciphertext by a scalar in Z_q: decrypts to c·m
    pub fn scalar_mul(&self, scalar: u64) -> RlweCiphertext {
        RlweCiphertext {
            a: self.a.scalar_mul(scalar),
            b: self.b.scalar_mul(scalar),
        }
    }

    /// Multiply ciphertext by the monomial X^k: decrypts to X^k·m
    ///
    /// Noise-free: the monomial only rotates coefficients.
    pub fn mul_monomial(&self, k: usize) -> RlweCiphertext {
        RlweCiphertext {
            a: self.a.mul_monomial(k),
            b: self.b.mul_monomial(k),
        }
    }
}
