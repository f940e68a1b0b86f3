//! RLWE ciphertext and key types.
//!
//! Ring-LWE over R_q = Z_q[X]/(X^d + 1).

use crate::math::Poly;
use serde::{Deserialize, Serialize};

/// RLWE secret key: polynomial in R_q sampled from error distribution.
///
/// # Example
///
/// ```
/// use packed_control::rlwe::RlweSecretKey;
/// use packed_control::math::{Poly, DEFAULT_Q};
///
/// let poly = Poly::zero(256, DEFAULT_Q);
/// let sk = RlweSecretKey::from_poly(poly);
/// assert_eq!(sk.ring_dim(), 256);
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RlweSecretKey {
    /// Secret polynomial in R_q.
    pub poly: Poly,
}

/// RLWE ciphertext: (a, b) ∈ R_q × R_q where b = -a·s + e + Δ·m.
///
/// # Fields
///
/// * `a` - Random polynomial in R_q
/// * `b` - Encrypted polynomial: b = -a·s + e + Δ·m
///
/// # Decryption
///
/// The phase `b + a·s = e + Δ·m`. The controller encoding uses Δ = 1, so
/// the phase read as centered integers is the message plus noise.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RlweCiphertext {
    /// Random polynomial in R_q.
    pub a: Poly,
    /// Encrypted polynomial: b = -a·s + e + Δ·m.
    pub b: Poly,
}

impl RlweSecretKey {
    /// Creates a secret key from a polynomial.
    pub fn from_poly(poly: Poly) -> Self {
        Self { poly }
    }

    /// Returns the ring dimension.
    pub fn ring_dim(&self) -> usize {
        self.poly.dimension()
    }

    /// Returns the modulus q.
    pub fn modulus(&self) -> u64 {
        self.poly.modulus()
    }
}

impl RlweCiphertext {
    /// Creates a ciphertext from component polynomials.
    ///
    /// # Panics
    ///
    /// Debug-asserts that `a` and `b` have the same dimension and modulus.
    pub fn from_parts(a: Poly, b: Poly) -> Self {
        debug_assert_eq!(
            a.dimension(),
            b.dimension(),
            "Ciphertext polynomials must have same dimension"
        );
        debug_assert_eq!(
            a.modulus(),
            b.modulus(),
            "Ciphertext polynomials must have same modulus"
        );
        Self { a, b }
    }

    /// Returns the ring dimension.
    pub fn ring_dim(&self) -> usize {
        self.a.dimension()
    }

    /// Returns the modulus q.
    pub fn modulus(&self) -> u64 {
        self.a.modulus()
    }
}
