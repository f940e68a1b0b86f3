//! Homomorphic primitives consumed by the packing layer.
//!
//! The packer, evaluator, and unpacker only ever talk to a
//! [`HomomorphicBackend`]. Ciphertexts are opaque to them: they carry no
//! packing width or scale, so the packing layer wraps them in tagged handles.
//!
//! Two implementations ship with the crate:
//!
//! - [`LatticeBackend`]: RLWE/RGSW over R_q with key-switched automorphisms
//! - [`PlainBackend`]: the same ring operations on cleartext polynomials,
//!   exact and fast, for testing the packing algebra in isolation

use std::fmt::Debug;

use crate::error::Result;
use crate::math::Poly;

mod lattice;
mod plain;

pub use lattice::LatticeBackend;
pub use plain::PlainBackend;

/// Ring operations over encrypted polynomials in Z_q[X]/(X^d + 1).
///
/// Messages are polynomials with coefficients in Z_q and no plaintext
/// scaling: `decrypt(encrypt(m))` is `m` plus noise, read as centered
/// integers by the caller.
pub trait HomomorphicBackend: Send + Sync {
    /// RLWE-like ciphertext: supports addition, scalar and monomial products
    type Ciphertext: Clone + Debug + Send + Sync;
    /// RGSW-like ciphertext: right operand of the external product
    type PackedCiphertext: Debug + Send + Sync;

    /// Ring dimension d
    fn ring_dim(&self) -> usize;

    /// Ciphertext modulus q
    fn modulus(&self) -> u64;

    fn encrypt(&self, message: &Poly) -> Self::Ciphertext;

    /// Decryption phase as a coefficient-domain polynomial
    fn decrypt(&self, ct: &Self::Ciphertext) -> Poly;

    fn add(&self, lhs: &Self::Ciphertext, rhs: &Self::Ciphertext) -> Self::Ciphertext;

    fn sub(&self, lhs: &Self::Ciphertext, rhs: &Self::Ciphertext) -> Self::Ciphertext;

    /// Multiply by a scalar in Z_q
    fn scalar_mul(&self, ct: &Self::Ciphertext, scalar: u64) -> Self::Ciphertext;

    /// Multiply by X^k, `k` taken modulo 2d
    fn mul_monomial(&self, ct: &Self::Ciphertext, k: usize) -> Self::Ciphertext;

    /// Encrypt a message for use as the right operand of `external_product`
    fn encrypt_packed(&self, message: &Poly) -> Self::PackedCiphertext;

    /// Product of a ciphertext with a packed ciphertext: decrypts to m₀·m₁
    fn external_product(
        &self,
        ct: &Self::Ciphertext,
        packed: &Self::PackedCiphertext,
    ) -> Self::Ciphertext;

    /// Evaluate τ_g(X) = X^g on the encrypted message.
    ///
    /// Fails with `MissingGaloisKey` unless `generate_galois_keys` has been
    /// called with `g`.
    fn automorphism(&self, ct: &Self::Ciphertext, g: usize) -> Result<Self::Ciphertext>;

    /// Prepare whatever `automorphism` needs for each element
    fn generate_galois_keys(&mut self, elements: &[usize]) -> Result<()>;
}
