//! Key-switching module
//!
//! Transforms a ciphertext valid under secret key s into one valid under s'.
//! The unpacker needs it after every Galois automorphism, which leaves the
//! ciphertext under τ_g(s).
//!
//! # Key-Switching Matrix
//!
//! A key-switching matrix K from s to s' consists of ℓ RLWE ciphertexts:
//! ```text
//! K = [RLWE_{s'}(s·z^0), RLWE_{s'}(s·z^1), ..., RLWE_{s'}(s·z^(ℓ-1))]
//! ```
//!
//! # Algorithm
//!
//! To switch (a, b) from key s to key s':
//! 1. Decompose a using gadget: g⁻¹(a) = [a₀, a₁, ..., a_{ℓ-1}]
//! 2. Compute: (a', b') = (0, b) + Σᵢ aᵢ · K[i]

mod setup;
mod switch;

pub use setup::{generate_automorphism_ks_matrix, generate_ks_matrix, KeySwitchingMatrix};
pub use switch::{automorphism_switch, key_switch};
