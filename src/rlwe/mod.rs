//! RLWE (Ring Learning With Errors) encryption module
//!
//! This module implements RLWE encryption over the ring R_q = Z_q[X]/(X^d + 1).
//!
//! # Overview
//!
//! - Secret key s is a polynomial sampled from the error distribution
//! - Ciphertext (a, b) encrypts message m as b = -a·s + e + Δ·m
//! - The controller encoding uses Δ = 1: messages are already-scaled
//!   integers and decryption reads the phase b + a·s as centered integers
//!
//! # Galois Automorphisms
//!
//! Automorphisms τ_g: R → R defined by τ_g(X) = X^g fold packed ciphertexts
//! apart during unpacking.
//!
//! # Example
//!
//! ```
//! use packed_control::rlwe::{RlweSecretKey, RlweCiphertext};
//! use packed_control::params::RingParams;
//! use packed_control::math::{Poly, GaussianSampler};
//!
//! let params = RingParams::insecure_d256();
//! let ctx = params.ntt_context();
//! let mut sampler = GaussianSampler::new(params.sigma);
//!
//! let sk = RlweSecretKey::generate(&params, &mut sampler);
//!
//! let message = Poly::from_signed(&[-5, 12], params.ring_dim, params.q);
//! let a = Poly::random(params.ring_dim, params.q);
//! let error = Poly::sample_gaussian(params.ring_dim, params.q, &mut sampler);
//! let ct = RlweCiphertext::encrypt(&sk, &message, 1, a, &error, &ctx);
//!
//! let phase = ct.decrypt_phase(&sk, &ctx);
//! assert!((phase.coeff_signed(0) + 5).abs() < 32);
//! ```

mod enc;
mod galois;
mod types;

pub use galois::{apply_automorphism, automorphism_ciphertext, is_valid_galois_element};
pub use types::{RlweCiphertext, RlweSecretKey};
