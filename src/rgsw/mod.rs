//! RGSW (Ring-GSW) encryption module
//!
//! An RGSW ciphertext encrypting message m is a 2ℓ × 2 matrix where:
//! - Each row is an RLWE ciphertext
//! - The gadget vector g = [1, z, z², ..., z^(ℓ-1)]^T allows decomposition
//!
//! # External Product
//!
//! RLWE(m₀) ⊡ RGSW(m₁) → RLWE(m₀·m₁). Packed matrix columns are RGSW
//! ciphertexts; the encrypted state components are RLWE ciphertexts.
//!
//! # Example
//!
//! ```
//! use packed_control::math::{GaussianSampler, Poly};
//! use packed_control::params::RingParams;
//! use packed_control::rgsw::{external_product, RgswCiphertext};
//! use packed_control::rlwe::{RlweCiphertext, RlweSecretKey};
//!
//! let params = RingParams::insecure_d256();
//! let ctx = params.ntt_context();
//! let mut sampler = GaussianSampler::new(params.sigma);
//! let sk = RlweSecretKey::generate(&params, &mut sampler);
//!
//! let two = Poly::constant(2, params.ring_dim, params.q);
//! let rgsw = RgswCiphertext::encrypt(&sk, &two, &params.gadget(), &mut sampler, &ctx);
//!
//! let m = Poly::constant(1000, params.ring_dim, params.q);
//! let a = Poly::random(params.ring_dim, params.q);
//! let e = Poly::sample_gaussian(params.ring_dim, params.q, &mut sampler);
//! let ct = RlweCiphertext::encrypt(&sk, &m, 1, a, &e, &ctx);
//!
//! let prod = external_product(&ct, &rgsw, &ctx);
//! let phase = prod.decrypt_phase(&sk, &ctx);
//! assert!((phase.coeff_signed(0) - 2000).abs() < 1 << 20);
//! ```

mod external_product;
mod types;

pub(crate) use types::encrypt_zero_ntt;
pub use external_product::{external_product, gadget_decompose, gadget_reconstruct};
pub use types::{GadgetVector, RgswCiphertext};
