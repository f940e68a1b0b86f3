//! Packing layer: quantization, packed matrix-vector products, unpacking.
//!
//! # Layout
//!
//! With stride N/τ, logical index `i` of a packed column sits at coefficient
//! `perm[i]·N/τ`, pre-multiplied by τ⁻¹ mod q. Vectors are not packed: each
//! component is its own ciphertext with the value in the constant term, so
//! the external product of component `j` against column `j` places
//! `τ⁻¹·M[i][j]·x_j` in slot `perm[i]`. Summing over `j` gives the spread
//! product, and the unpacker folds it back into one ciphertext per row.
//!
//! # Example
//!
//! ```
//! use packed_control::backend::PlainBackend;
//! use packed_control::math::DEFAULT_Q;
//! use packed_control::packing::PackingContext;
//! use packed_control::params::{Scale, ScalingParameters};
//!
//! let backend = PlainBackend::new(64, DEFAULT_Q).unwrap();
//! let ctx = PackingContext::setup(backend, 4, ScalingParameters::reference()).unwrap();
//!
//! let identity = vec![
//!     vec![1.0, 0.0, 0.0, 0.0],
//!     vec![0.0, 1.0, 0.0, 0.0],
//!     vec![0.0, 0.0, 1.0, 0.0],
//!     vec![0.0, 0.0, 0.0, 1.0],
//! ];
//! let m = ctx.pack_and_encrypt_integer(&identity, Scale::UNIT).unwrap();
//! let x = ctx.encrypt_vector(&[3.0, -1.0, 2.0, 0.0], Scale::SIGNAL).unwrap();
//!
//! let y = ctx.unpack(&ctx.mult_pack(&x, &m).unwrap(), 4).unwrap();
//! let values = ctx.decrypt_and_rescale(&y, Scale::SIGNAL * Scale::ENCODING).unwrap();
//! assert!((values[1] + 1.0).abs() < 1e-9);
//! ```

mod context;
mod encode;
mod evaluate;
pub mod quantize;
mod slots;
mod types;
mod unpack;

pub use context::{packing_width, FoldRound, PackingContext};
pub use quantize::{
    check_headroom, dequantize, dequantize_vector, quantize, quantize_matrix, quantize_vector,
};
pub use slots::{permutation, SlotPermutation};
pub use types::{EncryptedVector, PackedMatrix, PackedProduct, PackedTerm};
