//! Encrypted linear control over packed RLWE/RGSW ciphertexts
//!
//! A linear controller `x⁺ = F x + G y + R u`, `u = H x` is evaluated with
//! its state kept encrypted across control periods.
//!
//! Key components:
//! - Packing: controller matrices are RGSW-encrypted column by column in a
//!   strided, bit-reversed slot layout
//! - Packed evaluation: `M·x` as a sum of external products, spread over
//!   the packed slots
//! - Unpacking: a log2(τ)-round automorphism fold back to one ciphertext per
//!   component, ready for the next period
//! - Typed scales: every ciphertext handle records the fixed-point scale
//!   of its integer unit, so mismatched additions fail before they happen

pub mod backend;
pub mod control;
pub mod error;
pub mod ks;
pub mod math;
pub mod packing;
pub mod params;
pub mod rgsw;
pub mod rlwe;

pub use backend::{HomomorphicBackend, LatticeBackend, PlainBackend};
pub use control::{
    ClosedLoopSystem, ControllerMatrices, DesignBounds, EncryptedController, Trajectory,
};
pub use error::{ControlError, Result};
pub use packing::{
    permutation, EncryptedVector, PackedMatrix, PackedProduct, PackedTerm, PackingContext,
    SlotPermutation,
};
pub use params::{RingParams, Scale, ScalingParameters};
