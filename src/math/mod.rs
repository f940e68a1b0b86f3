//! Mathematical primitives for the lattice backend.
//!
//! - **Modular arithmetic** over Z_q
//! - **Number-Theoretic Transform (NTT)** with Montgomery reduction
//! - **Polynomial operations** over R_q = Z_q[X]/(X^d + 1)
//! - **Discrete Gaussian sampling** for error terms
//!
//! The packed controller runs over R_q with d = 2048 by default and q an
//! NTT-friendly prime just below 2^60. Everything above this module
//! (RLWE, RGSW, key switching) is built on these types.
//!
//! # Example
//!
//! ```
//! use packed_control::math::{Poly, NttContext};
//!
//! let ctx = NttContext::with_default_q(256);
//! let mut poly = Poly::random(256, ctx.modulus());
//! poly.to_ntt(&ctx);
//! ```

pub mod modular;
pub mod ntt;
pub mod poly;
pub mod sampler;

pub use modular::{ModQ, DEFAULT_Q};
pub use ntt::NttContext;
pub use poly::Poly;
pub use sampler::{GaussianSampler, DEFAULT_SIGMA};
