//! Key-switching matrix generation

use crate::math::{GaussianSampler, NttContext};
use crate::rgsw::{encrypt_zero_ntt, GadgetVector};
use crate::rlwe::{apply_automorphism, RlweCiphertext, RlweSecretKey};
use serde::{Deserialize, Serialize};

/// Key-switching matrix from secret key s to secret key s'
///
/// The matrix consists of ℓ RLWE ciphertexts encrypting s·z^i under s':
/// ```text
/// K[i] = RLWE_{s'}(s·z^i) = (a_i, -a_i·s' + e_i + s·z^i)
/// ```
///
/// Rows are kept in NTT domain, like RGSW rows.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KeySwitchingMatrix {
    /// ℓ RLWE ciphertexts in NTT domain
    pub rows: Vec<RlweCiphertext>,
    /// Gadget parameters
    pub gadget: GadgetVector,
}

impl KeySwitchingMatrix {
    /// Get the ring dimension
    pub fn ring_dim(&self) -> usize {
        self.rows[0].ring_dim()
    }

    /// Get the gadget length ℓ
    pub fn gadget_len(&self) -> usize {
        self.gadget.len
    }
}

/// Generate a key-switching matrix from secret key s to secret key s'
///
/// # Arguments
/// * `from_key` - Source secret key s
/// * `to_key` - Target secret key s'
/// * `gadget` - Gadget vector parameters
/// * `sampler` - Gaussian sampler for error
/// * `ctx` - NTT context
///
/// # Returns
/// Key-switching matrix that transforms ciphertexts from `from_key` to `to_key`
pub fn generate_ks_matrix(
    from_key: &RlweSecretKey,
    to_key: &RlweSecretKey,
    gadget: &GadgetVector,
    sampler: &mut GaussianSampler,
    ctx: &NttContext,
) -> KeySwitchingMatrix {
    debug_assert_eq!(
        from_key.ring_dim(),
        to_key.ring_dim(),
        "Keys must have same ring dimension"
    );

    let from_ntt = from_key.poly.to_ntt_new(ctx);
    let rows = gadget
        .powers()
        .into_iter()
        .map(|power| {
            // b = -a·s' + e + s·z^i
            let (a, b) = encrypt_zero_ntt(to_key, sampler, ctx);
            let b = &b + &from_ntt.scalar_mul(power);
            RlweCiphertext::from_parts(a, b)
        })
        .collect();

    KeySwitchingMatrix {
        rows,
        gadget: gadget.clone(),
    }
}

/// Generate a key-switching matrix for automorphism
///
/// For Galois automorphism τ_g, creates a matrix from τ_g(s) to s, which
/// brings a ciphertext back under s after τ_g has been applied to it.
///
/// # Arguments
/// * `sk` - Secret key s
/// * `automorphism` - Galois element g (must be odd)
/// * `gadget` - Gadget vector parameters
/// * `sampler` - Gaussian sampler for error
/// * `ctx` - NTT context
pub fn generate_automorphism_ks_matrix(
    sk: &RlweSecretKey,
    automorphism: usize,
    gadget: &GadgetVector,
    sampler: &mut GaussianSampler,
    ctx: &NttContext,
) -> KeySwitchingMatrix {
    let auto_s = RlweSecretKey::from_poly(apply_automorphism(&sk.poly, automorphism));
    generate_ks_matrix(&auto_s, sk, gadget, sampler, ctx)
}
