//! RGSW ciphertext and gadget types.

use crate::math::{GaussianSampler, NttContext, Poly};
use crate::rlwe::{RlweCiphertext, RlweSecretKey};
use serde::{Deserialize, Serialize};

/// Gadget vector g_z = [1, z, z², ..., z^(ℓ-1)]^T.
///
/// Used for decomposing polynomials into small-norm components so that
/// products with encrypted matrices grow noise by the digit size, not by q.
///
/// # Fields
///
/// * `base` - Gadget base z
/// * `len` - Number of digits ℓ = ⌈log_z(q)⌉
/// * `q` - Ciphertext modulus
///
/// # Example
///
/// ```
/// use packed_control::rgsw::GadgetVector;
/// use packed_control::math::DEFAULT_Q;
///
/// let gadget = GadgetVector::new(1 << 8, 8, DEFAULT_Q);
/// assert_eq!(gadget.powers()[2], 1 << 16);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GadgetVector {
    /// Gadget base z.
    pub base: u64,
    /// Number of digits ℓ = ⌈log_z(q)⌉.
    pub len: usize,
    /// Ciphertext modulus q.
    pub q: u64,
}

impl GadgetVector {
    /// Create a new gadget vector
    ///
    /// # Arguments
    /// * `base` - Gadget base z (e.g., 2^8)
    /// * `len` - Number of digits ℓ
    /// * `q` - Ciphertext modulus
    pub fn new(base: u64, len: usize, q: u64) -> Self {
        debug_assert!(base > 1, "Gadget base must be > 1");
        debug_assert!(len > 0, "Gadget length must be > 0");
        Self { base, len, q }
    }

    /// Get all powers [1, z, z², ..., z^(ℓ-1)] mod q
    pub fn powers(&self) -> Vec<u64> {
        let mut powers = Vec::with_capacity(self.len);
        let mut current = 1u128;
        let base = self.base as u128;
        let q = self.q as u128;

        for _ in 0..self.len {
            powers.push(current as u64);
            current = (current * base) % q;
        }
        powers
    }
}

/// Fresh RLWE encryption of zero, returned with `a` and `b` in NTT domain.
pub(crate) fn encrypt_zero_ntt(
    sk: &RlweSecretKey,
    sampler: &mut GaussianSampler,
    ctx: &NttContext,
) -> (Poly, Poly) {
    let d = sk.ring_dim();
    let q = sk.modulus();

    let a = Poly::random(d, q);
    let error = Poly::sample_gaussian(d, q, sampler);
    let b = &(-a.mul_ntt(&sk.poly, ctx)) + &error;

    (a.to_ntt_new(ctx), b.to_ntt_new(ctx))
}

/// RGSW ciphertext: 2ℓ × 2 matrix of ring elements
///
/// ```text
/// [ Row 0..ℓ-1:   (a_i + m·z^i, b_i)   phase m·z^i·s + e_i
///   Row ℓ..2ℓ-1: (a_i, b_i + m·z^i)   phase m·z^i + e_i ]
/// ```
///
/// Rows are stored in NTT domain; every external product multiplies them
/// against fresh decomposition digits, so the forward transform is paid once
/// at encryption time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RgswCiphertext {
    /// 2ℓ RLWE ciphertexts in NTT domain
    pub rows: Vec<RlweCiphertext>,
    /// Gadget parameters
    pub gadget: GadgetVector,
}

impl RgswCiphertext {
    /// Encrypt a message polynomial under the given secret key
    ///
    /// # Arguments
    /// * `sk` - RLWE secret key
    /// * `message` - Message polynomial (coefficient domain, any element of R_q)
    /// * `gadget` - Gadget vector parameters
    /// * `sampler` - Gaussian sampler for error
    /// * `ctx` - NTT context
    pub fn encrypt(
        sk: &RlweSecretKey,
        message: &Poly,
        gadget: &GadgetVector,
        sampler: &mut GaussianSampler,
        ctx: &NttContext,
    ) -> Self {
        let ell = gadget.len;
        let powers = gadget.powers();
        let message_ntt = message.to_ntt_new(ctx);

        let mut rows = Vec::with_capacity(2 * ell);

        // Row i = (a + m·z^i, b) where (a, b) encrypts 0
        for &power in &powers {
            let (a, b) = encrypt_zero_ntt(sk, sampler, ctx);
            let a = &a + &message_ntt.scalar_mul(power);
            rows.push(RlweCiphertext::from_parts(a, b));
        }

        // Row ℓ+i = (a, b + m·z^i)
        for &power in &powers {
            let (a, b) = encrypt_zero_ntt(sk, sampler, ctx);
            let b = &b + &message_ntt.scalar_mul(power);
            rows.push(RlweCiphertext::from_parts(a, b));
        }

        Self {
            rows,
            gadget: gadget.clone(),
        }
    }

    /// Get the ring dimension
    pub fn ring_dim(&self) -> usize {
        self.rows[0].ring_dim()
    }

    /// Get the gadget length ℓ
    pub fn gadget_len(&self) -> usize {
        self.gadget.len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::RingParams;

    #[test]
    fn test_gadget_powers() {
        let gadget = RingParams::insecure_d256().gadget();
        let powers = gadget.powers();
        assert_eq!(powers.len(), gadget.len);
        assert_eq!(powers[0], 1);
        assert_eq!(powers[1], gadget.base);
        assert_eq!(powers[7], 1u64 << 56);
    }

    #[test]
    fn test_rgsw_shape() {
        let params = RingParams::insecure_d256();
        let ctx = params.ntt_context();
        let mut sampler = GaussianSampler::with_seed(params.sigma, 5);
        let sk = RlweSecretKey::generate(&params, &mut sampler);

        let msg = Poly::constant(1, params.ring_dim, params.q);
        let ct = RgswCiphertext::encrypt(&sk, &msg, &params.gadget(), &mut sampler, &ctx);

        assert_eq!(ct.rows.len(), 2 * params.gadget_len);
        assert_eq!(ct.ring_dim(), params.ring_dim);
        assert!(ct.rows.iter().all(|r| r.a.is_ntt() && r.b.is_ntt()));
    }

    #[test]
    fn test_rows_decrypt_to_gadget_multiples() {
        let params = RingParams::insecure_d256();
        let ctx = params.ntt_context();
        let mut sampler = GaussianSampler::with_seed(params.sigma, 6);
        let sk = RlweSecretKey::generate(&params, &mut sampler);

        let msg = Poly::constant(7, params.ring_dim, params.q);
        let ct = RgswCiphertext::encrypt(&sk, &msg, &params.gadget(), &mut sampler, &ctx);
        let powers = params.gadget().powers();

        // Lower rows have phase m·z^i + e
        for (i, row) in ct.rows[params.gadget_len..].iter().enumerate() {
            let mut row = row.clone();
            row.a.from_ntt(&ctx);
            row.b.from_ntt(&ctx);
            let phase = row.decrypt_phase(&sk, &ctx);
            let expected = crate::math::ModQ::mul(7, powers[i], params.q);
            let diff = crate::math::ModQ::sub(phase.coeff(0), expected, params.q);
            assert!(crate::math::ModQ::to_signed(diff, params.q).abs() < 32);
        }
    }
}
