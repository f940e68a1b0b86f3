//! Key-switching operation

use crate::math::{NttContext, Poly};
use crate::rgsw::gadget_decompose;
use crate::rlwe::{automorphism_ciphertext, RlweCiphertext};

use super::setup::KeySwitchingMatrix;

/// Apply key-switching to transform a ciphertext from key s to key s'
///
/// # Algorithm
///
/// 1. Decompose a using gadget: g⁻¹(a) = [a₀, a₁, ..., a_{ℓ-1}]
/// 2. Compute: (a', b') = (0, b) + Σᵢ aᵢ · K[i]
///
/// The result satisfies a'·s' + b' = a·s + b + Σᵢ aᵢ·eᵢ.
///
/// # Arguments
/// * `ct` - Input ciphertext (a, b) valid under source key s
/// * `ks_matrix` - Key-switching matrix from s to s' (NTT-domain rows)
/// * `ctx` - NTT context
pub fn key_switch(
    ct: &RlweCiphertext,
    ks_matrix: &KeySwitchingMatrix,
    ctx: &NttContext,
) -> RlweCiphertext {
    let d = ct.ring_dim();
    let q = ct.modulus();

    let a_decomp = gadget_decompose(&ct.a, &ks_matrix.gadget);

    let mut result_a = Poly::zero(d, q).to_ntt_new(ctx);
    let mut result_b = result_a.clone();

    for (digit, ks_row) in a_decomp.iter().zip(&ks_matrix.rows) {
        let digit = digit.to_ntt_new(ctx);
        result_a.mul_acc_ntt_domain(&digit, &ks_row.a, ctx);
        result_b.mul_acc_ntt_domain(&digit, &ks_row.b, ctx);
    }

    result_a.from_ntt(ctx);
    result_b.from_ntt(ctx);

    // (0, b) + Σᵢ aᵢ · K[i]
    RlweCiphertext::from_parts(result_a, &result_b + &ct.b)
}

/// Evaluate τ_g on a ciphertext and switch the result back to the original key
///
/// `ks_matrix` must switch from τ_g(s) to s.
pub fn automorphism_switch(
    ct: &RlweCiphertext,
    g: usize,
    ks_matrix: &KeySwitchingMatrix,
    ctx: &NttContext,
) -> RlweCiphertext {
    key_switch(&automorphism_ciphertext(ct, g), ks_matrix, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ks::{generate_automorphism_ks_matrix, generate_ks_matrix};
    use crate::math::GaussianSampler;
    use crate::params::RingParams;
    use crate::rlwe::{apply_automorphism, RlweSecretKey};

    fn encrypt(
        sk: &RlweSecretKey,
        message: &Poly,
        params: &RingParams,
        sampler: &mut GaussianSampler,
        ctx: &NttContext,
    ) -> RlweCiphertext {
        let a = Poly::random(params.ring_dim, params.q);
        let e = Poly::sample_gaussian(params.ring_dim, params.q, sampler);
        RlweCiphertext::encrypt(sk, message, 1, a, &e, ctx)
    }

    #[test]
    fn test_key_switch_preserves_message() {
        let params = RingParams::insecure_d256();
        let ctx = params.ntt_context();
        let mut sampler = GaussianSampler::with_seed(params.sigma, 41);

        let sk1 = RlweSecretKey::generate(&params, &mut sampler);
        let sk2 = RlweSecretKey::generate(&params, &mut sampler);
        let ks_matrix = generate_ks_matrix(&sk1, &sk2, &params.gadget(), &mut sampler, &ctx);

        let message = Poly::from_signed(&[123_456, -789, 42], params.ring_dim, params.q);
        let ct = encrypt(&sk1, &message, &params, &mut sampler, &ctx);

        let switched = key_switch(&ct, &ks_matrix, &ctx);
        let phase = switched.decrypt_phase(&sk2, &ctx);

        for (i, expected) in [123_456i64, -789, 42].into_iter().enumerate() {
            assert!(
                (phase.coeff_signed(i) - expected).abs() < 1 << 20,
                "coefficient {}: {}",
                i,
                phase.coeff_signed(i)
            );
        }
    }

    #[test]
    fn test_automorphism_switch() {
        let params = RingParams::insecure_d256();
        let ctx = params.ntt_context();
        let mut sampler = GaussianSampler::with_seed(params.sigma, 42);
        let d = params.ring_dim;

        let sk = RlweSecretKey::generate(&params, &mut sampler);
        let g = 5;
        let ks_matrix =
            generate_automorphism_ks_matrix(&sk, g, &params.gadget(), &mut sampler, &ctx);

        let mut message = Poly::zero(d, params.q);
        message.set_coeff(0, 1_000_000);
        message.set_coeff(1, 2_000_000);
        let ct = encrypt(&sk, &message, &params, &mut sampler, &ctx);

        let rotated = automorphism_switch(&ct, g, &ks_matrix, &ctx);
        let phase = rotated.decrypt_phase(&sk, &ctx);
        let expected = apply_automorphism(&message, g);

        for i in 0..d {
            let diff = phase.coeff_signed(i)
                - crate::math::ModQ::to_signed(expected.coeff(i), params.q);
            assert!(diff.abs() < 1 << 20, "coefficient {}: diff {}", i, diff);
        }
    }
}
