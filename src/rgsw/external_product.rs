//! External product operation: RLWE × RGSW → RLWE
//!
//! This is the multiplication the packed evaluator is built on: one encrypted
//! vector component times one encrypted matrix column.

use crate::math::{NttContext, Poly};
use crate::rlwe::RlweCiphertext;

use super::types::{GadgetVector, RgswCiphertext};

/// Decompose a polynomial coefficient-wise into base-z digits
///
/// For each coefficient c, computes digits [c₀, c₁, ..., c_{ℓ-1}] such that:
/// c = c₀ + c₁·z + c₂·z² + ... + c_{ℓ-1}·z^{ℓ-1}
///
/// The digits are in [0, z) range for simplicity.
pub fn gadget_decompose(poly: &Poly, gadget: &GadgetVector) -> Vec<Poly> {
    let d = poly.dimension();
    let q = poly.modulus();
    let base = gadget.base;
    let ell = gadget.len;

    let mut digits = vec![vec![0u64; d]; ell];

    for j in 0..d {
        let mut val = poly.coeff(j);
        for digit in digits.iter_mut() {
            digit[j] = val % base;
            val /= base;
        }
    }

    digits
        .into_iter()
        .map(|coeffs| Poly::from_coeffs(coeffs, q))
        .collect()
}

/// Reconstruct a polynomial from its gadget decomposition
///
/// Given decomposition [p₀, p₁, ..., p_{ℓ-1}], computes:
/// p = p₀ + p₁·z + p₂·z² + ... + p_{ℓ-1}·z^{ℓ-1}
pub fn gadget_reconstruct(decomposed: &[Poly], gadget: &GadgetVector) -> Poly {
    assert_eq!(
        decomposed.len(),
        gadget.len,
        "Decomposition length must match gadget length"
    );

    let d = decomposed[0].dimension();
    let q = decomposed[0].modulus();
    let powers = gadget.powers();

    let mut result = Poly::zero(d, q);
    for (poly, &power) in decomposed.iter().zip(&powers) {
        result += &poly.scalar_mul(power);
    }
    result
}

/// Compute the external product: RLWE(m₀) ⊡ RGSW(m₁) → RLWE(m₀·m₁)
///
/// # Algorithm
///
/// Given RLWE ciphertext (a, b) and RGSW ciphertext C:
/// 1. Decompose a and b using gadget inverse: g⁻¹(a), g⁻¹(b)
/// 2. Compute: (a', b') = Σᵢ [g⁻¹(a)ᵢ · C[i] + g⁻¹(b)ᵢ · C[ℓ+i]]
///
/// The phase of the result is m₁·(m₀ + e₀) + Σ digits·e, so the noise
/// grows with the digit size and the RGSW message, never with q.
pub fn external_product(
    rlwe: &RlweCiphertext,
    rgsw: &RgswCiphertext,
    ctx: &NttContext,
) -> RlweCiphertext {
    let d = rlwe.ring_dim();
    let q = rlwe.modulus();
    let gadget = &rgsw.gadget;
    let ell = gadget.len;
    assert_eq!(rgsw.rows.len(), 2 * ell, "RGSW must have 2ℓ rows");
    assert_eq!(rgsw.ring_dim(), d, "RGSW ring dimension mismatch");

    let a_decomp = gadget_decompose(&rlwe.a, gadget);
    let b_decomp = gadget_decompose(&rlwe.b, gadget);

    let mut result_a = Poly::zero(d, q).to_ntt_new(ctx);
    let mut result_b = result_a.clone();

    for (i, (da, db)) in a_decomp.iter().zip(&b_decomp).enumerate() {
        // g⁻¹(a)ᵢ · RGSW[i]
        let da = da.to_ntt_new(ctx);
        let row_a = &rgsw.rows[i];
        result_a.mul_acc_ntt_domain(&da, &row_a.a, ctx);
        result_b.mul_acc_ntt_domain(&da, &row_a.b, ctx);

        // g⁻¹(b)ᵢ · RGSW[ℓ+i]
        let db = db.to_ntt_new(ctx);
        let row_b = &rgsw.rows[ell + i];
        result_a.mul_acc_ntt_domain(&db, &row_b.a, ctx);
        result_b.mul_acc_ntt_domain(&db, &row_b.b, ctx);
    }

    result_a.from_ntt(ctx);
    result_b.from_ntt(ctx);
    RlweCiphertext::from_parts(result_a, result_b)
}
