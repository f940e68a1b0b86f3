//! Galois automorphisms for RLWE
//!
//! Galois automorphisms τ_g: R → R are ring automorphisms defined by
//! τ_g(X) = X^g for odd g ∈ Z_{2d}^*.
//!
//! The unpacker uses the elements g = τ/2^r + 1: on the packed subring
//! generated by Y = X^(d/τ) they fix even powers of Y at round r and negate
//! the odd ones, which is what splits a packed ciphertext in two.

use crate::math::{ModQ, Poly};

use super::types::RlweCiphertext;

/// Apply Galois automorphism τ_g to a polynomial
///
/// τ_g(p(X)) = p(X^g) mod (X^d + 1)
///
/// X^i maps to X^(g·i mod 2d), with a sign flip when g·i mod 2d ≥ d.
///
/// # Arguments
/// * `poly` - Input polynomial (coefficient domain)
/// * `g` - Galois element (must be odd)
pub fn apply_automorphism(poly: &Poly, g: usize) -> Poly {
    let d = poly.dimension();
    let q = poly.modulus();
    let two_d = 2 * d;

    let mut result_coeffs = vec![0u64; d];

    for i in 0..d {
        let coeff = poly.coeff(i);
        if coeff == 0 {
            continue;
        }

        let new_idx = (g * i) % two_d;
        if new_idx < d {
            result_coeffs[new_idx] = ModQ::add(result_coeffs[new_idx], coeff, q);
        } else {
            result_coeffs[new_idx - d] = ModQ::sub(result_coeffs[new_idx - d], coeff, q);
        }
    }

    Poly::from_coeffs(result_coeffs, q)
}

/// Apply automorphism to RLWE ciphertext
///
/// τ_g((a, b)) = (τ_g(a), τ_g(b))
///
/// The result is encrypted under τ_g(s); key switching brings it back
/// under s.
pub fn automorphism_ciphertext(ct: &RlweCiphertext, g: usize) -> RlweCiphertext {
    RlweCiphertext {
        a: apply_automorphism(&ct.a, g),
        b: apply_automorphism(&ct.b, g),
    }
}

/// Check if g is a valid Galois element: odd and below 2d
///
/// Every odd number is a unit modulo a power of two.
pub fn is_valid_galois_element(g: usize, d: usize) -> bool {
    g % 2 == 1 && g < 2 * d
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::DEFAULT_Q;

    const D: usize = 64;

    fn sample_poly() -> Poly {
        Poly::from_coeffs((0..D as u64).map(|i| i * 17 + 5).collect(), DEFAULT_Q)
    }

    #[test]
    fn test_automorphism_identity() {
        let poly = sample_poly();
        assert_eq!(apply_automorphism(&poly, 1), poly);
    }

    #[test]
    fn test_automorphism_composition() {
        let poly = sample_poly();
        let step = apply_automorphism(&apply_automorphism(&poly, 3), 5);
        let direct = apply_automorphism(&poly, (3 * 5) % (2 * D));
        assert_eq!(step, direct);
    }

    #[test]
    fn test_automorphism_preserves_constant_term() {
        let poly = sample_poly();
        for g in [3usize, 5, 9, 17, 33, 2 * D - 1] {
            assert_eq!(apply_automorphism(&poly, g).coeff(0), poly.coeff(0));
        }
    }

    #[test]
    fn test_unpack_element_splits_strided_slots() {
        // With τ = 4 the stride is d/4; g = τ + 1 negates odd multiples
        // of the stride and fixes even ones
        let tau = 4;
        let stride = D / tau;
        let mut coeffs = vec![0u64; D];
        for k in 0..tau {
            coeffs[k * stride] = 10 + k as u64;
        }
        let poly = Poly::from_coeffs(coeffs, DEFAULT_Q);
        let image = apply_automorphism(&poly, tau + 1);

        for k in 0..tau {
            let expected = if k % 2 == 0 {
                10 + k as u64
            } else {
                DEFAULT_Q - (10 + k as u64)
            };
            assert_eq!(image.coeff(k * stride), expected, "slot {}", k);
        }
    }

    #[test]
    fn test_negation_automorphism() {
        // τ_{2d-1}(X) = X^{-1} = -X^{d-1}
        let mut coeffs = vec![0u64; D];
        coeffs[1] = 1;
        let poly = Poly::from_coeffs(coeffs, DEFAULT_Q);

        let result = apply_automorphism(&poly, 2 * D - 1);
        assert_eq!(result.coeff(D - 1), DEFAULT_Q - 1);
    }

    #[test]
    fn test_valid_galois_elements() {
        assert!(is_valid_galois_element(1, D));
        assert!(is_valid_galois_element(5, D));
        assert!(is_valid_galois_element(2 * D - 1, D));
        assert!(!is_valid_galois_element(2, D));
        assert!(!is_valid_galois_element(2 * D + 1, D));
    }

    #[test]
    fn test_automorphism_ciphertext() {
        let a = sample_poly();
        let b = Poly::from_coeffs((0..D as u64).map(|i| i * 7 + 1).collect(), DEFAULT_Q);
        let ct = RlweCiphertext::from_parts(a.clone(), b.clone());

        let ct_auto = automorphism_ciphertext(&ct, 3);
        assert_eq!(ct_auto.a, apply_automorphism(&a, 3));
        assert_eq!(ct_auto.b, apply_automorphism(&b, 3));
    }
}
