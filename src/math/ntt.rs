//! Number-Theoretic Transform (NTT) for fast polynomial multiplication.
//!
//! Implements Cooley-Tukey radix-2 NTT for negacyclic convolution over
//! R_q = Z_q[X]/(X^d + 1). All ciphertext products in the packed evaluator
//! (external products, key-switching inner products) run through this
//! transform.
//!
//! # Theory
//!
//! For negacyclic convolution (multiplication modulo X^n + 1), we use a
//! primitive 2n-th root of unity ψ where ψ^n = -1. The NTT evaluates a
//! polynomial at the odd powers of ψ, enabling pointwise multiplication in
//! the evaluation domain.
//!
//! # Requirements
//!
//! The modulus q must satisfy q ≡ 1 (mod 2n) for a primitive 2n-th root
//! of unity to exist. `DEFAULT_Q` supports n up to 8192.
//!
//! # Example
//!
//! ```
//! use packed_control::math::NttContext;
//!
//! let ctx = NttContext::with_default_q(256);
//!
//! let mut coeffs = vec![1u64; 256];
//! ctx.forward(&mut coeffs);
//! ctx.inverse(&mut coeffs);
//! assert_eq!(coeffs[0], 1);
//! ```

use super::modular::{ModQ, DEFAULT_Q};

/// Precomputed NTT context with twiddle factors.
///
/// Stores precomputed roots of unity and Montgomery constants. Create once
/// per ring and share it; all methods take `&self`.
///
/// # Fields
///
/// * `n` - Ring dimension (must be a power of two)
/// * `q` - Modulus (must satisfy q ≡ 1 mod 2n)
/// * `psi_powers` - Forward twiddle factors (powers of ψ, bit-reversed)
/// * `psi_inv_powers` - Inverse twiddle factors (powers of ψ^(-1))
/// * `n_inv` - n^(-1) mod q for inverse NTT scaling
#[derive(Clone, Debug)]
pub struct NttContext {
    n: usize,
    q: u64,
    /// -q^(-1) mod 2^64 for Montgomery reduction.
    q_inv_neg: u64,
    /// 2^128 mod q, used to enter Montgomery form.
    r_squared: u64,
    psi_powers: Vec<u64>,
    psi_inv_powers: Vec<u64>,
    /// n^(-1) mod q in Montgomery form.
    n_inv: u64,
}

impl NttContext {
    /// Creates an NTT context for the given dimension and modulus.
    ///
    /// # Arguments
    ///
    /// * `n` - Ring dimension (must be a power of two)
    /// * `q` - Modulus (must be prime with q ≡ 1 mod 2n)
    ///
    /// # Panics
    ///
    /// Panics if `n` is not a power of two or `q` does not satisfy
    /// q ≡ 1 (mod 2n). `RingParams::validate` rejects such parameters before
    /// a context is built.
    pub fn new(n: usize, q: u64) -> Self {
        assert!(n.is_power_of_two() && n >= 2, "n must be a power of two");
        assert!(q % (2 * n as u64) == 1, "q must be ≡ 1 (mod 2n)");

        let q_inv_neg = Self::compute_q_inv_neg(q);
        let r_squared = Self::compute_r_squared(q);

        let psi = Self::find_primitive_root(2 * n as u64, q);
        let psi_mont = Self::to_montgomery(psi, q, r_squared, q_inv_neg);
        let psi_powers = Self::compute_twiddle_factors(n, psi_mont, q, q_inv_neg, r_squared);

        let psi_inv = ModQ::pow(psi, q - 2, q);
        let psi_inv_mont = Self::to_montgomery(psi_inv, q, r_squared, q_inv_neg);
        let psi_inv_powers =
            Self::compute_twiddle_factors(n, psi_inv_mont, q, q_inv_neg, r_squared);

        let n_inv_val = ModQ::pow(n as u64, q - 2, q);
        let n_inv = Self::to_montgomery(n_inv_val, q, r_squared, q_inv_neg);

        Self {
            n,
            q,
            q_inv_neg,
            r_squared,
            psi_powers,
            psi_inv_powers,
            n_inv,
        }
    }

    /// Creates an NTT context with `DEFAULT_Q`.
    pub fn with_default_q(n: usize) -> Self {
        Self::new(n, DEFAULT_Q)
    }

    /// Returns the ring dimension.
    pub fn dimension(&self) -> usize {
        self.n
    }

    /// Returns the modulus q.
    pub fn modulus(&self) -> u64 {
        self.q
    }

    /// Performs forward NTT in-place using Cooley-Tukey decimation-in-time.
    ///
    /// Input coefficients are converted to Montgomery form first, so the
    /// output is the evaluation vector in Montgomery representation.
    ///
    /// # Panics
    ///
    /// Panics if `coeffs.len() != n`.
    pub fn forward(&self, coeffs: &mut [u64]) {
        assert_eq!(coeffs.len(), self.n, "Input length must match dimension");

        for c in coeffs.iter_mut() {
            *c = Self::to_montgomery(*c, self.q, self.r_squared, self.q_inv_neg);
        }

        let n = self.n;
        let q = self.q;
        let mut t = n;
        let mut m = 1;

        while m < n {
            t >>= 1;
            for i in 0..m {
                let j1 = 2 * i * t;
                let j2 = j1 + t;
                let w = self.psi_powers[m + i];

                for j in j1..j2 {
                    let u = coeffs[j];
                    let v = self.montgomery_mul(coeffs[j + t], w);

                    coeffs[j] = if u + v >= q { u + v - q } else { u + v };
                    coeffs[j + t] = if u >= v { u - v } else { q - v + u };
                }
            }
            m <<= 1;
        }
    }

    /// Performs inverse NTT in-place using Gentleman-Sande decimation-in-frequency.
    ///
    /// Output is converted back from Montgomery form.
    ///
    /// # Panics
    ///
    /// Panics if `coeffs.len() != n`.
    pub fn inverse(&self, coeffs: &mut [u64]) {
        assert_eq!(coeffs.len(), self.n, "Input length must match dimension");

        let n = self.n;
        let q = self.q;
        let mut t = 1;
        let mut m = n;

        while m > 1 {
            m >>= 1;
            for i in 0..m {
                let j1 = i * 2 * t;
                let w = self.psi_inv_powers[m + i];

                for j in j1..(j1 + t) {
                    let u = coeffs[j];
                    let v = coeffs[j + t];

                    coeffs[j] = if u + v >= q { u + v - q } else { u + v };
                    let diff = if u >= v { u - v } else { q - v + u };
                    coeffs[j + t] = self.montgomery_mul(diff, w);
                }
            }
            t <<= 1;
        }

        // Scale by n^(-1) and leave Montgomery form in one pass
        for c in coeffs.iter_mut() {
            let scaled = self.montgomery_mul(*c, self.n_inv);
            *c = self.montgomery_mul(scaled, 1);
        }
    }

    /// Performs pointwise multiplication in NTT domain.
    ///
    /// Both inputs must be in Montgomery form (as produced by `forward`).
    ///
    /// # Panics
    ///
    /// Panics if any slice length differs from n.
    pub fn pointwise_mul(&self, a: &[u64], b: &[u64], result: &mut [u64]) {
        assert_eq!(a.len(), self.n, "Input length must match dimension");
        assert_eq!(b.len(), self.n, "Input length must match dimension");
        assert_eq!(result.len(), self.n, "Output length must match dimension");

        for ((r, &x), &y) in result.iter_mut().zip(a).zip(b) {
            *r = self.montgomery_mul(x, y);
        }
    }

    /// Single Montgomery product, for fused multiply-add loops.
    #[inline]
    pub fn pointwise_mul_single(&self, a: u64, b: u64) -> u64 {
        self.montgomery_mul(a, b)
    }

    #[inline]
    fn montgomery_mul(&self, a: u64, b: u64) -> u64 {
        let q = self.q;
        let ab = (a as u128) * (b as u128);
        let m = ((ab as u64).wrapping_mul(self.q_inv_neg)) as u128;
        let t = ((ab + m * (q as u128)) >> 64) as u64;
        if t >= q {
            t - q
        } else {
            t
        }
    }

    fn to_montgomery(a: u64, q: u64, r_squared: u64, q_inv_neg: u64) -> u64 {
        let ab = (a as u128) * (r_squared as u128);
        let m = ((ab as u64).wrapping_mul(q_inv_neg)) as u128;
        let t = ((ab + m * (q as u128)) >> 64) as u64;
        if t >= q {
            t - q
        } else {
            t
        }
    }

    fn compute_q_inv_neg(q: u64) -> u64 {
        let mut y: u64 = 1;
        for i in 1..64 {
            let yi = y.wrapping_mul(q) & (1u64 << i);
            y |= yi;
        }
        y.wrapping_neg()
    }

    fn compute_r_squared(q: u64) -> u64 {
        let r_mod_q = (1u128 << 64) % (q as u128);
        ((r_mod_q * r_mod_q) % (q as u128)) as u64
    }

    /// Find a primitive n-th root of unity modulo q (n a power of two)
    fn find_primitive_root(n: u64, q: u64) -> u64 {
        let exp = (q - 1) / n;
        for g in 2..q {
            let candidate = ModQ::pow(g, exp, q);
            // For n = 2^k, primitivity is ψ^(n/2) = -1
            if ModQ::pow(candidate, n / 2, q) == q - 1 {
                return candidate;
            }
        }
        unreachable!("q ≡ 1 (mod n) guarantees a primitive n-th root")
    }

    /// Twiddle factors in bit-reversed order: factors[m] = ψ^bitrev(m).
    fn compute_twiddle_factors(
        n: usize,
        psi: u64,
        q: u64,
        q_inv_neg: u64,
        r_squared: u64,
    ) -> Vec<u64> {
        let mont_mul = |a: u64, b: u64| -> u64 {
            let ab = (a as u128) * (b as u128);
            let mm = ((ab as u64).wrapping_mul(q_inv_neg)) as u128;
            let t = ((ab + mm * (q as u128)) >> 64) as u64;
            if t >= q {
                t - q
            } else {
                t
            }
        };

        let one = Self::to_montgomery(1, q, r_squared, q_inv_neg);
        let mut factors = vec![0u64; n];
        factors[0] = one;

        for m in 1..n {
            if m.is_power_of_two() {
                // ψ^(n/(2m)) by repeated squaring of ψ
                let mut pow = psi;
                let mut e = 1usize;
                while e < n / (2 * m) {
                    pow = mont_mul(pow, pow);
                    e <<= 1;
                }
                factors[m] = pow;
            } else {
                let prev_idx = m & (m - 1);
                let step_idx = m & m.wrapping_neg();
                factors[m] = mont_mul(factors[prev_idx], factors[step_idx]);
            }
        }

        factors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ntt_inverse_roundtrip_small() {
        let n = 16;
        let ctx = NttContext::with_default_q(n);

        let original: Vec<u64> = (0..n as u64).collect();
        let mut coeffs = original.clone();

        ctx.forward(&mut coeffs);
        ctx.inverse(&mut coeffs);

        assert_eq!(coeffs, original);
    }

    #[test]
    fn test_ntt_inverse_roundtrip_2048() {
        let n = 2048;
        let ctx = NttContext::with_default_q(n);

        let original: Vec<u64> = (0..n as u64).map(|i| i * 1000 % DEFAULT_Q).collect();
        let mut coeffs = original.clone();

        ctx.forward(&mut coeffs);
        ctx.inverse(&mut coeffs);

        assert_eq!(coeffs, original);
    }

    #[test]
    fn test_ntt_zero_polynomial() {
        let n = 256;
        let ctx = NttContext::with_default_q(n);

        let mut coeffs = vec![0u64; n];
        ctx.forward(&mut coeffs);
        assert!(coeffs.iter().all(|&c| c == 0));

        ctx.inverse(&mut coeffs);
        assert!(coeffs.iter().all(|&c| c == 0));
    }

    #[test]
    fn test_pointwise_multiplication_identity() {
        let n = 256;
        let ctx = NttContext::with_default_q(n);

        let mut a = vec![0u64; n];
        let mut b: Vec<u64> = (0..n as u64).map(|i| i * 7 + 3).collect();
        let expected = b.clone();
        a[0] = 1;

        ctx.forward(&mut a);
        ctx.forward(&mut b);

        let mut result = vec![0u64; n];
        ctx.pointwise_mul(&a, &b, &mut result);
        ctx.inverse(&mut result);

        assert_eq!(result, expected);
    }

    #[test]
    fn test_negacyclic_convolution() {
        // x * x^(n-1) = x^n = -1 in Z_q[X]/(X^n + 1)
        let n = 256;
        let q = DEFAULT_Q;
        let ctx = NttContext::with_default_q(n);

        let mut a = vec![0u64; n];
        a[1] = 1;
        let mut b = vec![0u64; n];
        b[n - 1] = 1;

        ctx.forward(&mut a);
        ctx.forward(&mut b);

        let mut result = vec![0u64; n];
        ctx.pointwise_mul(&a, &b, &mut result);
        ctx.inverse(&mut result);

        assert_eq!(result[0], q - 1);
        assert!(result[1..].iter().all(|&c| c == 0));
    }

    #[test]
    fn test_matches_schoolbook_product() {
        let n = 32;
        let q = DEFAULT_Q;
        let ctx = NttContext::with_default_q(n);

        let a: Vec<u64> = (0..n as u64).map(|i| (i * 31 + 5) % 97).collect();
        let b: Vec<u64> = (0..n as u64).map(|i| ModQ::from_signed(i as i64 - 16, q)).collect();

        let mut expected = vec![0u64; n];
        for i in 0..n {
            for j in 0..n {
                let prod = ModQ::mul(a[i], b[j], q);
                let k = i + j;
                if k < n {
                    expected[k] = ModQ::add(expected[k], prod, q);
                } else {
                    expected[k - n] = ModQ::sub(expected[k - n], prod, q);
                }
            }
        }

        let mut a_ntt = a.clone();
        let mut b_ntt = b.clone();
        ctx.forward(&mut a_ntt);
        ctx.forward(&mut b_ntt);
        let mut result = vec![0u64; n];
        ctx.pointwise_mul(&a_ntt, &b_ntt, &mut result);
        ctx.inverse(&mut result);

        assert_eq!(result, expected);
    }
}
