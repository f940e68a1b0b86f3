//! Polynomial operations over R_q = Z_q[X]/(X^d + 1).
//!
//! Polynomials can exist in either coefficient domain or NTT domain.
//! Ciphertext components that are multiplied many times (RGSW rows,
//! key-switching rows) are stored in NTT domain; everything that is
//! permuted or shifted (automorphisms, monomial products) works on
//! coefficients.
//!
//! # Example
//!
//! ```
//! use packed_control::math::{NttContext, Poly, DEFAULT_Q};
//!
//! let ctx = NttContext::with_default_q(256);
//!
//! let a = Poly::random(256, DEFAULT_Q);
//! let b = Poly::random(256, DEFAULT_Q);
//! let product = a.mul_ntt(&b, &ctx);
//! assert_eq!(product.dimension(), 256);
//! ```

use super::modular::ModQ;
use super::ntt::NttContext;
use super::sampler::GaussianSampler;
use rand::Rng;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// Polynomial in R_q = Z_q[X]/(X^d + 1).
///
/// # Fields
///
/// * `coeffs` - Coefficients in coefficient or NTT domain
/// * `q` - Modulus q
/// * `is_ntt` - Whether coefficients are in NTT domain
///
/// # Example
///
/// ```
/// use packed_control::math::{Poly, DEFAULT_Q};
///
/// let poly = Poly::constant(42, 256, DEFAULT_Q);
/// assert_eq!(poly.coeff(0), 42);
/// assert_eq!(poly.dimension(), 256);
/// ```
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct Poly {
    coeffs: Vec<u64>,
    q: u64,
    is_ntt: bool,
}

impl Poly {
    /// Create zero polynomial with given dimension and modulus
    pub fn zero(dim: usize, q: u64) -> Self {
        Self {
            coeffs: vec![0; dim],
            q,
            is_ntt: false,
        }
    }

    /// Create polynomial from coefficient vector
    pub fn from_coeffs(coeffs: Vec<u64>, q: u64) -> Self {
        let mut p = Self {
            coeffs,
            q,
            is_ntt: false,
        };
        p.reduce();
        p
    }

    /// Create a polynomial whose first coefficients are the given signed
    /// integers; the rest are zero.
    ///
    /// # Panics
    ///
    /// Panics if `values.len() > dim`.
    pub fn from_signed(values: &[i64], dim: usize, q: u64) -> Self {
        assert!(values.len() <= dim, "too many coefficients for dimension");
        let mut coeffs = vec![0u64; dim];
        for (c, &v) in coeffs.iter_mut().zip(values) {
            *c = ModQ::from_signed(v, q);
        }
        Self {
            coeffs,
            q,
            is_ntt: false,
        }
    }

    /// Create polynomial with a single coefficient (constant polynomial)
    pub fn constant(value: u64, dim: usize, q: u64) -> Self {
        let mut coeffs = vec![0; dim];
        coeffs[0] = value % q;
        Self {
            coeffs,
            q,
            is_ntt: false,
        }
    }

    /// Sample polynomial with coefficients from discrete Gaussian distribution
    pub fn sample_gaussian(dim: usize, q: u64, sampler: &mut GaussianSampler) -> Self {
        let coeffs = sampler.sample_vec_centered(dim, q);
        Self {
            coeffs,
            q,
            is_ntt: false,
        }
    }

    /// Generate a uniformly random polynomial
    pub fn random(dim: usize, q: u64) -> Self {
        Self::random_with_rng(dim, q, &mut rand::thread_rng())
    }

    /// Generate a uniformly random polynomial with given RNG
    pub fn random_with_rng<R: Rng>(dim: usize, q: u64, rng: &mut R) -> Self {
        let coeffs: Vec<u64> = (0..dim).map(|_| rng.gen_range(0..q)).collect();
        Self {
            coeffs,
            q,
            is_ntt: false,
        }
    }

    /// Get polynomial dimension
    pub fn dimension(&self) -> usize {
        self.coeffs.len()
    }

    /// Get modulus
    pub fn modulus(&self) -> u64 {
        self.q
    }

    /// Check if in NTT domain
    pub fn is_ntt(&self) -> bool {
        self.is_ntt
    }

    /// Get coefficient at index (only valid if not in NTT domain)
    pub fn coeff(&self, i: usize) -> u64 {
        assert!(!self.is_ntt, "Cannot access coefficients in NTT domain");
        self.coeffs[i]
    }

    /// Coefficient at index in the centered range [-q/2, q/2)
    pub fn coeff_signed(&self, i: usize) -> i64 {
        ModQ::to_signed(self.coeff(i), self.q)
    }

    /// Set coefficient at index (only valid if not in NTT domain)
    pub fn set_coeff(&mut self, i: usize, value: u64) {
        assert!(!self.is_ntt, "Cannot set coefficients in NTT domain");
        self.coeffs[i] = value % self.q;
    }

    /// Get reference to coefficient/NTT vector
    pub fn coeffs(&self) -> &[u64] {
        &self.coeffs
    }

    fn reduce(&mut self) {
        for c in &mut self.coeffs {
            *c %= self.q;
        }
    }

    /// Convert to NTT domain
    pub fn to_ntt(&mut self, ctx: &NttContext) {
        if !self.is_ntt {
            ctx.forward(&mut self.coeffs);
            self.is_ntt = true;
        }
    }

    /// Convert from NTT domain to coefficient domain
    pub fn from_ntt(&mut self, ctx: &NttContext) {
        if self.is_ntt {
            ctx.inverse(&mut self.coeffs);
            self.is_ntt = false;
        }
    }

    /// Create a copy in NTT domain
    pub fn to_ntt_new(&self, ctx: &NttContext) -> Self {
        let mut result = self.clone();
        result.to_ntt(ctx);
        result
    }

    /// Scalar multiplication
    pub fn scalar_mul(&self, scalar: u64) -> Self {
        let scalar = scalar % self.q;
        let coeffs: Vec<u64> = self
            .coeffs
            .iter()
            .map(|&c| ModQ::mul(c, scalar, self.q))
            .collect();

        Self {
            coeffs,
            q: self.q,
            is_ntt: self.is_ntt,
        }
    }

    /// Multiply by the monomial X^k, `k` taken modulo 2d.
    ///
    /// Since X^d = -1, this is a negacyclic rotation: coefficient i moves to
    /// (i + k) mod d and flips sign whenever it wraps past X^d an odd number
    /// of times.
    pub fn mul_monomial(&self, k: usize) -> Self {
        assert!(!self.is_ntt, "Monomial product works on coefficients");
        let d = self.coeffs.len();
        let k = k % (2 * d);
        let mut coeffs = vec![0u64; d];

        for (i, &c) in self.coeffs.iter().enumerate() {
            let target = i + k;
            let wraps = target / d;
            let idx = target % d;
            coeffs[idx] = if wraps % 2 == 0 {
                c
            } else {
                ModQ::negate(c, self.q)
            };
        }

        Self {
            coeffs,
            q: self.q,
            is_ntt: false,
        }
    }

    /// Polynomial multiplication using NTT (negacyclic for X^d + 1)
    pub fn mul_ntt(&self, other: &Self, ctx: &NttContext) -> Self {
        assert_eq!(self.q, other.q, "Moduli must match");
        assert_eq!(
            self.coeffs.len(),
            other.coeffs.len(),
            "Dimensions must match"
        );

        let a = self.to_ntt_new(ctx);
        let b = other.to_ntt_new(ctx);
        let mut poly = a.mul_ntt_domain(&b, ctx);
        poly.from_ntt(ctx);
        poly
    }

    /// Polynomial multiplication when both are already in NTT domain
    pub fn mul_ntt_domain(&self, other: &Self, ctx: &NttContext) -> Self {
        assert!(
            self.is_ntt && other.is_ntt,
            "Both polynomials must be in NTT domain"
        );
        assert_eq!(self.q, other.q, "Moduli must match");

        let mut result = vec![0u64; self.coeffs.len()];
        ctx.pointwise_mul(&self.coeffs, &other.coeffs, &mut result);

        Self {
            coeffs: result,
            q: self.q,
            is_ntt: true,
        }
    }

    /// In-place multiply-accumulate in NTT domain: self += a * b
    pub fn mul_acc_ntt_domain(&mut self, a: &Self, b: &Self, ctx: &NttContext) {
        assert!(
            self.is_ntt && a.is_ntt && b.is_ntt,
            "All polynomials must be in NTT domain"
        );
        assert_eq!(self.q, a.q, "Moduli must match");
        assert_eq!(self.q, b.q, "Moduli must match");

        let q = self.q;
        for ((acc, &x), &y) in self.coeffs.iter_mut().zip(&a.coeffs).zip(&b.coeffs) {
            let prod = ctx.pointwise_mul_single(x, y);
            let sum = *acc + prod;
            *acc = if sum >= q { sum - q } else { sum };
        }
    }
}

impl PartialEq for Poly {
    fn eq(&self, other: &Self) -> bool {
        self.q == other.q && self.is_ntt == other.is_ntt && self.coeffs == other.coeffs
    }
}

impl Eq for Poly {}

impl Add for &Poly {
    type Output = Poly;

    fn add(self, rhs: Self) -> Self::Output {
        assert_eq!(self.q, rhs.q, "Moduli must match");
        assert_eq!(self.is_ntt, rhs.is_ntt, "NTT domains must match");

        let coeffs: Vec<u64> = self
            .coeffs
            .iter()
            .zip(rhs.coeffs.iter())
            .map(|(&a, &b)| {
                let sum = a + b;
                if sum >= self.q {
                    sum - self.q
                } else {
                    sum
                }
            })
            .collect();

        Poly {
            coeffs,
            q: self.q,
            is_ntt: self.is_ntt,
        }
    }
}

impl Add for Poly {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        &self + &rhs
    }
}

impl AddAssign<&Poly> for Poly {
    fn add_assign(&mut self, rhs: &Self) {
        assert_eq!(self.q, rhs.q, "Moduli must match");
        assert_eq!(self.is_ntt, rhs.is_ntt, "NTT domains must match");

        let q = self.q;
        for (a, &b) in self.coeffs.iter_mut().zip(rhs.coeffs.iter()) {
            let sum = *a + b;
            *a = if sum >= q { sum - q } else { sum };
        }
    }
}

impl Sub for &Poly {
    type Output = Poly;

    fn sub(self, rhs: Self) -> Self::Output {
        assert_eq!(self.q, rhs.q, "Moduli must match");
        assert_eq!(self.is_ntt, rhs.is_ntt, "NTT domains must match");

        let coeffs: Vec<u64> = self
            .coeffs
            .iter()
            .zip(rhs.coeffs.iter())
            .map(|(&a, &b)| if a >= b { a - b } else { self.q - b + a })
            .collect();

        Poly {
            coeffs,
            q: self.q,
            is_ntt: self.is_ntt,
        }
    }
}

impl Sub for Poly {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        &self - &rhs
    }
}

impl SubAssign<&Poly> for Poly {
    fn sub_assign(&mut self, rhs: &Self) {
        *self = &*self - rhs;
    }
}

impl Neg for &Poly {
    type Output = Poly;

    fn neg(self) -> Self::Output {
        let coeffs: Vec<u64> = self
            .coeffs
            .iter()
            .map(|&c| ModQ::negate(c, self.q))
            .collect();

        Poly {
            coeffs,
            q: self.q,
            is_ntt: self.is_ntt,
        }
    }
}

impl Neg for Poly {
    type Output = Self;

    fn neg(self) -> Self::Output {
        -&self
    }
}
