//! Scalar arithmetic over Z_q.
//!
//! All helpers take the modulus explicitly and work on canonical
//! representatives in `[0, q)`. Signed quantities (quantized control
//! signals, noise) move in and out of Z_q through [`ModQ::from_signed`] and
//! [`ModQ::to_signed`], which use the centered range `[-q/2, q/2)`.

/// Default modulus q = 2^60 - 2^14 + 1 (NTT-friendly prime).
///
/// q ≡ 1 (mod 2^14), so negacyclic NTTs exist for ring dimensions up to 8192.
pub const DEFAULT_Q: u64 = 1152921504606830593;

/// Modular arithmetic operations over Z_q
pub struct ModQ;

impl ModQ {
    /// Add two values modulo q
    #[inline]
    pub fn add(a: u64, b: u64, q: u64) -> u64 {
        let sum = (a as u128) + (b as u128);
        (sum % (q as u128)) as u64
    }

    /// Subtract two values modulo q
    #[inline]
    pub fn sub(a: u64, b: u64, q: u64) -> u64 {
        if a >= b {
            a - b
        } else {
            q - (b - a)
        }
    }

    /// Multiply two values modulo q
    #[inline]
    pub fn mul(a: u64, b: u64, q: u64) -> u64 {
        let prod = (a as u128) * (b as u128);
        (prod % (q as u128)) as u64
    }

    /// Negate a value modulo q
    #[inline]
    pub fn negate(a: u64, q: u64) -> u64 {
        if a == 0 {
            0
        } else {
            q - a
        }
    }

    /// Convert a signed integer to its representation in Z_q
    #[inline]
    pub fn from_signed(val: i64, q: u64) -> u64 {
        if val >= 0 {
            (val as u64) % q
        } else {
            let abs = val.unsigned_abs() % q;
            if abs == 0 {
                0
            } else {
                q - abs
            }
        }
    }

    /// Convert from Z_q to signed representation in [-q/2, q/2)
    #[inline]
    pub fn to_signed(val: u64, q: u64) -> i64 {
        if val < q.div_ceil(2) {
            val as i64
        } else {
            -((q - val) as i64)
        }
    }

    /// Modular exponentiation by squaring
    pub fn pow(mut base: u64, mut exp: u64, q: u64) -> u64 {
        let mut result = 1u64 % q;
        base %= q;
        while exp > 0 {
            if exp & 1 == 1 {
                result = Self::mul(result, base, q);
            }
            exp >>= 1;
            base = Self::mul(base, base, q);
        }
        result
    }

    /// Multiplicative inverse via the extended Euclidean algorithm.
    ///
    /// Returns `None` when `a` and `q` are not coprime.
    pub fn inv(a: u64, q: u64) -> Option<u64> {
        let mut t: i128 = 0;
        let mut new_t: i128 = 1;
        let mut r: i128 = q as i128;
        let mut new_r: i128 = (a % q) as i128;

        while new_r != 0 {
            let quotient = r / new_r;
            (t, new_t) = (new_t, t - quotient * new_t);
            (r, new_r) = (new_r, r - quotient * new_r);
        }

        if r != 1 {
            return None;
        }
        if t < 0 {
            t += q as i128;
        }
        Some(t as u64)
    }
}
