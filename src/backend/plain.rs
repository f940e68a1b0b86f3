use std::collections::HashSet;

use crate::error::{ControlError, Result};
use crate::math::{NttContext, Poly};
use crate::params::RingParams;
use crate::rlwe::{apply_automorphism, is_valid_galois_element};

use super::HomomorphicBackend;

/// Cleartext stand-in for [`LatticeBackend`](super::LatticeBackend).
///
/// "Ciphertexts" are the message polynomials themselves, so every operation
/// is exact. Galois keys are still tracked so that a missing key fails the
/// same way it does on the lattice backend.
pub struct PlainBackend {
    ctx: NttContext,
    galois_keys: HashSet<usize>,
}

impl PlainBackend {
    pub fn new(ring_dim: usize, q: u64) -> Result<Self> {
        RingParams {
            ring_dim,
            q,
            ..RingParams::insecure_d256()
        }
        .validate()?;

        Ok(Self {
            ctx: NttContext::new(ring_dim, q),
            galois_keys: HashSet::new(),
        })
    }
}

impl HomomorphicBackend for PlainBackend {
    type Ciphertext = Poly;
    type PackedCiphertext = Poly;

    fn ring_dim(&self) -> usize {
        self.ctx.dimension()
    }

    fn modulus(&self) -> u64 {
        self.ctx.modulus()
    }

    fn encrypt(&self, message: &Poly) -> Poly {
        message.clone()
    }

    fn decrypt(&self, ct: &Poly) -> Poly {
        ct.clone()
    }

    fn add(&self, lhs: &Poly, rhs: &Poly) -> Poly {
        lhs + rhs
    }

    fn sub(&self, lhs: &Poly, rhs: &Poly) -> Poly {
        lhs - rhs
    }

    fn scalar_mul(&self, ct: &Poly, scalar: u64) -> Poly {
        ct.scalar_mul(scalar)
    }

    fn mul_monomial(&self, ct: &Poly, k: usize) -> Poly {
        ct.mul_monomial(k)
    }

    fn encrypt_packed(&self, message: &Poly) -> Poly {
        message.clone()
    }

    fn external_product(&self, ct: &Poly, packed: &Poly) -> Poly {
        ct.mul_ntt(packed, &self.ctx)
    }

    fn automorphism(&self, ct: &Poly, g: usize) -> Result<Poly> {
        if !self.galois_keys.contains(&g) {
            return Err(ControlError::MissingGaloisKey(g));
        }
        Ok(apply_automorphism(ct, g))
    }

    fn generate_galois_keys(&mut self, elements: &[usize]) -> Result<()> {
        let d = self.ring_dim();
        for &g in elements {
            if !is_valid_galois_element(g, d) {
                return Err(ControlError::InvalidParams(format!(
                    "{} is not a Galois element for ring dimension {}",
                    g, d
                )));
            }
            self.galois_keys.insert(g);
        }
        Ok(())
    }
}
