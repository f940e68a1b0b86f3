use std::collections::HashMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use tracing::debug;

use crate::error::{ControlError, Result};
use crate::ks::{automorphism_switch, generate_automorphism_ks_matrix, KeySwitchingMatrix};
use crate::math::{GaussianSampler, NttContext, Poly};
use crate::params::RingParams;
use crate::rgsw::{external_product, GadgetVector, RgswCiphertext};
use crate::rlwe::{is_valid_galois_element, RlweCiphertext, RlweSecretKey};

use super::HomomorphicBackend;

/// RLWE/RGSW backend over R_q = Z_q[X]/(X^d + 1).
///
/// Holds the secret key, so it plays both client and evaluator. Encryption
/// randomness is drawn per call from the thread-local RNG; key material is
/// drawn from a ChaCha20 stream fixed at construction.
pub struct LatticeBackend {
    params: RingParams,
    ctx: NttContext,
    gadget: GadgetVector,
    sk: RlweSecretKey,
    galois_keys: HashMap<usize, KeySwitchingMatrix>,
    keygen_rng: ChaCha20Rng,
}

impl LatticeBackend {
    /// Create a backend with a fresh secret key
    pub fn new(params: RingParams) -> Result<Self> {
        Self::from_rng(params, ChaCha20Rng::from_entropy())
    }

    /// Create a backend whose key material is derived from `seed`
    pub fn with_seed(params: RingParams, seed: u64) -> Result<Self> {
        Self::from_rng(params, ChaCha20Rng::seed_from_u64(seed))
    }

    fn from_rng(params: RingParams, mut keygen_rng: ChaCha20Rng) -> Result<Self> {
        params.validate()?;

        let ctx = params.ntt_context();
        let gadget = params.gadget();
        let mut sampler = GaussianSampler::with_seed(params.sigma, keygen_rng.gen());
        let sk = RlweSecretKey::generate(&params, &mut sampler);

        debug!(
            ring_dim = params.ring_dim,
            gadget_base = params.gadget_base,
            gadget_len = params.gadget_len,
            "lattice backend ready"
        );

        Ok(Self {
            params,
            ctx,
            gadget,
            sk,
            galois_keys: HashMap::new(),
            keygen_rng,
        })
    }

    pub fn params(&self) -> &RingParams {
        &self.params
    }

    /// Galois elements with a key-switching key
    pub fn galois_elements(&self) -> Vec<usize> {
        let mut elements: Vec<usize> = self.galois_keys.keys().copied().collect();
        elements.sort_unstable();
        elements
    }

    fn sampler(&self) -> GaussianSampler {
        GaussianSampler::new(self.params.sigma)
    }
}

impl HomomorphicBackend for LatticeBackend {
    type Ciphertext = RlweCiphertext;
    type PackedCiphertext = RgswCiphertext;

    fn ring_dim(&self) -> usize {
        self.params.ring_dim
    }

    fn modulus(&self) -> u64 {
        self.params.q
    }

    fn encrypt(&self, message: &Poly) -> RlweCiphertext {
        let mut sampler = self.sampler();
        let a = Poly::random(self.params.ring_dim, self.params.q);
        let error = Poly::sample_gaussian(self.params.ring_dim, self.params.q, &mut sampler);
        RlweCiphertext::encrypt(&self.sk, message, 1, a, &error, &self.ctx)
    }

    fn decrypt(&self, ct: &RlweCiphertext) -> Poly {
        ct.decrypt_phase(&self.sk, &self.ctx)
    }

    fn add(&self, lhs: &RlweCiphertext, rhs: &RlweCiphertext) -> RlweCiphertext {
        lhs.add(rhs)
    }

    fn sub(&self, lhs: &RlweCiphertext, rhs: &RlweCiphertext) -> RlweCiphertext {
        lhs.sub(rhs)
    }

    fn scalar_mul(&self, ct: &RlweCiphertext, scalar: u64) -> RlweCiphertext {
        ct.scalar_mul(scalar)
    }

    fn mul_monomial(&self, ct: &RlweCiphertext, k: usize) -> RlweCiphertext {
        ct.mul_monomial(k)
    }

    fn encrypt_packed(&self, message: &Poly) -> RgswCiphertext {
        let mut sampler = self.sampler();
        RgswCiphertext::encrypt(&self.sk, message, &self.gadget, &mut sampler, &self.ctx)
    }

    fn external_product(&self, ct: &RlweCiphertext, packed: &RgswCiphertext) -> RlweCiphertext {
        external_product(ct, packed, &self.ctx)
    }

    fn automorphism(&self, ct: &RlweCiphertext, g: usize) -> Result<RlweCiphertext> {
        let ks_matrix = self
            .galois_keys
            .get(&g)
            .ok_or(ControlError::MissingGaloisKey(g))?;
        Ok(automorphism_switch(ct, g, ks_matrix, &self.ctx))
    }

    fn generate_galois_keys(&mut self, elements: &[usize]) -> Result<()> {
        for &g in elements {
            if !is_valid_galois_element(g, self.params.ring_dim) {
                return Err(ControlError::InvalidParams(format!(
                    "{} is not a Galois element for ring dimension {}",
                    g, self.params.ring_dim
                )));
            }
            if self.galois_keys.contains_key(&g) {
                continue;
            }
            let mut sampler = GaussianSampler::with_seed(self.params.sigma, self.keygen_rng.gen());
            let ks_matrix =
                generate_automorphism_ks_matrix(&self.sk, g, &self.gadget, &mut sampler, &self.ctx);
            self.galois_keys.insert(g, ks_matrix);
        }
        debug!(elements = ?self.galois_elements(), "galois keys generated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> LatticeBackend {
        LatticeBackend::with_seed(RingParams::insecure_d256(), 7).unwrap()
    }

    #[test]
    fn test_rejects_invalid_params() {
        let params = RingParams {
            ring_dim: 100,
            ..RingParams::insecure_d256()
        };
        assert!(matches!(
            LatticeBackend::new(params),
            Err(ControlError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_encrypt_decrypt() {
        let backend = backend();
        let m = Poly::from_signed(&[42, -17], backend.ring_dim(), backend.modulus());
        let phase = backend.decrypt(&backend.encrypt(&m));
        assert!((phase.coeff_signed(0) - 42).abs() < 32);
        assert!((phase.coeff_signed(1) + 17).abs() < 32);
    }

    #[test]
    fn test_automorphism_requires_key() {
        let mut backend = backend();
        let m = Poly::from_signed(&[1], backend.ring_dim(), backend.modulus());
        let ct = backend.encrypt(&m);

        assert_eq!(
            backend.automorphism(&ct, 5).unwrap_err(),
            ControlError::MissingGaloisKey(5)
        );

        backend.generate_galois_keys(&[5, 3]).unwrap();
        assert_eq!(backend.galois_elements(), vec![3, 5]);
        let phase = backend.decrypt(&backend.automorphism(&ct, 5).unwrap());
        assert!((phase.coeff_signed(0) - 1).abs() < 1 << 20);
    }

    #[test]
    fn test_rejects_even_galois_element() {
        let mut backend = backend();
        assert!(backend.generate_galois_keys(&[4]).is_err());
    }
}
