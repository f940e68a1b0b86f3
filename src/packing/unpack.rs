//! Unpacker: folds a spread product into a dense encrypted vector.
//!
//! Write Y = X^(N/τ). A spread product holds `τ⁻¹·y_i` at `Y^perm[i]`.
//! Round r applies τ_g with g = τ/2^r + 1, which fixes Y^k when
//! `k / 2^r` is even and negates it when odd, so
//!
//! ```text
//! even = c + τ_g(c)
//! odd  = (c - τ_g(c)) · Y^(-2^r)
//! ```
//!
//! split the live slots in two and double them. After log2(τ) rounds the
//! leaf reached by the even/odd path of slot k holds `τ·τ⁻¹·y` in its
//! constant term. Taking the even branch first visits slots in bit-reversed
//! order, which is `perm`, so the depth-first leaves are `y_0, y_1, ..`.

use tracing::debug;

use crate::backend::HomomorphicBackend;
use crate::error::{ControlError, Result};
use crate::params::Scale;

use super::context::PackingContext;
use super::types::{EncryptedVector, PackedProduct};

impl<B: HomomorphicBackend> PackingContext<B> {
    /// Dense vector of the first `n` components of `product`
    pub fn unpack(
        &self,
        product: &PackedProduct<B::Ciphertext>,
        n: usize,
    ) -> Result<EncryptedVector<B::Ciphertext>> {
        self.check_tau(product.tau())?;
        if n == 0 || n > product.len() {
            return Err(ControlError::DimensionViolation(format!(
                "cannot unpack {} components from a product of length {}",
                n,
                product.len()
            )));
        }

        let mut leaves = Vec::with_capacity(n);
        self.fold(product.ciphertext().clone(), 0, 0, n, &mut leaves)?;

        debug!(n, tau = self.tau, "unpacked product");
        Ok(EncryptedVector::new(leaves, product.scale(), self.tau))
    }

    /// Depth-first fold; subtrees starting at or beyond `n` are skipped
    fn fold(
        &self,
        ct: B::Ciphertext,
        round: usize,
        start: usize,
        n: usize,
        leaves: &mut Vec<B::Ciphertext>,
    ) -> Result<()> {
        let Some(table) = self.rounds.get(round) else {
            leaves.push(ct);
            return Ok(());
        };
        let half = self.tau >> (round + 1);
        let rotated = self.backend.automorphism(&ct, table.galois_element)?;

        let even = self.backend.add(&ct, &rotated);
        self.fold(even, round + 1, start, n, leaves)?;

        if start + half < n {
            let diff = self.backend.sub(&ct, &rotated);
            let odd = self.backend.mul_monomial(&diff, table.monomial_exponent);
            self.fold(odd, round + 1, start + half, n, leaves)?;
        }
        Ok(())
    }

    /// Decrypt and multiply by the real value of `expected`.
    ///
    /// Fails if the vector carries a different scale.
    pub fn decrypt_and_rescale(
        &self,
        vector: &EncryptedVector<B::Ciphertext>,
        expected: Scale,
    ) -> Result<Vec<f64>> {
        if vector.scale() != expected {
            return Err(ControlError::ScaleMismatch {
                expected,
                actual: vector.scale(),
            });
        }
        let unit = expected.value(&self.scaling);
        Ok(self
            .decrypt_quantized(vector)
            .into_iter()
            .map(|v| v as f64 * unit)
            .collect())
    }

    /// Constant terms as centered integers, in units of `vector.scale()`
    pub fn decrypt_quantized(&self, vector: &EncryptedVector<B::Ciphertext>) -> Vec<i64> {
        vector
            .components()
            .iter()
            .map(|ct| self.backend.decrypt(ct).coeff_signed(0))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::PlainBackend;
    use crate::math::DEFAULT_Q;
    use crate::params::ScalingParameters;

    fn context(ring_dim: usize, tau: usize) -> PackingContext<PlainBackend> {
        let backend = PlainBackend::new(ring_dim, DEFAULT_Q).unwrap();
        PackingContext::setup(backend, tau, ScalingParameters::reference()).unwrap()
    }

    fn integer_matrix(rows: usize, cols: usize) -> Vec<Vec<i64>> {
        (0..rows)
            .map(|i| {
                (0..cols)
                    .map(|j| (i as i64 + 1) * 7 - (j as i64) * 3 + ((i * j) % 5) as i64)
                    .collect()
            })
            .collect()
    }

    fn mat_vec(m: &[Vec<i64>], x: &[i64]) -> Vec<i64> {
        m.iter()
            .map(|row| row.iter().zip(x).map(|(a, b)| a * b).sum())
            .collect()
    }

    #[test]
    fn test_identity_composition_for_every_length() {
        for tau in [1, 2, 4, 8, 16] {
            let ctx = context(64, tau);
            for n in 1..=tau {
                let identity: Vec<Vec<i64>> = (0..n)
                    .map(|i| (0..n).map(|j| i64::from(i == j)).collect())
                    .collect();
                let x: Vec<i64> = (0..n as i64).map(|i| 100 * i - 37).collect();

                let m = ctx.pack_quantized(&identity, Scale::UNIT).unwrap();
                let ct = ctx.encrypt_quantized(&x, Scale::UNIT).unwrap();
                let product = ctx.mult_pack(&ct, &m).unwrap();
                let unpacked = ctx.unpack(&product, n).unwrap();

                assert_eq!(unpacked.len(), n);
                assert_eq!(ctx.decrypt_quantized(&unpacked), x, "tau={} n={}", tau, n);
            }
        }
    }

    #[test]
    fn test_rectangular_products() {
        let ctx = context(32, 8);
        for (rows, cols) in [(1, 8), (8, 1), (3, 5), (6, 2), (8, 8)] {
            let m = integer_matrix(rows, cols);
            let x: Vec<i64> = (0..cols as i64).map(|j| 11 - 4 * j).collect();

            let packed = ctx.pack_quantized(&m, Scale::STATE).unwrap();
            let ct = ctx.encrypt_quantized(&x, Scale::SIGNAL).unwrap();
            let unpacked = ctx.unpack(&ctx.mult_pack(&ct, &packed).unwrap(), rows).unwrap();

            assert_eq!(unpacked.scale(), Scale::STATE * Scale::SIGNAL);
            assert_eq!(ctx.decrypt_quantized(&unpacked), mat_vec(&m, &x));
        }
    }

    #[test]
    fn test_partial_unpack_keeps_prefix() {
        let ctx = context(16, 4);
        let m = integer_matrix(4, 4);
        let x = vec![1, -2, 3, -4];
        let product = ctx
            .mult_pack(
                &ctx.encrypt_quantized(&x, Scale::UNIT).unwrap(),
                &ctx.pack_quantized(&m, Scale::UNIT).unwrap(),
            )
            .unwrap();
        let full = mat_vec(&m, &x);
        for n in 1..=4 {
            let unpacked = ctx.unpack(&product, n).unwrap();
            assert_eq!(ctx.decrypt_quantized(&unpacked), full[..n].to_vec());
        }
    }

    #[test]
    fn test_unpack_rejects_bad_length() {
        let ctx = context(16, 4);
        let product = ctx
            .mult_pack(
                &ctx.encrypt_quantized(&[1, 2], Scale::UNIT).unwrap(),
                &ctx.pack_quantized(&[vec![1, 0], vec![0, 1]], Scale::UNIT).unwrap(),
            )
            .unwrap();
        assert!(ctx.unpack(&product, 0).is_err());
        assert!(ctx.unpack(&product, 3).is_err());
    }

    #[test]
    fn test_unpack_rejects_foreign_width() {
        let ctx4 = context(16, 4);
        let ctx2 = context(16, 2);
        let product = ctx2
            .mult_pack(
                &ctx2.encrypt_quantized(&[1], Scale::UNIT).unwrap(),
                &ctx2.pack_quantized(&[vec![1]], Scale::UNIT).unwrap(),
            )
            .unwrap();
        assert_eq!(
            ctx4.unpack(&product, 1).unwrap_err(),
            ControlError::PackingWidthMismatch {
                expected: 4,
                actual: 2
            }
        );
    }

    #[test]
    fn test_decrypt_and_rescale() {
        let ctx = context(16, 2);
        let ct = ctx.encrypt_vector(&[0.5, -0.25], Scale::SIGNAL).unwrap();
        let expected = Scale::SIGNAL * Scale::ENCODING;
        let values = ctx.decrypt_and_rescale(&ct, expected).unwrap();
        assert!((values[0] - 0.5).abs() < 1e-9);
        assert!((values[1] + 0.25).abs() < 1e-9);

        assert_eq!(
            ctx.decrypt_and_rescale(&ct, Scale::SIGNAL).unwrap_err(),
            ControlError::ScaleMismatch {
                expected: Scale::SIGNAL,
                actual: expected
            }
        );
    }
}
