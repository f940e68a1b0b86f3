//! Packed matrix-vector products.

use rayon::prelude::*;
use tracing::debug;

use crate::backend::HomomorphicBackend;
use crate::error::{ControlError, Result};
use crate::math::{ModQ, Poly};

use super::context::PackingContext;
use super::types::{EncryptedVector, PackedMatrix, PackedProduct, PackedTerm};

impl<B: HomomorphicBackend> PackingContext<B> {
    /// `M·x` spread over the packed slots
    pub fn mult_pack(
        &self,
        vector: &EncryptedVector<B::Ciphertext>,
        matrix: &PackedMatrix<B::PackedCiphertext>,
    ) -> Result<PackedProduct<B::Ciphertext>> {
        self.multiply_and_accumulate(&[PackedTerm::new(vector, matrix)])
    }

    /// `Σ weight·M·x` over all terms.
    ///
    /// All terms must produce the same number of rows at the same scale.
    pub fn multiply_and_accumulate(
        &self,
        terms: &[PackedTerm<'_, B::Ciphertext, B::PackedCiphertext>],
    ) -> Result<PackedProduct<B::Ciphertext>> {
        let first = terms.first().ok_or_else(|| {
            ControlError::DimensionViolation("no terms to accumulate".into())
        })?;
        let rows = first.matrix.rows();
        let scale = first.scale();

        for term in terms {
            self.check_tau(term.vector.tau())?;
            self.check_tau(term.matrix.tau())?;
            if term.vector.len() != term.matrix.cols() {
                return Err(ControlError::DimensionViolation(format!(
                    "vector of length {} against matrix with {} columns",
                    term.vector.len(),
                    term.matrix.cols()
                )));
            }
            if term.matrix.rows() != rows {
                return Err(ControlError::DimensionViolation(format!(
                    "terms produce {} and {} rows",
                    rows,
                    term.matrix.rows()
                )));
            }
            if term.scale() != scale {
                return Err(ControlError::ScaleMismatch {
                    expected: scale,
                    actual: term.scale(),
                });
            }
        }

        let q = self.backend.modulus();
        let mut sum: Option<B::Ciphertext> = None;
        for term in terms {
            let product = self.column_products(term.vector, term.matrix);
            let weighted = match term.weight {
                1 => product,
                w => self.backend.scalar_mul(&product, ModQ::from_signed(w, q)),
            };
            sum = Some(match sum {
                Some(acc) => self.backend.add(&acc, &weighted),
                None => weighted,
            });
        }

        debug!(terms = terms.len(), rows, %scale, "accumulated packed products");
        let ciphertext = sum.ok_or_else(|| {
            ControlError::DimensionViolation("no terms to accumulate".into())
        })?;
        Ok(PackedProduct::new(ciphertext, rows, scale, self.tau))
    }

    /// Σ_j ext(x_j, col_j): external products in parallel, summed in column order
    fn column_products(
        &self,
        vector: &EncryptedVector<B::Ciphertext>,
        matrix: &PackedMatrix<B::PackedCiphertext>,
    ) -> B::Ciphertext {
        let products: Vec<B::Ciphertext> = vector
            .components()
            .par_iter()
            .zip(matrix.columns().par_iter())
            .map(|(x, column)| self.backend.external_product(x, column))
            .collect();

        let mut iter = products.into_iter();
        let first = iter.next();
        iter.fold(first, |acc, ct| acc.map(|acc| self.backend.add(&acc, &ct)))
            .unwrap_or_else(|| {
                let d = self.backend.ring_dim();
                let q = self.backend.modulus();
                self.backend.encrypt(&Poly::zero(d, q))
            })
    }

    /// Homomorphic sum of two vectors with identical tags
    pub fn add_vectors(
        &self,
        lhs: &EncryptedVector<B::Ciphertext>,
        rhs: &EncryptedVector<B::Ciphertext>,
    ) -> Result<EncryptedVector<B::Ciphertext>> {
        self.check_tau(lhs.tau())?;
        self.check_tau(rhs.tau())?;
        if lhs.scale() != rhs.scale() {
            return Err(ControlError::ScaleMismatch {
                expected: lhs.scale(),
                actual: rhs.scale(),
            });
        }
        if lhs.len() != rhs.len() {
            return Err(ControlError::DimensionViolation(format!(
                "cannot add vectors of length {} and {}",
                lhs.len(),
                rhs.len()
            )));
        }
        let components = lhs
            .components()
            .iter()
            .zip(rhs.components())
            .map(|(a, b)| self.backend.add(a, b))
            .collect();
        Ok(EncryptedVector::new(components, lhs.scale(), self.tau))
    }
}
