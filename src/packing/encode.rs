//! Packer and vector encryption.

use rayon::prelude::*;
use tracing::debug;

use crate::backend::HomomorphicBackend;
use crate::error::{ControlError, Result};
use crate::math::{ModQ, Poly};
use crate::params::Scale;

use super::context::PackingContext;
use super::quantize::{check_headroom, matrix_shape, quantize, quantize_vector};
use super::types::{EncryptedVector, PackedMatrix};

impl<B: HomomorphicBackend> PackingContext<B> {
    /// Quantize `matrix` at `scale` and encrypt it column by column.
    ///
    /// Rows or columns beyond `tau` are rejected. Missing slots are zero.
    pub fn pack_and_encrypt(
        &self,
        matrix: &[Vec<f64>],
        scale: Scale,
    ) -> Result<PackedMatrix<B::PackedCiphertext>> {
        let step = scale.value(&self.scaling);
        let quantized = matrix
            .iter()
            .map(|row| quantize_vector(row, step))
            .collect::<Result<Vec<_>>>()?;
        self.pack_quantized(&quantized, scale)
    }

    /// Like `pack_and_encrypt`, but every entry must already be an integer
    /// multiple of `scale`.
    pub fn pack_and_encrypt_integer(
        &self,
        matrix: &[Vec<f64>],
        scale: Scale,
    ) -> Result<PackedMatrix<B::PackedCiphertext>> {
        let step = scale.value(&self.scaling);
        let mut quantized = Vec::with_capacity(matrix.len());
        for (row, entries) in matrix.iter().enumerate() {
            let mut ints = Vec::with_capacity(entries.len());
            for (col, &value) in entries.iter().enumerate() {
                let q = quantize(value, step)?;
                if (value / step - q as f64).abs() > 1e-9 {
                    return Err(ControlError::NonIntegerMatrix { row, col, value });
                }
                ints.push(q);
            }
            quantized.push(ints);
        }
        self.pack_quantized(&quantized, scale)
    }

    /// Pack an integer matrix whose entries are in units of `scale`
    pub fn pack_quantized(
        &self,
        matrix: &[Vec<i64>],
        scale: Scale,
    ) -> Result<PackedMatrix<B::PackedCiphertext>> {
        let (rows, cols) = matrix_shape(matrix)?;
        if rows > self.tau || cols > self.tau {
            return Err(ControlError::DimensionViolation(format!(
                "{}x{} matrix does not fit packing width {}",
                rows, cols, self.tau
            )));
        }
        for row in matrix {
            check_headroom(row, self.backend.modulus())?;
        }

        let columns: Vec<B::PackedCiphertext> = (0..cols)
            .into_par_iter()
            .map(|j| {
                let column = self.column_poly(matrix, j);
                self.backend.encrypt_packed(&column)
            })
            .collect();

        debug!(rows, cols, %scale, "packed matrix");
        Ok(PackedMatrix::new(columns, rows, scale, self.tau))
    }

    /// Σ_i τ⁻¹·M[i][j]·X^(perm[i]·stride)
    fn column_poly(&self, matrix: &[Vec<i64>], j: usize) -> Poly {
        let d = self.backend.ring_dim();
        let q = self.backend.modulus();
        let mut coeffs = vec![0u64; d];
        for (i, row) in matrix.iter().enumerate() {
            let value = ModQ::from_signed(row[j], q);
            coeffs[self.permutation.slot(i) * self.stride] = ModQ::mul(value, self.tau_inv, q);
        }
        Poly::from_coeffs(coeffs, q)
    }

    /// Quantize `values` at `quant`, lift by 1/L and encrypt.
    ///
    /// The result has scale `quant · L`.
    pub fn encrypt_vector(
        &self,
        values: &[f64],
        quant: Scale,
    ) -> Result<EncryptedVector<B::Ciphertext>> {
        let step = quant.value(&self.scaling);
        let quantized = quantize_vector(values, step)?;
        let bound = self.backend.modulus() / 2;
        let lifted = quantized
            .iter()
            .map(|&v| {
                v.checked_mul(self.lift as i64)
                    .ok_or(ControlError::ModulusOverflow { value: v, bound })
            })
            .collect::<Result<Vec<_>>>()?;
        self.encrypt_quantized(&lifted, quant * Scale::ENCODING)
    }

    /// Quantize `values` directly at the full `scale` and encrypt.
    ///
    /// Rounding happens at `scale` itself, encoding step included, so the
    /// result keeps every digit `scale` can represent.
    pub fn encrypt_at_scale(
        &self,
        values: &[f64],
        scale: Scale,
    ) -> Result<EncryptedVector<B::Ciphertext>> {
        let quantized = quantize_vector(values, scale.value(&self.scaling))?;
        self.encrypt_quantized(&quantized, scale)
    }

    /// Encrypt integers already expressed in units of `scale`
    pub fn encrypt_quantized(
        &self,
        values: &[i64],
        scale: Scale,
    ) -> Result<EncryptedVector<B::Ciphertext>> {
        if values.is_empty() || values.len() > self.tau {
            return Err(ControlError::DimensionViolation(format!(
                "vector of length {} does not fit packing width {}",
                values.len(),
                self.tau
            )));
        }
        let d = self.backend.ring_dim();
        let q = self.backend.modulus();
        check_headroom(values, q)?;

        let components = values
            .iter()
            .map(|&v| self.backend.encrypt(&Poly::from_signed(&[v], d, q)))
            .collect();
        Ok(EncryptedVector::new(components, scale, self.tau))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::PlainBackend;
    use crate::math::DEFAULT_Q;
    use crate::params::ScalingParameters;

    fn context(tau: usize) -> PackingContext<PlainBackend> {
        let backend = PlainBackend::new(32, DEFAULT_Q).unwrap();
        PackingContext::setup(backend, tau, ScalingParameters::reference()).unwrap()
    }

    #[test]
    fn test_column_layout() {
        let ctx = context(4);
        let matrix = vec![vec![1, 5], vec![2, 6], vec![3, 7]];
        let packed = ctx.pack_quantized(&matrix, Scale::UNIT).unwrap();
        assert_eq!((packed.rows(), packed.cols()), (3, 2));

        // stride 8, perm = [0, 2, 1, 3]
        let col = &packed.columns()[1];
        let tau_times =
            |k: usize| ModQ::to_signed(ModQ::mul(col.coeff(k), 4, DEFAULT_Q), DEFAULT_Q);
        assert_eq!(tau_times(0), 5);
        assert_eq!(tau_times(16), 6);
        assert_eq!(tau_times(8), 7);
        assert_eq!(col.coeff(24), 0);
        assert_eq!(col.coeff(1), 0);
    }

    #[test]
    fn test_pack_rejects_oversized() {
        let ctx = context(2);
        let too_tall = vec![vec![1.0], vec![1.0], vec![1.0]];
        let too_wide = vec![vec![1.0, 1.0, 1.0]];
        assert!(matches!(
            ctx.pack_and_encrypt(&too_tall, Scale::STATE),
            Err(ControlError::DimensionViolation(_))
        ));
        assert!(matches!(
            ctx.pack_and_encrypt(&too_wide, Scale::STATE),
            Err(ControlError::DimensionViolation(_))
        ));
        assert!(matches!(
            ctx.pack_and_encrypt(&[], Scale::STATE),
            Err(ControlError::DimensionViolation(_))
        ));
    }

    #[test]
    fn test_integer_matrix() {
        let ctx = context(2);
        assert!(ctx
            .pack_and_encrypt_integer(&[vec![-1.0, 0.0], vec![2.0, 1.0]], Scale::UNIT)
            .is_ok());
        assert_eq!(
            ctx.pack_and_encrypt_integer(&[vec![1.0, 0.5]], Scale::UNIT)
                .unwrap_err(),
            ControlError::NonIntegerMatrix {
                row: 0,
                col: 1,
                value: 0.5
            }
        );
    }

    #[test]
    fn test_encrypt_vector_scale_and_lift() {
        let ctx = context(4);
        let ct = ctx.encrypt_vector(&[0.25, -1.0], Scale::SIGNAL).unwrap();
        assert_eq!(ct.scale(), Scale::new(0, 1, 1));
        assert_eq!(ct.tau(), 4);
        assert_eq!(ct.components()[0].coeff_signed(0), 250_000);
        assert_eq!(ct.components()[1].coeff_signed(0), -1_000_000);
    }

    #[test]
    fn test_encrypt_at_scale_keeps_encoding_digits() {
        let ctx = context(4);
        let signal = Scale::SIGNAL * Scale::ENCODING;

        let coarse = ctx.encrypt_vector(&[0.123_456_7], Scale::SIGNAL).unwrap();
        let fine = ctx.encrypt_at_scale(&[0.123_456_7], signal).unwrap();

        assert_eq!(coarse.scale(), fine.scale());
        assert_eq!(coarse.components()[0].coeff_signed(0), 123_000);
        assert_eq!(fine.components()[0].coeff_signed(0), 123_457);
    }

    #[test]
    fn test_encrypt_vector_rejects_bad_length() {
        let ctx = context(2);
        assert!(ctx.encrypt_vector(&[], Scale::SIGNAL).is_err());
        assert!(ctx.encrypt_vector(&[1.0, 2.0, 3.0], Scale::SIGNAL).is_err());
    }

    #[test]
    fn test_encrypt_quantized_checks_headroom() {
        let ctx = context(2);
        assert!(matches!(
            ctx.encrypt_quantized(&[i64::MAX], Scale::UNIT),
            Err(ControlError::ModulusOverflow { .. })
        ));
    }
}
