//! Fixed-point quantization.
//!
//! Rounding is `f64::round`: to nearest, ties away from zero.

use crate::error::{ControlError, Result};

/// Quantize one value: `round(x / step)`
pub fn quantize(x: f64, step: f64) -> Result<i64> {
    if !x.is_finite() || !(step.is_finite() && step > 0.0) {
        return Err(ControlError::Quantization { value: x, step });
    }
    let scaled = (x / step).round();
    // i64::MAX is not representable; 2^63 is the first value that does not fit
    if !scaled.is_finite() || scaled.abs() >= 9.223_372_036_854_775_808e18 {
        return Err(ControlError::Quantization { value: x, step });
    }
    Ok(scaled as i64)
}

pub fn quantize_vector(values: &[f64], step: f64) -> Result<Vec<i64>> {
    values.iter().map(|&x| quantize(x, step)).collect()
}

pub fn quantize_matrix(matrix: &[Vec<f64>], step: f64) -> Result<Vec<Vec<i64>>> {
    matrix_shape(matrix)?;
    matrix
        .iter()
        .map(|row| quantize_vector(row, step))
        .collect()
}

pub fn dequantize(x: i64, step: f64) -> f64 {
    x as f64 * step
}

pub fn dequantize_vector(values: &[i64], step: f64) -> Vec<f64> {
    values.iter().map(|&x| dequantize(x, step)).collect()
}

/// Reject integers that would wrap modulo q: centered representatives
/// must satisfy |v| ≤ ⌊q/2⌋.
pub fn check_headroom(values: &[i64], q: u64) -> Result<()> {
    let bound = q / 2;
    match values.iter().find(|v| v.unsigned_abs() > bound) {
        Some(&value) => Err(ControlError::ModulusOverflow { value, bound }),
        None => Ok(()),
    }
}

/// (rows, cols) of a non-empty rectangular matrix
pub fn matrix_shape<T>(matrix: &[Vec<T>]) -> Result<(usize, usize)> {
    let rows = matrix.len();
    let cols = matrix.first().map_or(0, Vec::len);
    if rows == 0 || cols == 0 {
        return Err(ControlError::DimensionViolation(
            "matrix must have at least one row and one column".into(),
        ));
    }
    if let Some(i) = matrix.iter().position(|row| row.len() != cols) {
        return Err(ControlError::DimensionViolation(format!(
            "row {} has {} entries, expected {}",
            i,
            matrix[i].len(),
            cols
        )));
    }
    Ok((rows, cols))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::DEFAULT_Q;

    #[test]
    fn test_quantize_rounds_to_nearest() {
        assert_eq!(quantize(0.4, 1.0).unwrap(), 0);
        assert_eq!(quantize(0.6, 1.0).unwrap(), 1);
        assert_eq!(quantize(-1.7, 1.0).unwrap(), -2);
        assert_eq!(quantize(3.0, 1e-3).unwrap(), 3000);
    }

    #[test]
    fn test_quantize_ties_away_from_zero() {
        assert_eq!(quantize(0.5, 1.0).unwrap(), 1);
        assert_eq!(quantize(-0.5, 1.0).unwrap(), -1);
        assert_eq!(quantize(2.5, 1.0).unwrap(), 3);
        assert_eq!(quantize(-2.5, 1.0).unwrap(), -3);
        assert_eq!(quantize(0.75, 0.5).unwrap(), 2);
    }

    #[test]
    fn test_quantize_rejects_bad_input() {
        assert!(quantize(f64::NAN, 1.0).is_err());
        assert!(quantize(f64::INFINITY, 1.0).is_err());
        assert!(quantize(1.0, 0.0).is_err());
        assert!(quantize(1.0, -1e-3).is_err());
        assert!(quantize(1e300, 1e-10).is_err());
    }

    #[test]
    fn test_dequantize_within_one_step() {
        let step = 1e-3;
        let values = [0.123_456, -7.654_321, 0.0, 1e-4];
        let back = dequantize_vector(&quantize_vector(&values, step).unwrap(), step);
        for (v, b) in values.iter().zip(&back) {
            assert!((v - b).abs() <= step / 2.0 + 1e-12);
        }
    }

    #[test]
    fn test_headroom() {
        let half = (DEFAULT_Q / 2) as i64;
        assert!(check_headroom(&[half, -half, 0], DEFAULT_Q).is_ok());
        assert_eq!(
            check_headroom(&[1, half + 1], DEFAULT_Q),
            Err(ControlError::ModulusOverflow {
                value: half + 1,
                bound: DEFAULT_Q / 2
            })
        );
    }

    #[test]
    fn test_matrix_shape() {
        assert_eq!(matrix_shape(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap(), (2, 2));
        assert!(matrix_shape::<f64>(&[]).is_err());
        assert!(matrix_shape(&[Vec::<f64>::new()]).is_err());
        assert!(matrix_shape(&[vec![1.0, 2.0], vec![3.0]]).is_err());
        assert!(quantize_matrix(&[vec![1.0], vec![2.0, 3.0]], 1.0).is_err());
    }
}
