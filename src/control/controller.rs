use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backend::HomomorphicBackend;
use crate::error::{ControlError, Result};
use crate::packing::quantize::matrix_shape;
use crate::packing::{EncryptedVector, PackedMatrix, PackedTerm, PackingContext};
use crate::params::{Scale, ScalingParameters};

/// Quantization scale of the initial state: s·r
pub const STATE_QUANT: Scale = Scale::new(1, 1, 0);
/// Scale of the encrypted controller state: s·r·L
pub const STATE_SCALE: Scale = Scale::new(1, 1, 1);
/// Scale of encrypted sensor and re-encrypted actuator signals: r·L
pub const SIGNAL_SCALE: Scale = Scale::new(0, 1, 1);
/// Scale of the decrypted actuator output H·x: s²·r·L
pub const ACTUATOR_SCALE: Scale = Scale::new(2, 1, 1);

/// Controller `x⁺ = F x + G y + R u`, `u = H x`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerMatrices {
    pub f: Vec<Vec<f64>>,
    pub g: Vec<Vec<f64>>,
    pub r: Vec<Vec<f64>>,
    pub h: Vec<Vec<f64>>,
}

/// (state, output, input) dimensions, checked for consistency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerDims {
    pub state: usize,
    pub output: usize,
    pub input: usize,
}

/// Largest magnitudes the loop is designed for. [`EncryptedController::new`]
/// checks that no intermediate can wrap modulo q within them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DesignBounds {
    /// max |x_i| of the controller state
    pub state: f64,
    /// max |y_i| of a sensor reading
    pub sensor: f64,
}

impl Default for DesignBounds {
    fn default() -> Self {
        Self {
            state: 1e3,
            sensor: 1e3,
        }
    }
}

/// Worst-case integer magnitudes of one step's homomorphic results
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorstCase {
    /// H·x at s²·r·L
    pub actuator: f64,
    /// F·x + G·y + R·u at s·r·L
    pub state_update: f64,
}

/// max_i Σ_j |round(M[i][j] / step)|
fn quantized_row_norm(matrix: &[Vec<f64>], step: f64) -> f64 {
    matrix
        .iter()
        .map(|row| row.iter().map(|v| (v.abs() / step).round()).sum::<f64>())
        .fold(0.0, f64::max)
}

fn row_norm(matrix: &[Vec<f64>]) -> f64 {
    matrix
        .iter()
        .map(|row| row.iter().map(|v| v.abs()).sum::<f64>())
        .fold(0.0, f64::max)
}

impl ControllerMatrices {
    /// Bound the integers a step produces when |x| ≤ `bounds.state` and
    /// |y| ≤ `bounds.sensor`.
    pub fn worst_case(&self, bounds: &DesignBounds, scaling: &ScalingParameters) -> WorstCase {
        let s = scaling.state_step;
        let x = (bounds.state / STATE_SCALE.value(scaling)).ceil();
        let y = (bounds.sensor / SIGNAL_SCALE.value(scaling)).ceil();
        let u = (row_norm(&self.h) * bounds.state / SIGNAL_SCALE.value(scaling)).ceil();

        let actuator = quantized_row_norm(&self.h, s) * x;
        let state_update = quantized_row_norm(&self.f, 1.0) * x
            + quantized_row_norm(&self.g, s) * y
            + quantized_row_norm(&self.r, s) * u;
        WorstCase {
            actuator,
            state_update,
        }
    }

    /// Fail with `ModulusOverflow` if a worst-case step could wrap mod q
    pub fn check_design_bounds(
        &self,
        bounds: &DesignBounds,
        scaling: &ScalingParameters,
        q: u64,
    ) -> Result<()> {
        let bound = q / 2;
        let worst = self.worst_case(bounds, scaling);
        for value in [worst.actuator, worst.state_update] {
            if !value.is_finite() || value > bound as f64 {
                return Err(ControlError::ModulusOverflow {
                    value: value as i64,
                    bound,
                });
            }
        }
        Ok(())
    }

    pub fn dims(&self) -> Result<ControllerDims> {
        let (n, n2) = matrix_shape(&self.f)?;
        let (g_rows, p) = matrix_shape(&self.g)?;
        let (r_rows, m) = matrix_shape(&self.r)?;
        let (h_rows, h_cols) = matrix_shape(&self.h)?;

        let check_shape = |name: &str, actual: (usize, usize), expected: (usize, usize)| {
            if actual == expected {
                Ok(())
            } else {
                Err(ControlError::DimensionViolation(format!(
                    "{} is {}x{}, expected {}x{}",
                    name, actual.0, actual.1, expected.0, expected.1
                )))
            }
        };
        check_shape("F", (n, n2), (n, n))?;
        check_shape("G", (g_rows, p), (n, p))?;
        check_shape("R", (r_rows, m), (n, m))?;
        check_shape("H", (h_rows, h_cols), (m, n))?;

        Ok(ControllerDims {
            state: n,
            output: p,
            input: m,
        })
    }
}

/// Controller whose state never leaves encryption.
///
/// Each step takes a plaintext sensor reading and returns the plaintext
/// actuator signal; the state ciphertext is replaced, never decrypted.
pub struct EncryptedController<B: HomomorphicBackend> {
    ctx: PackingContext<B>,
    f: PackedMatrix<B::PackedCiphertext>,
    g: PackedMatrix<B::PackedCiphertext>,
    r: PackedMatrix<B::PackedCiphertext>,
    h: PackedMatrix<B::PackedCiphertext>,
    state: EncryptedVector<B::Ciphertext>,
    dims: ControllerDims,
}

impl<B: HomomorphicBackend> EncryptedController<B> {
    /// Pack the controller matrices and encrypt the initial state, checked
    /// against the default [`DesignBounds`].
    ///
    /// `F` must be an integer matrix; `G`, `R`, `H` are quantized at s.
    pub fn new(ctx: PackingContext<B>, matrices: &ControllerMatrices, x0: &[f64]) -> Result<Self> {
        Self::with_bounds(ctx, matrices, x0, DesignBounds::default())
    }

    /// Like [`EncryptedController::new`] with explicit design bounds
    pub fn with_bounds(
        ctx: PackingContext<B>,
        matrices: &ControllerMatrices,
        x0: &[f64],
        bounds: DesignBounds,
    ) -> Result<Self> {
        let dims = matrices.dims()?;
        if x0.len() != dims.state {
            return Err(ControlError::DimensionViolation(format!(
                "initial state has length {}, controller has {} states",
                x0.len(),
                dims.state
            )));
        }
        if let Some(v) = x0.iter().find(|v| v.abs() > bounds.state) {
            return Err(ControlError::InvalidParams(format!(
                "initial state component {} exceeds design bound {}",
                v, bounds.state
            )));
        }
        matrices.check_design_bounds(&bounds, ctx.scaling(), ctx.backend().modulus())?;

        let f = ctx.pack_and_encrypt_integer(&matrices.f, Scale::UNIT)?;
        let g = ctx.pack_and_encrypt(&matrices.g, Scale::STATE)?;
        let r = ctx.pack_and_encrypt(&matrices.r, Scale::STATE)?;
        let h = ctx.pack_and_encrypt(&matrices.h, Scale::STATE)?;
        let state = ctx.encrypt_vector(x0, STATE_QUANT)?;

        debug!(
            states = dims.state,
            outputs = dims.output,
            inputs = dims.input,
            tau = ctx.tau(),
            "encrypted controller initialized"
        );

        Ok(Self {
            ctx,
            f,
            g,
            r,
            h,
            state,
            dims,
        })
    }

    /// One control period: returns `u = H x` and advances the state.
    pub fn step(&mut self, y: &[f64]) -> Result<Vec<f64>> {
        if y.len() != self.dims.output {
            return Err(ControlError::DimensionViolation(format!(
                "sensor reading has length {}, expected {}",
                y.len(),
                self.dims.output
            )));
        }
        let ctx = &self.ctx;

        let y_ct = ctx.encrypt_vector(y, Scale::SIGNAL)?;

        let u_ct = ctx.unpack(&ctx.mult_pack(&self.state, &self.h)?, self.dims.input)?;
        let u = ctx.decrypt_and_rescale(&u_ct, ACTUATOR_SCALE)?;
        let u_re = ctx.encrypt_at_scale(&u, SIGNAL_SCALE)?;

        let next = ctx.multiply_and_accumulate(&[
            PackedTerm::new(&self.state, &self.f),
            PackedTerm::new(&y_ct, &self.g),
            PackedTerm::new(&u_re, &self.r),
        ])?;
        self.state = ctx.unpack(&next, self.dims.state)?;

        Ok(u)
    }

    pub fn state(&self) -> &EncryptedVector<B::Ciphertext> {
        &self.state
    }

    /// Decrypt the current state. Diagnostics only; `step` never does this.
    pub fn decrypt_state(&self) -> Result<Vec<f64>> {
        self.ctx.decrypt_and_rescale(&self.state, STATE_SCALE)
    }

    pub fn dims(&self) -> ControllerDims {
        self.dims
    }

    pub fn context(&self) -> &PackingContext<B> {
        &self.ctx
    }
}
