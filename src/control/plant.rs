use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::backend::HomomorphicBackend;
use crate::error::{ControlError, Result};
use crate::packing::quantize::matrix_shape;
use crate::packing::PackingContext;
use crate::params::ScalingParameters;

use super::controller::{ControllerMatrices, EncryptedController};

fn mat_vec(m: &[Vec<f64>], v: &[f64]) -> Vec<f64> {
    m.iter()
        .map(|row| row.iter().zip(v).map(|(a, b)| a * b).sum())
        .collect()
}

fn add_into(acc: &mut [f64], v: &[f64]) {
    for (a, b) in acc.iter_mut().zip(v) {
        *a += b;
    }
}

fn expect_len(name: &str, actual: usize, expected: usize) -> Result<()> {
    if actual != expected {
        return Err(ControlError::DimensionViolation(format!(
            "{} has length {}, expected {}",
            name, actual, expected
        )));
    }
    Ok(())
}

/// Discrete-time plant `x⁺ = A x + B u`, `y = C x`
#[derive(Debug, Clone)]
pub struct Plant {
    a: Vec<Vec<f64>>,
    b: Vec<Vec<f64>>,
    c: Vec<Vec<f64>>,
    state: Vec<f64>,
}

impl Plant {
    pub fn new(a: Vec<Vec<f64>>, b: Vec<Vec<f64>>, c: Vec<Vec<f64>>, x0: Vec<f64>) -> Result<Self> {
        let (n, n2) = matrix_shape(&a)?;
        let (b_rows, _) = matrix_shape(&b)?;
        let (_, c_cols) = matrix_shape(&c)?;
        if n != n2 || b_rows != n || c_cols != n {
            return Err(ControlError::DimensionViolation(format!(
                "plant matrices do not share state dimension {}",
                n
            )));
        }
        expect_len("plant initial state", x0.len(), n)?;
        Ok(Self { a, b, c, state: x0 })
    }

    pub fn output(&self) -> Vec<f64> {
        mat_vec(&self.c, &self.state)
    }

    pub fn apply(&mut self, u: &[f64]) -> Result<()> {
        expect_len("plant input", u.len(), self.b[0].len())?;
        let mut next = mat_vec(&self.a, &self.state);
        add_into(&mut next, &mat_vec(&self.b, u));
        self.state = next;
        Ok(())
    }

    pub fn state(&self) -> &[f64] {
        &self.state
    }
}

/// Unencrypted controller with the same recurrence as [`EncryptedController`]
#[derive(Debug, Clone)]
pub struct LinearController {
    matrices: ControllerMatrices,
    state: Vec<f64>,
}

impl LinearController {
    pub fn new(matrices: ControllerMatrices, x0: Vec<f64>) -> Result<Self> {
        let dims = matrices.dims()?;
        expect_len("controller initial state", x0.len(), dims.state)?;
        Ok(Self {
            matrices,
            state: x0,
        })
    }

    pub fn step(&mut self, y: &[f64]) -> Result<Vec<f64>> {
        expect_len("sensor reading", y.len(), self.matrices.g[0].len())?;
        let u = mat_vec(&self.matrices.h, &self.state);
        let mut next = mat_vec(&self.matrices.f, &self.state);
        add_into(&mut next, &mat_vec(&self.matrices.g, y));
        add_into(&mut next, &mat_vec(&self.matrices.r, &u));
        self.state = next;
        Ok(u)
    }

    pub fn state(&self) -> &[f64] {
        &self.state
    }
}

/// Plant and controller of one closed loop, with initial states
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedLoopSystem {
    pub plant_a: Vec<Vec<f64>>,
    pub plant_b: Vec<Vec<f64>>,
    pub plant_c: Vec<Vec<f64>>,
    pub plant_x0: Vec<f64>,
    pub controller: ControllerMatrices,
    pub controller_x0: Vec<f64>,
}

impl ClosedLoopSystem {
    /// Four-state, two-input, two-output reference loop.
    ///
    /// The controller's F is integral, so the state scale survives every
    /// step without rescaling.
    pub fn reference() -> Self {
        Self {
            plant_a: vec![
                vec![0.9984, 0.0, 0.0042, 0.0],
                vec![0.0, 0.9989, 0.0, -0.0033],
                vec![0.0, 0.0, 0.9958, 0.0],
                vec![0.0, 0.0, 0.0, 0.9967],
            ],
            plant_b: vec![
                vec![0.0083, 0.0],
                vec![0.0, 0.0063],
                vec![0.0, 0.0048],
                vec![0.0031, 0.0],
            ],
            plant_c: vec![vec![0.5, 0.0, 0.0, 0.0], vec![0.0, 0.5, 0.0, 0.0]],
            plant_x0: vec![1.0, 1.0, 1.0, 1.0],
            controller: ControllerMatrices {
                f: vec![
                    vec![-1.0, 0.0, 0.0, 0.0],
                    vec![0.0, 0.0, 0.0, 0.0],
                    vec![0.0, 0.0, 2.0, 0.0],
                    vec![0.0, 0.0, 0.0, 1.0],
                ],
                g: vec![
                    vec![0.7160, -0.3828],
                    vec![-0.8131, -1.4790],
                    vec![0.6646, 1.1860],
                    vec![0.0181, -0.0060],
                ],
                r: vec![
                    vec![-1.7396, 0.3476],
                    vec![0.2588, 1.3226],
                    vec![0.5115, 2.4668],
                    vec![0.0122, 0.0030],
                ],
                h: vec![
                    vec![-0.8829, 0.0445, -0.0533, -0.0855],
                    vec![0.1791, 0.2180, -0.2738, 0.0180],
                ],
            },
            controller_x0: vec![0.5, 0.02, -1.0, 0.9],
        }
    }

    pub fn plant(&self) -> Result<Plant> {
        Plant::new(
            self.plant_a.clone(),
            self.plant_b.clone(),
            self.plant_c.clone(),
            self.plant_x0.clone(),
        )
    }

    /// Run `steps` periods with the unencrypted controller
    pub fn run_plaintext(&self, steps: usize) -> Result<Trajectory> {
        let mut controller =
            LinearController::new(self.controller.clone(), self.controller_x0.clone())?;
        self.run(steps, |y| controller.step(y))
    }

    /// Run `steps` periods with the controller evaluated on `backend`
    pub fn run_encrypted<B: HomomorphicBackend>(
        &self,
        backend: B,
        scaling: ScalingParameters,
        steps: usize,
    ) -> Result<Trajectory> {
        let dims = self.controller.dims()?;
        let ctx =
            PackingContext::for_dimensions(backend, dims.state, dims.output, dims.input, scaling)?;
        let mut controller = EncryptedController::new(ctx, &self.controller, &self.controller_x0)?;
        self.run(steps, |y| controller.step(y))
    }

    fn run<F>(&self, steps: usize, mut control: F) -> Result<Trajectory>
    where
        F: FnMut(&[f64]) -> Result<Vec<f64>>,
    {
        let mut plant = self.plant()?;
        let mut trajectory = Trajectory::default();
        trajectory.states.push(plant.state().to_vec());

        for k in 0..steps {
            let y = plant.output();
            let started = Instant::now();
            let u = control(&y)?;
            let elapsed_ms = started.elapsed().as_secs_f64() * 1e3;
            plant.apply(&u)?;

            debug!(step = k, ?u, elapsed_ms, "control period");
            trajectory.states.push(plant.state().to_vec());
            trajectory.outputs.push(y);
            trajectory.inputs.push(u);
            trajectory.latency_ms.push(elapsed_ms);
        }

        info!(
            steps,
            avg_period_ms = trajectory.average_latency_ms(),
            "closed loop finished"
        );
        Ok(trajectory)
    }
}

/// Per-step plant states, sensor readings, actuator signals, and controller
/// latency
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    /// Plant state before each period and after the last: `steps + 1` entries
    pub states: Vec<Vec<f64>>,
    pub outputs: Vec<Vec<f64>>,
    pub inputs: Vec<Vec<f64>>,
    pub latency_ms: Vec<f64>,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn average_latency_ms(&self) -> f64 {
        if self.latency_ms.is_empty() {
            return 0.0;
        }
        self.latency_ms.iter().sum::<f64>() / self.latency_ms.len() as f64
    }

    /// ‖u_k − u'_k‖₂ for every step both trajectories cover
    pub fn actuator_deviation(&self, other: &Trajectory) -> Vec<f64> {
        self.inputs
            .iter()
            .zip(&other.inputs)
            .map(|(u, v)| {
                u.iter()
                    .zip(v)
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum::<f64>()
                    .sqrt()
            })
            .collect()
    }

    pub fn max_actuator_deviation(&self, other: &Trajectory) -> f64 {
        self.actuator_deviation(other)
            .into_iter()
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::PlainBackend;
    use crate::math::DEFAULT_Q;

    #[test]
    fn test_reference_dimensions() {
        let system = ClosedLoopSystem::reference();
        let dims = system.controller.dims().unwrap();
        assert_eq!((dims.state, dims.output, dims.input), (4, 2, 2));
        assert!(system.plant().is_ok());
    }

    #[test]
    fn test_plaintext_first_input() {
        let system = ClosedLoopSystem::reference();
        let trajectory = system.run_plaintext(3).unwrap();
        assert_eq!(trajectory.len(), 3);

        // u_0 = H·xc0
        let h = &system.controller.h;
        let x0 = &system.controller_x0;
        let expected = mat_vec(h, x0);
        assert_eq!(trajectory.inputs[0], expected);
        assert_eq!(trajectory.outputs[0], vec![0.5, 0.5]);
    }

    #[test]
    fn test_trajectory_records_plant_states() {
        let system = ClosedLoopSystem::reference();
        let trajectory = system.run_plaintext(3).unwrap();
        assert_eq!(trajectory.states.len(), 4);
        assert_eq!(trajectory.states[0], system.plant_x0);

        let mut x1 = mat_vec(&system.plant_a, &system.plant_x0);
        add_into(&mut x1, &mat_vec(&system.plant_b, &trajectory.inputs[0]));
        assert_eq!(trajectory.states[1], x1);

        for (x, y) in trajectory.states.iter().zip(&trajectory.outputs) {
            assert_eq!(&mat_vec(&system.plant_c, x), y);
        }
    }

    #[test]
    fn test_plain_backend_tracks_plaintext() {
        let system = ClosedLoopSystem::reference();
        let reference = system.run_plaintext(200).unwrap();
        let backend = PlainBackend::new(64, DEFAULT_Q).unwrap();
        let encrypted = system
            .run_encrypted(backend, ScalingParameters::reference(), 200)
            .unwrap();
        assert!(reference.max_actuator_deviation(&encrypted) < 2e-3);
        assert_eq!(encrypted.states.len(), 201);
    }

    #[test]
    fn test_actuator_deviation() {
        let a = Trajectory {
            inputs: vec![vec![0.0, 0.0], vec![1.0, 1.0]],
            ..Default::default()
        };
        let b = Trajectory {
            inputs: vec![vec![3.0, 4.0], vec![1.0, 1.0]],
            ..Default::default()
        };
        assert_eq!(a.actuator_deviation(&b), vec![5.0, 0.0]);
        assert_eq!(a.max_actuator_deviation(&b), 5.0);
    }

    #[test]
    fn test_plant_rejects_mismatched_input() {
        let mut plant = ClosedLoopSystem::reference().plant().unwrap();
        assert!(plant.apply(&[1.0]).is_err());
    }
}
