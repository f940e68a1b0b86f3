//! Control-step sequencing.
//!
//! [`EncryptedController`] runs one period as
//!
//! 1. encrypt the sensor reading y at r·L
//! 2. `u = H x`, unpacked and decrypted at s²·r·L
//! 3. re-encrypt u, rounded at r·L
//! 4. `x ← unpack(F x + G y + R u)`
//!
//! [`ClosedLoopSystem`] couples it (or the plaintext [`LinearController`])
//! with a [`Plant`] and records a [`Trajectory`].

mod controller;
mod plant;

pub use controller::{
    ControllerDims, ControllerMatrices, DesignBounds, EncryptedController, WorstCase,
    ACTUATOR_SCALE, SIGNAL_SCALE, STATE_QUANT, STATE_SCALE,
};
pub use plant::{ClosedLoopSystem, LinearController, Plant, Trajectory};
