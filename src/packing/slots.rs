//! Slot permutation shared by the packer and the unpacker.

use serde::{Deserialize, Serialize};

use crate::error::{ControlError, Result};

/// Bijection of `{0, .., tau-1}`: logical index `i` lives in packed slot
/// `slots[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotPermutation {
    slots: Vec<usize>,
}

impl SlotPermutation {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Packed slot of logical index `i`
    pub fn slot(&self, i: usize) -> usize {
        self.slots[i]
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.slots
    }

    /// Logical index stored in each packed slot
    pub fn inverse(&self) -> Vec<usize> {
        let mut inv = vec![0; self.slots.len()];
        for (i, &s) in self.slots.iter().enumerate() {
            inv[s] = i;
        }
        inv
    }
}

/// Build the permutation for packing width `tau`.
///
/// `perm(1) = [0]` and `perm(2t) = 2·perm(t) ++ 2·perm(t) + 1`, which is
/// bit reversal on `log2(tau)` bits. The unpacker's even/odd fold visits
/// slots in exactly this order, so its depth-first leaves come out in
/// logical order.
pub fn permutation(tau: usize) -> Result<SlotPermutation> {
    if !tau.is_power_of_two() {
        return Err(ControlError::DimensionViolation(format!(
            "packing width {} is not a power of two",
            tau
        )));
    }
    Ok(SlotPermutation {
        slots: interleave(tau),
    })
}

fn interleave(tau: usize) -> Vec<usize> {
    if tau == 1 {
        return vec![0];
    }
    let half = interleave(tau / 2);
    half.iter()
        .map(|&s| 2 * s)
        .chain(half.iter().map(|&s| 2 * s + 1))
        .collect()
}
