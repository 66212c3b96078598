//! Weight loading
//!
//! The stationary weights go to the weight window one element per word,
//! in the order of the geometry's traversal table. Each element is
//! zero-extended; the accelerator only reads the low byte.

use crate::bus::RegisterBus;
use crate::error::{EtpuError, Result};
use crate::geometry::{ArrayGeometry, Coord};
use crate::matrix::Matrix;
use crate::registers::Registers;
use etpu_chip::windows::Window;
use etpu_chip::word::weight_word;
use tracing::{debug, warn};

/// Writes a weight matrix into the weight window
#[derive(Debug, Clone)]
pub struct WeightLoader {
    dim: usize,
    traversal: Vec<Coord>,
}

impl WeightLoader {
    /// Loader for `geometry`'s traversal table
    pub fn new(geometry: &ArrayGeometry) -> Self {
        Self {
            dim: geometry.dim(),
            traversal: geometry.traversal().to_vec(),
        }
    }

    /// Words written per load
    pub fn word_count(&self) -> usize {
        self.traversal.len()
    }

    /// `(slot, word)` pairs for `weights`, in write order
    ///
    /// # Errors
    ///
    /// Returns error if `weights` does not match the array dimension.
    pub fn plan(&self, weights: &Matrix) -> Result<Vec<(usize, u32)>> {
        self.check(weights)?;
        Ok(self
            .traversal
            .iter()
            .enumerate()
            .map(|(slot, &(r, c))| (slot, weight_word(weights.get(r, c))))
            .collect())
    }

    /// Write every weight, slot 0 upwards
    ///
    /// Returns the number of words written.
    ///
    /// # Errors
    ///
    /// Returns error if `weights` does not match the array dimension; nothing
    /// is written in that case.
    pub fn load<B: RegisterBus>(&self, regs: &mut Registers<B>, weights: &Matrix) -> Result<usize> {
        let plan = self.plan(weights)?;
        for &(slot, word) in &plan {
            regs.write(Window::Weight, slot, word);
        }
        debug!("Loaded {} weight words", plan.len());
        Ok(plan.len())
    }

    /// Read the weight window back and compare low bytes
    ///
    /// # Errors
    ///
    /// Returns error on the first slot whose low byte differs from `weights`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn readback<B: RegisterBus>(&self, regs: &mut Registers<B>, weights: &Matrix) -> Result<()> {
        for (slot, word) in self.plan(weights)? {
            let expected = word as u8;
            let found = regs.read(Window::Weight, slot) as u8;
            if found != expected {
                warn!("Weight slot {slot} mismatch: wrote {expected:#04x}, read {found:#04x}");
                return Err(EtpuError::WeightReadback {
                    slot,
                    expected,
                    found,
                });
            }
        }
        debug!("Weight readback verified ({} slots)", self.word_count());
        Ok(())
    }

    fn check(&self, weights: &Matrix) -> Result<()> {
        if weights.dim() == self.dim {
            Ok(())
        } else {
            Err(EtpuError::DimensionMismatch {
                expected: self.dim,
                found: weights.dim(),
            })
        }
    }
}
