//! Array geometry: weight traversal and stream wavefront schedule
//!
//! A systolic array needs its input skewed: the elements that reach the
//! array boundary in the same cycle lie on one anti-diagonal `r + c = d`.
//! The stream window therefore receives one word per anti-diagonal,
//! `2n - 1` words for an `n`×`n` array, each written to stream slot `d`.
//!
//! ```text
//!            d=0   d=1       d=2             d=3        d=4       terminal
//! slot        0     1         2               3          4          4
//! tag         -     -         1               2          3          4
//! lane 2      -     -       I[2][0]         I[2][1]    I[2][2]      -
//! lane 1      -   I[0][1]   I[1][1]         I[1][2]      -          -
//! lane 0   I[0][0] I[1][0]  I[0][2]           -          -          -
//! ```
//!
//! Leading diagonals (`d < n-1`) place `(r, c)` in lane `c` and carry no
//! tag. From the main anti-diagonal on, `(r, c)` goes to lane `r` and the
//! word is tagged `d - (n-1) + 1`. The end-of-frame word reuses the last
//! slot with tag `n + 1`. Three lanes per word cap the array at 3×3.

use crate::error::{EtpuError, Result};
use etpu_chip::frame::DIMENSION;
use etpu_chip::windows::WINDOW_SLOTS;
use etpu_chip::word::MAX_LANES;

/// Matrix coordinate `(row, col)`
pub type Coord = (usize, usize);

/// One stream word of the wavefront schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavefrontStep {
    /// Stream window slot
    pub slot: usize,
    /// Tag byte, zero for untagged words
    pub tag: u8,
    /// Matrix element carried by each lane, low byte first
    pub lanes: [Option<Coord>; MAX_LANES],
}

impl WavefrontStep {
    /// Number of populated lanes
    pub fn density(&self) -> usize {
        self.lanes.iter().flatten().count()
    }
}

/// Validated plan for an `n`×`n` array
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayGeometry {
    dim: usize,
    traversal: Vec<Coord>,
    schedule: Vec<WavefrontStep>,
}

impl ArrayGeometry {
    /// Generate the plan for an `dim`×`dim` array
    ///
    /// # Errors
    ///
    /// Returns error if `dim` is zero, exceeds the three data lanes of a
    /// stream word, or does not fit the register windows.
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(EtpuError::invalid_geometry("array dimension must be at least 1"));
        }
        if dim > MAX_LANES {
            return Err(EtpuError::invalid_geometry(format!(
                "{dim}x{dim} array needs {dim} lanes per stream word, have {MAX_LANES}"
            )));
        }
        if dim * dim > WINDOW_SLOTS || 2 * dim - 1 > WINDOW_SLOTS {
            return Err(EtpuError::invalid_geometry(format!(
                "{dim}x{dim} array does not fit {WINDOW_SLOTS}-slot windows"
            )));
        }
        Ok(Self::generate(dim))
    }

    /// Plan for the reference 3×3 accelerator
    pub fn reference() -> Self {
        Self::generate(DIMENSION)
    }

    fn generate(dim: usize) -> Self {
        let geometry = Self {
            dim,
            traversal: row_major(dim),
            schedule: wavefront(dim),
        };
        tracing::debug!(
            "Array geometry {dim}x{dim}: {} weight slots, {} stream words, terminal tag {}",
            geometry.traversal.len(),
            geometry.schedule.len(),
            geometry.terminal_tag()
        );
        geometry
    }

    /// Replace the weight traversal table
    ///
    /// Entry `i` names the matrix element written to weight slot `i`.
    ///
    /// # Errors
    ///
    /// Returns error unless `table` visits every element exactly once.
    pub fn with_traversal(mut self, table: Vec<Coord>) -> Result<Self> {
        let n = self.dim;
        if table.len() != n * n {
            return Err(EtpuError::invalid_traversal(format!(
                "{} entries for {} weights",
                table.len(),
                n * n
            )));
        }
        let mut seen = vec![false; n * n];
        for (slot, &(r, c)) in table.iter().enumerate() {
            if r >= n || c >= n {
                return Err(EtpuError::invalid_traversal(format!(
                    "slot {slot} names ({r}, {c}) outside {n}x{n}"
                )));
            }
            if std::mem::replace(&mut seen[r * n + c], true) {
                return Err(EtpuError::invalid_traversal(format!(
                    "slot {slot} repeats ({r}, {c})"
                )));
            }
        }
        self.traversal = table;
        Ok(self)
    }

    /// Array side length
    pub const fn dim(&self) -> usize {
        self.dim
    }

    /// Weight slot → matrix coordinate
    pub fn traversal(&self) -> &[Coord] {
        &self.traversal
    }

    /// Stream words written before the readout drain, in slot order
    pub fn schedule(&self) -> &[WavefrontStep] {
        &self.schedule
    }

    /// Stream slot reused by the end-of-frame word
    pub fn terminal_slot(&self) -> usize {
        2 * self.dim - 2
    }

    /// Tag of the end-of-frame word
    #[allow(clippy::cast_possible_truncation)]
    pub fn terminal_tag(&self) -> u8 {
        self.dim as u8 + 1
    }
}

impl Default for ArrayGeometry {
    fn default() -> Self {
        Self::reference()
    }
}

fn row_major(dim: usize) -> Vec<Coord> {
    (0..dim).flat_map(|r| (0..dim).map(move |c| (r, c))).collect()
}

#[allow(clippy::cast_possible_truncation)]
fn wavefront(dim: usize) -> Vec<WavefrontStep> {
    let pivot = dim - 1;
    (0..2 * dim - 1)
        .map(|d| {
            let leading = d < pivot;
            let mut lanes = [None; MAX_LANES];
            for r in d.saturating_sub(pivot)..=d.min(pivot) {
                let c = d - r;
                lanes[if leading { c } else { r }] = Some((r, c));
            }
            WavefrontStep {
                slot: d,
                tag: if leading { 0 } else { (d - pivot + 1) as u8 },
                lanes,
            }
        })
        .collect()
}
