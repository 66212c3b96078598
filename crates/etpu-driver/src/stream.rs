//! Stream packing
//!
//! Serialises the input matrix into the stream window following the
//! geometry's wavefront schedule (see [`crate::geometry`]), then closes the
//! frame with the tag-only terminal word once the readout drain is done.

use crate::bus::RegisterBus;
use crate::error::{EtpuError, Result};
use crate::geometry::{ArrayGeometry, WavefrontStep};
use crate::matrix::Matrix;
use crate::registers::Registers;
use etpu_chip::windows::Window;
use etpu_chip::word::{pack_word, terminal_word, MAX_LANES};
use tracing::debug;

/// One packed stream word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamWord {
    /// Stream window slot
    pub slot: usize,
    /// Register value
    pub value: u32,
}

/// Packs input matrices into stream words
#[derive(Debug, Clone)]
pub struct StreamPacker {
    dim: usize,
    schedule: Vec<WavefrontStep>,
    terminal_slot: usize,
    terminal_tag: u8,
}

impl StreamPacker {
    /// Packer for `geometry`'s wavefront schedule
    pub fn new(geometry: &ArrayGeometry) -> Self {
        Self {
            dim: geometry.dim(),
            schedule: geometry.schedule().to_vec(),
            terminal_slot: geometry.terminal_slot(),
            terminal_tag: geometry.terminal_tag(),
        }
    }

    /// Pack `input` without touching the bus
    ///
    /// # Errors
    ///
    /// Returns error if `input` does not match the array dimension.
    pub fn pack(&self, input: &Matrix) -> Result<Vec<StreamWord>> {
        if input.dim() != self.dim {
            return Err(EtpuError::DimensionMismatch {
                expected: self.dim,
                found: input.dim(),
            });
        }
        Ok(self
            .schedule
            .iter()
            .map(|step| {
                let mut lanes = [0u8; MAX_LANES];
                for (lane, coord) in lanes.iter_mut().zip(step.lanes) {
                    if let Some((r, c)) = coord {
                        *lane = input.get(r, c);
                    }
                }
                StreamWord {
                    slot: step.slot,
                    value: pack_word(step.tag, lanes),
                }
            })
            .collect())
    }

    /// Write the data-bearing words in slot order
    ///
    /// Returns the number of words written.
    ///
    /// # Errors
    ///
    /// Returns error if `input` does not match the array dimension; nothing
    /// is written in that case.
    pub fn write_data<B: RegisterBus>(&self, regs: &mut Registers<B>, input: &Matrix) -> Result<usize> {
        let words = self.pack(input)?;
        for w in &words {
            regs.write(Window::Stream, w.slot, w.value);
        }
        debug!("Streamed {} wavefront words", words.len());
        Ok(words.len())
    }

    /// Write the end-of-frame word over the last stream slot
    pub fn write_terminal<B: RegisterBus>(&self, regs: &mut Registers<B>) {
        let word = self.terminal_word();
        regs.write(Window::Stream, word.slot, word.value);
        debug!("Frame closed with tag {}", self.terminal_tag);
    }

    /// The end-of-frame word
    pub fn terminal_word(&self) -> StreamWord {
        StreamWord {
            slot: self.terminal_slot,
            value: terminal_word(self.terminal_tag),
        }
    }

    /// Data words per frame
    pub fn word_count(&self) -> usize {
        self.schedule.len()
    }
}
