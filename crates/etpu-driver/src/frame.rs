//! Frame orchestration
//!
//! One frame drives the accelerator through its whole protocol, once:
//!
//! 1. weight loader writes the stationary matrix,
//! 2. stream packer writes the wavefront words,
//! 3. readout drain polls the readout span,
//! 4. stream packer closes the frame with the terminal tag.
//!
//! The accelerator is free-running, so step order is the only contract:
//! the terminal word must never reach the bus before the last drain read.
//! Matrices are checked before the first access; once a frame starts it
//! runs to completion.

use crate::bus::RegisterBus;
use crate::config::DriverConfig;
use crate::error::{EtpuError, Result};
use crate::geometry::ArrayGeometry;
use crate::loading::WeightLoader;
use crate::matrix::Matrix;
use crate::readout::{ReadoutDrain, ReadoutSpan};
use crate::registers::Registers;
use crate::stream::StreamPacker;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Outcome of one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameReport {
    /// Frame sequence number on this driver, from 0
    pub frame: u64,

    /// Weight words written
    pub weight_words: usize,

    /// Stream words written, terminal word included
    pub stream_words: usize,

    /// Readout words, in read order
    pub readout: Vec<u32>,

    /// Wall time for the frame
    pub elapsed: Duration,
}

/// Drives frames over an exclusively owned register bus
#[derive(Debug)]
pub struct FrameDriver<B> {
    regs: Registers<B>,
    dim: usize,
    loader: WeightLoader,
    packer: StreamPacker,
    drain: ReadoutDrain,
    verify_weights: bool,
    frames: u64,
}

impl<B: RegisterBus> FrameDriver<B> {
    /// Driver for `config`
    ///
    /// # Errors
    ///
    /// Returns error if the configured geometry is invalid.
    pub fn new(bus: B, config: &DriverConfig) -> Result<Self> {
        let geometry = config.build_geometry()?;
        Ok(Self::with_geometry(
            bus,
            &geometry,
            config.readout,
            config.verify_weights,
        ))
    }

    /// Driver for the reference 3×3 accelerator
    pub fn reference(bus: B) -> Self {
        Self::with_geometry(bus, &ArrayGeometry::reference(), ReadoutSpan::REFERENCE, false)
    }

    fn with_geometry(
        bus: B,
        geometry: &ArrayGeometry,
        span: ReadoutSpan,
        verify_weights: bool,
    ) -> Self {
        info!(
            "Frame driver on {} bus: {1}x{1} array, readout slots {2:?}",
            bus.bus_type(),
            geometry.dim(),
            span.slots()
        );
        Self {
            regs: Registers::new(bus),
            dim: geometry.dim(),
            loader: WeightLoader::new(geometry),
            packer: StreamPacker::new(geometry),
            drain: ReadoutDrain::new(span),
            verify_weights,
            frames: 0,
        }
    }

    /// Run one frame
    ///
    /// # Errors
    ///
    /// Returns error if either matrix does not match the array dimension
    /// (before any bus access), or if weight verification is enabled and
    /// the weight window reads back wrong.
    pub fn run_frame(&mut self, weights: &Matrix, input: &Matrix) -> Result<FrameReport> {
        for m in [weights, input] {
            if m.dim() != self.dim {
                return Err(EtpuError::DimensionMismatch {
                    expected: self.dim,
                    found: m.dim(),
                });
            }
        }

        let frame = self.frames;
        let span = tracing::debug_span!("frame", frame);
        let _enter = span.enter();
        let start = Instant::now();

        let weight_words = self.loader.load(&mut self.regs, weights)?;
        if self.verify_weights {
            self.loader.readback(&mut self.regs, weights)?;
        }

        let data_words = self.packer.write_data(&mut self.regs, input)?;
        let readout = self.drain.drain(&mut self.regs);
        self.packer.write_terminal(&mut self.regs);

        self.frames += 1;
        let elapsed = start.elapsed();
        info!(
            "Frame {frame}: {weight_words} weight, {} stream, {} readout words in {elapsed:?}",
            data_words + 1,
            readout.len()
        );
        debug!("Readout: {readout:08x?}");

        Ok(FrameReport {
            frame,
            weight_words,
            stream_words: data_words + 1,
            readout,
            elapsed,
        })
    }

    /// Run one frame with the reference weight and input matrices
    ///
    /// # Errors
    ///
    /// Returns error if the driver is not configured for a 3×3 array.
    pub fn run_reference_frame(&mut self) -> Result<FrameReport> {
        self.run_frame(&Matrix::reference_weights(), &Matrix::reference_input())
    }

    /// Frames completed so far
    pub const fn frames_run(&self) -> u64 {
        self.frames
    }

    /// Stream packer in use
    pub const fn packer(&self) -> &StreamPacker {
        &self.packer
    }

    /// Borrow the bus
    pub const fn bus(&self) -> &B {
        self.regs.bus()
    }

    /// Release the bus
    pub fn into_bus(self) -> B {
        self.regs.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::RecordingBus;
    use etpu_chip::windows::Window;

    #[test]
    fn reference_frame_access_counts() {
        let mut driver = FrameDriver::reference(RecordingBus::new());
        let report = driver.run_reference_frame().unwrap();
        assert_eq!(report.frame, 0);
        assert_eq!(report.weight_words, 9);
        assert_eq!(report.stream_words, 5 + 1);
        assert_eq!(report.readout.len(), 25);

        let bus = driver.into_bus();
        assert_eq!(bus.writes().count(), 9 + 5 + 1);
        assert_eq!(bus.reads().count(), 25);
    }

    #[test]
    fn mismatched_input_fails_before_bus_access() {
        let mut driver = FrameDriver::reference(RecordingBus::new());
        let err = driver
            .run_frame(&Matrix::reference_weights(), &Matrix::zeros(2))
            .unwrap_err();
        assert!(matches!(err, EtpuError::DimensionMismatch { .. }));
        assert_eq!(driver.frames_run(), 0);
        assert!(driver.bus().events().is_empty());
    }

    #[test]
    fn verify_adds_weight_reads() {
        let cfg = DriverConfig::new().with_verify_weights(true);
        let mut driver = FrameDriver::new(RecordingBus::new(), &cfg).unwrap();
        driver.run_reference_frame().unwrap();
        let weight_reads = driver
            .bus()
            .reads()
            .filter(|e| matches!(e.location(), Some((Window::Weight, _))))
            .count();
        assert_eq!(weight_reads, 9);
    }

    #[test]
    fn verify_failure_stops_frame() {
        let cfg = DriverConfig::new().with_verify_weights(true);
        let bus = RecordingBus::new().with_stuck(Window::Weight.addr(0), 0xAA);
        let mut driver = FrameDriver::new(bus, &cfg).unwrap();
        let err = driver.run_reference_frame().unwrap_err();
        assert!(matches!(err, EtpuError::WeightReadback { slot: 0, .. }));
        assert_eq!(driver.bus().writes().count(), 9);
        assert_eq!(driver.frames_run(), 0);
    }

    #[test]
    fn frame_numbers_increase() {
        let mut driver = FrameDriver::reference(RecordingBus::new());
        assert_eq!(driver.run_reference_frame().unwrap().frame, 0);
        assert_eq!(driver.run_reference_frame().unwrap().frame, 1);
        assert_eq!(driver.frames_run(), 2);
    }
}
