//! Readout drain
//!
//! After the wavefront is streamed the driver polls a fixed run of readout
//! slots. The reads pace the driver against the free-running pipeline;
//! there is no success predicate, retry or timeout, and the values are
//! handed back to the caller as-is.

use crate::bus::RegisterBus;
use crate::error::{EtpuError, Result};
use crate::registers::Registers;
use etpu_chip::frame::{READOUT_FIRST_SLOT, READOUT_WORDS};
use etpu_chip::windows::{Window, WINDOW_SLOTS};
use std::ops::Range;
use tracing::debug;

/// Contiguous run of readout slots polled per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadoutSpan {
    first: usize,
    count: usize,
}

impl ReadoutSpan {
    /// Reference span: slots 5..30
    pub const REFERENCE: Self = Self {
        first: READOUT_FIRST_SLOT,
        count: READOUT_WORDS,
    };

    /// Span of `count` slots starting at `first`
    ///
    /// # Errors
    ///
    /// Returns error if the span runs past the readout window.
    pub fn new(first: usize, count: usize) -> Result<Self> {
        match first.checked_add(count) {
            Some(end) if end <= WINDOW_SLOTS => Ok(Self { first, count }),
            _ => Err(EtpuError::ReadoutSpan { first, count }),
        }
    }

    /// First slot polled
    pub const fn first(&self) -> usize {
        self.first
    }

    /// Number of reads
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Slots polled, ascending
    pub const fn slots(&self) -> Range<usize> {
        self.first..self.first + self.count
    }
}

impl Default for ReadoutSpan {
    fn default() -> Self {
        Self::REFERENCE
    }
}

/// Polls the readout window
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadoutDrain {
    span: ReadoutSpan,
}

impl ReadoutDrain {
    /// Drain over `span`
    pub const fn new(span: ReadoutSpan) -> Self {
        Self { span }
    }

    /// Configured span
    pub const fn span(&self) -> ReadoutSpan {
        self.span
    }

    /// Issue every read of the span in ascending slot order
    pub fn drain<B: RegisterBus>(&self, regs: &mut Registers<B>) -> Vec<u32> {
        let words: Vec<u32> = self
            .span
            .slots()
            .map(|slot| regs.read(Window::Readout, slot))
            .collect();
        debug!(
            "Drained {} readout words from slots {:?}",
            words.len(),
            self.span.slots()
        );
        words
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::RecordingBus;

    #[test]
    fn reference_span_reads_slots_5_to_29() {
        let mut regs = Registers::new(RecordingBus::new());
        let words = ReadoutDrain::default().drain(&mut regs);
        assert_eq!(words.len(), 25);
        let slots: Vec<usize> = regs
            .into_inner()
            .reads()
            .filter_map(|e| e.location())
            .map(|(w, s)| {
                assert_eq!(w, Window::Readout);
                s
            })
            .collect();
        assert_eq!(slots, (5..30).collect::<Vec<_>>());
    }

    #[test]
    fn returns_values_in_read_order() {
        let bus = RecordingBus::new().with_readout([7, 8, 9]);
        let mut regs = Registers::new(bus);
        let drain = ReadoutDrain::new(ReadoutSpan::new(0, 4).unwrap());
        assert_eq!(drain.drain(&mut regs), [7, 8, 9, 0]);
    }

    #[test]
    fn span_must_fit_window() {
        assert!(ReadoutSpan::new(5, 59).is_ok());
        assert!(matches!(
            ReadoutSpan::new(5, 60),
            Err(EtpuError::ReadoutSpan { first: 5, count: 60 })
        ));
        assert!(ReadoutSpan::new(usize::MAX, 2).is_err());
    }

    #[test]
    fn empty_span_reads_nothing() {
        let mut regs = Registers::new(RecordingBus::new());
        let drain = ReadoutDrain::new(ReadoutSpan::new(5, 0).unwrap());
        assert!(drain.drain(&mut regs).is_empty());
        assert!(regs.into_inner().events().is_empty());
    }
}
