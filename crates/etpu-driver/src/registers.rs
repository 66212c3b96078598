//! Register windows over a bus
//!
//! [`Registers`] owns the bus for the duration of a frame and addresses
//! the three windows by `(window, slot)`. Slots are validated when a frame
//! plan is built ([`ArrayGeometry`](crate::ArrayGeometry),
//! [`ReadoutSpan`](crate::ReadoutSpan)); an out-of-range slot reaching
//! this layer is a programmer error and only debug builds check it.

use crate::bus::{BusType, RegisterBus};
use etpu_chip::windows::Window;
use tracing::trace;

/// Exclusive `(window, slot)` access to the accelerator
#[derive(Debug)]
pub struct Registers<B> {
    bus: B,
}

impl<B: RegisterBus> Registers<B> {
    /// Take ownership of `bus`
    pub const fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Store `value` at `slot` of `window`
    pub fn write(&mut self, window: Window, slot: usize, value: u32) {
        debug_assert!(Window::contains(slot), "{window} slot {slot} out of range");
        trace!("{window}[{slot}] <- {value:#010x}");
        self.bus.write32(window.addr(slot), value);
    }

    /// Load the word at `slot` of `window`
    pub fn read(&mut self, window: Window, slot: usize) -> u32 {
        debug_assert!(Window::contains(slot), "{window} slot {slot} out of range");
        let value = self.bus.read32(window.addr(slot));
        trace!("{window}[{slot}] -> {value:#010x}");
        value
    }

    /// Underlying bus type
    pub fn bus_type(&self) -> BusType {
        self.bus.bus_type()
    }

    /// Borrow the bus
    pub const fn bus(&self) -> &B {
        &self.bus
    }

    /// Release the bus
    pub fn into_inner(self) -> B {
        self.bus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{BusEvent, RecordingBus};

    #[test]
    fn slot_maps_to_base_plus_stride() {
        let mut regs = Registers::new(RecordingBus::new());
        regs.write(Window::Weight, 8, 11);
        regs.write(Window::Readout, 0, 1);
        let _ = regs.read(Window::Stream, 2);
        let bus = regs.into_inner();
        assert_eq!(
            bus.events(),
            &[
                BusEvent::Write { addr: 0x3000_0020, value: 11 },
                BusEvent::Write { addr: 0x3000_0200, value: 1 },
                BusEvent::Read { addr: 0x3000_0108, value: 0 },
            ]
        );
    }

    #[test]
    fn every_window_reads_back() {
        let mut regs = Registers::new(RecordingBus::new());
        for window in Window::ALL {
            regs.write(window, 3, 0x55);
            assert_eq!(regs.read(window, 3), 0x55);
        }
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "out of range")]
    fn out_of_range_slot_is_caught_in_debug() {
        let mut regs = Registers::new(RecordingBus::new());
        regs.write(Window::Stream, etpu_chip::windows::WINDOW_SLOTS, 0);
    }
}
