//! Software (recording) register bus
//!
//! Stands in for the accelerator when there is no hardware: CI, dry runs
//! from the CLI, and protocol tests. Behaves like a plain register file
//! (a read returns the last value written to that address, zero if never
//! written) and records every access in bus order.
//!
//! Two knobs shape what reads return:
//!
//! - a scripted readout queue, consumed by reads of the readout window, to
//!   stand in for pipeline output;
//! - stuck registers, which ignore writes, to model a faulty weight slot.

use crate::bus::{BusType, RegisterBus};
use etpu_chip::windows::Window;
use std::collections::{BTreeMap, VecDeque};
use tracing::trace;

/// One recorded bus access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusEvent {
    /// A 32-bit store
    Write {
        /// Physical address
        addr: u64,
        /// Value stored
        value: u32,
    },
    /// A 32-bit load
    Read {
        /// Physical address
        addr: u64,
        /// Value returned
        value: u32,
    },
}

impl BusEvent {
    /// Physical address of the access
    pub const fn addr(&self) -> u64 {
        match *self {
            Self::Write { addr, .. } | Self::Read { addr, .. } => addr,
        }
    }

    /// Value stored or returned
    pub const fn value(&self) -> u32 {
        match *self {
            Self::Write { value, .. } | Self::Read { value, .. } => value,
        }
    }

    /// Whether this is a store
    pub const fn is_write(&self) -> bool {
        matches!(self, Self::Write { .. })
    }

    /// Window and slot the access decoded to, if any
    pub fn location(&self) -> Option<(Window, usize)> {
        Window::locate(self.addr())
    }
}

impl std::fmt::Display for BusEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dir = if self.is_write() { 'W' } else { 'R' };
        write!(f, "{dir} {:#010x} {:#010x}", self.addr(), self.value())?;
        if let Some((window, slot)) = self.location() {
            write!(f, "  {window}[{slot}]")?;
        }
        Ok(())
    }
}

/// Recording register bus
#[derive(Debug, Default)]
pub struct RecordingBus {
    regs: BTreeMap<u64, u32>,
    stuck: BTreeMap<u64, u32>,
    readout_script: VecDeque<u32>,
    events: Vec<BusEvent>,
}

impl RecordingBus {
    /// Empty register file, no script
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `values` to readout-window reads, in order, before falling back
    /// to the register file
    #[must_use]
    pub fn with_readout(mut self, values: impl IntoIterator<Item = u32>) -> Self {
        self.readout_script.extend(values);
        self
    }

    /// Pin `addr` to `value`; writes are recorded but do not land
    #[must_use]
    pub fn with_stuck(mut self, addr: u64, value: u32) -> Self {
        self.stuck.insert(addr, value);
        self
    }

    /// Current register contents, without recording an access
    pub fn peek(&self, addr: u64) -> u32 {
        self.stuck
            .get(&addr)
            .or_else(|| self.regs.get(&addr))
            .copied()
            .unwrap_or(0)
    }

    /// Every access so far, in bus order
    pub fn events(&self) -> &[BusEvent] {
        &self.events
    }

    /// Stores only, in bus order
    pub fn writes(&self) -> impl Iterator<Item = &BusEvent> {
        self.events.iter().filter(|e| e.is_write())
    }

    /// Loads only, in bus order
    pub fn reads(&self) -> impl Iterator<Item = &BusEvent> {
        self.events.iter().filter(|e| !e.is_write())
    }

    /// Drain the recorded trace, keeping register contents
    pub fn take_events(&mut self) -> Vec<BusEvent> {
        std::mem::take(&mut self.events)
    }

    /// Scripted readout values not yet consumed
    pub fn pending_readout(&self) -> usize {
        self.readout_script.len()
    }
}

impl RegisterBus for RecordingBus {
    fn read32(&mut self, addr: u64) -> u32 {
        let scripted = match Window::locate(addr) {
            Some((Window::Readout, _)) => self.readout_script.pop_front(),
            _ => None,
        };
        let value = scripted.unwrap_or_else(|| self.peek(addr));
        trace!("Read u32 @ {addr:#x} = {value:#x}");
        self.events.push(BusEvent::Read { addr, value });
        value
    }

    fn write32(&mut self, addr: u64, value: u32) {
        trace!("Write u32 @ {addr:#x} = {value:#x}");
        self.events.push(BusEvent::Write { addr, value });
        self.regs.insert(addr, value);
    }

    fn bus_type(&self) -> BusType {
        BusType::Recording
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_return_last_write() {
        let mut bus = RecordingBus::new();
        let addr = Window::Weight.addr(3);
        assert_eq!(bus.read32(addr), 0);
        bus.write32(addr, 7);
        bus.write32(addr, 9);
        assert_eq!(bus.read32(addr), 9);
        assert_eq!(bus.events().len(), 4);
        assert_eq!(bus.writes().count(), 2);
    }

    #[test]
    fn scripted_readout_is_consumed_in_order() {
        let mut bus = RecordingBus::new().with_readout([0xA, 0xB]);
        let r5 = Window::Readout.addr(5);
        assert_eq!(bus.read32(r5), 0xA);
        assert_eq!(bus.read32(Window::Readout.addr(6)), 0xB);
        assert_eq!(bus.read32(r5), 0);
        assert_eq!(bus.pending_readout(), 0);
    }

    #[test]
    fn script_does_not_leak_into_other_windows() {
        let mut bus = RecordingBus::new().with_readout([0xA]);
        assert_eq!(bus.read32(Window::Stream.addr(0)), 0);
        assert_eq!(bus.pending_readout(), 1);
    }

    #[test]
    fn stuck_register_ignores_writes() {
        let addr = Window::Weight.addr(2);
        let mut bus = RecordingBus::new().with_stuck(addr, 0xFF);
        bus.write32(addr, 6);
        assert_eq!(bus.read32(addr), 0xFF);
        assert_eq!(bus.writes().next().map(BusEvent::value), Some(6));
    }

    #[test]
    fn event_display_names_window_slot() {
        let e = BusEvent::Write {
            addr: Window::Stream.addr(4),
            value: 0x0400_0000,
        };
        assert_eq!(e.to_string(), "W 0x30000110 0x04000000  stream[4]");
    }

    #[test]
    fn take_events_keeps_registers() {
        let mut bus = RecordingBus::new();
        bus.write32(Window::Stream.addr(1), 5);
        assert_eq!(bus.take_events().len(), 1);
        assert!(bus.events().is_empty());
        assert_eq!(bus.peek(Window::Stream.addr(1)), 5);
    }
}
