//! Register bus abstraction
//!
//! The platform supplies a raw `read32` / `write32` primitive over physical
//! addresses. Implementations must perform every call as a direct, ordered
//! device access: no caching, no merging, no reordering of a write past a
//! later read. Accesses are infallible; a mis-addressed access is a
//! hardware fault, not an error this layer can observe.

use std::fmt::Debug;

/// Raw 32-bit register access supplied by the platform
pub trait RegisterBus: Debug + Send {
    /// Read the 32-bit word at physical address `addr`
    fn read32(&mut self, addr: u64) -> u32;

    /// Write a 32-bit word to physical address `addr`
    fn write32(&mut self, addr: u64, value: u32);

    /// Bus type for logging
    fn bus_type(&self) -> BusType;
}

impl<B: RegisterBus + ?Sized> RegisterBus for Box<B> {
    fn read32(&mut self, addr: u64) -> u32 {
        (**self).read32(addr)
    }

    fn write32(&mut self, addr: u64, value: u32) {
        (**self).write32(addr, value);
    }

    fn bus_type(&self) -> BusType {
        (**self).bus_type()
    }
}

/// Bus type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusType {
    /// Raw volatile MMIO over an already-mapped base (bare metal)
    Mmio,

    /// `/dev/mem` mapping from Linux userspace
    DevMem,

    /// Software recording bus, no hardware required
    Recording,
}

impl std::fmt::Display for BusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mmio => write!(f, "MMIO"),
            Self::DevMem => write!(f, "/dev/mem"),
            Self::Recording => write!(f, "Recording"),
        }
    }
}
