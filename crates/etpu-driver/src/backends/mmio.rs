//! Volatile MMIO bus over an already-mapped register base
//!
//! Used directly on bare metal, where the accelerator is identity-mapped at
//! its physical address, and underneath [`DevMemBus`](super::DevMemBus)
//! on Linux.

// MMIO registers are naturally aligned by hardware, so pointer casts are safe
#![allow(clippy::cast_ptr_alignment)]
#![allow(clippy::cast_possible_truncation)]

use crate::bus::{BusType, RegisterBus};
use etpu_chip::windows::{ACCEL_BASE, ACCEL_SPAN};
use std::ptr::NonNull;
use std::sync::atomic::{fence, Ordering};

/// Raw volatile register bus
///
/// Every access is a single 32-bit volatile load or store bracketed by
/// sequentially consistent fences, so neither the compiler nor the CPU may
/// reorder a window write past a later readout read.
pub struct MmioBus {
    /// Virtual address of `phys_base`
    ptr: NonNull<u8>,
    /// Physical address the mapping starts at
    phys_base: u64,
    /// Mapped length in bytes
    len: usize,
}

impl std::fmt::Debug for MmioBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MmioBus")
            .field("ptr", &format_args!("{:p}", self.ptr))
            .field("phys_base", &format_args!("{:#x}", self.phys_base))
            .field("len", &format_args!("{:#x}", self.len))
            .finish()
    }
}

// SAFETY: Send - MmioBus refers to device memory, not thread-local state. The
// RegisterBus API takes &mut self for every access, so a moved bus is still
// the only accessor of its window.
unsafe impl Send for MmioBus {}

impl MmioBus {
    /// Wrap a mapped register range
    ///
    /// # Safety
    ///
    /// `base` must point to `len` bytes of device memory backing physical
    /// addresses `phys_base..phys_base + len`, 4-byte aligned, valid and
    /// exclusively owned by the returned bus for its whole lifetime.
    pub const unsafe fn new(base: NonNull<u8>, phys_base: u64, len: usize) -> Self {
        Self {
            ptr: base,
            phys_base,
            len,
        }
    }

    /// Bus over the accelerator at its physical address (bare metal)
    ///
    /// # Safety
    ///
    /// The caller must run with the accelerator identity-mapped (no MMU or
    /// a 1:1 mapping) and must not create a second bus over the same range.
    pub unsafe fn identity() -> Self {
        // SAFETY: ACCEL_BASE is a non-zero constant; validity of the mapping
        // is the caller's contract above.
        unsafe {
            Self::new(
                NonNull::new_unchecked(ACCEL_BASE as usize as *mut u8),
                ACCEL_BASE,
                ACCEL_SPAN as usize,
            )
        }
    }

    /// Translate a physical address into a byte offset inside the mapping
    ///
    /// # Panics
    ///
    /// Panics if the 4-byte access at `addr` falls outside the mapping.
    fn offset(&self, addr: u64) -> usize {
        let offset = addr
            .checked_sub(self.phys_base)
            .and_then(|o| usize::try_from(o).ok())
            .filter(|o| o.checked_add(4).is_some_and(|end| end <= self.len));
        match offset {
            Some(o) => o,
            None => panic!("Register address {addr:#x} outside mapped range"),
        }
    }

    /// Physical base of the mapping
    pub const fn phys_base(&self) -> u64 {
        self.phys_base
    }

    /// Mapped length in bytes
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the mapping is empty
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl RegisterBus for MmioBus {
    fn read32(&mut self, addr: u64) -> u32 {
        let offset = self.offset(addr);
        fence(Ordering::SeqCst);
        // SAFETY: read_volatile necessary for MMIO - hardware can change value.
        // Invariants: (1) ptr valid for self.len per new(); (2) offset+4 <= len;
        // (3) u32 aligned, window slots sit on a 4-byte stride.
        let value = unsafe { self.ptr.as_ptr().add(offset).cast::<u32>().read_volatile() };
        fence(Ordering::SeqCst);
        value
    }

    fn write32(&mut self, addr: u64, value: u32) {
        let offset = self.offset(addr);
        fence(Ordering::SeqCst);
        // SAFETY: write_volatile necessary for MMIO - the accelerator starts
        // computing as soon as the store lands.
        // Invariants: (1) ptr valid for self.len; (2) offset+4 <= len; (3) u32 aligned.
        unsafe { self.ptr.as_ptr().add(offset).cast::<u32>().write_volatile(value) };
        fence(Ordering::SeqCst);
    }

    fn bus_type(&self) -> BusType {
        BusType::Mmio
    }
}
