//! Register window layout of the ETPU accelerator.
//!
//! The accelerator sits on the SoC bus as three disjoint register banks,
//! each a run of 32-bit words at a 4-byte stride:
//!
//! ```text
//! Window   Base          Decode   Slots  Purpose
//! ──────── ───────────── ──────── ────── ─────────────────────────────────
//! Weight   0x3000_0000   0x100    64     Stationary weight matrix
//! Stream   0x3000_0100   0x100    64     Packed input wavefront + tags
//! Readout  0x3000_0200   0x100    64     Pipeline output sink
//! ```
//!
//! The whole accelerator decodes `0x300` bytes from [`ACCEL_BASE`], which
//! fits in a single 4 KiB page.

/// Physical base of the accelerator (first byte of the weight window).
pub const ACCEL_BASE: u64 = 0x3000_0000;

/// Bytes decoded by the accelerator across all three windows.
pub const ACCEL_SPAN: u64 = 0x300;

/// Byte stride between consecutive slots.
pub const SLOT_STRIDE: u64 = 4;

/// Bytes decoded by each window.
pub const WINDOW_BYTES: u64 = 0x100;

/// Slots addressable in each window.
pub const WINDOW_SLOTS: usize = (WINDOW_BYTES / SLOT_STRIDE) as usize;

/// Weight window base (`B_w`).
pub const WEIGHT_BASE: u64 = ACCEL_BASE;
/// Stream window base (`B_s`).
pub const STREAM_BASE: u64 = ACCEL_BASE + 0x100;
/// Readout window base (`B_r`).
pub const READOUT_BASE: u64 = ACCEL_BASE + 0x200;

/// One of the three register banks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Window {
    /// Stationary weight store.
    Weight,
    /// Input stream feed.
    Stream,
    /// Readout sink.
    Readout,
}

impl Window {
    /// All windows in address order.
    pub const ALL: [Self; 3] = [Self::Weight, Self::Stream, Self::Readout];

    /// Physical base address of this window.
    #[must_use]
    pub const fn base(self) -> u64 {
        match self {
            Self::Weight => WEIGHT_BASE,
            Self::Stream => STREAM_BASE,
            Self::Readout => READOUT_BASE,
        }
    }

    /// Byte offset of `slot` inside the window.
    #[must_use]
    pub const fn offset(slot: usize) -> u64 {
        slot as u64 * SLOT_STRIDE
    }

    /// Physical address of `slot` in this window.
    #[must_use]
    pub const fn addr(self, slot: usize) -> u64 {
        self.base() + Self::offset(slot)
    }

    /// Whether `slot` decodes inside this window.
    #[must_use]
    pub const fn contains(slot: usize) -> bool {
        slot < WINDOW_SLOTS
    }

    /// Reverse lookup: which window and slot a physical address falls in.
    #[must_use]
    pub fn locate(addr: u64) -> Option<(Self, usize)> {
        if addr < ACCEL_BASE || addr >= ACCEL_BASE + ACCEL_SPAN || addr % SLOT_STRIDE != 0 {
            return None;
        }
        let rel = addr - ACCEL_BASE;
        let window = Self::ALL[(rel / WINDOW_BYTES) as usize];
        Some((window, ((rel % WINDOW_BYTES) / SLOT_STRIDE) as usize))
    }

    /// Short lowercase name, used in traces and CLI output.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Weight => "weight",
            Self::Stream => "stream",
            Self::Readout => "readout",
        }
    }
}

impl std::fmt::Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
