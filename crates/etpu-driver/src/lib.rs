//! Control-plane driver for the ETPU convolution accelerator.
//!
//! The accelerator exposes three register windows (weights, input stream,
//! readout) and starts computing as soon as register writes land. There is
//! no start command, no status register and no interrupt: the driver's
//! whole job is to stage data in the right words, in the right order.
//!
//! # Frame protocol
//!
//! ```text
//! weight  [0..9)   ← W[r][c], one element per word, traversal order
//! stream  [0..5)   ← wavefront words, 1-2-3-2-1 elements, tags 0,0,1,2,3
//! readout [5..30)  → 25 pacing reads
//! stream  [4]      ← 0x0400_0000 end of frame
//! ```
//!
//! # Bus hierarchy
//!
//! ```text
//! Hardware:
//!   DevMemBus    : /dev/mem mapping from Linux userspace
//!   MmioBus      : raw volatile accesses, bare metal
//!
//! Development:
//!   RecordingBus : software register file with an access trace
//! ```
//!
//! # Quick start
//!
//! ```
//! use etpu_driver::{FrameDriver, RecordingBus};
//!
//! # fn main() -> etpu_driver::Result<()> {
//! let mut driver = FrameDriver::reference(RecordingBus::new());
//! let report = driver.run_reference_frame()?;
//! assert_eq!(report.readout.len(), 25);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]

pub mod backends;
mod bus;
mod config;
mod error;
mod frame;
pub mod geometry;
mod loading;
mod matrix;
mod readout;
mod registers;
mod stream;

/// Silicon constants (re-exported from etpu-chip).
pub mod chip {
    pub use etpu_chip::frame::{
        reference, DIMENSION, READOUT_FIRST_SLOT, READOUT_WORDS, STREAM_WORDS, TERMINAL_SLOT,
        TERMINAL_TAG, WEIGHT_WORDS,
    };
    pub use etpu_chip::windows::{
        Window, ACCEL_BASE, ACCEL_SPAN, READOUT_BASE, SLOT_STRIDE, STREAM_BASE, WEIGHT_BASE,
        WINDOW_SLOTS,
    };
    pub use etpu_chip::word::{lane_of, pack_word, tag_of, terminal_word, MAX_LANES, TAG_SHIFT};
}

pub use backends::{BusEvent, DevMemBus, MmioBus, RecordingBus, DEV_MEM};
pub use bus::{BusType, RegisterBus};
pub use config::DriverConfig;
pub use error::{EtpuError, Result};
pub use frame::{FrameDriver, FrameReport};
pub use geometry::{ArrayGeometry, Coord, WavefrontStep};
pub use loading::WeightLoader;
pub use matrix::Matrix;
pub use readout::{ReadoutDrain, ReadoutSpan};
pub use registers::Registers;
pub use stream::{StreamPacker, StreamWord};

/// Commonly used types.
pub mod prelude {
    pub use crate::{
        ArrayGeometry, DriverConfig, EtpuError, FrameDriver, FrameReport, Matrix, ReadoutSpan,
        RecordingBus, RegisterBus, Result,
    };
}
