//! Register bus implementations
//!
//! Three buses available:
//! - **Mmio**: volatile accesses over an already-mapped base (bare metal)
//! - **DevMem**: `/dev/mem` mapping from Linux userspace
//! - **Recording**: software register file with an access trace (CI, dry runs)

pub mod devmem;
pub mod mmio;
pub mod recording;

pub use devmem::{DevMemBus, DEV_MEM};
pub use mmio::MmioBus;
pub use recording::{BusEvent, RecordingBus};
