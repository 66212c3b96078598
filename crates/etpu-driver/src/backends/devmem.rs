//! `/dev/mem` register bus for Linux userspace
//!
//! Maps the page(s) holding the accelerator windows with `O_SYNC` so the
//! kernel hands out an uncached device mapping, then drives them through
//! [`MmioBus`]. Minimal unsafe, confined to `mmap` / `munmap`.

#![allow(clippy::cast_possible_truncation)]

use super::mmio::MmioBus;
use crate::bus::{BusType, RegisterBus};
use crate::error::{EtpuError, Result};
use etpu_chip::windows::{ACCEL_BASE, ACCEL_SPAN};
use rustix::mm::{mmap, munmap, MapFlags, ProtFlags};
use std::fs::{File, OpenOptions};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsFd;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

/// Default physical memory device
pub const DEV_MEM: &str = "/dev/mem";

/// Register bus backed by a `/dev/mem` mapping
#[derive(Debug)]
pub struct DevMemBus {
    mmio: MmioBus,
    map: NonNull<u8>,
    map_len: usize,
    _file: File,
    path: PathBuf,
}

// SAFETY: Send - DevMemBus owns its mapping exclusively; the mapping is
// process-wide and stays valid when the owner moves between threads.
unsafe impl Send for DevMemBus {}

impl DevMemBus {
    /// Map the accelerator windows from `path` (normally `/dev/mem`)
    ///
    /// # Errors
    ///
    /// Returns an error if the device cannot be opened or mapped.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_range(path, ACCEL_BASE, ACCEL_SPAN)
    }

    /// Map an arbitrary physical range from `path`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `len` is zero
    /// - The device file cannot be opened read/write ([`EtpuError::Io`])
    /// - `mmap` fails (no CAP_SYS_RAWIO, `STRICT_DEVMEM`, bad address)
    pub fn open_range(path: impl AsRef<Path>, phys_base: u64, len: u64) -> Result<Self> {
        let path = path.as_ref();
        if len == 0 {
            return Err(EtpuError::mapping("zero-length register range"));
        }

        let page = rustix::param::page_size() as u64;
        let map_base = phys_base & !(page - 1);
        let lead = (phys_base - map_base) as usize;
        let map_len = (lead + len as usize).div_ceil(page as usize) * page as usize;

        tracing::debug!(
            "Mapping {} bytes at {phys_base:#x} via {} (page {map_base:#x}, {map_len:#x} bytes)",
            len,
            path.display()
        );

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open(path)
            .inspect_err(|e| {
                tracing::warn!("Cannot open {}: {e}. Running as root?", path.display());
            })?;

        // SAFETY: mmap necessary for MMIO - maps the accelerator page into the
        // process. Invariants: (1) fd valid, just opened; (2) map_len non-zero and
        // page-multiple; (3) map_base page-aligned; (4) the mapping is released
        // only in Drop, and the file is kept open alongside it.
        let ptr = unsafe {
            mmap(
                std::ptr::null_mut(),
                map_len,
                ProtFlags::READ | ProtFlags::WRITE,
                MapFlags::SHARED,
                file.as_fd(),
                map_base,
            )
        }
        .map_err(|e| EtpuError::mapping(format!("mmap of {phys_base:#x} failed: {e}")))?;

        let map = NonNull::new(ptr.cast::<u8>())
            .ok_or_else(|| EtpuError::mapping("mmap returned a null mapping"))?;

        // SAFETY: lead < page <= map_len, so the adjusted pointer stays inside
        // the mapping and is non-null. The range lead..lead+len is mapped, device
        // backed and owned by this bus until Drop.
        let mmio = unsafe {
            MmioBus::new(
                NonNull::new_unchecked(map.as_ptr().add(lead)),
                phys_base,
                len as usize,
            )
        };

        tracing::info!("Mapped accelerator registers {phys_base:#x}+{len:#x} at {map:p}");

        Ok(Self {
            mmio,
            map,
            map_len,
            _file: file,
            path: path.to_path_buf(),
        })
    }

    /// Device file the registers were mapped from
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RegisterBus for DevMemBus {
    fn read32(&mut self, addr: u64) -> u32 {
        self.mmio.read32(addr)
    }

    fn write32(&mut self, addr: u64, value: u32) {
        self.mmio.write32(addr, value);
    }

    fn bus_type(&self) -> BusType {
        BusType::DevMem
    }
}

impl Drop for DevMemBus {
    fn drop(&mut self) {
        // SAFETY: map/map_len are exactly what mmap returned in open_range and
        // Drop runs once; no MmioBus access can follow.
        unsafe {
            if let Err(e) = munmap(self.map.as_ptr().cast(), self.map_len) {
                tracing::error!("munmap failed during drop: {e}");
            }
        }
        tracing::debug!("Unmapped accelerator registers from {}", self.path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_length_is_rejected() {
        let err = DevMemBus::open_range(DEV_MEM, ACCEL_BASE, 0).unwrap_err();
        assert!(matches!(err, EtpuError::Mapping { .. }));
    }

    #[test]
    fn missing_device_is_an_io_error() {
        let err = DevMemBus::open("/nonexistent/etpu-mem").unwrap_err();
        assert!(matches!(
            err,
            EtpuError::Io { ref source } if source.kind() == std::io::ErrorKind::NotFound
        ));
    }

    #[test]
    #[ignore] // Requires hardware
    fn maps_accelerator_windows() {
        let bus = DevMemBus::open(DEV_MEM).expect("map /dev/mem");
        assert_eq!(bus.bus_type(), BusType::DevMem);
    }
}
