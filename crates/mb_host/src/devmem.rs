//! Physical register access from Linux user space.
//!
//! Maps the register windows of a board profile out of `/dev/mem` (or a UIO
//! device node) and serves [`RegisterIo`] accesses through them with the same
//! volatile accessor the firmware uses.

use std::ffi::c_void;
use std::fs::{File, OpenOptions};
use std::num::NonZeroUsize;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use std::ptr::NonNull;

use anyhow::{Context, Result, bail};
use mb_core::io::{Mmio, RegisterIo};
use nix::fcntl::OFlag;
use nix::sys::mman::{MapFlags, ProtFlags, mmap, munmap};

use crate::target::Target;

/// Granularity of mmap offsets on the target kernels.
const PAGE_SIZE: usize = 0x1000;

/// One mapped physical window.
pub struct Window {
    ptr: NonNull<c_void>,
    map_len: usize,
    phys: usize,
    len: usize,
    mmio: Mmio,
}

impl std::fmt::Debug for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Window")
            .field("ptr", &self.ptr)
            .field("phys", &format_args!("{:#x}", self.phys))
            .field("len", &self.len)
            .finish()
    }
}

impl Window {
    fn map(file: &File, phys: usize, len: usize) -> Result<Self> {
        let page_base = phys & !(PAGE_SIZE - 1);
        let map_len = (phys - page_base + len).next_multiple_of(PAGE_SIZE);
        let length = NonZeroUsize::new(map_len).context("empty register window")?;
        let offset = i64::try_from(page_base).context("physical address out of range")?;

        // SAFETY: a fresh shared mapping of a device file; nothing else in
        // this process aliases it, and it is unmapped exactly once in Drop.
        let ptr = unsafe {
            mmap(
                None,
                length,
                ProtFlags::PROT_READ | ProtFlags::PROT_WRITE,
                MapFlags::MAP_SHARED,
                file,
                offset,
            )
        }
        .with_context(|| format!("failed to map {len:#x} bytes at {phys:#x}"))?;

        // SAFETY: the translated range covers page_base..page_base + map_len,
        // which is mapped for as long as this window lives.
        let mmio = unsafe { Mmio::translated(page_base, ptr.as_ptr() as *mut u8) };

        tracing::debug!(
            "mapped {:#x}..{:#x} at {:p}",
            phys,
            phys + len,
            ptr.as_ptr()
        );

        Ok(Self {
            ptr,
            map_len,
            phys,
            len,
            mmio,
        })
    }

    fn contains(&self, addr: usize, width: usize) -> bool {
        addr >= self.phys && addr + width <= self.phys + self.len
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        // SAFETY: ptr and map_len come from the successful mmap in Window::map.
        if let Err(e) = unsafe { munmap(self.ptr, self.map_len) } {
            tracing::warn!("munmap of {:#x} failed: {}", self.phys, e);
        }
    }
}

/// Set of physical windows behind one device node.
#[derive(Debug)]
pub struct DevMem {
    windows: Vec<Window>,
}

impl DevMem {
    /// Opens `path` and maps each `(phys, len)` window.
    pub fn open(path: &Path, windows: &[(usize, usize)]) -> Result<Self> {
        if windows.is_empty() {
            bail!("board profile has no register windows to map");
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(OFlag::O_SYNC.bits())
            .open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;

        let windows = windows
            .iter()
            .map(|&(phys, len)| Window::map(&file, phys, len))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { windows })
    }

    fn route(&self, addr: usize, width: usize) -> &Mmio {
        match self.windows.iter().find(|w| w.contains(addr, width)) {
            Some(window) => &window.mmio,
            None => panic!("register access at {addr:#x} outside every mapped window"),
        }
    }
}

impl RegisterIo for DevMem {
    fn read8(&self, addr: usize) -> u8 {
        self.route(addr, 1).read8(addr)
    }

    fn read32(&self, addr: usize) -> u32 {
        self.route(addr, 4).read32(addr)
    }

    fn read64(&self, addr: usize) -> u64 {
        self.route(addr, 8).read64(addr)
    }

    fn write32(&self, addr: usize, value: u32) {
        self.route(addr, 4).write32(addr, value)
    }

    fn write64(&self, addr: usize, value: u64) {
        self.route(addr, 8).write64(addr, value)
    }
}

impl Target for DevMem {
    #[cfg(target_arch = "aarch64")]
    fn system_counter(&self) -> Option<u64> {
        let ticks: u64;
        // SAFETY: Linux enables EL0 reads of the virtual counter on arm64.
        unsafe {
            core::arch::asm!("mrs {}, cntvct_el0", out(reg) ticks, options(nomem, nostack));
        }
        Some(ticks)
    }

    #[cfg(not(target_arch = "aarch64"))]
    fn system_counter(&self) -> Option<u64> {
        None
    }
}
