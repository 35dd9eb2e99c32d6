//! Register reader capability and the volatile MMIO implementation.
//!
//! Every hardware access in this crate goes through [`RegisterIo`], so the
//! accessor and clocks can run against real memory-mapped registers, a
//! `/dev/mem` window on a host, or the in-memory [`FakeDevice`](crate::fake::FakeDevice).

use core::sync::atomic::{Ordering, fence};

/// Fixed-width register access at absolute addresses.
///
/// Implementations must perform exactly one bus transaction per call and
/// must not cache, merge, or reorder accesses.
pub trait RegisterIo {
    /// Reads an 8-bit register.
    fn read8(&self, addr: usize) -> u8;

    /// Reads a 32-bit register.
    fn read32(&self, addr: usize) -> u32;

    /// Reads a 64-bit register.
    fn read64(&self, addr: usize) -> u64;

    /// Writes a 32-bit register.
    fn write32(&self, addr: usize, value: u32);

    /// Writes a 64-bit register.
    fn write64(&self, addr: usize, value: u64);
}

impl<T: RegisterIo + ?Sized> RegisterIo for &T {
    #[inline(always)]
    fn read8(&self, addr: usize) -> u8 {
        (**self).read8(addr)
    }

    #[inline(always)]
    fn read32(&self, addr: usize) -> u32 {
        (**self).read32(addr)
    }

    #[inline(always)]
    fn read64(&self, addr: usize) -> u64 {
        (**self).read64(addr)
    }

    #[inline(always)]
    fn write32(&self, addr: usize, value: u32) {
        (**self).write32(addr, value)
    }

    #[inline(always)]
    fn write64(&self, addr: usize, value: u64) {
        (**self).write64(addr, value)
    }
}

/// Volatile access to physical (or identity-mapped) register addresses.
///
/// Encapsulates the raw pointer reads and writes used by bare-metal firmware.
/// Every access is a single volatile load or store of the requested width.
/// Writes are followed by a release fence so that a subsequent read of a
/// different register cannot be observed before the write by the device.
#[derive(Debug, Clone, Copy)]
pub struct Mmio {
    /// Offset added to every address before dereferencing.
    ///
    /// Zero on bare metal. Host mappings set this to the difference between
    /// the virtual address of the mapping and the physical base it covers.
    translation: usize,
}

impl Mmio {
    /// Creates an accessor that dereferences addresses as given.
    ///
    /// # Safety
    ///
    /// Every address later passed to this accessor must be mapped to device
    /// registers (or memory) that tolerate volatile access of the requested
    /// width, and must be naturally aligned for that width.
    pub const unsafe fn new() -> Self {
        Self { translation: 0 }
    }

    /// Creates an accessor that translates physical addresses into a mapping.
    ///
    /// The physical address `phys_base` is served from the virtual address
    /// `virt_base`; all other addresses are shifted by the same amount.
    ///
    /// # Safety
    ///
    /// Same requirements as [`Mmio::new`], applied to the translated addresses,
    /// and the mapping must outlive the accessor.
    pub unsafe fn translated(phys_base: usize, virt_base: *mut u8) -> Self {
        Self {
            translation: (virt_base as usize).wrapping_sub(phys_base),
        }
    }

    #[inline(always)]
    fn ptr<T>(&self, addr: usize) -> *mut T {
        addr.wrapping_add(self.translation) as *mut T
    }
}

impl RegisterIo for Mmio {
    #[inline(always)]
    fn read8(&self, addr: usize) -> u8 {
        // SAFETY: the constructor contract guarantees the address is mapped.
        unsafe { self.ptr::<u8>(addr).read_volatile() }
    }

    #[inline(always)]
    fn read32(&self, addr: usize) -> u32 {
        // SAFETY: see read8.
        unsafe { self.ptr::<u32>(addr).read_volatile() }
    }

    #[inline(always)]
    fn read64(&self, addr: usize) -> u64 {
        // SAFETY: see read8.
        unsafe { self.ptr::<u64>(addr).read_volatile() }
    }

    #[inline(always)]
    fn write32(&self, addr: usize, value: u32) {
        // SAFETY: see read8.
        unsafe { self.ptr::<u32>(addr).write_volatile(value) }
        fence(Ordering::Release);
    }

    #[inline(always)]
    fn write64(&self, addr: usize, value: u64) {
        // SAFETY: see read8.
        unsafe { self.ptr::<u64>(addr).write_volatile(value) }
        fence(Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translated_mmio_reads_backing_memory() {
        let mut backing = [0u64; 4];
        backing[1] = 0x1122_3344_5566_7788;
        let virt = backing.as_mut_ptr() as *mut u8;
        let mmio = unsafe { Mmio::translated(0x4_0000_0000, virt) };

        assert_eq!(mmio.read64(0x4_0000_0008), 0x1122_3344_5566_7788);
        assert_eq!(mmio.read32(0x4_0000_0008), 0x5566_7788);
        assert_eq!(mmio.read8(0x4_0000_0008), 0x88);
    }

    #[test]
    fn translated_mmio_writes_backing_memory() {
        let mut backing = [0u64; 2];
        let virt = backing.as_mut_ptr() as *mut u8;
        let mmio = unsafe { Mmio::translated(0x8000_0000, virt) };

        mmio.write64(0x8000_0008, 0xDEAD_BEEF_0000_0001);
        mmio.write32(0x8000_0000, 7);

        assert_eq!(mmio.read64(0x8000_0008), 0xDEAD_BEEF_0000_0001);
        assert_eq!(mmio.read32(0x8000_0000), 7);
    }
}
