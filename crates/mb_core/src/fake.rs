//! In-memory register block standing in for the FPGA.
//!
//! The fake device answers [`RegisterIo`] accesses from a little-endian byte
//! array covering `base..base + N`. Host simulation seeds it with plausible
//! register values; tests poke exact bit patterns and check that the accessor
//! reports them unchanged.

use core::cell::Cell;

use crate::io::RegisterIo;

/// Fixed-size in-memory register window.
///
/// Uses `Cell` storage so reads and writes go through `&self`, matching the
/// shape of real MMIO. Not `Sync`: one fake device belongs to one thread,
/// like the single-reader register block it models.
pub struct FakeDevice<const N: usize> {
    base: usize,
    bytes: [Cell<u8>; N],
    reads: Cell<usize>,
}

impl<const N: usize> FakeDevice<N> {
    /// Creates a zero-filled window starting at `base`.
    pub fn new(base: usize) -> Self {
        Self {
            base,
            bytes: [const { Cell::new(0) }; N],
            reads: Cell::new(0),
        }
    }

    /// First address served by the window.
    pub fn base(&self) -> usize {
        self.base
    }

    /// Number of read transactions served so far.
    pub fn read_count(&self) -> usize {
        self.reads.get()
    }

    /// Stores an 8-bit value without counting as a bus transaction.
    pub fn poke8(&self, addr: usize, value: u8) {
        self.store(addr, &[value]);
    }

    /// Stores a 32-bit value without counting as a bus transaction.
    pub fn poke32(&self, addr: usize, value: u32) {
        self.store(addr, &value.to_le_bytes());
    }

    /// Stores a 64-bit value without counting as a bus transaction.
    pub fn poke64(&self, addr: usize, value: u64) {
        self.store(addr, &value.to_le_bytes());
    }

    fn index(&self, addr: usize, width: usize) -> usize {
        let offset = addr.wrapping_sub(self.base);
        assert!(
            addr >= self.base && offset + width <= N,
            "fake device access at {:#x} (+{}) outside {:#x}..{:#x}",
            addr,
            width,
            self.base,
            self.base + N
        );
        offset
    }

    fn store(&self, addr: usize, data: &[u8]) {
        let start = self.index(addr, data.len());
        for (cell, byte) in self.bytes[start..start + data.len()].iter().zip(data) {
            cell.set(*byte);
        }
    }

    fn load<const W: usize>(&self, addr: usize) -> [u8; W] {
        let start = self.index(addr, W);
        self.reads.set(self.reads.get() + 1);
        let mut out = [0u8; W];
        for (byte, cell) in out.iter_mut().zip(&self.bytes[start..start + W]) {
            *byte = cell.get();
        }
        out
    }
}

impl<const N: usize> RegisterIo for FakeDevice<N> {
    fn read8(&self, addr: usize) -> u8 {
        self.load::<1>(addr)[0]
    }

    fn read32(&self, addr: usize) -> u32 {
        u32::from_le_bytes(self.load(addr))
    }

    fn read64(&self, addr: usize) -> u64 {
        u64::from_le_bytes(self.load(addr))
    }

    fn write32(&self, addr: usize, value: u32) {
        self.poke32(addr, value);
    }

    fn write64(&self, addr: usize, value: u64) {
        self.poke64(addr, value);
    }
}
