//! Block RAM scratchpad used by the bus-speed test bitstreams.
//!
//! The BRAM test designs map a small block RAM into the processor address
//! space so firmware can measure read and write latency of the AXI path.
//! Every access takes a byte bias into the window and is checked against the
//! window size and the natural alignment of the access width.

use mb_common::mmio;

use crate::BindingError;
use crate::io::RegisterIo;

/// Checked accessor for a BRAM window.
#[derive(Debug, Clone, Copy)]
pub struct Scratchpad<R> {
    io: R,
    base: usize,
    size: usize,
}

impl<R: RegisterIo> Scratchpad<R> {
    /// Window of `size` bytes starting at `base`.
    pub const fn new(io: R, base: usize, size: usize) -> Self {
        Self { io, base, size }
    }

    /// Standard 8 KiB test window at `base`.
    pub const fn bram(io: R, base: usize) -> Self {
        Self::new(io, base, mmio::BRAM_SIZE)
    }

    /// Window size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    fn check(&self, bias: usize, width: usize) -> Result<usize, BindingError> {
        // wide reads are issued as 64-bit beats
        let align = width.min(8);
        if bias % align != 0 {
            return Err(BindingError::Misaligned { bias, align });
        }
        match bias.checked_add(width) {
            Some(end) if end <= self.size => Ok(self.base + bias),
            _ => Err(BindingError::OutOfWindow { bias, width }),
        }
    }

    /// Reads the 32-bit word at `bias`.
    ///
    /// # Arguments
    ///
    /// * `bias` - Byte offset into the window, a multiple of 4
    ///
    /// # Returns
    ///
    /// The word read from the BRAM, or the [`BindingError`] describing why
    /// the offset is not usable. Nothing is read on error.
    pub fn read32(&self, bias: usize) -> Result<u32, BindingError> {
        let addr = self.check(bias, 4)?;
        Ok(self.io.read32(addr))
    }

    /// Writes a 32-bit word at `bias`.
    ///
    /// # Arguments
    ///
    /// * `bias` - Byte offset into the window, a multiple of 4
    /// * `value` - Word to store
    pub fn write32(&self, bias: usize, value: u32) -> Result<(), BindingError> {
        let addr = self.check(bias, 4)?;
        self.io.write32(addr, value);
        Ok(())
    }

    /// Reads the 64-bit word at `bias` in a single bus transaction.
    ///
    /// # Arguments
    ///
    /// * `bias` - Byte offset into the window, a multiple of 8
    ///
    /// # Returns
    ///
    /// The word read from the BRAM, or the [`BindingError`] describing why
    /// the offset is not usable.
    pub fn read64(&self, bias: usize) -> Result<u64, BindingError> {
        let addr = self.check(bias, 8)?;
        Ok(self.io.read64(addr))
    }

    /// Writes a 64-bit word at `bias` in a single bus transaction.
    ///
    /// # Arguments
    ///
    /// * `bias` - Byte offset into the window, a multiple of 8
    /// * `value` - Word to store
    pub fn write64(&self, bias: usize, value: u64) -> Result<(), BindingError> {
        let addr = self.check(bias, 8)?;
        self.io.write64(addr, value);
        Ok(())
    }

    /// Reads 16 bytes as two consecutive 64-bit words.
    ///
    /// The whole range is checked before the first read, so a failed call
    /// never touches the bus.
    pub fn read128(&self, bias: usize) -> Result<[u64; 2], BindingError> {
        let addr = self.check(bias, 16)?;
        Ok([self.io.read64(addr), self.io.read64(addr + 8)])
    }

    /// Reads 32 bytes as two 128-bit reads at `bias` and `bias + 16`.
    pub fn read256(&self, bias: usize) -> Result<[u64; 4], BindingError> {
        self.check(bias, 32)?;
        let [a, b] = self.read128(bias)?;
        let [c, d] = self.read128(bias + 16)?;
        Ok([a, b, c, d])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeDevice;

    const BASE: usize = 0x8000_0000;

    #[test]
    fn write_then_read_each_width() {
        let dev = FakeDevice::<64>::new(BASE);
        let pad = Scratchpad::new(&dev, BASE, 64);

        pad.write32(4, 0xCAFE_F00D).unwrap();
        pad.write64(8, 0x0102_0304_0506_0708).unwrap();

        assert_eq!(pad.read32(4).unwrap(), 0xCAFE_F00D);
        assert_eq!(pad.read64(8).unwrap(), 0x0102_0304_0506_0708);
        assert_eq!(pad.read64(0).unwrap(), 0xCAFE_F00D_0000_0000);
    }

    #[test]
    fn read256_concatenates_two_halves() {
        let dev = FakeDevice::<64>::new(BASE);
        for i in 0..8 {
            dev.poke64(BASE + i * 8, i as u64 + 1);
        }
        let pad = Scratchpad::new(&dev, BASE, 64);

        assert_eq!(pad.read128(16).unwrap(), [3, 4]);
        assert_eq!(pad.read256(32).unwrap(), [5, 6, 7, 8]);
    }

    #[test]
    fn rejects_access_past_window() {
        let dev = FakeDevice::<64>::new(BASE);
        let pad = Scratchpad::new(&dev, BASE, 64);

        assert_eq!(
            pad.read64(64),
            Err(BindingError::OutOfWindow { bias: 64, width: 8 })
        );
        assert_eq!(
            pad.read256(48),
            Err(BindingError::OutOfWindow { bias: 48, width: 32 })
        );
        assert!(pad.read32(60).is_ok());
        assert_eq!(dev.read_count(), 1);
    }

    #[test]
    fn rejects_misaligned_bias() {
        let dev = FakeDevice::<64>::new(BASE);
        let pad = Scratchpad::new(&dev, BASE, 64);

        assert_eq!(
            pad.write32(2, 1),
            Err(BindingError::Misaligned { bias: 2, align: 4 })
        );
        assert_eq!(
            pad.read64(4),
            Err(BindingError::Misaligned { bias: 4, align: 8 })
        );
        assert!(pad.read256(8).is_ok());
    }

    #[test]
    fn bram_window_is_eight_kib() {
        let dev = FakeDevice::<8>::new(BASE);
        let pad = Scratchpad::bram(&dev, BASE);
        assert_eq!(pad.size(), 8192);
        assert_eq!(
            pad.read32(8192),
            Err(BindingError::OutOfWindow { bias: 8192, width: 4 })
        );
    }
}
