//! Micro Blossom register accessor.
//!
//! Performs the fixed-offset reads that firmware needs from the accelerator's
//! register block: the native timer and the static hardware description.
//! The accessor holds no state besides its register reader and base address,
//! so every call reflects the registers at the moment of the call.

use mb_common::{HardwareInfo, mmio, regs, timer};

use crate::io::{Mmio, RegisterIo};

/// Converts a pair of native timer samples into elapsed seconds.
///
/// Assumes `end` was sampled after `start`. A 64-bit counter at 200 MHz
/// needs close to three thousand years to wrap, so wraparound is not
/// detected; the subtraction follows unsigned machine semantics.
#[inline]
pub fn diff_native_time(start: u64, end: u64) -> f32 {
    end.wrapping_sub(start) as f32 / timer::FREQUENCY_HZ as f32
}

/// Handle to one Micro Blossom register block.
///
/// Generic over the register reader so the same code runs on bare metal
/// ([`Mmio`]), through a host mapping, or against a fake device in tests.
#[derive(Debug, Clone, Copy)]
pub struct MicroBlossom<R> {
    io: R,
    base: usize,
}

impl MicroBlossom<Mmio> {
    /// Returns an accessor for the register block at [`mmio::UB_BASE`].
    ///
    /// # Safety
    ///
    /// The Micro Blossom bitstream must be loaded and its register block must
    /// be mapped at `UB_BASE` in the current address space.
    pub unsafe fn at_default_base() -> Self {
        // SAFETY: forwarded to the caller.
        Self::new(unsafe { Mmio::new() }, mmio::UB_BASE)
    }
}

impl<R: RegisterIo> MicroBlossom<R> {
    /// Creates an accessor for the register block starting at `base`.
    pub const fn new(io: R, base: usize) -> Self {
        Self { io, base }
    }

    /// Base address of the register block.
    pub fn base(&self) -> usize {
        self.base
    }

    /// Register reader used by this accessor.
    pub fn io(&self) -> &R {
        &self.io
    }

    /// Reads the raw 64-bit native timer counter.
    #[inline]
    pub fn get_native_time(&self) -> u64 {
        self.io.read64(self.base + regs::NATIVE_TIME)
    }

    /// Converts two native timestamps into elapsed seconds.
    ///
    /// Same as the free function [`diff_native_time`]; provided on the
    /// accessor for call sites that only hold the handle.
    #[inline]
    pub fn diff_native_time(&self, start: u64, end: u64) -> f32 {
        diff_native_time(start, end)
    }

    /// Reads the static hardware description.
    ///
    /// Issues three independent reads. They are not atomic with respect to
    /// each other, which is harmless because the gateware never changes
    /// these registers after configuration.
    pub fn get_hardware_info(&self) -> HardwareInfo {
        HardwareInfo {
            version: self.io.read32(self.base + regs::VERSION),
            context_depth: self.io.read32(self.base + regs::CONTEXT_DEPTH),
            obstacle_channels: self.io.read8(self.base + regs::OBSTACLE_CHANNELS),
        }
    }
}
