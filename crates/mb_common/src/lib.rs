//! Common definitions shared by the Micro Blossom firmware binding and host tools.
//!
//! This crate provides the physical address map of the supported bitstreams,
//! the register layout of the Micro Blossom register block, and the hardware
//! information record returned to firmware. Nothing here touches hardware;
//! the definitions are consumed by the accessor in `mb_core`, the firmware
//! exports, and the host-side probe.

#![no_std]

#[cfg(not(target_pointer_width = "64"))]
compile_error!("the Micro Blossom register block lies above 4 GiB; build for a 64-bit target");

// Memory-mapped I/O address space definitions for the Versal boards.
//
// Defines the physical addresses of the FPGA register blocks reachable from
// the application cores. These addresses must match the address editor of
// the Vivado block design that produced the bitstream.
pub mod mmio {
    /// Base address of the Micro Blossom register block.
    ///
    /// Located in the high FPD AXI window of the VMK180. The 64-bit native
    /// timer sits at offset 0, followed by the static hardware description
    /// registers.
    pub const UB_BASE: usize = 0x4_0000_0000;

    /// Base address of the standalone AXI4 timer bitstream.
    ///
    /// The timer-only design exposes the same 64-bit free-running counter as
    /// Micro Blossom, but on the low FPD AXI window.
    pub const AXI4_TIMER_BASE: usize = 0xA400_0000;

    /// Base address of the BRAM test window as seen from the R5F cores.
    ///
    /// The real-time cores reach the block RAM through the LPD AXI port.
    pub const BRAM_BASE_R5: usize = 0x8000_0000;

    /// Base address of the BRAM test window as seen from the A72 cores.
    ///
    /// The application cores reach the block RAM through the FPD AXI port.
    pub const BRAM_BASE_A72: usize = 0xA400_0000;

    /// Size in bytes of the BRAM test window.
    pub const BRAM_SIZE: usize = 8192;
}

/// Register layout of the Micro Blossom register block.
///
/// All offsets are in bytes relative to [`mmio::UB_BASE`] (or whatever base
/// the accessor was constructed with). Registers are little-endian.
pub mod regs {
    /// 64-bit free-running native timer counter.
    pub const NATIVE_TIME: usize = 0;

    /// 32-bit hardware version word.
    pub const VERSION: usize = 8;

    /// 32-bit context depth, the number of decoding contexts the
    /// accelerator can hold concurrently.
    pub const CONTEXT_DEPTH: usize = 12;

    /// 8-bit number of obstacle report channels.
    pub const OBSTACLE_CHANNELS: usize = 16;

    /// Number of bytes spanned by the registers above.
    pub const BLOCK_SIZE: usize = 24;
}

/// Native timer definitions.
pub mod timer {
    /// Frequency of the Micro Blossom and AXI4 native timers, in ticks per second.
    pub const FREQUENCY_HZ: u32 = 200_000_000;

    /// Nominal frequency of the processor's generic timer on the Versal PS.
    ///
    /// Used by bitstreams without a fabric timer. The standalone BSP reads
    /// this counter through `XTime_GetTime`, which only returns 32
    /// significant bits.
    pub const GENERIC_FREQUENCY_HZ: u32 = 100_000_000;
}

/// Static description of the Micro Blossom accelerator.
///
/// A snapshot assembled from three independent register reads. The layout is
/// `#[repr(C)]` so the record can be returned by value across the C ABI to
/// the vendor board-support code.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HardwareInfo {
    /// Hardware version word.
    pub version: u32,

    /// Number of decoding contexts supported by the accelerator.
    pub context_depth: u32,

    /// Number of obstacle report channels.
    pub obstacle_channels: u8,
}
