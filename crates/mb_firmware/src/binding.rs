//! C ABI exported to the vendor board-support code.
//!
//! These symbols replace the hand-written C binding of earlier bitstreams.
//! The bitstream the image is linked for is chosen with a cargo feature:
//!
//! * `micro_blossom`: the native timer and hardware description come from
//!   the Micro Blossom register block.
//! * `axi4_timer`: the native timer is the standalone AXI4 timer.
//! * `bram_speed`: no fabric timer; time is taken from the BSP's generic
//!   timer, which wraps at 32 bits. The BRAM test window is exported.
//!
//! Each function builds its accessor on the spot from the fixed address map,
//! so there is no global state to initialise before the first call.

use mb_core::clock::NativeClock;
use mb_core::console::ConsoleSink;

use crate::console::Putchar;

#[cfg(any(
    all(feature = "micro_blossom", feature = "axi4_timer"),
    all(feature = "micro_blossom", feature = "bram_speed"),
    all(feature = "axi4_timer", feature = "bram_speed"),
))]
compile_error!("select exactly one of the micro_blossom, axi4_timer and bram_speed features");

#[cfg(not(any(feature = "micro_blossom", feature = "axi4_timer", feature = "bram_speed")))]
compile_error!("select one of the micro_blossom, axi4_timer and bram_speed features");

#[cfg(feature = "micro_blossom")]
/// Address map of the bitstream this image is linked for.
pub mod image {
    use mb_common::{HardwareInfo, mmio, regs};
    use mb_core::MicroBlossom;
    use mb_core::clock::CounterClock;
    use mb_core::io::Mmio;

    #[inline(always)]
    pub fn micro_blossom() -> MicroBlossom<Mmio> {
        // SAFETY: the micro_blossom feature is only enabled for images of
        // bitstreams that place the register block at UB_BASE.
        unsafe { MicroBlossom::at_default_base() }
    }

    #[inline(always)]
    pub fn native_clock() -> CounterClock<Mmio> {
        // SAFETY: as above; the timer is the first register of the block.
        CounterClock::fabric(unsafe { Mmio::new() }, mmio::UB_BASE + regs::NATIVE_TIME)
    }

    #[unsafe(no_mangle)]
    pub extern "C" fn get_hardware_info() -> HardwareInfo {
        micro_blossom().get_hardware_info()
    }
}

#[cfg(feature = "axi4_timer")]
/// Address map of the bitstream this image is linked for.
pub mod image {
    use mb_common::mmio;
    use mb_core::clock::CounterClock;
    use mb_core::io::Mmio;

    #[inline(always)]
    pub fn native_clock() -> CounterClock<Mmio> {
        // SAFETY: the axi4_timer bitstream maps its counter at AXI4_TIMER_BASE.
        CounterClock::fabric(unsafe { Mmio::new() }, mmio::AXI4_TIMER_BASE)
    }
}

#[cfg(feature = "bram_speed")]
/// Address map of the bitstream this image is linked for.
pub mod image {
    use mb_common::{mmio, timer};
    use mb_core::clock::{SampledClock, Wrapping32Clock};
    use mb_core::io::Mmio;
    use mb_core::scratch::Scratchpad;

    /// The binding runs on the A72 cores, which reach the BRAM over FPD AXI.
    const BRAM_BASE: usize = mmio::BRAM_BASE_A72;

    unsafe extern "C" {
        fn XTime_GetTime(time: *mut u64);
    }

    fn xtime() -> u64 {
        let mut time = 0u64;
        // SAFETY: XTime_GetTime only writes the 64-bit value behind the pointer.
        unsafe { XTime_GetTime(&mut time) };
        time
    }

    #[inline(always)]
    pub fn native_clock() -> Wrapping32Clock<SampledClock<fn() -> u64>> {
        Wrapping32Clock::new(SampledClock::new(
            xtime as fn() -> u64,
            timer::GENERIC_FREQUENCY_HZ,
        ))
    }

    #[inline(always)]
    pub fn scratchpad() -> Scratchpad<Mmio> {
        // SAFETY: the BRAM test bitstreams map the block RAM at BRAM_BASE; all
        // accesses are bounds-checked against the window before use.
        Scratchpad::bram(unsafe { Mmio::new() }, BRAM_BASE)
    }

    // An invalid bias is a programming error in the caller and halts, like a
    // failed assertion in C would.

    #[unsafe(no_mangle)]
    pub extern "C" fn test_read32(bias: u32) -> u32 {
        match scratchpad().read32(bias as usize) {
            Ok(value) => value,
            Err(e) => panic!("test_read32: {}", e),
        }
    }

    #[unsafe(no_mangle)]
    pub extern "C" fn test_write32(bias: u32, value: u32) {
        if let Err(e) = scratchpad().write32(bias as usize, value) {
            panic!("test_write32: {}", e);
        }
    }

    #[unsafe(no_mangle)]
    pub extern "C" fn test_read64(bias: u32) -> u64 {
        match scratchpad().read64(bias as usize) {
            Ok(value) => value,
            Err(e) => panic!("test_read64: {}", e),
        }
    }

    #[unsafe(no_mangle)]
    pub extern "C" fn test_write64(bias: u32, value: u64) {
        if let Err(e) = scratchpad().write64(bias as usize, value) {
            panic!("test_write64: {}", e);
        }
    }

    /// Copies 16 bytes of the window into `values`.
    ///
    /// # Safety
    ///
    /// `values` must point to writable storage for two `u64`.
    #[unsafe(no_mangle)]
    pub unsafe extern "C" fn test_read128(bias: u32, values: *mut [u64; 2]) {
        match scratchpad().read128(bias as usize) {
            // SAFETY: forwarded to the caller.
            Ok(words) => unsafe { values.write(words) },
            Err(e) => panic!("test_read128: {}", e),
        }
    }

    /// Copies 32 bytes of the window into `values`.
    ///
    /// # Safety
    ///
    /// `values` must point to writable storage for four `u64`.
    #[unsafe(no_mangle)]
    pub unsafe extern "C" fn test_read256(bias: u32, values: *mut [u64; 4]) {
        match scratchpad().read256(bias as usize) {
            // SAFETY: forwarded to the caller.
            Ok(words) => unsafe { values.write(words) },
            Err(e) => panic!("test_read256: {}", e),
        }
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn print_char(c: u8) {
    Putchar.print_char(c);
}

#[unsafe(no_mangle)]
pub extern "C" fn get_native_time() -> u64 {
    image::native_clock().now()
}

/// Elapsed seconds between two native timestamps.
///
/// May lose precision for very long intervals because the result is `float`.
/// On `bram_speed` images one wrap of the 32-bit counter is tolerated.
#[unsafe(no_mangle)]
pub extern "C" fn diff_native_time(start: u64, end: u64) -> f32 {
    image::native_clock().elapsed(start, end)
}
