//! Bare-metal binding between the Micro Blossom accelerator and the vendor BSP.
//!
//! Built as a static library and linked into the standalone application
//! produced by Vitis. The C side provides `main`, the libc console, and a
//! call into [`rust_main`]; this library provides the register binding the
//! decoder firmware calls into.

#![no_std]

use panic_halt as _;

pub mod binding;
pub mod console;

use mb_core::clock::NativeClock;

use crate::binding::image;

/// Iterations of the calibration loop timed by the self-test.
const CALIBRATION_LOOPS: u32 = 1_000_000;

/// Firmware entry point called by the C `main`.
///
/// Reports the accelerator description and times a fixed busy loop with the
/// native timer, so a bring-up log immediately shows whether the bitstream
/// and the timer frequency are the expected ones.
#[unsafe(no_mangle)]
pub extern "C" fn rust_main() {
    console::println!("[BOOT] Micro Blossom binding online");

    #[cfg(feature = "micro_blossom")]
    {
        let info = image::micro_blossom().get_hardware_info();
        console::println!("[INFO] version: {:#010x}", info.version);
        console::println!("[INFO] context depth: {}", info.context_depth);
        console::println!("[INFO] obstacle channels: {}", info.obstacle_channels);
    }

    let clock = image::native_clock();
    let start = clock.now();
    let mut acc = 0u32;
    for i in 0..CALIBRATION_LOOPS {
        acc = core::hint::black_box(acc.wrapping_add(i));
    }
    let end = clock.now();

    console::println!(
        "[TIMER] {} loops took {} ticks ({:.6} s at {} Hz)",
        CALIBRATION_LOOPS,
        clock.ticks_between(start, end),
        clock.elapsed(start, end),
        clock.frequency()
    );
    if end == start {
        console::println!("[TIMER] native timer is not counting");
    }
}
