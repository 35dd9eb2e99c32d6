//! Console output for firmware debugging.
//!
//! Characters go straight to the C runtime's `putchar`, which the vendor
//! board-support package routes to the PS UART. There is no buffering and
//! no locking: the binding runs on a single core.

use core::fmt;

use mb_core::console::{ConsoleSink, ConsoleWriter};

unsafe extern "C" {
    /// Standard C character output provided by the BSP's libc.
    fn putchar(c: i32) -> i32;
}

/// The platform console primitive.
pub struct Putchar;

impl ConsoleSink for Putchar {
    #[inline]
    fn print_char(&self, c: u8) {
        // SAFETY: putchar has no preconditions; the return value is ignored
        // because the UART driver never reports failure.
        unsafe {
            putchar(c as i32);
        }
    }
}

/// Internal function for printing formatted arguments.
///
/// Called by the println! macro; not meant to be called directly.
#[doc(hidden)]
pub fn _print(args: fmt::Arguments) {
    use fmt::Write;
    let _ = ConsoleWriter(Putchar).write_fmt(args);
}

/// Prints a formatted line to the console.
///
/// # Example
///
/// ```ignore
/// println!("Value: {}", 42);
/// ```
#[macro_export]
macro_rules! println {
    ($($arg:tt)*) => ({
        $crate::console::_print(format_args!($($arg)*));
        $crate::console::_print(format_args!("\n"));
    });
}
pub use println;
