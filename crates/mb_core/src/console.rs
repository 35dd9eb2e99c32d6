//! Character console plumbing.
//!
//! The platform provides a single primitive that emits one character. This
//! module wraps it so formatted output can be produced with `write!` without
//! any buffering between the formatter and the device.

use core::cell::Cell;
use core::fmt;

/// Platform console primitive.
pub trait ConsoleSink {
    /// Emits one character. Never fails and never buffers.
    fn print_char(&self, c: u8);
}

impl<T: ConsoleSink + ?Sized> ConsoleSink for &T {
    fn print_char(&self, c: u8) {
        (**self).print_char(c)
    }
}

/// Adapts a [`ConsoleSink`] to [`fmt::Write`].
///
/// Forwards every byte of the formatted output as it is produced.
pub struct ConsoleWriter<C>(pub C);

impl<C: ConsoleSink> fmt::Write for ConsoleWriter<C> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.bytes() {
            self.0.print_char(c);
        }
        Ok(())
    }
}

/// Console that records output into a fixed buffer.
///
/// Characters beyond the capacity are counted but dropped.
pub struct CaptureConsole<const N: usize> {
    buf: [Cell<u8>; N],
    len: Cell<usize>,
}

impl<const N: usize> Default for CaptureConsole<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> CaptureConsole<N> {
    pub const fn new() -> Self {
        Self {
            buf: [const { Cell::new(0) }; N],
            len: Cell::new(0),
        }
    }

    /// Number of characters printed, including dropped ones.
    pub fn printed(&self) -> usize {
        self.len.get()
    }

    /// Copies the retained characters into `out`, returning how many were copied.
    pub fn copy_to(&self, out: &mut [u8]) -> usize {
        let kept = self.len.get().min(N).min(out.len());
        for (dst, cell) in out.iter_mut().zip(&self.buf[..kept]) {
            *dst = cell.get();
        }
        kept
    }

    pub fn clear(&self) {
        self.len.set(0);
    }
}

impl<const N: usize> ConsoleSink for CaptureConsole<N> {
    fn print_char(&self, c: u8) {
        let len = self.len.get();
        if len < N {
            self.buf[len].set(c);
        }
        self.len.set(len + 1);
    }
}
