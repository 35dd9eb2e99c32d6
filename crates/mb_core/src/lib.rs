//! Register-level binding for the Micro Blossom FPGA accelerator.
//!
//! This crate provides the typed accessors firmware uses to read the
//! accelerator's native timer and hardware description, together with the
//! supporting timer sources, BRAM scratchpad, and console adapters. All
//! modules are `no_std` and reach hardware only through [`io::RegisterIo`],
//! so they run unchanged on bare metal, through a host mapping, or against
//! the in-memory fake device.

#![cfg_attr(not(test), no_std)]

/// Micro Blossom register accessor.
///
/// Reads the 64-bit native timer and the static hardware description from
/// fixed offsets of the register block, and converts timer samples into
/// elapsed seconds.
pub mod accessor;

/// Address maps of the supported bitstreams.
///
/// Built-in board profiles naming the register blocks, timer, and
/// scratchpad window each bitstream exposes.
pub mod board;

/// Native timer sources.
///
/// Abstracts over the 64-bit fabric timers and the 32-bit processor timer
/// so latency measurements can use whichever counter the board provides.
pub mod clock;

/// Character console adapters.
///
/// Wraps the platform's single-character output primitive for formatted
/// printing, and provides a recording console for tests.
pub mod console;

/// In-memory register block.
///
/// Test double and simulation backend implementing the register reader
/// capability over a byte array.
pub mod fake;

/// Register reader capability.
///
/// Defines the fixed-width read and write primitives every accessor is
/// built on, and the volatile MMIO implementation used on hardware.
pub mod io;

/// BRAM scratchpad accessor.
///
/// Bounds- and alignment-checked reads and writes into the block RAM window
/// of the bus-speed test bitstreams.
pub mod scratch;

pub use accessor::{MicroBlossom, diff_native_time};
pub use mb_common::HardwareInfo;

/// Error types returned by checked binding operations.
///
/// The register accessor itself has no failure modes; faults on the bus are
/// platform traps. Errors only arise where a caller supplies an offset or a
/// board name that the binding can validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingError {
    /// An access would extend past the end of the scratchpad window.
    OutOfWindow {
        /// Byte offset requested by the caller.
        bias: usize,
        /// Width of the access in bytes.
        width: usize,
    },

    /// An access offset is not a multiple of the required alignment.
    Misaligned {
        /// Byte offset requested by the caller.
        bias: usize,
        /// Required alignment in bytes.
        align: usize,
    },

    /// No board profile is known under the requested name.
    UnknownBoard,
}

impl core::fmt::Display for BindingError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::OutOfWindow { bias, width } => {
                write!(f, "{width}-byte access at bias {bias:#x} leaves the window")
            }
            Self::Misaligned { bias, align } => {
                write!(f, "bias {bias:#x} is not {align}-byte aligned")
            }
            Self::UnknownBoard => f.write_str("unknown board profile"),
        }
    }
}

impl core::error::Error for BindingError {}
