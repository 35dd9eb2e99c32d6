//! Backends the host commands run against.

use mb_core::io::RegisterIo;

/// Register access plus the processor's generic timer.
///
/// The BRAM test bitstreams have no fabric timer, so their latency
/// measurements sample the CPU counter instead of a register. Each backend
/// says whether it can provide that counter.
pub trait Target: RegisterIo {
    /// Samples the generic timer, or `None` if this backend cannot read it.
    fn system_counter(&self) -> Option<u64>;
}
