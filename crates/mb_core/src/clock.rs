//! Native timer sources.
//!
//! Boards expose different free-running counters: the Micro Blossom and AXI4
//! timer bitstreams provide a 64-bit counter at 200 MHz, while designs without
//! a fabric timer fall back to the processor's generic timer, which only
//! delivers 32 significant bits. [`NativeClock`] hides the difference from
//! the benchmarking code.

use mb_common::timer;

use crate::io::RegisterIo;

/// A free-running tick counter.
pub trait NativeClock {
    /// Samples the counter.
    fn now(&self) -> u64;

    /// Counter frequency in ticks per second.
    fn frequency(&self) -> u32;

    /// Ticks between two samples, `end` taken after `start`.
    fn ticks_between(&self, start: u64, end: u64) -> u64 {
        end.wrapping_sub(start)
    }

    /// Seconds between two samples, `end` taken after `start`.
    fn elapsed(&self, start: u64, end: u64) -> f32 {
        self.ticks_between(start, end) as f32 / self.frequency() as f32
    }
}

/// 64-bit counter register read through a [`RegisterIo`].
#[derive(Debug, Clone, Copy)]
pub struct CounterClock<R> {
    io: R,
    addr: usize,
    frequency: u32,
}

impl<R: RegisterIo> CounterClock<R> {
    /// Counter at `addr` ticking at `frequency` Hz.
    pub const fn new(io: R, addr: usize, frequency: u32) -> Self {
        Self {
            io,
            addr,
            frequency,
        }
    }

    /// Fabric timer at `addr` running at the standard 200 MHz.
    pub const fn fabric(io: R, addr: usize) -> Self {
        Self::new(io, addr, timer::FREQUENCY_HZ)
    }
}

impl<R: RegisterIo> NativeClock for CounterClock<R> {
    #[inline]
    fn now(&self) -> u64 {
        self.io.read64(self.addr)
    }

    fn frequency(&self) -> u32 {
        self.frequency
    }
}

/// Counter sampled through a function instead of a register.
///
/// Covers timers that are not memory-mapped, such as the processor's generic
/// timer read through a board-support routine or a system register.
#[derive(Debug, Clone, Copy)]
pub struct SampledClock<F> {
    sample: F,
    frequency: u32,
}

impl<F: Fn() -> u64> SampledClock<F> {
    /// Counter returned by `sample`, ticking at `frequency` Hz.
    pub const fn new(sample: F, frequency: u32) -> Self {
        Self { sample, frequency }
    }
}

impl<F: Fn() -> u64> NativeClock for SampledClock<F> {
    #[inline]
    fn now(&self) -> u64 {
        (self.sample)()
    }

    fn frequency(&self) -> u32 {
        self.frequency
    }
}

/// Counter whose value wraps at 32 bits despite being read as 64 bits.
///
/// The generic timer behind the standalone BSP only keeps 32 significant
/// bits. Samples are truncated to 32 bits before differencing, so an
/// interval in which the counter wrapped once is still measured correctly;
/// longer intervals are not.
#[derive(Debug, Clone, Copy)]
pub struct Wrapping32Clock<C> {
    inner: C,
}

impl<C: NativeClock> Wrapping32Clock<C> {
    /// Treats `inner` as a 32-bit counter.
    pub const fn new(inner: C) -> Self {
        Self { inner }
    }
}

impl<C: NativeClock> NativeClock for Wrapping32Clock<C> {
    fn now(&self) -> u64 {
        self.inner.now()
    }

    fn frequency(&self) -> u32 {
        self.inner.frequency()
    }

    /// Ticks between two samples, assuming at most one wrap in between.
    ///
    /// A wrapped interval is `(u32::MAX - start) + end`, the same count the
    /// BSP's unsigned arithmetic produces, so it is one tick short of the
    /// exact modular distance.
    fn ticks_between(&self, start: u64, end: u64) -> u64 {
        let start = start as u32 as u64;
        let end = end as u32 as u64;
        if end < start {
            (u32::MAX as u64).wrapping_sub(start).wrapping_add(end)
        } else {
            end - start
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeDevice;

    #[test]
    fn fabric_clock_reads_counter() {
        let dev = FakeDevice::<8>::new(0xA400_0000);
        dev.poke64(0xA400_0000, 42);
        let clock = CounterClock::fabric(&dev, 0xA400_0000);

        assert_eq!(clock.now(), 42);
        assert_eq!(clock.frequency(), 200_000_000);
        assert_eq!(clock.elapsed(0, 400_000_000), 2.0);
    }

    #[test]
    fn wrapping_clock_handles_single_wrap() {
        let dev = FakeDevice::<8>::new(0);
        let clock = Wrapping32Clock::new(CounterClock::new(&dev, 0, 100_000_000));
        let start = u32::MAX as u64 - 10;

        assert_eq!(clock.ticks_between(start, 5), 15);
        assert_eq!(clock.ticks_between(5, 25), 20);
    }

    #[test]
    fn wrapping_clock_ignores_bits_above_32() {
        let dev = FakeDevice::<8>::new(0);
        let clock = Wrapping32Clock::new(CounterClock::new(&dev, 0, 100_000_000));
        let high = 1u64 << 32;

        // start above u32::MAX truncates to 9, end wrapped past it
        assert_eq!(clock.ticks_between(u32::MAX as u64 + 10, 5), u32::MAX as u64 - 4);
        assert_eq!(clock.ticks_between(high + 5, high + 25), 20);
        assert_eq!(clock.ticks_between(u64::MAX, 0), 0);
    }

    #[test]
    fn wrapping_clock_converts_with_its_frequency() {
        let dev = FakeDevice::<8>::new(0);
        let clock = Wrapping32Clock::new(CounterClock::new(&dev, 0, 100_000_000));
        assert_eq!(clock.elapsed(0, 50_000_000), 0.5);
    }

    #[test]
    fn sampled_clock_reads_through_function() {
        let counter = core::cell::Cell::new(u32::MAX as u64 - 99);
        let clock = Wrapping32Clock::new(SampledClock::new(
            || {
                let now = counter.get();
                counter.set(now + 200);
                now & u32::MAX as u64
            },
            100_000_000,
        ));

        let start = clock.now();
        let end = clock.now();
        assert_eq!(end, 100);
        assert_eq!(clock.ticks_between(start, end), 199);
        assert_eq!(clock.frequency(), 100_000_000);
    }
}
