//! Simulated board for running the tools without hardware.
//!
//! Serves the register block, timer, and scratchpad of a board profile from
//! memory. The timer advances with the host's monotonic clock at the
//! profile's native frequency so timing commands produce meaningful output.

use std::time::Instant;

use anyhow::{Result, bail};
use mb_common::{HardwareInfo, regs};
use mb_core::board::{BoardProfile, TimerSource, TimerSpec, TimerWidth};
use mb_core::fake::FakeDevice;
use mb_core::io::RegisterIo;

use crate::target::Target;

/// Hardware description reported by the simulated accelerator.
pub const SIM_INFO: HardwareInfo = HardwareInfo {
    version: 0x2024_0101,
    context_depth: 1,
    obstacle_channels: 1,
};

/// Scratchpad memory is allocated in blocks of one standard BRAM.
const CHUNK: usize = mb_common::mmio::BRAM_SIZE;

/// Largest scratchpad window the simulation will allocate.
pub const SCRATCH_LIMIT: usize = 1 << 20;

/// Simulated scratchpad window made of BRAM-sized blocks.
struct SimScratch {
    base: usize,
    size: usize,
    chunks: Vec<Box<FakeDevice<CHUNK>>>,
}

impl SimScratch {
    fn new(base: usize, size: usize) -> Self {
        let chunks = (0..size.div_ceil(CHUNK))
            .map(|i| Box::new(FakeDevice::new(base + i * CHUNK)))
            .collect();
        Self { base, size, chunks }
    }

    fn device(&self, addr: usize, width: usize) -> Option<&FakeDevice<CHUNK>> {
        if addr < self.base || addr + width > self.base + self.size {
            return None;
        }
        let offset = addr - self.base;
        // an access may not straddle two blocks
        if offset % CHUNK + width > CHUNK {
            return None;
        }
        self.chunks.get(offset / CHUNK).map(|chunk| &**chunk)
    }
}

pub struct SimBoard {
    started: Instant,
    timer: Option<TimerSpec>,
    registers: Option<FakeDevice<{ regs::BLOCK_SIZE }>>,
    scratch: Option<SimScratch>,
}

impl SimBoard {
    /// Builds a simulated board with the address map of `profile`.
    ///
    /// The scratchpad is backed by memory of the size the profile declares,
    /// up to [`SCRATCH_LIMIT`] bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile's scratchpad exceeds [`SCRATCH_LIMIT`].
    pub fn new(profile: &BoardProfile<'_>) -> Result<Self> {
        let registers = profile.registers.map(|base| {
            let dev = FakeDevice::<{ regs::BLOCK_SIZE }>::new(base);
            dev.poke32(base + regs::VERSION, SIM_INFO.version);
            dev.poke32(base + regs::CONTEXT_DEPTH, SIM_INFO.context_depth);
            dev.poke8(base + regs::OBSTACLE_CHANNELS, SIM_INFO.obstacle_channels);
            dev
        });
        if let Some(s) = profile.scratch {
            if s.size > SCRATCH_LIMIT {
                bail!(
                    "simulated scratchpad of {} bytes exceeds the {} byte limit",
                    s.size,
                    SCRATCH_LIMIT
                );
            }
        }
        Ok(Self {
            started: Instant::now(),
            timer: profile.timer,
            registers,
            scratch: profile.scratch.map(|s| SimScratch::new(s.base, s.size)),
        })
    }

    fn ticks(&self, frequency: u32, width: TimerWidth) -> u64 {
        let nanos = self.started.elapsed().as_nanos();
        let ticks = (nanos * frequency as u128 / 1_000_000_000) as u64;
        match width {
            TimerWidth::Bits64 => ticks,
            TimerWidth::Bits32 => ticks & u32::MAX as u64,
        }
    }

    fn fake(&self, addr: usize, width: usize) -> &dyn RegisterIo {
        if let Some(dev) = &self.registers {
            if addr >= dev.base() && addr + width <= dev.base() + regs::BLOCK_SIZE {
                return dev;
            }
        }
        if let Some(dev) = self.scratch.as_ref().and_then(|s| s.device(addr, width)) {
            return dev;
        }
        panic!("simulated access at {addr:#x} outside every register window");
    }
}

impl RegisterIo for SimBoard {
    fn read8(&self, addr: usize) -> u8 {
        self.fake(addr, 1).read8(addr)
    }

    fn read32(&self, addr: usize) -> u32 {
        self.fake(addr, 4).read32(addr)
    }

    fn read64(&self, addr: usize) -> u64 {
        match self.timer {
            Some(TimerSpec {
                source: TimerSource::Register(timer_addr),
                frequency,
                width,
            }) if timer_addr == addr => self.ticks(frequency, width),
            _ => self.fake(addr, 8).read64(addr),
        }
    }

    fn write32(&self, addr: usize, value: u32) {
        self.fake(addr, 4).write32(addr, value)
    }

    fn write64(&self, addr: usize, value: u64) {
        self.fake(addr, 8).write64(addr, value)
    }
}

impl Target for SimBoard {
    fn system_counter(&self) -> Option<u64> {
        match self.timer {
            Some(TimerSpec {
                source: TimerSource::System,
                frequency,
                width,
            }) => Some(self.ticks(frequency, width)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mb_core::MicroBlossom;
    use mb_core::board::{self, ScratchSpec};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn reports_sim_hardware_info() {
        let sim = SimBoard::new(&board::DEFAULT).unwrap();
        let ub = MicroBlossom::new(&sim, mb_common::mmio::UB_BASE);
        assert_eq!(ub.get_hardware_info(), SIM_INFO);
    }

    #[test]
    fn timer_advances_with_host_time() {
        let sim = SimBoard::new(&board::DEFAULT).unwrap();
        let ub = MicroBlossom::new(&sim, mb_common::mmio::UB_BASE);

        let start = ub.get_native_time();
        thread::sleep(Duration::from_millis(20));
        let end = ub.get_native_time();

        assert!(ub.diff_native_time(start, end) >= 0.019);
    }

    #[test]
    fn scratchpad_is_backed_by_memory() {
        let profile = board::preset("vmk180-bram-a72").unwrap();
        let sim = SimBoard::new(&profile).unwrap();
        sim.write64(0xA400_0010, 0xABCD);
        assert_eq!(sim.read64(0xA400_0010), 0xABCD);
    }

    #[test]
    fn scratchpad_follows_profile_size() {
        let profile = BoardProfile {
            name: "bram-16k",
            registers: None,
            timer: None,
            scratch: Some(ScratchSpec {
                base: 0x8000_0000,
                size: 16384,
            }),
        };
        let sim = SimBoard::new(&profile).unwrap();

        sim.write64(0x8000_2000, 7);
        sim.write32(0x8000_3FFC, 9);
        assert_eq!(sim.read64(0x8000_2000), 7);
        assert_eq!(sim.read32(0x8000_3FFC), 9);
        assert_eq!(sim.read64(0x8000_0000), 0);
    }

    #[test]
    fn oversized_scratchpad_is_rejected() {
        let profile = BoardProfile {
            name: "huge",
            registers: None,
            timer: None,
            scratch: Some(ScratchSpec {
                base: 0,
                size: SCRATCH_LIMIT + 8,
            }),
        };
        let err = SimBoard::new(&profile).err().unwrap();
        assert!(err.to_string().contains("exceeds"));
    }

    #[test]
    fn system_counter_only_for_system_timers() {
        let bram = board::preset("vmk180-bram-a72").unwrap();
        let sim = SimBoard::new(&bram).unwrap();
        assert!(sim.system_counter().unwrap() <= u32::MAX as u64);

        let ub = SimBoard::new(&board::DEFAULT).unwrap();
        assert_eq!(ub.system_counter(), None);
    }
}
