//! Address maps of the supported bitstreams.
//!
//! A board profile says which register blocks a given bitstream exposes and
//! where. Host tools select one by name or load an equivalent description
//! from a configuration file.

use mb_common::{mmio, timer};

use crate::BindingError;

/// Width of a native timer counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerWidth {
    /// Full 64-bit counter, wraparound never observed.
    Bits64,
    /// Counter keeps 32 significant bits and wraps.
    Bits32,
}

/// Where a native timer is sampled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerSource {
    /// 64-bit counter register at a physical address.
    Register(usize),
    /// The processor's generic timer, read without touching the bus.
    System,
}

/// Location and rate of a native timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerSpec {
    pub source: TimerSource,
    pub frequency: u32,
    pub width: TimerWidth,
}

/// Location of a BRAM scratchpad window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScratchSpec {
    pub base: usize,
    pub size: usize,
}

/// Address map of one bitstream on one board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardProfile<'a> {
    pub name: &'a str,
    /// Base of the Micro Blossom register block, if the bitstream has one.
    pub registers: Option<usize>,
    pub timer: Option<TimerSpec>,
    pub scratch: Option<ScratchSpec>,
}

const FABRIC_TIMER_HZ: u32 = timer::FREQUENCY_HZ;

// The BRAM test designs have no fabric timer and time with the CPU counter.
const GENERIC_TIMER: TimerSpec = TimerSpec {
    source: TimerSource::System,
    frequency: timer::GENERIC_FREQUENCY_HZ,
    width: TimerWidth::Bits32,
};

/// Built-in profiles.
pub const PRESETS: &[BoardProfile<'static>] = &[
    BoardProfile {
        name: "vmk180-micro-blossom",
        registers: Some(mmio::UB_BASE),
        timer: Some(TimerSpec {
            source: TimerSource::Register(mmio::UB_BASE),
            frequency: FABRIC_TIMER_HZ,
            width: TimerWidth::Bits64,
        }),
        scratch: None,
    },
    BoardProfile {
        name: "vmk180-axi4-timer",
        registers: None,
        timer: Some(TimerSpec {
            source: TimerSource::Register(mmio::AXI4_TIMER_BASE),
            frequency: FABRIC_TIMER_HZ,
            width: TimerWidth::Bits64,
        }),
        scratch: None,
    },
    BoardProfile {
        name: "vmk180-bram-a72",
        registers: None,
        timer: Some(GENERIC_TIMER),
        scratch: Some(ScratchSpec {
            base: mmio::BRAM_BASE_A72,
            size: mmio::BRAM_SIZE,
        }),
    },
    BoardProfile {
        name: "vmk180-bram-r5",
        registers: None,
        timer: Some(GENERIC_TIMER),
        scratch: Some(ScratchSpec {
            base: mmio::BRAM_BASE_R5,
            size: mmio::BRAM_SIZE,
        }),
    },
];

/// Default profile, the full Micro Blossom bitstream.
pub const DEFAULT: BoardProfile<'static> = PRESETS[0];

/// Looks up a built-in profile by name.
pub fn preset(name: &str) -> Result<BoardProfile<'static>, BindingError> {
    PRESETS
        .iter()
        .find(|p| p.name == name)
        .copied()
        .ok_or(BindingError::UnknownBoard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_micro_blossom() {
        assert_eq!(DEFAULT.registers, Some(0x4_0000_0000));
        let timer = DEFAULT.timer.unwrap();
        assert_eq!(timer.source, TimerSource::Register(0x4_0000_0000));
        assert_eq!(timer.frequency, 200_000_000);
    }

    #[test]
    fn lookup_by_name() {
        let bram = preset("vmk180-bram-r5").unwrap();
        assert_eq!(
            bram.scratch,
            Some(ScratchSpec {
                base: 0x8000_0000,
                size: 8192
            })
        );
        assert_eq!(preset("zcu106"), Err(BindingError::UnknownBoard));
    }

    #[test]
    fn bram_boards_time_with_wrapping_system_counter() {
        for name in ["vmk180-bram-a72", "vmk180-bram-r5"] {
            let timer = preset(name).unwrap().timer.unwrap();
            assert_eq!(timer.source, TimerSource::System);
            assert_eq!(timer.width, TimerWidth::Bits32);
            assert_eq!(timer.frequency, 100_000_000);
        }
    }

    #[test]
    fn preset_names_are_unique() {
        for (i, a) in PRESETS.iter().enumerate() {
            for b in &PRESETS[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }
}
