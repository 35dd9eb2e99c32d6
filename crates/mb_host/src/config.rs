//! Board profile files.
//!
//! A profile file describes a bitstream's address map in TOML, for boards or
//! bitstream revisions without a built-in preset:
//!
//! ```toml
//! name = "vmk180-micro-blossom-rev2"
//! registers = 0x4_0000_0000
//!
//! [timer]
//! addr = 0x4_0000_0000
//! frequency = 200_000_000
//! width = 64
//!
//! [scratch]
//! base = 0xA400_0000
//! size = 8192
//! ```
//!
//! A timer without a register address is declared with `system = true` and
//! is sampled from the processor's generic timer.

use std::path::{Path, PathBuf};

use mb_common::{mmio, timer};
use mb_core::board::{BoardProfile, ScratchSpec, TimerSource, TimerSpec, TimerWidth};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid profile: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("timer width must be 32 or 64, got {0}")]
    TimerWidth(u8),
    #[error("timer needs exactly one of `addr` or `system = true`")]
    TimerSource,
    #[error("timer frequency must be non-zero")]
    ZeroFrequency,
    #[error("scratchpad size must be non-zero")]
    EmptyScratch,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimerConfig {
    #[serde(default)]
    pub addr: Option<usize>,
    #[serde(default)]
    pub system: bool,
    #[serde(default = "default_frequency")]
    pub frequency: u32,
    #[serde(default = "default_width")]
    pub width: u8,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScratchConfig {
    pub base: usize,
    #[serde(default = "default_scratch_size")]
    pub size: usize,
}

/// Contents of a profile file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoardConfig {
    pub name: String,
    #[serde(default)]
    pub registers: Option<usize>,
    #[serde(default)]
    pub timer: Option<TimerConfig>,
    #[serde(default)]
    pub scratch: Option<ScratchConfig>,
}

fn default_frequency() -> u32 {
    timer::FREQUENCY_HZ
}

fn default_width() -> u8 {
    64
}

fn default_scratch_size() -> usize {
    mmio::BRAM_SIZE
}

impl BoardConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Validates the file and returns the profile it describes.
    pub fn profile(&self) -> Result<BoardProfile<'_>, ConfigError> {
        let timer = match &self.timer {
            Some(t) => {
                let source = match (t.addr, t.system) {
                    (Some(addr), false) => TimerSource::Register(addr),
                    (None, true) => TimerSource::System,
                    _ => return Err(ConfigError::TimerSource),
                };
                let width = match t.width {
                    64 => TimerWidth::Bits64,
                    32 => TimerWidth::Bits32,
                    other => return Err(ConfigError::TimerWidth(other)),
                };
                if t.frequency == 0 {
                    return Err(ConfigError::ZeroFrequency);
                }
                Some(TimerSpec {
                    source,
                    frequency: t.frequency,
                    width,
                })
            }
            None => None,
        };
        let scratch = match &self.scratch {
            Some(s) if s.size == 0 => return Err(ConfigError::EmptyScratch),
            Some(s) => Some(ScratchSpec {
                base: s.base,
                size: s.size,
            }),
            None => None,
        };
        Ok(BoardProfile {
            name: &self.name,
            registers: self.registers,
            timer,
            scratch,
        })
    }
}
