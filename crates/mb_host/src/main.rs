mod commands;
mod config;
mod devmem;
mod sim;
mod stats;
mod target;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mb_core::board::{self, BoardProfile, TimerSource};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::commands::BenchTarget;
use crate::config::BoardConfig;
use crate::devmem::DevMem;
use crate::sim::SimBoard;
use crate::target::Target;

#[derive(Parser)]
#[command(version, about = "Probe the Micro Blossom register binding from Linux")]
struct Cli {
    /// Built-in board profile.
    #[arg(long, default_value = board::DEFAULT.name, conflicts_with = "config")]
    board: String,

    /// Board profile file (TOML) overriding the built-in presets.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Device node exposing physical memory.
    #[arg(long, default_value = "/dev/mem")]
    device: PathBuf,

    /// Run against an in-memory simulation of the board.
    #[arg(long)]
    sim: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the accelerator's hardware description.
    Info,
    /// Compare the native timer against host time.
    Time {
        #[arg(long, default_value_t = 1000)]
        millis: u64,
    },
    /// Measure register read latency.
    Bench {
        #[arg(long, value_enum, default_value_t = BenchTarget::Timer)]
        target: BenchTarget,
        #[arg(short = 'n', long, default_value_t = 100_000)]
        iterations: u64,
    },
    /// Write and verify a pattern across the scratchpad window.
    Scratch {
        #[arg(long, default_value_t = 0x5A5A_A5A5_0F0F_F0F0)]
        seed: u64,
    },
    /// List the built-in board profiles.
    Boards,
}

fn setup_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::from_default_env().add_directive(level.into());
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Physical windows the commands may touch.
fn windows(profile: &BoardProfile<'_>) -> Vec<(usize, usize)> {
    let mut windows = Vec::new();
    if let Some(base) = profile.registers {
        windows.push((base, mb_common::regs::BLOCK_SIZE));
    }
    if let Some(TimerSource::Register(addr)) = profile.timer.map(|t| t.source) {
        let covered = windows
            .iter()
            .any(|&(base, len)| addr >= base && addr + 8 <= base + len);
        if !covered {
            windows.push((addr, 8));
        }
    }
    if let Some(scratch) = profile.scratch {
        windows.push((scratch.base, scratch.size));
    }
    windows
}

fn run(cli: &Cli, profile: &BoardProfile<'_>) -> Result<()> {
    let io: Box<dyn Target> = if cli.sim {
        tracing::info!("simulating board '{}'", profile.name);
        Box::new(SimBoard::new(profile)?)
    } else {
        Box::new(DevMem::open(&cli.device, &windows(profile))?)
    };
    let io = &*io;

    match &cli.command {
        Commands::Info => commands::info(io, profile),
        Commands::Time { millis } => commands::time(io, profile, Duration::from_millis(*millis)),
        Commands::Bench { target, iterations } => {
            commands::bench(io, profile, *target, *iterations)
        }
        Commands::Scratch { seed } => commands::scratch(io, profile, *seed),
        Commands::Boards => unreachable!("handled before opening the device"),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    if let Commands::Boards = cli.command {
        for preset in board::PRESETS {
            println!("{}", preset.name);
        }
        return Ok(());
    }

    match &cli.config {
        Some(path) => {
            let config = BoardConfig::load(path)?;
            let profile = config
                .profile()
                .with_context(|| format!("invalid profile in {}", path.display()))?;
            run(&cli, &profile)
        }
        None => {
            let profile = board::preset(&cli.board)
                .with_context(|| format!("unknown board '{}'", cli.board))?;
            run(&cli, &profile)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn timer_inside_register_block_is_not_mapped_twice() {
        assert_eq!(windows(&board::DEFAULT), vec![(0x4_0000_0000, 24)]);
    }

    #[test]
    fn separate_timer_gets_its_own_window() {
        let profile = board::preset("vmk180-axi4-timer").unwrap();
        assert_eq!(windows(&profile), vec![(0xA400_0000, 8)]);
    }

    #[test]
    fn system_timer_needs_no_window() {
        let profile = board::preset("vmk180-bram-r5").unwrap();
        assert_eq!(windows(&profile), vec![(0x8000_0000, 8192)]);
    }

    #[test]
    fn parses_bench_arguments() {
        let cli = Cli::parse_from([
            "mb_host", "--sim", "bench", "--target", "version", "-n", "10",
        ]);
        assert!(cli.sim);
        assert!(matches!(
            cli.command,
            Commands::Bench {
                target: BenchTarget::Version,
                iterations: 10
            }
        ));
    }
}
