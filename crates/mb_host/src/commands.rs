//! Implementations of the host tool's subcommands.
//!
//! Every command works on a [`Target`] chosen by `main` (a `/dev/mem`
//! mapping or the simulated board) and the board profile describing where
//! the registers live.

use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use mb_core::{BindingError, MicroBlossom};
use mb_core::board::{BoardProfile, TimerSource, TimerWidth};
use mb_core::clock::{CounterClock, NativeClock, SampledClock, Wrapping32Clock};
use mb_core::scratch::Scratchpad;

use crate::stats::LatencyStats;
use crate::target::Target;

fn clock<'a>(io: &'a dyn Target, profile: &BoardProfile<'_>) -> Result<Box<dyn NativeClock + 'a>> {
    let spec = profile
        .timer
        .with_context(|| format!("board '{}' has no native timer", profile.name))?;
    match spec.source {
        TimerSource::Register(addr) => {
            Ok(with_width(CounterClock::new(io, addr, spec.frequency), spec.width))
        }
        TimerSource::System => {
            if io.system_counter().is_none() {
                bail!("the system counter of board '{}' is not readable here", profile.name);
            }
            // availability does not change over the backend's lifetime
            let counter = SampledClock::new(move || io.system_counter().unwrap_or(0), spec.frequency);
            Ok(with_width(counter, spec.width))
        }
    }
}

fn with_width<'a, C: NativeClock + 'a>(counter: C, width: TimerWidth) -> Box<dyn NativeClock + 'a> {
    match width {
        TimerWidth::Bits64 => Box::new(counter),
        TimerWidth::Bits32 => Box::new(Wrapping32Clock::new(counter)),
    }
}

fn accessor<'a>(
    io: &'a dyn Target,
    profile: &BoardProfile<'_>,
) -> Result<MicroBlossom<&'a dyn Target>> {
    let base = profile
        .registers
        .with_context(|| format!("board '{}' has no Micro Blossom registers", profile.name))?;
    Ok(MicroBlossom::new(io, base))
}

fn scratchpad<'a>(
    io: &'a dyn Target,
    profile: &BoardProfile<'_>,
) -> Result<Scratchpad<&'a dyn Target>> {
    let spec = profile
        .scratch
        .with_context(|| format!("board '{}' has no scratchpad window", profile.name))?;
    Ok(Scratchpad::new(io, spec.base, spec.size))
}

/// Prints the accelerator's hardware description.
pub fn info(io: &dyn Target, profile: &BoardProfile<'_>) -> Result<()> {
    let ub = accessor(io, profile)?;
    let info = ub.get_hardware_info();
    tracing::debug!("hardware info read from {:#x}", ub.base());

    println!("Board:             {}", profile.name);
    println!("Version:           {:#010x}", info.version);
    println!("Context depth:     {}", info.context_depth);
    println!("Obstacle channels: {}", info.obstacle_channels);
    Ok(())
}

/// Samples the native timer across a host sleep and compares the two clocks.
pub fn time(io: &dyn Target, profile: &BoardProfile<'_>, interval: Duration) -> Result<()> {
    let clock = clock(io, profile)?;

    let host_start = Instant::now();
    let start = clock.now();
    thread::sleep(interval);
    let end = clock.now();
    let host_elapsed = host_start.elapsed().as_secs_f64();

    let native = clock.elapsed(start, end);
    println!(
        "Native ticks: {} -> {} ({} ticks)",
        start,
        end,
        clock.ticks_between(start, end)
    );
    println!("Native time:  {:.6} s", native);
    println!("Host time:    {:.6} s", host_elapsed);

    let ratio = native as f64 / host_elapsed;
    if !(0.9..=1.1).contains(&ratio) {
        tracing::warn!(
            "native timer runs at {:.3}x host time; check the {} Hz frequency",
            ratio,
            clock.frequency()
        );
    }
    Ok(())
}

/// Register read under test in `bench`.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum BenchTarget {
    /// 64-bit native timer register.
    Timer,
    /// 32-bit version register.
    Version,
    /// 64-bit scratchpad word.
    Scratch,
}

/// Measures the latency of repeated register reads in native ticks.
pub fn bench(
    io: &dyn Target,
    profile: &BoardProfile<'_>,
    target: BenchTarget,
    iterations: u64,
) -> Result<()> {
    if iterations == 0 {
        bail!("iterations must be positive");
    }
    let clock = clock(io, profile)?;
    let read: Box<dyn Fn() -> Result<u64, BindingError> + '_> = match target {
        BenchTarget::Timer => Box::new(|| Ok(clock.now())),
        BenchTarget::Version => {
            let ub = accessor(io, profile)?;
            Box::new(move || Ok(ub.get_hardware_info().version as u64))
        }
        BenchTarget::Scratch => {
            let pad = scratchpad(io, profile)?;
            Box::new(move || pad.read64(0))
        }
    };

    // the empty interval is the overhead of sampling the clock twice
    let mut overhead = u64::MAX;
    for _ in 0..16 {
        let a = clock.now();
        let b = clock.now();
        overhead = overhead.min(clock.ticks_between(a, b));
    }
    tracing::info!("timer sampling overhead: {} ticks", overhead);

    let mut stats = LatencyStats::new(1);
    for _ in 0..iterations {
        let start = clock.now();
        let value = read().with_context(|| format!("{:?} read on board '{}'", target, profile.name))?;
        std::hint::black_box(value);
        let end = clock.now();
        stats.update(clock.ticks_between(start, end).saturating_sub(overhead));
    }
    stats.print_report(clock.frequency());
    Ok(())
}

/// Writes a pattern across the scratchpad and reads it back.
pub fn scratch(io: &dyn Target, profile: &BoardProfile<'_>, seed: u64) -> Result<()> {
    let pad = scratchpad(io, profile)?;
    let words = pad.size() / 8;
    let pattern = |i: usize| seed ^ (i as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);

    for i in 0..words {
        pad.write64(i * 8, pattern(i))?;
    }
    let mut mismatches = 0usize;
    for i in 0..words {
        let got = pad.read64(i * 8)?;
        if got != pattern(i) {
            if mismatches < 8 {
                tracing::error!(
                    "bias {:#06x}: wrote {:#018x}, read {:#018x}",
                    i * 8,
                    pattern(i),
                    got
                );
            }
            mismatches += 1;
        }
    }
    // 32-bit lanes must see the same bytes as the 64-bit writes
    let low = pad.read32(0)?;
    if low != pattern(0) as u32 {
        tracing::error!("32-bit read of bias 0 returned {:#010x}", low);
        mismatches += 1;
    }

    println!("Scratchpad: {} words checked, {} mismatches", words, mismatches);
    if mismatches > 0 {
        bail!("scratchpad verification failed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimBoard;
    use mb_core::board::{self, ScratchSpec, TimerSpec};

    #[test]
    fn commands_run_on_simulated_micro_blossom() {
        let sim = SimBoard::new(&board::DEFAULT).unwrap();
        info(&sim, &board::DEFAULT).unwrap();
        time(&sim, &board::DEFAULT, Duration::from_millis(5)).unwrap();
        bench(&sim, &board::DEFAULT, BenchTarget::Version, 100).unwrap();
    }

    #[test]
    fn scratch_verifies_on_simulated_bram() {
        let profile = board::preset("vmk180-bram-a72").unwrap();
        let sim = SimBoard::new(&profile).unwrap();
        scratch(&sim, &profile, 0x1234).unwrap();
    }

    #[test]
    fn bench_reads_simulated_bram_with_system_counter() {
        let profile = board::preset("vmk180-bram-a72").unwrap();
        let sim = SimBoard::new(&profile).unwrap();
        bench(&sim, &profile, BenchTarget::Scratch, 100).unwrap();
        time(&sim, &profile, Duration::from_millis(5)).unwrap();
    }

    #[test]
    fn bench_rejects_scratchpad_smaller_than_a_word() {
        let profile = BoardProfile {
            name: "tiny",
            registers: None,
            timer: board::DEFAULT.timer,
            scratch: Some(ScratchSpec { base: 0x8000_0000, size: 4 }),
        };
        let sim = SimBoard::new(&profile).unwrap();

        let err = bench(&sim, &profile, BenchTarget::Scratch, 10).unwrap_err();
        assert!(err.to_string().contains("Scratch read on board 'tiny'"));
    }

    #[test]
    fn scratch_covers_profile_larger_than_one_bram() {
        let profile = BoardProfile {
            name: "bram-16k",
            registers: None,
            timer: None,
            scratch: Some(ScratchSpec { base: 0x8000_0000, size: 16384 }),
        };
        let sim = SimBoard::new(&profile).unwrap();
        scratch(&sim, &profile, 1).unwrap();
    }

    #[test]
    fn missing_blocks_are_reported() {
        let profile = BoardProfile {
            timer: None,
            ..board::preset("vmk180-bram-r5").unwrap()
        };
        let sim = SimBoard::new(&profile).unwrap();

        let err = info(&sim, &profile).unwrap_err();
        assert!(err.to_string().contains("no Micro Blossom registers"));
        assert!(time(&sim, &profile, Duration::ZERO).is_err());
    }

    #[test]
    fn unreadable_system_counter_is_reported() {
        let profile = BoardProfile {
            timer: Some(TimerSpec {
                source: TimerSource::System,
                ..board::DEFAULT.timer.unwrap()
            }),
            ..board::DEFAULT
        };
        // a simulation of the default board has no system timer to serve
        let sim = SimBoard::new(&board::DEFAULT).unwrap();
        let err = time(&sim, &profile, Duration::ZERO).unwrap_err();
        assert!(err.to_string().contains("not readable"));
    }

    #[test]
    fn zero_iterations_rejected() {
        let sim = SimBoard::new(&board::DEFAULT).unwrap();
        assert!(bench(&sim, &board::DEFAULT, BenchTarget::Timer, 0).is_err());
    }
}
