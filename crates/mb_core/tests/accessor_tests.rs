//! Accessor behaviour against the fake register block.

use mb_common::{HardwareInfo, mmio, regs};
use mb_core::MicroBlossom;
use mb_core::clock::{CounterClock, NativeClock};
use mb_core::diff_native_time;
use mb_core::fake::FakeDevice;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const BASE: usize = mmio::UB_BASE;
const TICKS_PER_SECOND: u64 = 200_000_000;

fn micro_blossom() -> FakeDevice<{ regs::BLOCK_SIZE }> {
    FakeDevice::new(BASE)
}

#[test]
fn diff_of_identical_samples_is_zero() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..10_000 {
        let t: u64 = rng.r#gen();
        assert_eq!(diff_native_time(t, t), 0.0);
    }
}

#[test]
fn one_second_apart_is_one() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..10_000 {
        let t = rng.gen_range(0..u64::MAX - TICKS_PER_SECOND);
        let elapsed = diff_native_time(t, t + TICKS_PER_SECOND);
        assert!((elapsed - 1.0).abs() <= f32::EPSILON, "t={t} elapsed={elapsed}");
    }
}

#[test]
fn native_time_matches_register() {
    let mut rng = StdRng::seed_from_u64(11);
    let dev = micro_blossom();
    let ub = MicroBlossom::new(&dev, BASE);

    for _ in 0..1_000 {
        let value: u64 = rng.r#gen();
        dev.poke64(BASE + regs::NATIVE_TIME, value);
        assert_eq!(ub.get_native_time(), value);
    }
}

#[test]
fn hardware_info_matches_registers() {
    let mut rng = StdRng::seed_from_u64(13);
    let dev = micro_blossom();
    let ub = MicroBlossom::new(&dev, BASE);

    for _ in 0..1_000 {
        let expected = HardwareInfo {
            version: rng.r#gen(),
            context_depth: rng.r#gen(),
            obstacle_channels: rng.r#gen(),
        };
        dev.poke32(BASE + regs::VERSION, expected.version);
        dev.poke32(BASE + regs::CONTEXT_DEPTH, expected.context_depth);
        dev.poke8(BASE + regs::OBSTACLE_CHANNELS, expected.obstacle_channels);

        assert_eq!(ub.get_hardware_info(), expected);
    }
}

#[test]
fn accessor_honours_custom_base() {
    let base = 0x1_0000;
    let dev = FakeDevice::<{ regs::BLOCK_SIZE }>::new(base);
    dev.poke64(base, 99);
    dev.poke32(base + 8, 3);
    let ub = MicroBlossom::new(&dev, base);

    assert_eq!(ub.base(), base);
    assert_eq!(ub.get_native_time(), 99);
    assert_eq!(ub.get_hardware_info().version, 3);
}

#[test]
fn clock_and_accessor_agree() {
    let dev = micro_blossom();
    let ub = MicroBlossom::new(&dev, BASE);
    let clock = CounterClock::fabric(&dev, BASE);

    dev.poke64(BASE, 1_000);
    let start = ub.get_native_time();
    dev.poke64(BASE, 1_000 + 3 * TICKS_PER_SECOND);
    let end = clock.now();

    assert_eq!(clock.elapsed(start, end), ub.diff_native_time(start, end));
    assert_eq!(clock.elapsed(start, end), 3.0);
}
