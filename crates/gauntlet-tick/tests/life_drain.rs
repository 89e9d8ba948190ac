//! Integration tests for the life-drain clock.
//!
//! Time is driven by a `ManualClock`, so every test is deterministic.

use std::time::Duration;

use gauntlet_tick::{Clock, LifeDrainClock, ManualClock};

// =========================================================================
// Helpers
// =========================================================================

fn clock_at(millis: u64) -> ManualClock {
    ManualClock::starting_at(Duration::from_millis(millis))
}

/// Polls once per `step_ms` until `total_ms` has elapsed, returning how
/// many times the drain fired.
fn run_frames(clock: &ManualClock, drain: &mut LifeDrainClock, step_ms: u64, total_ms: u64) -> u64 {
    let mut fired = 0;
    let mut elapsed = 0;
    while elapsed < total_ms {
        clock.advance(Duration::from_millis(step_ms));
        elapsed += step_ms;
        if drain.poll() {
            fired += 1;
        }
    }
    fired
}

// =========================================================================
// Baseline
// =========================================================================

#[test]
fn test_new_clock_records_current_second() {
    let clock = clock_at(42_700);
    let drain = LifeDrainClock::new(clock.clone());
    assert_eq!(drain.last_tick_second(), 42);
    assert_eq!(drain.fired(), 0);
}

#[test]
fn test_poll_within_same_second_does_not_fire() {
    let clock = clock_at(10_000);
    let mut drain = LifeDrainClock::new(clock.clone());

    clock.advance(Duration::from_millis(999));
    assert!(!drain.poll());
    assert_eq!(drain.last_tick_second(), 10);
}

#[test]
fn test_poll_fires_on_second_boundary() {
    let clock = clock_at(10_900);
    let mut drain = LifeDrainClock::new(clock.clone());

    clock.advance(Duration::from_millis(100));
    assert!(drain.poll());
    assert_eq!(drain.last_tick_second(), 11);
    // Same second again: edge already consumed.
    assert!(!drain.poll());
}

// =========================================================================
// Frame rate independence
// =========================================================================

#[test]
fn test_two_and_a_half_seconds_fire_twice_at_any_frame_rate() {
    for step_ms in [1, 16, 33, 100, 250, 500] {
        let clock = clock_at(100_000);
        let mut drain = LifeDrainClock::new(clock.clone());
        let fired = run_frames(&clock, &mut drain, step_ms, 2_500);
        assert_eq!(fired, 2, "step {step_ms}ms fired {fired} times");
    }
}

#[test]
fn test_stall_skips_instead_of_catching_up() {
    let clock = clock_at(0);
    let mut drain = LifeDrainClock::new(clock.clone());

    clock.advance(Duration::from_secs(5));
    assert!(drain.poll());
    assert!(!drain.poll());
    assert_eq!(drain.fired(), 1);
    assert_eq!(drain.last_tick_second(), 5);
}

#[test]
fn test_backwards_clock_never_fires_or_rewinds() {
    let clock = clock_at(20_000);
    let mut drain = LifeDrainClock::new(clock.clone());

    clock.set(Duration::from_secs(15));
    assert!(!drain.poll());
    assert_eq!(drain.last_tick_second(), 20);

    // Forward past the baseline again: fires once.
    clock.set(Duration::from_millis(21_100));
    assert!(drain.poll());
    assert_eq!(drain.last_tick_second(), 21);
}

#[test]
fn test_manual_clock_reads_what_was_set() {
    let clock = clock_at(0);
    clock.set(Duration::from_millis(1234));
    assert_eq!(clock.now(), Duration::from_millis(1234));
}
