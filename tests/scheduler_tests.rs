//! Scheduler Tests
//!
//! Tests for even-minute slot detection and the post-transmission guard.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test scheduler_tests

use wspr_beacon::beacon::scheduler::Scheduler;
use wspr_beacon::config::TX_GUARD_SECS;
use wspr_beacon::time::UtcDateTime;

fn at(hour: u8, minute: u8, second: u8) -> UtcDateTime {
    UtcDateTime::new(2024, 6, 2, hour, minute, second).unwrap()
}

fn after(time: UtcDateTime, seconds: i64) -> UtcDateTime {
    UtcDateTime::from_seconds_since_epoch(time.seconds_since_epoch() + seconds).unwrap()
}

// =============================================================================
// Slot Detection
// =============================================================================

#[test]
fn test_even_minute_second_zero_is_slot() {
    assert!(Scheduler::is_slot_start(&at(12, 0, 0)));
    assert!(Scheduler::is_slot_start(&at(12, 2, 0)));
    assert!(Scheduler::is_slot_start(&at(23, 58, 0)));
}

#[test]
fn test_odd_minute_is_not_slot() {
    assert!(!Scheduler::is_slot_start(&at(12, 1, 0)));
    assert!(!Scheduler::is_slot_start(&at(12, 59, 0)));
}

#[test]
fn test_other_seconds_are_not_slot() {
    assert!(!Scheduler::is_slot_start(&at(12, 2, 1)));
    assert!(!Scheduler::is_slot_start(&at(12, 2, 59)));
}

#[test]
fn test_fresh_scheduler_starts_at_slot() {
    let scheduler = Scheduler::new();
    assert!(scheduler.should_start(&at(12, 2, 0)));
    assert!(!scheduler.should_start(&at(12, 1, 0)));
    assert!(!scheduler.in_cooldown(&at(12, 2, 0)));
}

#[test]
fn test_default_guard() {
    assert_eq!(Scheduler::default().guard_secs(), TX_GUARD_SECS);
    assert_eq!(Scheduler::with_guard(5).guard_secs(), 5);
}

// =============================================================================
// Once Per Slot
// =============================================================================

#[test]
fn test_slot_fires_once() {
    let mut scheduler = Scheduler::new();
    let slot = at(12, 2, 0);
    assert!(scheduler.should_start(&slot));

    scheduler.begin(&slot);
    // A second tick within the same second must not retrigger
    assert!(!scheduler.should_start(&slot));
}

#[test]
fn test_aborted_slot_does_not_restart() {
    // Transmission ended immediately; the guard ran out inside the same second
    let mut scheduler = Scheduler::with_guard(0);
    let slot = at(12, 2, 0);
    scheduler.begin(&slot);
    scheduler.complete(&slot);
    assert!(!scheduler.should_start(&slot));
}

#[test]
fn test_next_slot_fires_after_previous() {
    let mut scheduler = Scheduler::new();
    let slot = at(12, 2, 0);
    scheduler.begin(&slot);
    scheduler.complete(&after(slot, 111));

    assert!(scheduler.should_start(&at(12, 4, 0)));
}

// =============================================================================
// Guard Interval
// =============================================================================

#[test]
fn test_cooldown_blocks_slot_inside_guard() {
    let mut scheduler = Scheduler::with_guard(2);
    // Transmission that overran into the next slot
    scheduler.begin(&at(12, 2, 0));
    scheduler.complete(&at(12, 3, 59));

    let next = at(12, 4, 0);
    assert!(scheduler.in_cooldown(&next));
    assert!(!scheduler.should_start(&next));
}

#[test]
fn test_cooldown_expires() {
    let mut scheduler = Scheduler::with_guard(2);
    let finished = at(12, 3, 50);
    scheduler.begin(&at(12, 2, 0));
    scheduler.complete(&finished);

    assert!(scheduler.in_cooldown(&after(finished, 1)));
    assert!(!scheduler.in_cooldown(&after(finished, 2)));
}

#[test]
fn test_cooldown_across_midnight() {
    let mut scheduler = Scheduler::with_guard(2);
    scheduler.begin(&at(23, 58, 0));
    scheduler.complete(&at(23, 59, 59));

    let midnight = UtcDateTime::new(2024, 6, 3, 0, 0, 0).unwrap();
    assert!(scheduler.in_cooldown(&midnight));
    assert!(!scheduler.should_start(&midnight));

    let next = UtcDateTime::new(2024, 6, 3, 0, 2, 0).unwrap();
    assert!(scheduler.should_start(&next));
}

// =============================================================================
// Countdown
// =============================================================================

#[test]
fn test_seconds_to_next_slot() {
    assert_eq!(Scheduler::seconds_to_next_slot(&at(12, 2, 0)), 0);
    assert_eq!(Scheduler::seconds_to_next_slot(&at(12, 2, 1)), 119);
    assert_eq!(Scheduler::seconds_to_next_slot(&at(12, 3, 0)), 60);
    assert_eq!(Scheduler::seconds_to_next_slot(&at(12, 3, 59)), 1);
    assert_eq!(Scheduler::seconds_to_next_slot(&at(23, 59, 30)), 30);
}
