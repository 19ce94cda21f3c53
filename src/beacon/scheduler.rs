//! Transmission slot scheduling
//!
//! WSPR transmissions start at second 0 of every even UTC minute. The
//! scheduler decides, once per tick, whether a transmission should start now.
//! After a transmission ends the trigger stays disarmed for a guard interval,
//! and a slot that already fired never fires twice.

use crate::config::TX_GUARD_SECS;
use crate::time::UtcDateTime;

/// Slot trigger with post-transmission cooldown
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scheduler {
    guard_secs: i64,
    /// Epoch seconds before which the trigger is disarmed
    rearm_at: Option<i64>,
    /// Epoch second of the last slot that fired
    last_slot: Option<i64>,
}

impl Scheduler {
    /// Scheduler with the default guard interval
    #[must_use]
    pub const fn new() -> Self {
        Self::with_guard(TX_GUARD_SECS)
    }

    /// Scheduler with a custom guard interval in seconds
    #[must_use]
    pub const fn with_guard(guard_secs: i64) -> Self {
        Self {
            guard_secs,
            rearm_at: None,
            last_slot: None,
        }
    }

    /// Guard interval in seconds
    #[must_use]
    pub const fn guard_secs(&self) -> i64 {
        self.guard_secs
    }

    /// True at second 0 of an even minute
    #[must_use]
    pub const fn is_slot_start(now: &UtcDateTime) -> bool {
        now.second() == 0 && now.minute() % 2 == 0
    }

    /// True while the post-transmission guard is running
    #[must_use]
    pub fn in_cooldown(&self, now: &UtcDateTime) -> bool {
        self.rearm_at
            .is_some_and(|rearm| now.seconds_since_epoch() < rearm)
    }

    /// Whether a transmission should start at `now`
    #[must_use]
    pub fn should_start(&self, now: &UtcDateTime) -> bool {
        Self::is_slot_start(now)
            && !self.in_cooldown(now)
            && self.last_slot != Some(now.seconds_since_epoch())
    }

    /// Record that the slot at `now` has been taken
    pub fn begin(&mut self, now: &UtcDateTime) {
        self.last_slot = Some(now.seconds_since_epoch());
    }

    /// Record the end of a transmission and start the guard interval
    pub fn complete(&mut self, finished: &UtcDateTime) {
        self.rearm_at = Some(finished.seconds_since_epoch() + self.guard_secs);
    }

    /// Seconds until the next slot start at or after `now`
    #[must_use]
    pub fn seconds_to_next_slot(now: &UtcDateTime) -> u32 {
        let into_cycle = u32::from(now.minute() % 2) * 60 + u32::from(now.second());
        (120 - into_cycle) % 120
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(minute: u8, second: u8) -> UtcDateTime {
        UtcDateTime::new(2024, 6, 2, 12, minute, second).unwrap()
    }

    #[test]
    fn next_slot_countdown() {
        assert_eq!(Scheduler::seconds_to_next_slot(&at(2, 0)), 0);
        assert_eq!(Scheduler::seconds_to_next_slot(&at(2, 1)), 119);
        assert_eq!(Scheduler::seconds_to_next_slot(&at(3, 30)), 30);
    }
}
