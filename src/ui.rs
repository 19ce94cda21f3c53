//! User Interface
//!
//! Text of the status screen. Rendering to pixels lives in
//! `drivers::display`; this module only decides what the five lines say so
//! it can be checked on the host.

use core::fmt::Write as _;

use heapless::String;

use crate::time::UtcDateTime;
use crate::types::{Frequency, TransmitterState};

/// Characters per line (128 px / 6 px font)
pub const LINE_WIDTH: usize = 21;

/// Number of status lines
pub const LINE_COUNT: usize = 5;

/// One line of status text
pub type StatusLine = String<LINE_WIDTH>;

/// Values shown on the status screen
#[derive(Clone, Copy, Debug)]
pub struct ScreenInput<'a> {
    /// Base transmit frequency
    pub frequency: Frequency,
    /// Configured callsign
    pub callsign: &'a str,
    /// Transmitter state
    pub transmitter: TransmitterState,
    /// GPS lock flag
    pub gps_lock: bool,
    /// Current locator
    pub locator: &'a str,
    /// Clock reading
    pub utc: Option<UtcDateTime>,
    /// Display offset from UTC in hours
    pub tz_offset: i8,
}

/// Formatted status screen
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusScreen {
    lines: [StatusLine; LINE_COUNT],
}

impl StatusScreen {
    /// Format all lines from `input`
    #[must_use]
    pub fn from_input(input: &ScreenInput<'_>) -> Self {
        let mut screen = Self::default();
        let [freq, call, gps, grid, clock] = &mut screen.lines;

        let hz = input.frequency.as_hz();
        write!(freq, "Freq: {}.{:03}.{:03}", hz / 1_000_000, (hz / 1000) % 1000, hz % 1000).ok();
        write!(call, "{} {}", input.callsign, input.transmitter.label()).ok();
        write!(gps, "GPS: {}", if input.gps_lock { "LOCK" } else { "----" }).ok();
        write!(grid, "Grid: {}", input.locator).ok();
        write_clock(clock, input.utc, input.tz_offset).ok();

        screen
    }

    /// The lines, top to bottom
    #[must_use]
    pub fn lines(&self) -> &[StatusLine; LINE_COUNT] {
        &self.lines
    }

    /// Replace the contents; returns true if anything changed
    pub fn update(&mut self, next: Self) -> bool {
        if *self == next {
            return false;
        }
        *self = next;
        true
    }
}

fn write_clock(out: &mut StatusLine, utc: Option<UtcDateTime>, tz_offset: i8) -> core::fmt::Result {
    out.write_str("UTC")?;
    if tz_offset != 0 {
        write!(out, "{tz_offset:+}")?;
    }
    match utc {
        Some(utc) => {
            let local = utc.offset_hours(tz_offset);
            write!(
                out,
                " {:02}:{:02}:{:02}",
                local.hour(),
                local.minute(),
                local.second()
            )
        }
        None => out.write_str(" --:--:--"),
    }
}
