//! GPS receiver stream handling
//!
//! [`GpsParser`] assembles raw UART bytes into NMEA lines and turns the
//! useful ones into [`GpsEvent`]s. It keeps a partially received line
//! between calls, so callers can hand it whatever bytes are buffered and
//! come back later for the rest.

pub mod nmea;

use heapless::Vec;

use crate::config::NMEA_MAX_LEN;
use crate::locator::to_locator;
use crate::time::UtcDateTime;
use crate::types::GridLocator;

pub use nmea::{NmeaError, Sentence};

/// Position fix derived from a GGA sentence
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GpsFix {
    /// UTC time of day of the fix in seconds, if reported
    pub seconds_of_day: Option<u32>,
    /// Latitude in degrees, south negative
    pub latitude: f32,
    /// Longitude in degrees, west negative
    pub longitude: f32,
    /// Fix quality indicator
    pub quality: u8,
    /// Satellites in use
    pub satellites: u8,
    /// Four-character locator of the position
    pub locator: GridLocator,
}

#[cfg(feature = "embedded")]
impl defmt::Format for GpsFix {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "GpsFix({}, q={}, sats={})",
            self.locator,
            self.quality,
            self.satellites
        );
    }
}

/// Output of the parser
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GpsEvent {
    /// Valid date and time from an RMC sentence
    ClockSync(UtcDateTime),
    /// Valid position from a GGA sentence
    Position(GpsFix),
}

impl From<Sentence> for GpsEvent {
    fn from(sentence: Sentence) -> Self {
        match sentence {
            Sentence::Rmc(time) => Self::ClockSync(time),
            Sentence::Gga(gga) => Self::Position(GpsFix {
                seconds_of_day: gga.seconds_of_day,
                latitude: gga.latitude,
                longitude: gga.longitude,
                quality: gga.quality,
                satellites: gga.satellites,
                locator: to_locator(gga.latitude, gga.longitude),
            }),
        }
    }
}

/// Line assembler and sentence decoder
#[derive(Debug, Default)]
pub struct GpsParser {
    line: Vec<u8, NMEA_MAX_LEN>,
    overflowed: bool,
    sentences: u32,
    rejected: u32,
}

impl GpsParser {
    /// Create a parser with an empty line buffer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            line: Vec::new(),
            overflowed: false,
            sentences: 0,
            rejected: 0,
        }
    }

    /// Feed one byte, returning an event when it completes a useful sentence
    pub fn feed(&mut self, byte: u8) -> Option<GpsEvent> {
        match byte {
            b'\n' => self.finish_line(),
            b'\r' => None,
            b'$' => {
                // Start of sentence resynchronises even mid-line
                self.line.clear();
                self.overflowed = false;
                let _ = self.line.push(byte);
                None
            }
            _ => {
                if !self.overflowed && self.line.push(byte).is_err() {
                    self.overflowed = true;
                }
                None
            }
        }
    }

    /// Feed a slice of bytes, calling `on_event` for every event produced
    pub fn feed_slice(&mut self, bytes: &[u8], mut on_event: impl FnMut(GpsEvent)) {
        for &byte in bytes {
            if let Some(event) = self.feed(byte) {
                on_event(event);
            }
        }
    }

    /// Bytes of the current partial line
    #[must_use]
    pub fn pending(&self) -> usize {
        self.line.len()
    }

    /// Sentences decoded into events so far
    #[must_use]
    pub const fn sentence_count(&self) -> u32 {
        self.sentences
    }

    /// Lines skipped as malformed, unsupported or without a fix
    #[must_use]
    pub const fn rejected_count(&self) -> u32 {
        self.rejected
    }

    fn finish_line(&mut self) -> Option<GpsEvent> {
        let overflowed = core::mem::replace(&mut self.overflowed, false);
        if overflowed || self.line.is_empty() {
            self.line.clear();
            if overflowed {
                self.rejected = self.rejected.wrapping_add(1);
            }
            return None;
        }

        let result = core::str::from_utf8(&self.line)
            .map_err(|_| NmeaError::InvalidField)
            .and_then(nmea::parse_sentence);
        self.line.clear();

        match result {
            Ok(sentence) => {
                self.sentences = self.sentences.wrapping_add(1);
                Some(sentence.into())
            }
            Err(_e) => {
                self.rejected = self.rejected.wrapping_add(1);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlong_line_is_dropped() {
        let mut parser = GpsParser::new();
        let mut long = [b'A'; 120];
        long[0] = b'$';
        for &b in &long {
            assert!(parser.feed(b).is_none());
        }
        assert!(parser.feed(b'\n').is_none());
        assert_eq!(parser.pending(), 0);
        assert_eq!(parser.rejected_count(), 1);
    }

    #[test]
    fn dollar_restarts_line() {
        let mut parser = GpsParser::new();
        let mut events = 0;
        parser.feed_slice(b"$GPRMC,garbage$GNRMC,000000,A,5920.000,N,01804.200,E,0.0,0.0,020624,,,A*6D\r\n", |_| {
            events += 1;
        });
        assert_eq!(events, 1);
    }
}
