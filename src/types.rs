//! Shared types used across the beacon firmware
//!
//! This module defines domain-specific types that enforce invariants
//! at construction time and provide type safety throughout the codebase.

use core::fmt;

use heapless::String;

/// Synthesizer frequency with millihertz resolution
///
/// WSPR tone spacing is about 1.46 Hz, so whole hertz are not fine enough.
/// The value is stored in mHz and validated against the synthesizer range.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Frequency(u64);

impl Frequency {
    /// Minimum supported frequency (100 kHz, below the 2200m band needs R divider limits)
    pub const MIN_HZ: u32 = 100_000;

    /// Maximum supported frequency (150 MHz, covers the 2m WSPR segment)
    pub const MAX_HZ: u32 = 150_000_000;

    /// Lowest supported frequency
    pub const MIN: Self = Self(Self::MIN_HZ as u64 * 1000);

    /// Create a new Frequency from Hz, returns None if out of range
    #[must_use]
    pub const fn from_hz(hz: u32) -> Option<Self> {
        if hz >= Self::MIN_HZ && hz <= Self::MAX_HZ {
            Some(Self(hz as u64 * 1000))
        } else {
            None
        }
    }

    /// Create a new Frequency from millihertz, returns None if out of range
    #[must_use]
    pub const fn from_millihertz(mhz: u64) -> Option<Self> {
        if mhz >= Self::MIN_HZ as u64 * 1000 && mhz <= Self::MAX_HZ as u64 * 1000 {
            Some(Self(mhz))
        } else {
            None
        }
    }

    /// Get the frequency in whole Hz (truncated)
    #[must_use]
    pub const fn as_hz(self) -> u32 {
        (self.0 / 1000) as u32
    }

    /// Get the frequency in millihertz
    #[must_use]
    pub const fn as_millihertz(self) -> u64 {
        self.0
    }

    /// Offset by a signed number of millihertz, None if the result leaves the range
    #[must_use]
    pub const fn offset_millihertz(self, delta: i64) -> Option<Self> {
        let shifted = self.0 as i64 + delta;
        if shifted < 0 {
            return None;
        }
        Self::from_millihertz(shifted as u64)
    }
}

impl fmt::Debug for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frequency({} mHz)", self.0)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03} Hz", self.0 / 1000, self.0 % 1000)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Frequency {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}.{:03} Hz", self.0 / 1000, self.0 % 1000);
    }
}

/// Amateur band with a WSPR sub-band
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Band {
    /// 2200 meters
    M2200,
    /// 630 meters
    M630,
    /// 160 meters
    M160,
    /// 80 meters
    M80,
    /// 60 meters
    M60,
    /// 40 meters
    M40,
    /// 30 meters
    M30,
    /// 20 meters
    M20,
    /// 17 meters
    M17,
    /// 15 meters
    M15,
    /// 12 meters
    M12,
    /// 10 meters
    M10,
    /// 6 meters
    M6,
    /// 2 meters
    M2,
}

impl Band {
    /// All bands in ascending frequency order
    pub const ALL: [Self; 14] = [
        Self::M2200,
        Self::M630,
        Self::M160,
        Self::M80,
        Self::M60,
        Self::M40,
        Self::M30,
        Self::M20,
        Self::M17,
        Self::M15,
        Self::M12,
        Self::M10,
        Self::M6,
        Self::M2,
    ];

    /// Audio offset of the WSPR window centre above the dial frequency
    pub const WINDOW_CENTRE_HZ: u32 = 1_500;

    /// Standard WSPR USB dial frequency
    #[must_use]
    pub const fn dial_hz(self) -> u32 {
        match self {
            Self::M2200 => 136_000,
            Self::M630 => 474_200,
            Self::M160 => 1_836_600,
            Self::M80 => 3_568_600,
            Self::M60 => 5_287_200,
            Self::M40 => 7_038_600,
            Self::M30 => 10_138_700,
            Self::M20 => 14_095_600,
            Self::M17 => 18_104_600,
            Self::M15 => 21_094_600,
            Self::M12 => 24_924_600,
            Self::M10 => 28_124_600,
            Self::M6 => 50_293_000,
            Self::M2 => 144_489_000,
        }
    }

    /// Transmit frequency at the centre of the 200 Hz WSPR window
    #[must_use]
    pub const fn transmit_frequency(self) -> Option<Frequency> {
        Frequency::from_hz(self.dial_hz() + Self::WINDOW_CENTRE_HZ)
    }

    /// Short band name ("20m")
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::M2200 => "2200m",
            Self::M630 => "630m",
            Self::M160 => "160m",
            Self::M80 => "80m",
            Self::M60 => "60m",
            Self::M40 => "40m",
            Self::M30 => "30m",
            Self::M20 => "20m",
            Self::M17 => "17m",
            Self::M15 => "15m",
            Self::M12 => "12m",
            Self::M10 => "10m",
            Self::M6 => "6m",
            Self::M2 => "2m",
        }
    }

    /// Look up a band by name, case-insensitive
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|band| band.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Find the band whose WSPR window contains a frequency
    #[must_use]
    pub fn from_frequency(freq: Frequency) -> Option<Self> {
        let hz = freq.as_hz();
        Self::ALL.iter().copied().find(|band| {
            let low = band.dial_hz() + Self::WINDOW_CENTRE_HZ - 100;
            let high = band.dial_hz() + Self::WINDOW_CENTRE_HZ + 100;
            (low..=high).contains(&hz)
        })
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Band {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.name());
    }
}

/// Transmit power reported in the WSPR message
///
/// Only the 19 dBm values WSPR can encode are representable; the position
/// of the value in [`PowerLevel::ALLOWED_DBM`] is its encoded index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PowerLevel(u8);

impl PowerLevel {
    /// Encodable power levels in dBm, in index order
    pub const ALLOWED_DBM: [u8; 19] = [
        0, 3, 7, 10, 13, 17, 20, 23, 27, 30, 33, 37, 40, 43, 47, 50, 53, 57, 60,
    ];

    /// Create a power level from dBm, None if WSPR cannot encode it
    #[must_use]
    pub fn from_dbm(dbm: u8) -> Option<Self> {
        Self::ALLOWED_DBM
            .iter()
            .position(|&allowed| allowed == dbm)
            .and_then(|index| u8::try_from(index).ok())
            .map(Self)
    }

    /// Get the power in dBm
    #[must_use]
    pub const fn dbm(self) -> u8 {
        Self::ALLOWED_DBM[self.0 as usize]
    }

    /// Get the encoded index (0-18)
    #[must_use]
    pub const fn index(self) -> u8 {
        self.0
    }
}

impl Default for PowerLevel {
    fn default() -> Self {
        Self(3) // 10 dBm
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for PowerLevel {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{} dBm", self.dbm());
    }
}

/// Maximum characters in a plain callsign
pub const MAX_PLAIN_CALL_LEN: usize = 6;

/// Maximum characters on either side of a compound callsign
pub const MAX_AFFIX_LEN: usize = 3;

/// Callsign as it is split for packing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallsignParts<'a> {
    /// Single token ("N0CALL")
    Plain(&'a str),
    /// Prefix and suffix around one '/' ("PJ4/K1A")
    Compound {
        /// Token before the '/'
        prefix: &'a str,
        /// Token after the '/'
        suffix: &'a str,
    },
}

/// Validated, upper-cased callsign
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Callsign(String<{ MAX_PLAIN_CALL_LEN + 1 }>);

impl Callsign {
    /// Parse and validate a callsign
    ///
    /// Accepts a plain token of 1-6 characters, or two 1-3 character tokens
    /// around exactly one '/'. Tokens must not start with a digit and may only
    /// contain letters and digits.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let mut normalised: String<{ MAX_PLAIN_CALL_LEN + 1 }> = String::new();
        for c in text.chars() {
            normalised.push(c.to_ascii_uppercase()).ok()?;
        }

        let valid = match split_parts(&normalised) {
            Some(CallsignParts::Plain(token)) => valid_token(token, MAX_PLAIN_CALL_LEN),
            Some(CallsignParts::Compound { prefix, suffix }) => {
                valid_token(prefix, MAX_AFFIX_LEN) && valid_token(suffix, MAX_AFFIX_LEN)
            }
            None => false,
        };

        valid.then_some(Self(normalised))
    }

    /// Split into packing tokens
    #[must_use]
    pub fn parts(&self) -> CallsignParts<'_> {
        // Validated on construction, so the split cannot fail
        split_parts(&self.0).unwrap_or(CallsignParts::Plain(&self.0))
    }

    /// Get the callsign text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn split_parts(text: &str) -> Option<CallsignParts<'_>> {
    let mut pieces = text.split('/');
    let first = pieces.next()?;
    match (pieces.next(), pieces.next()) {
        (None, _) => Some(CallsignParts::Plain(first)),
        (Some(second), None) => Some(CallsignParts::Compound {
            prefix: first,
            suffix: second,
        }),
        (Some(_), Some(_)) => None,
    }
}

fn valid_token(token: &str, max_len: usize) -> bool {
    let bytes = token.as_bytes();
    !bytes.is_empty()
        && bytes.len() <= max_len
        && !bytes[0].is_ascii_digit()
        && bytes.iter().all(u8::is_ascii_alphanumeric)
}

impl fmt::Display for Callsign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Callsign {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.0.as_str());
    }
}

/// Four-character Maidenhead locator ("JO65")
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridLocator([u8; 4]);

impl GridLocator {
    /// Number of fields per axis ('A'..='R')
    pub const FIELDS: u8 = 18;

    /// Number of squares per field per axis ('0'..='9')
    pub const SQUARES: u8 = 10;

    /// South-west corner square, used before any fix
    pub const ORIGIN: Self = Self(*b"AA00");

    /// Parse a locator; letters are case-insensitive
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let bytes = text.trim().as_bytes();
        if bytes.len() != 4 {
            return None;
        }

        let lon_field = bytes[0].to_ascii_uppercase();
        let lat_field = bytes[1].to_ascii_uppercase();
        let fields_ok = [lon_field, lat_field]
            .iter()
            .all(|&c| (b'A'..b'A' + Self::FIELDS).contains(&c));
        let squares_ok = bytes[2].is_ascii_digit() && bytes[3].is_ascii_digit();

        (fields_ok && squares_ok).then_some(Self([lon_field, lat_field, bytes[2], bytes[3]]))
    }

    /// Build from field and square indices, None if any index is out of range
    #[must_use]
    pub const fn from_indices(lon_field: u8, lat_field: u8, lon_square: u8, lat_square: u8) -> Option<Self> {
        if lon_field >= Self::FIELDS
            || lat_field >= Self::FIELDS
            || lon_square >= Self::SQUARES
            || lat_square >= Self::SQUARES
        {
            return None;
        }
        Some(Self([
            b'A' + lon_field,
            b'A' + lat_field,
            b'0' + lon_square,
            b'0' + lat_square,
        ]))
    }

    /// Longitude field index (0-17)
    #[must_use]
    pub const fn lon_field(self) -> u8 {
        self.0[0] - b'A'
    }

    /// Latitude field index (0-17)
    #[must_use]
    pub const fn lat_field(self) -> u8 {
        self.0[1] - b'A'
    }

    /// Longitude square index (0-9)
    #[must_use]
    pub const fn lon_square(self) -> u8 {
        self.0[2] - b'0'
    }

    /// Latitude square index (0-9)
    #[must_use]
    pub const fn lat_square(self) -> u8 {
        self.0[3] - b'0'
    }

    /// Get the locator text
    #[must_use]
    pub fn as_str(&self) -> &str {
        // Only ASCII letters and digits are ever stored
        core::str::from_utf8(&self.0).unwrap_or("????")
    }
}

impl fmt::Debug for GridLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GridLocator({})", self.as_str())
    }
}

impl fmt::Display for GridLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for GridLocator {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.as_str());
    }
}

/// Transmitter state owned by the scheduler
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TransmitterState {
    /// Waiting for the next even-minute slot
    #[default]
    Idle,
    /// Keying a WSPR symbol sequence
    Transmitting,
}

impl TransmitterState {
    /// Short status label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Transmitting => "TX",
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for TransmitterState {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.label());
    }
}

/// Synthesizer clock output
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockOutput {
    /// CLK0 output
    Clk0,
    /// CLK1 output
    Clk1,
    /// CLK2 output
    Clk2,
}

#[cfg(feature = "embedded")]
impl defmt::Format for ClockOutput {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Clk0 => defmt::write!(f, "CLK0"),
            Self::Clk1 => defmt::write!(f, "CLK1"),
            Self::Clk2 => defmt::write!(f, "CLK2"),
        }
    }
}
