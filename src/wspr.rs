//! WSPR Message Encoding
//!
//! Turns a callsign, Maidenhead locator and power level into the 162
//! four-level FSK symbols of a standard (type 1) WSPR transmission.
//!
//! # Pipeline
//!
//! ```text
//! callsign ─┐
//! locator ──┼─► pack (50 bits) ─► convolve (K=32, r=1/2) ─► interleave ─► + sync ─► symbols
//! power ────┘
//! ```
//!
//! Everything here is pure and runs on the host.

pub mod convolution;
pub mod interleave;
pub mod pack;
pub mod sync;

use core::fmt;

use crate::types::{Callsign, GridLocator, PowerLevel};

/// Number of channel symbols in one transmission
pub const SYMBOL_COUNT: usize = 162;

/// Number of message bits carried by one transmission
pub const MESSAGE_BITS: usize = 50;

/// Symbol period in microseconds (8192 / 12000 s)
pub const SYMBOL_PERIOD_US: u64 = 682_667;

/// Tone spacing in millihertz (12000 / 8192 Hz)
pub const TONE_SPACING_MILLIHERTZ: i64 = 1_465;

/// Encoding failure
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncodeError {
    /// Callsign is empty, too long, has a bad character or more than one '/'
    InvalidCallsign,
    /// Locator is not two letters A-R followed by two digits
    InvalidLocator,
    /// Power is not one of the encodable dBm values
    InvalidPower,
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCallsign => f.write_str("invalid callsign"),
            Self::InvalidLocator => f.write_str("invalid locator"),
            Self::InvalidPower => f.write_str("invalid power"),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for EncodeError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::InvalidCallsign => defmt::write!(f, "InvalidCallsign"),
            Self::InvalidLocator => defmt::write!(f, "InvalidLocator"),
            Self::InvalidPower => defmt::write!(f, "InvalidPower"),
        }
    }
}

/// Validated message contents
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WsprMessage {
    callsign: Callsign,
    locator: GridLocator,
    power: PowerLevel,
}

impl WsprMessage {
    /// Validate raw fields into a message
    ///
    /// # Errors
    ///
    /// Returns the first field that fails validation, checked in the order
    /// locator, callsign, power.
    pub fn new(callsign: &str, locator: &str, power_dbm: u8) -> Result<Self, EncodeError> {
        let locator = GridLocator::parse(locator).ok_or(EncodeError::InvalidLocator)?;
        let callsign = Callsign::parse(callsign).ok_or(EncodeError::InvalidCallsign)?;
        let power = PowerLevel::from_dbm(power_dbm).ok_or(EncodeError::InvalidPower)?;
        Ok(Self {
            callsign,
            locator,
            power,
        })
    }

    /// Build from already validated parts
    #[must_use]
    pub const fn from_parts(callsign: Callsign, locator: GridLocator, power: PowerLevel) -> Self {
        Self {
            callsign,
            locator,
            power,
        }
    }

    /// Callsign being sent
    #[must_use]
    pub const fn callsign(&self) -> &Callsign {
        &self.callsign
    }

    /// Locator being sent
    #[must_use]
    pub const fn locator(&self) -> GridLocator {
        self.locator
    }

    /// Power being reported
    #[must_use]
    pub const fn power(&self) -> PowerLevel {
        self.power
    }

    /// Pack into the 50-bit message word (bit 49 is sent first)
    #[must_use]
    pub fn packed(&self) -> u64 {
        let call = pack::pack_callsign(&self.callsign);
        let grid_power = pack::pack_grid_power(self.locator, self.power);
        pack::assemble(call, grid_power)
    }

    /// Run the full channel coding chain
    #[must_use]
    pub fn symbols(&self) -> SymbolSequence {
        let coded = convolution::encode_message(self.packed());
        let interleaved = interleave::interleave(&coded);
        SymbolSequence(sync::merge(&interleaved))
    }
}

/// The 162 channel symbols of one transmission, each in 0..=3
#[derive(Clone, PartialEq, Eq)]
pub struct SymbolSequence([u8; SYMBOL_COUNT]);

impl SymbolSequence {
    /// Symbols in transmission order
    #[must_use]
    pub const fn as_slice(&self) -> &[u8; SYMBOL_COUNT] {
        &self.0
    }

    /// Number of symbols (always 162)
    #[must_use]
    pub const fn len(&self) -> usize {
        SYMBOL_COUNT
    }

    /// Always false; present for clippy's `len_without_is_empty`
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Iterate over symbols in transmission order
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.iter().copied()
    }

    /// Iterate over the tone offset of each symbol in tone steps
    pub fn tone_offsets(&self) -> impl Iterator<Item = i8> + '_ {
        self.iter().map(tone_offset)
    }
}

impl fmt::Debug for SymbolSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

/// Tone offset for a symbol, in tone steps relative to the base frequency
///
/// Symbols 0 and 3 share the base tone.
#[must_use]
pub const fn tone_offset(symbol: u8) -> i8 {
    match symbol {
        1 => 1,
        2 => -1,
        _ => 0,
    }
}

/// Encode a beacon message into channel symbols
///
/// # Errors
///
/// Returns [`EncodeError`] naming the first invalid field.
pub fn encode(callsign: &str, locator: &str, power_dbm: u8) -> Result<SymbolSequence, EncodeError> {
    let message = WsprMessage::new(callsign, locator, power_dbm)?;
    Ok(message.symbols())
}
