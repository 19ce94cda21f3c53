//! System configuration and hardware constants
//!
//! Compile-time constants for the beacon hardware live at the top of this
//! module. [`BeaconConfig`] holds the operator settings that are edited from
//! the console and persisted to flash as `key=value` lines.

use core::fmt::{self, Write as _};

use heapless::String;

use crate::types::{Band, ClockOutput, Frequency};

/// System clock frequency (STM32G474 @ 170MHz)
pub const SYSTEM_CLOCK_HZ: u32 = 170_000_000;

/// I2C bus frequency for the synthesizer and display
pub const I2C_FREQUENCY_HZ: u32 = 400_000;

/// I2C bus frequency for the real-time clock
pub const RTC_I2C_FREQUENCY_HZ: u32 = 100_000;

/// `Si5351A` I2C address
pub const SI5351_I2C_ADDR: u8 = 0x60;

/// DS3231 I2C address
pub const DS3231_I2C_ADDR: u8 = 0x68;

/// SSD1306 OLED I2C address
pub const DISPLAY_I2C_ADDR: u8 = 0x3C;

/// Display width in pixels
pub const DISPLAY_WIDTH: u32 = 128;

/// Display height in pixels
pub const DISPLAY_HEIGHT: u32 = 64;

/// `Si5351A` crystal frequency (25 MHz standard)
pub const SI5351_XTAL_FREQ: u32 = 25_000_000;

/// Synthesizer output wired to the transmitter
pub const TX_CLOCK_OUTPUT: ClockOutput = ClockOutput::Clk0;

/// GPS receiver UART baud rate
pub const GPS_BAUD_RATE: u32 = 9_600;

/// GPS UART receive ring buffer size
pub const GPS_RX_BUFFER_SIZE: usize = 256;

/// GPS UART transmit buffer size (unused direction, but required by the driver)
pub const GPS_TX_BUFFER_SIZE: usize = 16;

/// Longest NMEA sentence including `$` and checksum, excluding CR/LF
pub const NMEA_MAX_LEN: usize = 82;

/// Beacon loop tick interval in milliseconds
pub const TICK_INTERVAL_MS: u64 = 250;

/// Seconds after a transmission ends before the trigger is re-armed
pub const TX_GUARD_SECS: i64 = 2;

/// USB VID (pid.codes test VID)
pub const USB_VID: u16 = 0x1209;

/// USB PID (pid.codes test PID)
pub const USB_PID: u16 = 0x0001;

/// USB CDC ACM packet size
pub const USB_CDC_PACKET_SIZE: u16 = 64;

/// Longest console input line
pub const CONSOLE_LINE_SIZE: usize = 64;

/// Largest console response
pub const CONSOLE_RESPONSE_SIZE: usize = 384;

/// Largest serialised settings blob
pub const SETTINGS_TEXT_SIZE: usize = 128;

/// Default callsign
pub const DEFAULT_CALLSIGN: &str = "N0CALL";

/// Default locator used until the first GPS fix
pub const DEFAULT_GRID: &str = "AA00";

/// Default reported power in dBm
pub const DEFAULT_POWER_DBM: u8 = 10;

/// Default transmit frequency (6m WSPR window)
pub const DEFAULT_FREQUENCY_HZ: u32 = 50_294_500;

/// Default display time zone offset in hours
pub const DEFAULT_TZ_OFFSET: i8 = 0;

/// Pin assignments for GPIO
pub mod pins {
    //! GPIO pin assignments matching the schematic

    /// Status LED (directly on MCU)
    pub const LED_STATUS: &str = "PA5";

    /// I2C1 SCL (Si5351)
    pub const I2C1_SCL: &str = "PB8";

    /// I2C1 SDA (Si5351)
    pub const I2C1_SDA: &str = "PB9";

    /// I2C2 SCL (DS3231)
    pub const I2C2_SCL: &str = "PA9";

    /// I2C2 SDA (DS3231)
    pub const I2C2_SDA: &str = "PA8";

    /// I2C3 SCL (OLED)
    pub const I2C3_SCL: &str = "PC8";

    /// I2C3 SDA (OLED)
    pub const I2C3_SDA: &str = "PC9";

    /// USART3 TX to GPS RX
    pub const GPS_TX: &str = "PB10";

    /// USART3 RX from GPS TX
    pub const GPS_RX: &str = "PB11";

    /// USB D+ (handled by USB peripheral)
    pub const USB_DP: &str = "PA12";

    /// USB D- (handled by USB peripheral)
    pub const USB_DM: &str = "PA11";
}

/// Build the default transmit frequency
#[must_use]
pub const fn default_frequency() -> Option<Frequency> {
    Frequency::from_hz(DEFAULT_FREQUENCY_HZ)
}

/// Settings key
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigKey {
    /// `callsign`
    Callsign,
    /// `grid`
    Grid,
    /// `power`
    Power,
    /// `freq`
    Freq,
    /// `tz`
    Tz,
    /// `band` (write-only alias that sets `freq`)
    Band,
}

impl ConfigKey {
    /// Keys in serialisation order
    pub const STORED: [Self; 5] = [Self::Callsign, Self::Grid, Self::Power, Self::Freq, Self::Tz];

    /// Key text
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Callsign => "callsign",
            Self::Grid => "grid",
            Self::Power => "power",
            Self::Freq => "freq",
            Self::Tz => "tz",
            Self::Band => "band",
        }
    }

    /// Look up a key, case-insensitive
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        [
            Self::Callsign,
            Self::Grid,
            Self::Power,
            Self::Freq,
            Self::Tz,
            Self::Band,
        ]
        .into_iter()
        .find(|key| key.name().eq_ignore_ascii_case(name.trim()))
    }
}

/// Settings update failure
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Line has no `=`
    Malformed,
    /// Key is not a known setting
    UnknownKey,
    /// Value does not parse or is out of range for the key
    InvalidValue(ConfigKey),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => f.write_str("expected key=value"),
            Self::UnknownKey => f.write_str("unknown key"),
            Self::InvalidValue(key) => write!(f, "invalid value for {}", key.name()),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for ConfigError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Malformed => defmt::write!(f, "Malformed"),
            Self::UnknownKey => defmt::write!(f, "UnknownKey"),
            Self::InvalidValue(key) => defmt::write!(f, "InvalidValue({=str})", key.name()),
        }
    }
}

/// Capacity of the stored callsign text
pub const CALLSIGN_CAPACITY: usize = 12;

/// Capacity of the stored grid text
pub const GRID_CAPACITY: usize = 8;

/// Operator settings
///
/// Callsign, grid and power are kept as entered (upper-cased) and are only
/// validated when a message is encoded, so a bad value shows up as an
/// encoder failure at transmission time rather than being silently dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BeaconConfig {
    callsign: String<CALLSIGN_CAPACITY>,
    grid: String<GRID_CAPACITY>,
    power_dbm: u8,
    frequency: Frequency,
    tz_offset: i8,
}

impl Default for BeaconConfig {
    fn default() -> Self {
        let mut config = Self {
            callsign: String::new(),
            grid: String::new(),
            power_dbm: DEFAULT_POWER_DBM,
            frequency: default_frequency().unwrap_or(Frequency::MIN),
            tz_offset: DEFAULT_TZ_OFFSET,
        };
        let _ = config.callsign.push_str(DEFAULT_CALLSIGN);
        let _ = config.grid.push_str(DEFAULT_GRID);
        config
    }
}

impl BeaconConfig {
    /// Callsign text as entered
    #[must_use]
    pub fn callsign(&self) -> &str {
        &self.callsign
    }

    /// Configured locator, used until the first GPS fix
    #[must_use]
    pub fn grid(&self) -> &str {
        &self.grid
    }

    /// Reported power in dBm
    #[must_use]
    pub const fn power_dbm(&self) -> u8 {
        self.power_dbm
    }

    /// Base transmit frequency (tone 0)
    #[must_use]
    pub const fn frequency(&self) -> Frequency {
        self.frequency
    }

    /// Display time zone offset in hours
    #[must_use]
    pub const fn tz_offset(&self) -> i8 {
        self.tz_offset
    }

    /// Apply one setting
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownKey`] for an unrecognised key and
    /// [`ConfigError::InvalidValue`] if the value does not fit the key. The
    /// configuration is unchanged on error.
    pub fn set(&mut self, key: &str, value: &str) -> Result<ConfigKey, ConfigError> {
        let key = ConfigKey::from_name(key).ok_or(ConfigError::UnknownKey)?;
        let value = value.trim();
        let invalid = ConfigError::InvalidValue(key);

        match key {
            ConfigKey::Callsign => self.callsign = upper_nonempty(value).ok_or(invalid)?,
            ConfigKey::Grid => self.grid = upper_nonempty(value).ok_or(invalid)?,
            ConfigKey::Power => self.power_dbm = value.parse().map_err(|_| invalid)?,
            ConfigKey::Freq => {
                self.frequency = value
                    .parse::<u32>()
                    .ok()
                    .and_then(Frequency::from_hz)
                    .ok_or(invalid)?;
            }
            ConfigKey::Tz => {
                let tz: i8 = value.parse().map_err(|_| invalid)?;
                if !(-12..=14).contains(&tz) {
                    return Err(invalid);
                }
                self.tz_offset = tz;
            }
            ConfigKey::Band => {
                self.frequency = Band::from_name(value)
                    .and_then(Band::transmit_frequency)
                    .ok_or(invalid)?;
            }
        }
        Ok(key)
    }

    /// Apply a `key=value` line
    ///
    /// # Errors
    ///
    /// [`ConfigError::Malformed`] if there is no `=`, otherwise as [`Self::set`].
    pub fn apply_line(&mut self, line: &str) -> Result<ConfigKey, ConfigError> {
        let (key, value) = line.split_once('=').ok_or(ConfigError::Malformed)?;
        self.set(key, value)
    }

    /// Load settings text over the defaults
    ///
    /// Blank lines, malformed lines, unknown keys and bad values are skipped.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut config = Self::default();
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if let Err(_e) = config.apply_line(line) {
                debug!("config: skipped line");
            }
        }
        config
    }

    /// Write the value of one stored key
    ///
    /// # Errors
    ///
    /// Propagates writer errors.
    pub fn write_value<W: fmt::Write>(&self, key: ConfigKey, out: &mut W) -> fmt::Result {
        match key {
            ConfigKey::Callsign => out.write_str(&self.callsign),
            ConfigKey::Grid => out.write_str(&self.grid),
            ConfigKey::Power => write!(out, "{}", self.power_dbm),
            ConfigKey::Freq => write!(out, "{}", self.frequency.as_hz()),
            ConfigKey::Tz => write!(out, "{}", self.tz_offset),
            ConfigKey::Band => match Band::from_frequency(self.frequency) {
                Some(band) => out.write_str(band.name()),
                None => out.write_str("-"),
            },
        }
    }

    /// Serialise as `key=value` lines
    ///
    /// # Errors
    ///
    /// Propagates writer errors.
    pub fn write_text<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        for key in ConfigKey::STORED {
            out.write_str(key.name())?;
            out.write_char('=')?;
            self.write_value(key, out)?;
            out.write_char('\n')?;
        }
        Ok(())
    }

    /// Serialise into a bounded string
    ///
    /// # Errors
    ///
    /// Returns `fmt::Error` if the text does not fit.
    pub fn to_text(&self) -> Result<String<SETTINGS_TEXT_SIZE>, fmt::Error> {
        let mut text = String::new();
        self.write_text(&mut text)?;
        Ok(text)
    }
}

/// Marker at the start of a stored settings record
pub const SETTINGS_MAGIC: [u8; 4] = *b"WSB1";

/// Record header: magic, text length (LE u16), Fletcher-16 of length and text (LE u16)
const SETTINGS_HEADER_LEN: usize = 8;

/// Size of a stored settings record (a multiple of the flash write size)
pub const SETTINGS_RECORD_SIZE: usize = SETTINGS_HEADER_LEN + SETTINGS_TEXT_SIZE;

/// Byte offset of the settings page from the start of flash (last 2 KiB page)
pub const SETTINGS_FLASH_OFFSET: u32 = 512 * 1024 - SETTINGS_PAGE_SIZE;

/// Erase granularity of the settings page
pub const SETTINGS_PAGE_SIZE: u32 = 2048;

/// Frame the settings text for flash
///
/// # Errors
///
/// Returns `fmt::Error` if the text does not fit the record.
pub fn encode_settings(config: &BeaconConfig) -> Result<[u8; SETTINGS_RECORD_SIZE], fmt::Error> {
    let text = config.to_text()?;
    let len = u16::try_from(text.len()).map_err(|_| fmt::Error)?;

    let mut record = [0u8; SETTINGS_RECORD_SIZE];
    record[..4].copy_from_slice(&SETTINGS_MAGIC);
    record[4..6].copy_from_slice(&len.to_le_bytes());
    record[6..8].copy_from_slice(&settings_checksum(len, text.as_bytes()).to_le_bytes());
    record[SETTINGS_HEADER_LEN..SETTINGS_HEADER_LEN + text.len()].copy_from_slice(text.as_bytes());
    Ok(record)
}

/// Fletcher-16 over the little-endian length followed by the text
#[must_use]
pub fn settings_checksum(len: u16, text: &[u8]) -> u16 {
    let (a, b) = len
        .to_le_bytes()
        .iter()
        .chain(text)
        .fold((0u16, 0u16), |(a, b), &byte| {
            let a = (a + u16::from(byte)) % 255;
            (a, (b + a) % 255)
        });
    (b << 8) | a
}

/// Recover settings from a flash record
///
/// Returns `None` for an erased page or a damaged record.
#[must_use]
pub fn decode_settings(record: &[u8]) -> Option<BeaconConfig> {
    let header = record.get(..SETTINGS_HEADER_LEN)?;
    if header[..4] != SETTINGS_MAGIC {
        return None;
    }
    let stored_len = u16::from_le_bytes([header[4], header[5]]);
    let len = usize::from(stored_len);
    if len > SETTINGS_TEXT_SIZE {
        return None;
    }
    let body = record.get(SETTINGS_HEADER_LEN..SETTINGS_HEADER_LEN + len)?;
    if u16::from_le_bytes([header[6], header[7]]) != settings_checksum(stored_len, body) {
        return None;
    }
    core::str::from_utf8(body).ok().map(BeaconConfig::parse)
}

fn upper_nonempty<const N: usize>(value: &str) -> Option<String<N>> {
    if value.is_empty() || value.contains(char::is_whitespace) {
        return None;
    }
    let mut out = String::new();
    for c in value.chars() {
        out.push(c.to_ascii_uppercase()).ok()?;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialised_text_fits_buffer() {
        let mut config = BeaconConfig::default();
        config.set("callsign", "AAAAAAAAAAAA").unwrap();
        config.set("grid", "AAAAAAAA").unwrap();
        config.set("tz", "-12").unwrap();
        assert!(config.to_text().is_ok());
    }

    #[test]
    fn failed_set_leaves_value() {
        let mut config = BeaconConfig::default();
        assert!(config.set("freq", "12").is_err());
        assert_eq!(config.frequency().as_hz(), DEFAULT_FREQUENCY_HZ);
    }

    #[test]
    fn erased_flash_is_not_a_record() {
        assert!(decode_settings(&[0xFF; SETTINGS_RECORD_SIZE]).is_none());
    }

    #[test]
    fn record_restores_settings() {
        let mut config = BeaconConfig::default();
        config.set("callsign", "k1abc").unwrap();
        config.set("tz", "3").unwrap();
        let record = encode_settings(&config).unwrap();
        assert_eq!(record.len() % 8, 0);
        assert_eq!(decode_settings(&record), Some(config));
    }
}
