//! Operator Console Protocol
//!
//! Line-based text commands received over the USB serial console, and the
//! formatting of their responses. Parsing and formatting are pure; the beacon
//! loop does the dispatch.

use core::fmt::{self, Write as _};

use heapless::{String, Vec};

use crate::beacon::state::TxOutcome;
use crate::config::{BeaconConfig, ConfigError, ConfigKey, CONSOLE_LINE_SIZE, CONSOLE_RESPONSE_SIZE};
use crate::time::UtcDateTime;
use crate::types::{Frequency, TransmitterState};

/// Longest key accepted by `set`
pub const MAX_KEY_LEN: usize = 16;

/// Longest value accepted by `set`
pub const MAX_VALUE_LEN: usize = 32;

/// Bounded console response text
pub type Response = String<CONSOLE_RESPONSE_SIZE>;

/// Console command
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// List commands
    Help,
    /// Transmitter state, GPS lock, locator and clock
    Status,
    /// Show settings
    Config,
    /// Change and persist one setting
    Set {
        /// Setting name
        key: String<MAX_KEY_LEN>,
        /// New value text
        value: String<MAX_VALUE_LEN>,
    },
    /// Drain the GPS receiver buffer now
    Gps,
    /// Abort the transmission in progress
    Stop,
    /// Reset the MCU
    Reboot,
}

#[cfg(feature = "embedded")]
impl defmt::Format for ConsoleCommand {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Help => defmt::write!(f, "help"),
            Self::Status => defmt::write!(f, "status"),
            Self::Config => defmt::write!(f, "config"),
            Self::Set { key, value } => defmt::write!(f, "set {=str}={=str}", key.as_str(), value.as_str()),
            Self::Gps => defmt::write!(f, "gps"),
            Self::Stop => defmt::write!(f, "stop"),
            Self::Reboot => defmt::write!(f, "reboot"),
        }
    }
}

/// Console error with code and message
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsoleError {
    /// E01: Unknown command
    UnknownCommand,
    /// E02: Setting rejected
    Config(ConfigError),
    /// E03: Missing required argument
    MissingArg,
    /// E04: Input line too long
    LineTooLong,
    /// E05: Settings could not be saved
    StorageError,
}

impl ConsoleError {
    /// Get error code string
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UnknownCommand => "E01",
            Self::Config(_) => "E02",
            Self::MissingArg => "E03",
            Self::LineTooLong => "E04",
            Self::StorageError => "E05",
        }
    }
}

impl From<ConfigError> for ConsoleError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.code())?;
        match self {
            Self::UnknownCommand => f.write_str("unknown command (try 'help')"),
            Self::Config(err) => write!(f, "{err}"),
            Self::MissingArg => f.write_str("usage: set <key>=<value>"),
            Self::LineTooLong => f.write_str("line too long"),
            Self::StorageError => f.write_str("settings not saved"),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for ConsoleError {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.code());
    }
}

/// Parse one input line
///
/// Keywords are case-insensitive and surrounding whitespace is ignored.
/// Returns `Ok(None)` for a blank line.
///
/// # Errors
///
/// [`ConsoleError::UnknownCommand`] for anything unrecognised and
/// [`ConsoleError::MissingArg`] for a `set` without `key=value`.
pub fn parse_command(line: &str) -> Result<Option<ConsoleCommand>, ConsoleError> {
    let line = line.trim();
    let mut words = line.splitn(2, char::is_whitespace);
    let Some(keyword) = words.next().filter(|w| !w.is_empty()) else {
        return Ok(None);
    };
    let rest = words.next().unwrap_or("").trim();

    let is = |name: &str| keyword.eq_ignore_ascii_case(name);
    let command = if is("help") || keyword == "?" {
        ConsoleCommand::Help
    } else if is("status") {
        ConsoleCommand::Status
    } else if is("config") {
        ConsoleCommand::Config
    } else if is("gps") {
        ConsoleCommand::Gps
    } else if is("stop") {
        ConsoleCommand::Stop
    } else if is("reboot") {
        ConsoleCommand::Reboot
    } else if is("set") {
        parse_set(rest)?
    } else {
        return Err(ConsoleError::UnknownCommand);
    };
    Ok(Some(command))
}

fn parse_set(args: &str) -> Result<ConsoleCommand, ConsoleError> {
    let (key, value) = args.split_once('=').ok_or(ConsoleError::MissingArg)?;
    let (key, value) = (key.trim(), value.trim());
    if key.is_empty() || value.is_empty() {
        return Err(ConsoleError::MissingArg);
    }
    if ConfigKey::from_name(key).is_none() {
        return Err(ConfigError::UnknownKey.into());
    }

    let mut key_text = String::new();
    key_text.push_str(key).map_err(|()| ConfigError::UnknownKey)?;
    let mut value_text = String::new();
    value_text
        .push_str(value)
        .map_err(|()| ConsoleError::LineTooLong)?;

    Ok(ConsoleCommand::Set {
        key: key_text,
        value: value_text,
    })
}

/// Accumulates console bytes into lines
#[derive(Debug, Default)]
pub struct LineParser {
    buffer: Vec<u8, CONSOLE_LINE_SIZE>,
    overflowed: bool,
}

impl LineParser {
    /// Create an empty line parser
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: Vec::new(),
            overflowed: false,
        }
    }

    /// Feed a byte; a line terminator yields the parsed command
    ///
    /// Backspace and DEL erase the previous byte. Blank lines yield nothing.
    pub fn feed(&mut self, byte: u8) -> Option<Result<ConsoleCommand, ConsoleError>> {
        match byte {
            b'\r' | b'\n' => {
                let overflowed = core::mem::replace(&mut self.overflowed, false);
                let result = if overflowed {
                    Some(Err(ConsoleError::LineTooLong))
                } else {
                    core::str::from_utf8(&self.buffer)
                        .map_or(Some(Err(ConsoleError::UnknownCommand)), |line| {
                            parse_command(line).transpose()
                        })
                };
                self.buffer.clear();
                result
            }
            0x08 | 0x7F => {
                self.buffer.pop();
                None
            }
            _ => {
                if self.buffer.push(byte).is_err() {
                    self.overflowed = true;
                }
                None
            }
        }
    }

    /// Discard any partial line
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.overflowed = false;
    }
}

/// Command summary
pub const HELP_TEXT: &str = concat!(
    "commands:\r\n",
    "  status      beacon, gps and clock state\r\n",
    "  config      show settings\r\n",
    "  set k=v     change a setting\r\n",
    "  gps         read the gps receiver now\r\n",
    "  stop        abort the transmission\r\n",
    "  reboot      restart the beacon\r\n",
    "keys: callsign grid power freq tz band\r\n",
);

/// Snapshot of beacon state for the `status` command
#[derive(Clone, Copy, Debug)]
pub struct StatusReport<'a> {
    /// Transmitter state
    pub transmitter: TransmitterState,
    /// GPS lock flag
    pub gps_lock: bool,
    /// Locator for the next message
    pub locator: &'a str,
    /// Base transmit frequency
    pub frequency: Frequency,
    /// Clock reading, None if the clock could not be read
    pub utc: Option<UtcDateTime>,
    /// Whether the clock has been set since power loss
    pub clock_trusted: bool,
    /// Result of the last attempt
    pub last_outcome: Option<TxOutcome>,
    /// Completed transmissions since boot
    pub transmissions: u32,
}

/// Write the `status` response
///
/// # Errors
///
/// Propagates writer errors.
pub fn write_status<W: fmt::Write>(report: &StatusReport<'_>, out: &mut W) -> fmt::Result {
    write!(out, "state: {}\r\n", report.transmitter.label())?;
    write!(out, "gps: {}\r\n", if report.gps_lock { "LOCK" } else { "----" })?;
    write!(out, "grid: {}\r\n", report.locator)?;
    write!(out, "freq: {} Hz\r\n", report.frequency.as_hz())?;
    match report.utc {
        Some(utc) => write!(
            out,
            "utc: {utc}{}\r\n",
            if report.clock_trusted { "" } else { " (unset)" }
        )?,
        None => out.write_str("utc: unavailable\r\n")?,
    }
    match report.last_outcome {
        Some(outcome) => write!(out, "last tx: {}\r\n", outcome.describe())?,
        None => out.write_str("last tx: none\r\n")?,
    }
    write!(out, "sent: {}\r\n", report.transmissions)
}

/// Write the `config` response
///
/// # Errors
///
/// Propagates writer errors.
pub fn write_config<W: fmt::Write>(config: &BeaconConfig, out: &mut W) -> fmt::Result {
    for key in ConfigKey::STORED {
        write!(out, "{}: ", key.name())?;
        config.write_value(key, out)?;
        out.write_str("\r\n")?;
    }
    Ok(())
}

/// Format into a bounded response, truncating if it does not fit
pub fn respond(write: impl FnOnce(&mut Response) -> fmt::Result) -> Response {
    let mut response = Response::new();
    if write(&mut response).is_err() {
        // Keep what fitted and mark the cut
        while response.len() + 3 > CONSOLE_RESPONSE_SIZE {
            response.pop();
        }
        let _ = response.push_str("...");
    }
    response
}

/// Error response text
#[must_use]
pub fn error_response(err: ConsoleError) -> Response {
    respond(|out| write!(out, "{err}\r\n"))
}
