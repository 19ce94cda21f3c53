//! Beacon runtime state
//!
//! Everything the control loop mutates between ticks: current locator,
//! GPS lock, transmitter state and the outcome of the last attempt.

use heapless::String;

use crate::config::GRID_CAPACITY;
use crate::gps::GpsFix;
use crate::time::UtcDateTime;
use crate::types::{GridLocator, TransmitterState};
use crate::wspr::EncodeError;

/// How the last transmission attempt ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxOutcome {
    /// All symbols sent
    Completed,
    /// Message could not be encoded
    EncodeFailed(EncodeError),
    /// Synthesizer stopped responding mid-transmission
    SynthesizerFault,
    /// Cancelled from the console
    Aborted,
}

impl TxOutcome {
    /// Short description for status output
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::EncodeFailed(EncodeError::InvalidCallsign) => "invalid callsign",
            Self::EncodeFailed(EncodeError::InvalidLocator) => "invalid locator",
            Self::EncodeFailed(EncodeError::InvalidPower) => "invalid power",
            Self::SynthesizerFault => "synthesizer fault",
            Self::Aborted => "aborted",
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for TxOutcome {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.describe());
    }
}

/// State owned by the beacon loop
#[derive(Clone, Debug, PartialEq)]
pub struct BeaconState {
    locator: String<GRID_CAPACITY>,
    gps_lock: bool,
    transmitter: TransmitterState,
    clock_trusted: bool,
    last_fix: Option<GpsFix>,
    last_sync: Option<UtcDateTime>,
    last_outcome: Option<TxOutcome>,
    transmissions: u32,
}

impl BeaconState {
    /// Start with the configured locator and no GPS lock
    #[must_use]
    pub fn new(initial_locator: &str) -> Self {
        let mut locator = String::new();
        let _ = locator.push_str(initial_locator);
        Self {
            locator,
            gps_lock: false,
            transmitter: TransmitterState::Idle,
            clock_trusted: false,
            last_fix: None,
            last_sync: None,
            last_outcome: None,
            transmissions: 0,
        }
    }

    /// Locator used for the next message
    #[must_use]
    pub fn locator(&self) -> &str {
        &self.locator
    }

    /// True once a GGA sentence with a fix has been received
    #[must_use]
    pub const fn gps_lock(&self) -> bool {
        self.gps_lock
    }

    /// Current transmitter state
    #[must_use]
    pub const fn transmitter(&self) -> TransmitterState {
        self.transmitter
    }

    /// Whether the clock time can be relied on
    #[must_use]
    pub const fn clock_trusted(&self) -> bool {
        self.clock_trusted
    }

    /// Most recent position fix
    #[must_use]
    pub const fn last_fix(&self) -> Option<&GpsFix> {
        self.last_fix.as_ref()
    }

    /// Time of the last GPS clock sync
    #[must_use]
    pub const fn last_sync(&self) -> Option<UtcDateTime> {
        self.last_sync
    }

    /// Outcome of the most recent attempt
    #[must_use]
    pub const fn last_outcome(&self) -> Option<TxOutcome> {
        self.last_outcome
    }

    /// Completed transmissions since boot
    #[must_use]
    pub const fn transmissions(&self) -> u32 {
        self.transmissions
    }

    /// Take a position fix; returns true if the locator changed
    pub fn apply_fix(&mut self, fix: GpsFix) -> bool {
        let changed = self.locator.as_str() != fix.locator.as_str();
        if changed {
            self.set_locator(fix.locator);
        }
        self.gps_lock = true;
        self.last_fix = Some(fix);
        changed
    }

    /// Record that the clock was set from GPS
    pub fn record_sync(&mut self, time: UtcDateTime) {
        self.last_sync = Some(time);
        self.clock_trusted = true;
    }

    /// Record the clock's own opinion of its validity
    pub fn set_clock_trusted(&mut self, trusted: bool) {
        self.clock_trusted = trusted;
    }

    /// Replace the locator text (configured grid changed before a fix)
    pub fn set_locator_text(&mut self, text: &str) {
        self.locator.clear();
        let _ = self.locator.push_str(text);
    }

    /// Mark the transmitter busy
    pub fn begin_transmission(&mut self) {
        self.transmitter = TransmitterState::Transmitting;
    }

    /// Mark the transmitter idle and record the outcome
    pub fn end_transmission(&mut self, outcome: TxOutcome) {
        self.transmitter = TransmitterState::Idle;
        if outcome == TxOutcome::Completed {
            self.transmissions = self.transmissions.wrapping_add(1);
        }
        self.last_outcome = Some(outcome);
    }

    fn set_locator(&mut self, locator: GridLocator) {
        self.set_locator_text(locator.as_str());
    }
}
