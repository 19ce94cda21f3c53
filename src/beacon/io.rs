//! Collaborator traits
//!
//! The beacon logic talks to hardware only through these traits. The board
//! implements them in `hal` and `drivers`; host tests use in-memory fakes.

use crate::time::UtcDateTime;
use crate::types::{ClockOutput, Frequency};

/// Wall-clock source, disciplined by GPS
#[allow(async_fn_in_trait)]
pub trait UtcClock {
    /// Bus or device error
    type Error;

    /// Read the current UTC date and time
    async fn read_utc(&mut self) -> Result<UtcDateTime, Self::Error>;

    /// Set the clock
    async fn write_utc(&mut self, time: UtcDateTime) -> Result<(), Self::Error>;
}

/// Frequency synthesizer driving the transmitter
#[allow(async_fn_in_trait)]
pub trait Synthesizer {
    /// Bus or device error
    type Error;

    /// Tune an output
    async fn set_frequency(&mut self, output: ClockOutput, frequency: Frequency) -> Result<(), Self::Error>;

    /// Enable or disable an output
    async fn set_output(&mut self, output: ClockOutput, enabled: bool) -> Result<(), Self::Error>;
}

/// What the status indicator should show
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Indication {
    /// Booting, peripherals not yet up
    Boot,
    /// Waiting for the next slot
    Idle,
    /// Keying a message
    Transmitting,
    /// Clock not trusted (power loss, no GPS time yet)
    Fault,
}

impl Indication {
    /// Colour for RGB-capable indicators
    #[must_use]
    pub const fn rgb(self) -> (u8, u8, u8) {
        match self {
            Self::Boot => (50, 0, 0),
            Self::Idle => (0, 0, 0),
            Self::Transmitting => (0, 50, 0),
            Self::Fault => (50, 20, 0),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Indication {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Boot => defmt::write!(f, "Boot"),
            Self::Idle => defmt::write!(f, "Idle"),
            Self::Transmitting => defmt::write!(f, "Transmitting"),
            Self::Fault => defmt::write!(f, "Fault"),
        }
    }
}

/// Status LED or pixel
pub trait StatusIndicator {
    /// Show an indication
    fn set_state(&mut self, indication: Indication);
}

/// Paces symbol slots
#[allow(async_fn_in_trait)]
pub trait SlotTicker {
    /// Start a fresh slot period now
    fn restart(&mut self);

    /// Wait for the end of the current slot
    async fn next_slot(&mut self);
}

/// Buffered serial input from the GPS receiver
pub trait ByteSource {
    /// Copy out whatever bytes are already buffered, never waiting for more
    ///
    /// Returns the number of bytes written to `buf`; 0 means nothing is pending.
    fn read_buffered(&mut self, buf: &mut [u8]) -> usize;
}
