//! GPIO Abstractions
//!
//! The board status LED, driven from the beacon's [`Indication`].

use embedded_hal::digital::OutputPin;

use crate::beacon::io::{Indication, StatusIndicator};

/// Status LED state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LedState {
    /// LED is off
    #[default]
    Off,
    /// LED is on
    On,
}

impl LedState {
    /// Toggle the LED state
    #[must_use]
    pub const fn toggle(self) -> Self {
        match self {
            Self::Off => Self::On,
            Self::On => Self::Off,
        }
    }
}

impl defmt::Format for LedState {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Off => defmt::write!(f, "OFF"),
            Self::On => defmt::write!(f, "ON"),
        }
    }
}

/// Status LED driver
///
/// Single-colour, so the indications map to: boot and transmit on, idle
/// off, fault blinking (one toggle per call, i.e. per loop tick).
pub struct StatusLed<P> {
    pin: P,
    state: LedState,
}

impl<P: OutputPin> StatusLed<P> {
    /// Create a new status LED (initially off)
    #[must_use]
    pub fn new(pin: P) -> Self {
        let mut led = Self {
            pin,
            state: LedState::On,
        };
        led.set(LedState::Off);
        led
    }

    /// Get current state
    #[must_use]
    pub const fn state(&self) -> LedState {
        self.state
    }

    fn set(&mut self, state: LedState) {
        // Board pins are infallible
        let _ = match state {
            LedState::On => self.pin.set_high(),
            LedState::Off => self.pin.set_low(),
        };
        self.state = state;
    }
}

impl<P: OutputPin> StatusIndicator for StatusLed<P> {
    fn set_state(&mut self, indication: Indication) {
        match indication {
            Indication::Boot | Indication::Transmitting => self.set(LedState::On),
            Indication::Idle => self.set(LedState::Off),
            Indication::Fault => self.set(self.state.toggle()),
        }
    }
}
