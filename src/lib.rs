//! WSPR Beacon Firmware Library
//!
//! This library provides the core functionality for a standalone,
//! GPS-disciplined WSPR beacon built around an STM32G474 and a `Si5351A`
//! clock synthesizer. A GPS receiver supplies UTC time (used to discipline a
//! DS3231 real-time clock) and position (converted to a Maidenhead locator);
//! every even minute the beacon encodes its callsign, locator and power into
//! 162 four-level FSK symbols and keys them out on the synthesizer.
//!
//! # Data Flow
//!
//! ```text
//!   GPS UART ──► gps (NMEA) ──┬── RMC time ──► DS3231 (time::UtcDateTime)
//!                             └── GGA fix ───► locator ──► beacon state
//!
//!   DS3231 ──► beacon::scheduler ── even minute ──► wspr::encode
//!                                                     │ 162 symbols
//!                                                     ▼
//!                           beacon::transmit ──► synthesis ──► Si5351 CLK0
//!
//!   USB CDC ──► protocol (line parser) ──► Beacon::handle_command
//!                                             └── config ──► flash
//! ```
//!
//! Only `hal`, `drivers` and the binary touch hardware. Everything else
//! builds with `--features std` and is tested on the host against the
//! traits in [`beacon::io`].

#![cfg_attr(feature = "embedded", no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export dependencies needed by applications (only in embedded mode)
#[cfg(feature = "embedded")]
pub use embassy_executor;
#[cfg(feature = "embedded")]
pub use embassy_stm32;
#[cfg(feature = "embedded")]
pub use embassy_time;
#[cfg(feature = "embedded")]
pub use embassy_usb;

#[macro_use]
mod log;

/// Hardware Abstraction Layer
///
/// Provides safe abstractions over STM32G474 peripherals.
#[cfg(feature = "embedded")]
pub mod hal;

/// Peripheral Drivers
///
/// High-level drivers for external ICs (Si5351, DS3231, display).
#[cfg(feature = "embedded")]
pub mod drivers;

/// WSPR Message Encoder
///
/// Callsign/locator/power packing, convolutional coding, interleaving
/// and sync merge.
pub mod wspr;

/// GPS Sentence Parser
///
/// NMEA RMC/GGA decoding into clock-sync and position events.
pub mod gps;

/// Maidenhead Locator Math
pub mod locator;

/// Beacon Control Logic
///
/// Scheduler state machine, transmission sequencing and the beacon loop.
pub mod beacon;

/// Frequency Synthesis Math
///
/// `Si5351A` PLL and multisynth parameter calculation.
pub mod synthesis;

/// UTC date/time and RTC register encoding
pub mod time;

/// User Interface
///
/// Status screen text.
pub mod ui;

/// USB Subsystem
///
/// CDC ACM serial console buffering.
pub mod usb;

/// Operator Console Protocol
///
/// Console command parser and response formatting.
pub mod protocol;

/// Shared types used across modules
pub mod types;

/// System configuration, constants and persisted settings
pub mod config;

/// Prelude for the firmware binary
#[cfg(feature = "embedded")]
pub mod prelude {
    //! Settings constants, shared types, embassy timing and defmt logging.

    pub use crate::config::*;
    pub use crate::types::*;

    // Common traits
    pub use embedded_hal::digital::OutputPin;
    pub use embedded_hal_async::i2c::I2c as _;

    // Embassy
    pub use embassy_time::{Duration, Instant, Ticker, Timer};

    // Logging
    pub use defmt::{debug, error, info, trace, warn};
}
