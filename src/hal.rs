//! Hardware Abstraction Layer
//!
//! Provides safe abstractions over STM32G474 peripherals.
//! This module isolates hardware-specific code and provides
//! async interfaces for all peripheral operations.

pub mod flash;
pub mod gpio;
pub mod i2c;
pub mod timer;
pub mod uart;
