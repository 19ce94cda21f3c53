//! DS3231 Real-Time Clock Driver
//!
//! Keeps UTC across power cycles and between GPS fixes. Register
//! encoding lives in [`crate::time`].

use embassy_stm32::i2c::{Error as I2cError, I2c};
use embassy_stm32::mode::Async;

use crate::beacon::io::UtcClock;
use crate::hal::i2c::{I2cAddress, I2cBus, I2cResult};
use crate::time::UtcDateTime;

mod reg {
    pub const SECONDS: u8 = 0x00;
    pub const CONTROL: u8 = 0x0E;
    pub const STATUS: u8 = 0x0F;
}

/// Control register: oscillator disabled on battery when set
const EOSC: u8 = 0x80;

/// Status register: oscillator stopped at some point since last cleared
const OSF: u8 = 0x80;

/// DS3231 driver error
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ds3231Error {
    /// I2C transaction failed
    Bus(I2cError),
    /// Time registers hold an impossible date
    InvalidTime,
}

impl From<I2cError> for Ds3231Error {
    fn from(err: I2cError) -> Self {
        Self::Bus(err)
    }
}

impl defmt::Format for Ds3231Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Bus(e) => defmt::write!(f, "Bus({})", e),
            Self::InvalidTime => defmt::write!(f, "InvalidTime"),
        }
    }
}

/// DS3231 driver
pub struct Ds3231<'d> {
    bus: I2cBus<'d>,
}

impl<'d> Ds3231<'d> {
    /// Create a new DS3231 driver
    #[must_use]
    pub fn new(i2c: I2c<'d, Async>) -> Self {
        Self {
            bus: I2cBus::new(i2c),
        }
    }

    /// Make sure the oscillator keeps running on battery
    ///
    /// Returns whether the oscillator-stop flag was set, i.e. whether the
    /// stored time was lost.
    pub async fn init(&mut self) -> I2cResult<bool> {
        let control = self.bus.read_reg(I2cAddress::DS3231, reg::CONTROL).await?;
        if control & EOSC != 0 {
            self.bus
                .write_reg(I2cAddress::DS3231, reg::CONTROL, control & !EOSC)
                .await?;
        }
        self.oscillator_stopped().await
    }

    /// Whether the oscillator stopped since the time was last written
    pub async fn oscillator_stopped(&mut self) -> I2cResult<bool> {
        let status = self.bus.read_reg(I2cAddress::DS3231, reg::STATUS).await?;
        Ok(status & OSF != 0)
    }

    async fn clear_oscillator_stopped(&mut self) -> I2cResult<()> {
        let status = self.bus.read_reg(I2cAddress::DS3231, reg::STATUS).await?;
        if status & OSF != 0 {
            self.bus
                .write_reg(I2cAddress::DS3231, reg::STATUS, status & !OSF)
                .await?;
        }
        Ok(())
    }
}

impl UtcClock for Ds3231<'_> {
    type Error = Ds3231Error;

    async fn read_utc(&mut self) -> Result<UtcDateTime, Self::Error> {
        let mut regs = [0u8; 7];
        self.bus
            .read_regs(I2cAddress::DS3231, reg::SECONDS, &mut regs)
            .await?;
        UtcDateTime::from_ds3231_registers(&regs).ok_or(Ds3231Error::InvalidTime)
    }

    async fn write_utc(&mut self, time: UtcDateTime) -> Result<(), Self::Error> {
        self.bus
            .write_regs(I2cAddress::DS3231, reg::SECONDS, &time.to_ds3231_registers())
            .await?;
        self.clear_oscillator_stopped().await?;
        Ok(())
    }
}
