//! I2C Bus Abstractions
//!
//! Provides async I2C communication for the `Si5351A`, the DS3231 and the
//! display. Each device sits on its own bus and owns its [`I2cBus`].

use embassy_stm32::i2c::{Error as I2cError, I2c};
use embassy_stm32::mode::Async;

use crate::config::{DISPLAY_I2C_ADDR, DS3231_I2C_ADDR, SI5351_I2C_ADDR};

/// I2C operation result
pub type I2cResult<T> = Result<T, I2cError>;

/// I2C device address wrapper
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct I2cAddress(u8);

impl I2cAddress {
    /// `Si5351A` clock synthesizer address
    pub const SI5351: Self = Self(SI5351_I2C_ADDR);

    /// DS3231 real-time clock address
    pub const DS3231: Self = Self(DS3231_I2C_ADDR);

    /// SSD1306 OLED display address
    pub const SSD1306: Self = Self(DISPLAY_I2C_ADDR);

    /// Create from 7-bit address
    #[must_use]
    pub const fn new(addr: u8) -> Self {
        Self(addr & 0x7F)
    }

    /// Get the 7-bit address
    #[must_use]
    pub const fn addr(self) -> u8 {
        self.0
    }
}

impl defmt::Format for I2cAddress {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "0x{:02X}", self.0);
    }
}

/// Largest burst [`I2cBus::write_regs`] sends in one transaction
const MAX_BURST: usize = 16;

/// I2C bus wrapper
pub struct I2cBus<'d> {
    i2c: I2c<'d, Async>,
}

impl<'d> I2cBus<'d> {
    /// Create a new I2C bus wrapper
    #[must_use]
    pub fn new(i2c: I2c<'d, Async>) -> Self {
        Self { i2c }
    }

    /// Write bytes to a device
    pub async fn write(&mut self, addr: I2cAddress, data: &[u8]) -> I2cResult<()> {
        self.i2c.write(addr.addr(), data).await
    }

    /// Write a single register
    pub async fn write_reg(&mut self, addr: I2cAddress, reg: u8, value: u8) -> I2cResult<()> {
        self.i2c.write(addr.addr(), &[reg, value]).await
    }

    /// Read a single register
    pub async fn read_reg(&mut self, addr: I2cAddress, reg: u8) -> I2cResult<u8> {
        let mut buf = [0u8];
        self.i2c.write_read(addr.addr(), &[reg], &mut buf).await?;
        Ok(buf[0])
    }

    /// Write consecutive registers starting at `base_reg`
    ///
    /// Bursts longer than 16 bytes are split into several transactions.
    pub async fn write_regs(&mut self, addr: I2cAddress, base_reg: u8, values: &[u8]) -> I2cResult<()> {
        let mut reg = base_reg;
        for chunk in values.chunks(MAX_BURST) {
            let mut buf = [0u8; MAX_BURST + 1];
            buf[0] = reg;
            buf[1..=chunk.len()].copy_from_slice(chunk);
            self.i2c.write(addr.addr(), &buf[..=chunk.len()]).await?;
            // chunk.len() <= MAX_BURST
            reg = reg.wrapping_add(chunk.len() as u8);
        }
        Ok(())
    }

    /// Read consecutive registers starting at `base_reg`
    pub async fn read_regs(&mut self, addr: I2cAddress, base_reg: u8, buffer: &mut [u8]) -> I2cResult<()> {
        self.i2c.write_read(addr.addr(), &[base_reg], buffer).await
    }
}

/// Shadow of device registers, so unchanged values are not rewritten
pub struct RegisterMap<const N: usize> {
    values: [Option<u8>; N],
}

impl<const N: usize> RegisterMap<N> {
    /// Create an empty map (every register unknown)
    #[must_use]
    pub const fn new() -> Self {
        Self { values: [None; N] }
    }

    /// Record a value; returns true if the device needs the write
    pub fn update(&mut self, reg: usize, value: u8) -> bool {
        match self.values.get_mut(reg) {
            Some(slot) if *slot == Some(value) => false,
            Some(slot) => {
                *slot = Some(value);
                true
            }
            None => true,
        }
    }

    /// Record a block; returns true if any register changed
    pub fn update_block(&mut self, base: usize, values: &[u8]) -> bool {
        let mut changed = false;
        for (i, &value) in values.iter().enumerate() {
            changed |= self.update(base + i, value);
        }
        changed
    }

    /// Forget all values, forcing the next writes through
    pub fn invalidate(&mut self) {
        self.values.fill(None);
    }
}

impl<const N: usize> Default for RegisterMap<N> {
    fn default() -> Self {
        Self::new()
    }
}
