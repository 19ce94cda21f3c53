//! GPS Serial Input
//!
//! The receiver's NMEA stream arrives on USART3 into an interrupt-driven ring
//! buffer. [`GpsUart`] hands out whatever is already buffered so the beacon
//! loop never blocks on the receiver.

use embassy_stm32::usart::BufferedUartRx;
use embedded_io::{Read, ReadReady};

use crate::beacon::io::ByteSource;

/// Buffered GPS receive half
pub struct GpsUart<'d> {
    rx: BufferedUartRx<'d>,
    errors: u32,
}

impl<'d> GpsUart<'d> {
    /// Wrap the receive half of a buffered UART
    #[must_use]
    pub fn new(rx: BufferedUartRx<'d>) -> Self {
        Self { rx, errors: 0 }
    }

    /// Framing, noise and overrun errors seen so far
    #[must_use]
    pub const fn error_count(&self) -> u32 {
        self.errors
    }
}

impl ByteSource for GpsUart<'_> {
    fn read_buffered(&mut self, buf: &mut [u8]) -> usize {
        match self.rx.read_ready() {
            Ok(true) => match self.rx.read(buf) {
                Ok(n) => n,
                Err(e) => {
                    self.errors = self.errors.wrapping_add(1);
                    debug!("gps: uart error {}", e);
                    0
                }
            },
            Ok(false) => 0,
            Err(e) => {
                self.errors = self.errors.wrapping_add(1);
                debug!("gps: uart error {}", e);
                0
            }
        }
    }
}
