//! USB CDC ACM (Serial) Console Framing
//!
//! Responses are written to the bulk IN endpoint one packet at a time. A
//! transfer whose length is a multiple of the packet size must be closed
//! with a zero-length packet or the host keeps waiting for more data.

use crate::config::{USB_CDC_PACKET_SIZE, USB_PID, USB_VID};

/// Splits an outgoing message into endpoint-sized packets
///
/// Yields a trailing empty packet when the message fills its last packet
/// exactly. An empty message yields nothing.
#[derive(Clone, Debug)]
pub struct Packets<'a> {
    data: &'a [u8],
    packet_size: usize,
    needs_zlp: bool,
}

impl<'a> Packets<'a> {
    /// Frame `data` for an endpoint with `packet_size` byte packets
    #[must_use]
    pub fn new(data: &'a [u8], packet_size: usize) -> Self {
        let packet_size = packet_size.max(1);
        Self {
            data,
            packet_size,
            needs_zlp: !data.is_empty() && data.len() % packet_size == 0,
        }
    }

    /// Frame `data` for the console endpoint
    #[must_use]
    pub fn console(data: &'a [u8]) -> Self {
        Self::new(data, usize::from(USB_CDC_PACKET_SIZE))
    }
}

impl<'a> Iterator for Packets<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.data.is_empty() {
            if self.needs_zlp {
                self.needs_zlp = false;
                return Some(&[]);
            }
            return None;
        }
        let take = self.data.len().min(self.packet_size);
        let (packet, rest) = self.data.split_at(take);
        self.data = rest;
        Some(packet)
    }
}

/// USB device descriptor strings
pub struct UsbStrings {
    /// Manufacturer name
    pub manufacturer: &'static str,
    /// Product name
    pub product: &'static str,
    /// Serial number
    pub serial: &'static str,
}

impl Default for UsbStrings {
    fn default() -> Self {
        Self {
            manufacturer: "WSPR Beacon",
            product: "WSPR Beacon Console",
            serial: "0001",
        }
    }
}

/// USB device info for descriptor
#[derive(Clone, Copy, Debug)]
pub struct UsbDeviceInfo {
    /// Vendor ID
    pub vid: u16,
    /// Product ID
    pub pid: u16,
    /// Device release number
    pub device_release: u16,
}

impl Default for UsbDeviceInfo {
    fn default() -> Self {
        Self {
            vid: USB_VID,
            pid: USB_PID,
            device_release: 0x0100,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for UsbDeviceInfo {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "USB({:04X}:{:04X})", self.vid, self.pid);
    }
}
