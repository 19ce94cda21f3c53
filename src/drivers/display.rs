//! OLED Display Driver
//!
//! SSD1306 128x64 panel on I2C, used for the beacon status screen.
//! Frames are drawn with embedded-graphics into a page-ordered buffer and only
//! the pages that differ from what the panel already shows are sent.

use crate::config::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
use crate::hal::i2c::{I2cAddress, I2cBus, I2cResult};
use crate::ui::StatusScreen;
use embassy_stm32::i2c::I2c;
use embassy_stm32::mode::Async;
use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};

const WIDTH: usize = DISPLAY_WIDTH as usize;
const PAGES: usize = DISPLAY_HEIGHT as usize / 8;

/// Vertical distance between status lines in pixels
const LINE_PITCH: i32 = 12;

/// Data bytes per I2C transfer
const CHUNK: usize = 32;

/// Control byte: command stream follows
const CONTROL_COMMAND: u8 = 0x00;
/// Control byte: display RAM data follows
const CONTROL_DATA: u8 = 0x40;

/// Power-up sequence, one command with its arguments per entry
const INIT_SEQUENCE: &[&[u8]] = &[
    &[0xAE],       // display off
    &[0xD5, 0x80], // clock divide, default oscillator
    &[0xA8, 0x3F], // multiplex 64
    &[0xD3, 0x00], // no vertical offset
    &[0x40],       // start line 0
    &[0x8D, 0x14], // charge pump on
    &[0x20, 0x00], // horizontal addressing
    &[0xA1],       // segment remap
    &[0xC8],       // COM scan descending
    &[0xDA, 0x12], // alternative COM pins
    &[0x81, 0xCF], // contrast
    &[0xD9, 0xF1], // precharge
    &[0xDB, 0x40], // VCOMH level
    &[0xA4],       // follow RAM
    &[0xA6],       // non-inverted
    &[0xAF],       // display on
];

const SET_COLUMN_WINDOW: u8 = 0x21;
const SET_PAGE_WINDOW: u8 = 0x22;

/// Monochrome frame in panel order: eight rows per byte, one byte per column
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    pages: [[u8; WIDTH]; PAGES],
}

impl Frame {
    /// All pixels off
    #[must_use]
    pub const fn blank() -> Self {
        Self {
            pages: [[0; WIDTH]; PAGES],
        }
    }

    /// Turn every pixel off
    pub fn clear(&mut self) {
        for page in &mut self.pages {
            page.fill(0);
        }
    }

    /// Pixel state; out-of-range coordinates read as off
    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        x < WIDTH && y < PAGES * 8 && self.pages[y / 8][x] & (1 << (y % 8)) != 0
    }

    fn set(&mut self, x: usize, y: usize, on: bool) {
        let mask = 1 << (y % 8);
        let cell = &mut self.pages[y / 8][x];
        if on {
            *cell |= mask;
        } else {
            *cell &= !mask;
        }
    }

    /// Raw bytes of one page
    #[must_use]
    pub fn page(&self, index: usize) -> &[u8; WIDTH] {
        &self.pages[index]
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::blank()
    }
}

impl DrawTarget for Frame {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            let (Ok(x), Ok(y)) = (usize::try_from(point.x), usize::try_from(point.y)) else {
                continue;
            };
            if x < WIDTH && y < PAGES * 8 {
                self.set(x, y, color.is_on());
            }
        }
        Ok(())
    }
}

impl OriginDimensions for Frame {
    fn size(&self) -> Size {
        Size::new(DISPLAY_WIDTH, DISPLAY_HEIGHT)
    }
}

/// Draw the status lines into a frame, replacing its contents
pub fn render_status(frame: &mut Frame, screen: &StatusScreen) {
    frame.clear();
    let style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
    let mut y = 2;
    for line in screen.lines() {
        let _ = Text::with_baseline(line, Point::new(0, y), style, Baseline::Top).draw(frame);
        y += LINE_PITCH;
    }
}

/// SSD1306 panel
pub struct Display<'d> {
    bus: I2cBus<'d>,
    /// What the panel currently shows
    shown: Frame,
    /// Scratch frame for the next render
    next: Frame,
}

impl<'d> Display<'d> {
    /// Wrap the I2C peripheral the panel is on
    #[must_use]
    pub fn new(i2c: I2c<'d, Async>) -> Self {
        Self {
            bus: I2cBus::new(i2c),
            shown: Frame::blank(),
            next: Frame::blank(),
        }
    }

    /// Configure the controller and blank the panel
    pub async fn init(&mut self) -> I2cResult<()> {
        for command in INIT_SEQUENCE {
            self.command(command).await?;
        }
        self.shown.clear();
        for index in 0..PAGES {
            self.write_page(index).await?;
        }
        Ok(())
    }

    /// Render the status screen, sending only the pages that changed
    pub async fn show(&mut self, screen: &StatusScreen) -> I2cResult<()> {
        render_status(&mut self.next, screen);
        for index in 0..PAGES {
            if self.next.pages[index] != self.shown.pages[index] {
                self.shown.pages[index] = self.next.pages[index];
                self.write_page(index).await?;
            }
        }
        Ok(())
    }

    async fn command(&mut self, bytes: &[u8]) -> I2cResult<()> {
        let mut buf = [CONTROL_COMMAND; 4];
        let len = bytes.len().min(buf.len() - 1);
        buf[1..=len].copy_from_slice(&bytes[..len]);
        self.bus.write(I2cAddress::SSD1306, &buf[..=len]).await
    }

    async fn write_page(&mut self, index: usize) -> I2cResult<()> {
        // PAGES is 8, so the index always fits
        let page = index as u8;
        self.command(&[SET_COLUMN_WINDOW, 0, (WIDTH - 1) as u8]).await?;
        self.command(&[SET_PAGE_WINDOW, page, page]).await?;

        let mut buf = [CONTROL_DATA; CHUNK + 1];
        for chunk in self.shown.page(index).chunks(CHUNK) {
            buf[1..=chunk.len()].copy_from_slice(chunk);
            self.bus.write(I2cAddress::SSD1306, &buf[..=chunk.len()]).await?;
        }
        Ok(())
    }
}
