//! SSD1680 driver for the 2.9" 296x128 monochrome panel of the MagTag.
//!
//! The controller RAM is 128 sources wide and 296 gates tall; the badge draws
//! in landscape, so every pixel is rotated into RAM coordinates. Frames are
//! kept in memory and only pushed to the controller on [`Panel::refresh`].

use core::time::Duration;
use std::time::Instant;

use embedded_graphics::{pixelcolor::Rgb565, prelude::*};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiDevice;
use log::*;
use roar_core::display::{Panel, PANEL_HEIGHT, PANEL_WIDTH};
use thiserror::Error;

// SSD1680 commands
const DRIVER_OUTPUT_CONTROL: u8 = 0x01;
const GATE_VOLTAGE: u8 = 0x03;
const SOURCE_VOLTAGE: u8 = 0x04;
const DATA_ENTRY_MODE: u8 = 0x11;
const SOFT_RESET: u8 = 0x12;
const MASTER_ACTIVATION: u8 = 0x20;
const DISPLAY_UPDATE_CTRL2: u8 = 0x22;
const WRITE_RAM_BW: u8 = 0x24;
const WRITE_VCOM: u8 = 0x2C;
const BORDER_WAVEFORM: u8 = 0x3C;
const SET_RAM_X_RANGE: u8 = 0x44;
const SET_RAM_Y_RANGE: u8 = 0x45;
const SET_RAM_X_COUNTER: u8 = 0x4E;
const SET_RAM_Y_COUNTER: u8 = 0x4F;

/// Full refresh: clock on, load LUT from OTP, display, clock off.
const UPDATE_FULL: u8 = 0xF4;

/// The MagTag panel starts one byte into the controller's X RAM.
const RAM_X_OFFSET: u8 = 1;
const RAM_WIDTH: u32 = PANEL_HEIGHT;
const RAM_HEIGHT: u32 = PANEL_WIDTH;
const ROW_BYTES: usize = (RAM_WIDTH / 8) as usize;
const BUFFER_SIZE: usize = ROW_BYTES * RAM_HEIGHT as usize;

/// The panel ghosts when refreshed faster than this.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

const BUSY_TIMEOUT_MS: u32 = 30_000;

#[derive(Debug, Error)]
pub enum EpdError {
    #[error("SPI transfer failed")]
    Spi,
    #[error("GPIO access failed")]
    Pin,
    #[error("timeout waiting for BUSY")]
    BusyTimeout,
}

pub struct Ssd1680<SPI, DC, RST, BUSY, D> {
    spi: SPI,
    dc: DC,
    rst: RST,
    busy: BUSY,
    delay: D,
    buffer: Vec<u8>,
    initialized: bool,
    last_refresh: Option<Instant>,
}

impl<SPI, DC, RST, BUSY, D> Ssd1680<SPI, DC, RST, BUSY, D>
where
    SPI: SpiDevice,
    DC: OutputPin,
    RST: OutputPin,
    BUSY: InputPin,
    D: DelayNs,
{
    /// Does not touch the hardware; the controller is initialized on the first refresh.
    pub fn new(spi: SPI, dc: DC, rst: RST, busy: BUSY, delay: D) -> Self {
        Self {
            spi,
            dc,
            rst,
            busy,
            delay,
            buffer: vec![0xFF; BUFFER_SIZE],
            initialized: false,
            last_refresh: None,
        }
    }

    fn command(&mut self, command: u8, data: &[u8]) -> Result<(), EpdError> {
        self.dc.set_low().map_err(|_| EpdError::Pin)?;
        self.spi.write(&[command]).map_err(|_| EpdError::Spi)?;
        if !data.is_empty() {
            self.dc.set_high().map_err(|_| EpdError::Pin)?;
            self.spi.write(data).map_err(|_| EpdError::Spi)?;
        }
        Ok(())
    }

    fn busy_wait(&mut self) -> Result<(), EpdError> {
        for _ in 0..BUSY_TIMEOUT_MS {
            if !self.busy.is_high().map_err(|_| EpdError::Pin)? {
                return Ok(());
            }
            self.delay.delay_ms(1);
        }
        Err(EpdError::BusyTimeout)
    }

    fn init(&mut self) -> Result<(), EpdError> {
        // Reset sequence: LOW -> Wait -> HIGH -> Wait
        self.rst.set_low().map_err(|_| EpdError::Pin)?;
        self.delay.delay_ms(10);
        self.rst.set_high().map_err(|_| EpdError::Pin)?;
        self.delay.delay_ms(10);
        self.busy_wait()?;

        self.command(SOFT_RESET, &[])?;
        self.busy_wait()?;

        let last_gate = (RAM_HEIGHT - 1) as u16;
        let [gate_lo, gate_hi] = last_gate.to_le_bytes();
        self.command(DRIVER_OUTPUT_CONTROL, &[gate_lo, gate_hi, 0x00])?;
        // X increments, then Y.
        self.command(DATA_ENTRY_MODE, &[0x03])?;
        self.command(BORDER_WAVEFORM, &[0x05])?;
        self.command(WRITE_VCOM, &[0x36])?;
        self.command(GATE_VOLTAGE, &[0x17])?;
        self.command(SOURCE_VOLTAGE, &[0x41, 0x00, 0x32])?;

        let x_end = RAM_X_OFFSET + ROW_BYTES as u8 - 1;
        self.command(SET_RAM_X_RANGE, &[RAM_X_OFFSET, x_end])?;
        self.command(SET_RAM_Y_RANGE, &[0x00, 0x00, gate_lo, gate_hi])?;

        self.initialized = true;
        info!("SSD1680 initialized");
        Ok(())
    }

    fn write_frame(&mut self) -> Result<(), EpdError> {
        self.command(SET_RAM_X_COUNTER, &[RAM_X_OFFSET])?;
        self.command(SET_RAM_Y_COUNTER, &[0x00, 0x00])?;
        let frame = core::mem::take(&mut self.buffer);
        let result = self.command(WRITE_RAM_BW, &frame);
        self.buffer = frame;
        result
    }

    fn set_pixel(&mut self, point: Point, color: Rgb565) {
        let (x, y) = (point.x, point.y);
        if x < 0 || y < 0 || x as u32 >= PANEL_WIDTH || y as u32 >= PANEL_HEIGHT {
            return;
        }
        // Landscape (x, y) -> RAM (source, gate), rotated 90 degrees.
        let source = RAM_WIDTH - 1 - y as u32;
        let gate = x as u32;
        let index = gate as usize * ROW_BYTES + (source / 8) as usize;
        let mask = 0x80 >> (source % 8);
        if is_light(color) {
            self.buffer[index] |= mask;
        } else {
            self.buffer[index] &= !mask;
        }
    }
}

/// Bit set = white. Anything at or above half luminance is white.
fn is_light(color: Rgb565) -> bool {
    let r = u32::from(color.r()) * 255 / u32::from(Rgb565::MAX_R);
    let g = u32::from(color.g()) * 255 / u32::from(Rgb565::MAX_G);
    let b = u32::from(color.b()) * 255 / u32::from(Rgb565::MAX_B);
    (r * 299 + g * 587 + b * 114) / 1000 >= 128
}

impl<SPI, DC, RST, BUSY, D> OriginDimensions for Ssd1680<SPI, DC, RST, BUSY, D> {
    fn size(&self) -> Size {
        Size::new(PANEL_WIDTH, PANEL_HEIGHT)
    }
}

impl<SPI, DC, RST, BUSY, D> DrawTarget for Ssd1680<SPI, DC, RST, BUSY, D>
where
    SPI: SpiDevice,
    DC: OutputPin,
    RST: OutputPin,
    BUSY: InputPin,
    D: DelayNs,
{
    type Color = Rgb565;
    type Error = EpdError;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.set_pixel(point, color);
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        let fill = if is_light(color) { 0xFF } else { 0x00 };
        self.buffer.fill(fill);
        Ok(())
    }
}

impl<SPI, DC, RST, BUSY, D> Panel for Ssd1680<SPI, DC, RST, BUSY, D>
where
    SPI: SpiDevice,
    DC: OutputPin,
    RST: OutputPin,
    BUSY: InputPin,
    D: DelayNs,
{
    fn time_to_refresh(&self) -> Duration {
        self.last_refresh
            .map(|at| MIN_REFRESH_INTERVAL.saturating_sub(at.elapsed()))
            .unwrap_or(Duration::ZERO)
    }

    fn refresh(&mut self) -> Result<(), Self::Error> {
        if !self.initialized {
            self.init()?;
        }
        self.write_frame()?;
        self.command(DISPLAY_UPDATE_CTRL2, &[UPDATE_FULL])?;
        self.command(MASTER_ACTIVATION, &[])?;
        let result = self.busy_wait();
        self.last_refresh = Some(Instant::now());
        if result.is_err() {
            // Force a full re-init on the next refresh.
            self.initialized = false;
        }
        debug!("Panel refreshed");
        result
    }
}
