//! Test doubles for the hardware traits, all driven by one simulated clock.

use core::time::Duration;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::rc::Rc;

use embedded_graphics::{pixelcolor::Rgb565, prelude::*};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, ErrorKind, ErrorType, InputPin};

use crate::display::{Panel, PANEL_HEIGHT, PANEL_WIDTH};
use crate::net::{HttpTransport, Radio};

/// Shared virtual time, advanced only by [`FakeDelay`].
#[derive(Clone, Default)]
pub struct SimClock(Rc<Cell<u64>>);

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.0.get() / 1_000_000
    }

    pub fn advance(&self, ms: u64) {
        self.advance_ns(ms * 1_000_000);
    }

    fn advance_ns(&self, ns: u64) {
        self.0.set(self.0.get() + ns);
    }
}

pub struct FakeDelay {
    clock: SimClock,
    sleeps: Vec<u32>,
}

impl FakeDelay {
    pub fn new(clock: &SimClock) -> Self {
        Self {
            clock: clock.clone(),
            sleeps: Vec::new(),
        }
    }

    /// Every `delay_ms` call, in order.
    pub fn sleeps(&self) -> &[u32] {
        &self.sleeps
    }
}

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.clock.advance_ns(u64::from(ns));
    }

    fn delay_us(&mut self, us: u32) {
        self.clock.advance_ns(u64::from(us) * 1_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.sleeps.push(ms);
        self.clock.advance(u64::from(ms));
    }
}

/// Answers `is_associated` from a script, then repeats the last answer.
pub struct FakeRadio {
    script: RefCell<VecDeque<bool>>,
    last: Cell<bool>,
    checks: Cell<usize>,
    associations: usize,
    fail_association: bool,
}

impl FakeRadio {
    pub fn scripted(answers: &[bool]) -> Self {
        Self {
            script: RefCell::new(answers.iter().copied().collect()),
            last: Cell::new(answers.last().copied().unwrap_or(false)),
            checks: Cell::new(0),
            associations: 0,
            fail_association: false,
        }
    }

    pub fn connected() -> Self {
        Self::scripted(&[true])
    }

    pub fn disconnected() -> Self {
        Self::scripted(&[false])
    }

    pub fn failing_association(mut self) -> Self {
        self.fail_association = true;
        self
    }

    pub fn checks(&self) -> usize {
        self.checks.get()
    }

    pub fn associations(&self) -> usize {
        self.associations
    }
}

impl Radio for FakeRadio {
    fn associate(&mut self, _ssid: &str, _password: &str) -> anyhow::Result<()> {
        self.associations += 1;
        if self.fail_association {
            anyhow::bail!("association refused");
        }
        Ok(())
    }

    fn is_associated(&self) -> bool {
        self.checks.set(self.checks.get() + 1);
        match self.script.borrow_mut().pop_front() {
            Some(answer) => {
                self.last.set(answer);
                answer
            }
            None => self.last.get(),
        }
    }
}

/// Records POSTed URLs and replays canned responses; 200 once they run out.
pub struct FakeTransport {
    responses: VecDeque<Result<u16, String>>,
    posted: Vec<String>,
    resets: usize,
    fail_reset: bool,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::with_responses(Vec::new())
    }

    pub fn with_responses(responses: Vec<Result<u16, String>>) -> Self {
        Self {
            responses: responses.into(),
            posted: Vec::new(),
            resets: 0,
            fail_reset: false,
        }
    }

    pub fn failing_reset(mut self) -> Self {
        self.fail_reset = true;
        self
    }

    pub fn posted(&self) -> &[String] {
        &self.posted
    }

    pub fn resets(&self) -> usize {
        self.resets
    }
}

impl HttpTransport for FakeTransport {
    fn post(&mut self, url: &str) -> anyhow::Result<u16> {
        self.posted.push(url.to_string());
        match self.responses.pop_front().unwrap_or(Ok(200)) {
            Ok(status) => Ok(status),
            Err(reason) => Err(anyhow::anyhow!(reason)),
        }
    }

    fn reset(&mut self) -> anyhow::Result<()> {
        self.resets += 1;
        if self.fail_reset {
            anyhow::bail!("session rebuild failed");
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct FakeError;

impl digital::Error for FakeError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Active-low button, pressed inside any of its `[from, until)` windows (ms).
pub struct FakePin {
    clock: SimClock,
    windows: Vec<(u64, u64)>,
    broken: bool,
}

impl FakePin {
    pub fn pressed_between(clock: &SimClock, from: u64, until: u64) -> Self {
        Self {
            clock: clock.clone(),
            windows: vec![(from, until)],
            broken: false,
        }
    }

    pub fn held(clock: &SimClock) -> Self {
        Self::pressed_between(clock, 0, u64::MAX)
    }

    pub fn released(clock: &SimClock) -> Self {
        Self {
            clock: clock.clone(),
            windows: Vec::new(),
            broken: false,
        }
    }

    pub fn broken(clock: &SimClock) -> Self {
        Self {
            broken: true,
            ..Self::held(clock)
        }
    }
}

impl ErrorType for FakePin {
    type Error = FakeError;
}

impl InputPin for FakePin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.is_low().map(|low| !low)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        if self.broken {
            return Err(FakeError);
        }
        let now = self.clock.now_ms();
        Ok(self
            .windows
            .iter()
            .any(|&(from, until)| from <= now && now < until))
    }
}

/// In-memory 296x128 panel that timestamps every refresh.
pub struct FakePanel {
    clock: SimClock,
    pixels: Vec<Rgb565>,
    time_to_refresh: Duration,
    refreshed_at: Vec<u64>,
    fail_refresh: bool,
}

impl FakePanel {
    pub fn new(clock: &SimClock) -> Self {
        Self {
            clock: clock.clone(),
            pixels: vec![Rgb565::WHITE; (PANEL_WIDTH * PANEL_HEIGHT) as usize],
            time_to_refresh: Duration::ZERO,
            refreshed_at: Vec::new(),
            fail_refresh: false,
        }
    }

    pub fn with_time_to_refresh(mut self, wait: Duration) -> Self {
        self.time_to_refresh = wait;
        self
    }

    pub fn failing_refresh(mut self) -> Self {
        self.fail_refresh = true;
        self
    }

    pub fn refreshed_at(&self) -> &[u64] {
        &self.refreshed_at
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb565> {
        if x >= PANEL_WIDTH || y >= PANEL_HEIGHT {
            return None;
        }
        self.pixels.get((y * PANEL_WIDTH + x) as usize).copied()
    }
}

impl OriginDimensions for FakePanel {
    fn size(&self) -> Size {
        Size::new(PANEL_WIDTH, PANEL_HEIGHT)
    }
}

impl DrawTarget for FakePanel {
    type Color = Rgb565;
    type Error = FakeError;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0
                && point.y >= 0
                && (point.x as u32) < PANEL_WIDTH
                && (point.y as u32) < PANEL_HEIGHT
            {
                let index = point.y as u32 * PANEL_WIDTH + point.x as u32;
                self.pixels[index as usize] = color;
            }
        }
        Ok(())
    }
}

impl Panel for FakePanel {
    fn time_to_refresh(&self) -> Duration {
        self.time_to_refresh
    }

    fn refresh(&mut self) -> Result<(), Self::Error> {
        if self.fail_refresh {
            return Err(FakeError);
        }
        self.refreshed_at.push(self.clock.now_ms());
        Ok(())
    }
}

/// Uncompressed 24-bit bottom-up BMP filled with one `[r, g, b]` color.
pub fn bmp_24(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let row_size = (width * 3).div_ceil(4) * 4;
    let image_size = row_size * height;
    let offset = 14 + 40;

    let mut out = Vec::with_capacity((offset + image_size) as usize);
    out.extend_from_slice(b"BM");
    out.extend_from_slice(&(offset + image_size).to_le_bytes());
    out.extend_from_slice(&[0; 4]);
    out.extend_from_slice(&offset.to_le_bytes());

    out.extend_from_slice(&40u32.to_le_bytes());
    out.extend_from_slice(&(width as i32).to_le_bytes());
    out.extend_from_slice(&(height as i32).to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&24u16.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&image_size.to_le_bytes());
    out.extend_from_slice(&2835i32.to_le_bytes());
    out.extend_from_slice(&2835i32.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());

    let [r, g, b] = rgb;
    for _ in 0..height {
        for _ in 0..width {
            out.extend_from_slice(&[b, g, r]);
        }
        out.resize(out.len() + (row_size - width * 3) as usize, 0);
    }
    out
}

/// Scratch asset root under the system temp dir, removed on drop.
pub struct AssetDir {
    root: PathBuf,
}

impl AssetDir {
    pub fn new(name: &str) -> Self {
        let root = std::env::temp_dir().join(format!("roar_core-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&root);
        std::fs::create_dir_all(&root).unwrap();
        Self { root }
    }

    pub fn root(&self) -> PathBuf {
        self.root.clone()
    }

    pub fn write(&self, path: &str, bytes: &[u8]) {
        let full = self.root.join(path.trim_start_matches('/'));
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(full, bytes).unwrap();
    }
}

impl Drop for AssetDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
}
