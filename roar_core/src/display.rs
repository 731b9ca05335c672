//! Full-screen bitmap presenter for the e-paper panel.

use core::fmt::Debug;
use core::time::Duration;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use embedded_graphics::{image::Image, pixelcolor::Rgb565, prelude::*};
use embedded_hal::delay::DelayNs;
use log::*;
use thiserror::Error;
use tinybmp::Bmp;

use crate::net::saturating_ms;

/// Panel width in pixels.
pub const PANEL_WIDTH: u32 = 296;
/// Panel height in pixels.
pub const PANEL_HEIGHT: u32 = 128;
/// Extra wait on top of the panel's own refresh interval.
pub const REFRESH_MARGIN: Duration = Duration::from_millis(10);

/// An e-paper panel: a draw target whose content only becomes visible on `refresh`.
pub trait Panel: DrawTarget<Color = Rgb565> {
    /// Time left until the panel accepts the next refresh.
    fn time_to_refresh(&self) -> Duration;

    /// Pushes the drawn frame to the glass.
    fn refresh(&mut self) -> Result<(), Self::Error>;
}

#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("image {path} not found")]
    Missing { path: String },
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("image {path} is not a valid BMP: {reason}")]
    Malformed { path: String, reason: String },
    #[error("image {path} is {width}x{height}, expected 296x128")]
    WrongSize {
        path: String,
        width: u32,
        height: u32,
    },
    #[error("panel error: {0}")]
    Panel(String),
}

fn panel_error<E: Debug>(e: E) -> DisplayError {
    DisplayError::Panel(format!("{:?}", e))
}

/// Loads bitmaps from the asset root and shows them as the only layer on the panel.
pub struct DisplayPresenter<P> {
    panel: P,
    root: PathBuf,
}

impl<P> DisplayPresenter<P>
where
    P: Panel,
    P::Error: Debug,
{
    /// `root` is the directory absolute image paths are resolved under.
    pub fn new(panel: P, root: impl Into<PathBuf>) -> Self {
        Self {
            panel,
            root: root.into(),
        }
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }

    /// Draws the image at `path` and refreshes the panel once it is ready.
    pub fn show<D: DelayNs>(&mut self, path: &str, delay: &mut D) -> Result<(), DisplayError> {
        let data = self.read_asset(path)?;

        let bmp = Bmp::<Rgb565>::from_slice(&data).map_err(|e| DisplayError::Malformed {
            path: path.to_string(),
            reason: format!("{:?}", e),
        })?;
        let size = bmp.size();
        if size != Size::new(PANEL_WIDTH, PANEL_HEIGHT) {
            return Err(DisplayError::WrongSize {
                path: path.to_string(),
                width: size.width,
                height: size.height,
            });
        }

        self.panel.clear(Rgb565::WHITE).map_err(panel_error)?;
        Image::new(&bmp, Point::zero())
            .draw(&mut self.panel)
            .map_err(panel_error)?;

        let wait = self.panel.time_to_refresh() + REFRESH_MARGIN;
        delay.delay_ms(saturating_ms(wait));
        self.panel.refresh().map_err(panel_error)?;

        info!("Displayed {}", path);
        Ok(())
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(Path::new(path.trim_start_matches('/')))
    }

    fn read_asset(&self, path: &str) -> Result<Vec<u8>, DisplayError> {
        let full = self.resolve(path);
        let mut data = Vec::new();
        {
            let mut file = File::open(&full).map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => DisplayError::Missing {
                    path: path.to_string(),
                },
                _ => DisplayError::Io {
                    path: path.to_string(),
                    source: e,
                },
            })?;
            file.read_to_end(&mut data).map_err(|e| DisplayError::Io {
                path: path.to_string(),
                source: e,
            })?;
        }
        Ok(data)
    }
}
