//! Hardware independent core of the roar-tag badge.
//!
//! The badge shows a wait image, joins WiFi, shows its ready image and then
//! turns button presses into Home Assistant webhook calls. Hardware is only
//! reached through `embedded-hal`/`embedded-graphics` traits and the
//! [`net::Radio`], [`net::HttpTransport`] and [`display::Panel`] traits, so
//! everything here builds and tests on the host.

pub mod app;
pub mod display;
pub mod input;
pub mod net;
pub mod secrets;
pub mod webhook;

#[cfg(test)]
mod testing;

pub use app::{Badge, Phase, PollEvent};
pub use display::{DisplayError, DisplayPresenter, Panel};
pub use input::{ButtonId, InputPoller};
pub use net::{HttpTransport, NetworkClient, PostOutcome, Radio};
pub use secrets::Secrets;
pub use webhook::{Action, ButtonBinding, WebhookDispatcher};
