//! Button to webhook mapping.
//!
//! The badge is stateless: every press is one POST. Whether a song press
//! starts or stops playback is decided by the automation behind the webhook.

use embedded_hal::delay::DelayNs;
use log::*;

use crate::input::ButtonId;
use crate::net::{HttpTransport, NetworkClient, PostOutcome, Radio};
use crate::secrets::{Secrets, WiFiConfig};

/// What a button asks the hub to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    PlayRoar,
    PlayThinkOfWhatYouDone,
    LightsOn,
    LightsOff,
}

impl Action {
    /// Key of the token in the `[webhook]` table.
    pub fn key(self) -> &'static str {
        match self {
            Action::PlayRoar => "roar-trigger",
            Action::PlayThinkOfWhatYouDone => "think-of-what-you-done-trigger",
            Action::LightsOn => "lights-on-trigger",
            Action::LightsOff => "lights-off-trigger",
        }
    }

    /// Song buttons start playback, or stop whatever song is playing.
    pub fn is_song_toggle(self) -> bool {
        matches!(self, Action::PlayRoar | Action::PlayThinkOfWhatYouDone)
    }
}

/// A button and the webhook token it triggers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonBinding {
    pub button: ButtonId,
    pub action: Action,
    pub token: String,
}

impl ButtonBinding {
    pub fn new(button: ButtonId, action: Action, token: &str) -> Self {
        Self {
            button,
            action,
            token: token.to_string(),
        }
    }
}

/// Turns a binding into a POST, reconnecting first if the link dropped.
pub struct WebhookDispatcher {
    base_url: String,
    wifi: WiFiConfig,
    connect_attempts: u32,
}

impl WebhookDispatcher {
    pub fn new(base_url: &str, wifi: WiFiConfig, connect_attempts: u32) -> Self {
        Self {
            base_url: base_url.to_string(),
            wifi,
            connect_attempts,
        }
    }

    pub fn from_secrets(secrets: &Secrets) -> Self {
        Self::new(
            &secrets.webhook.base_url,
            secrets.wifi.clone(),
            secrets.badge.connect_attempts,
        )
    }

    pub fn url_for(&self, binding: &ButtonBinding) -> String {
        format!("{}{}", self.base_url, binding.token)
    }

    /// Sends the POST for `binding`.
    ///
    /// A dropped link triggers exactly one reconnect sequence. Its result is not
    /// checked; the POST is attempted either way.
    pub fn dispatch<R, T, D>(
        &self,
        network: &mut NetworkClient<R, T>,
        binding: &ButtonBinding,
        delay: &mut D,
    ) -> PostOutcome
    where
        R: Radio,
        T: HttpTransport,
        D: DelayNs,
    {
        if !network.is_connected() {
            warn!("Got disconnected... reconnecting");
            network.connect(
                &self.wifi.ssid,
                &self.wifi.password,
                self.connect_attempts,
                delay,
            );
        }

        if binding.action.is_song_toggle() {
            debug!("{} toggles song playback on the hub", binding.button);
        }

        let url = self.url_for(binding);
        info!("Sending request for {}", binding.action.key());
        debug!("POST {}", url);
        network.post(&url)
    }
}
