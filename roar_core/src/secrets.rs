use serde::Deserialize;

use crate::input::ButtonId;
use crate::net::DEFAULT_CONNECT_ATTEMPTS;
use crate::webhook::{Action, ButtonBinding};

/// Home Assistant webhook endpoint the tokens are appended to.
pub const DEFAULT_BASE_URL: &str = "http://home.box:8123/api/webhook/";

/// Defines the structure for the secrets.
#[derive(Deserialize, Debug, Clone)]
pub struct Secrets {
    /// Wi-Fi configuration.
    pub wifi: WiFiConfig,
    /// Webhook tokens, one per button.
    pub webhook: WebhookConfig,
    /// Optional badge tunables.
    #[serde(default)]
    pub badge: BadgeConfig,
}

/// Defines the structure for the Wi-Fi configuration.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WiFiConfig {
    /// The SSID of the Wi-Fi network.
    pub ssid: String,
    /// The password of the Wi-Fi network.
    pub password: String,
}

/// Defines the structure for the webhook configuration.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct WebhookConfig {
    /// URL prefix, the token of the pressed button is appended to it.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Button A: plays "Roar".
    pub roar_trigger: String,
    /// Button B: plays "Think of What You've Done".
    pub think_of_what_you_done_trigger: String,
    /// Button C: lights on.
    pub lights_on_trigger: String,
    /// Button D: lights off.
    pub lights_off_trigger: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

/// When the cooldown sleep follows a dispatch.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CooldownPolicy {
    /// Only after a delivered POST. A failed press can be retried right away.
    #[default]
    OnSuccess,
    /// After every dispatch attempt.
    Always,
}

/// What the badge does when the initial connection fails.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectFailurePolicy {
    /// Keep the wait image and stop. Buttons are never polled.
    #[default]
    Halt,
    /// Wait `reconnect-delay-ms` and run the connect sequence again.
    Retry,
}

/// Defines the structure for the `[badge]` table. Every key is optional, unknown keys are rejected.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct BadgeConfig {
    pub connect_attempts: u32,
    pub poll_interval_ms: u32,
    pub cooldown_ms: u32,
    pub cooldown: CooldownPolicy,
    pub on_connect_failure: ConnectFailurePolicy,
    pub reconnect_delay_ms: u32,
    pub wait_image: String,
    pub ready_image: String,
    pub http_timeout_ms: u64,
}

impl Default for BadgeConfig {
    fn default() -> Self {
        Self {
            connect_attempts: DEFAULT_CONNECT_ATTEMPTS,
            poll_interval_ms: 100,
            cooldown_ms: 5_000,
            cooldown: CooldownPolicy::default(),
            on_connect_failure: ConnectFailurePolicy::default(),
            reconnect_delay_ms: 60_000,
            wait_image: "/images/pleasewait.bmp".to_string(),
            ready_image: "/images/roarbg.bmp".to_string(),
            http_timeout_ms: 30_000,
        }
    }
}

impl Secrets {
    /// Parses and validates a `secrets.toml` document.
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let secrets: Secrets = toml::from_str(raw)
            .map_err(|e| anyhow::anyhow!("Error parsing secrets.toml: {}", e))?;
        secrets.validate()?;
        Ok(secrets)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.wifi.ssid.is_empty(), "wifi.ssid is empty");
        anyhow::ensure!(
            !self.webhook.base_url.is_empty(),
            "webhook.base-url is empty"
        );
        for binding in self.bindings() {
            anyhow::ensure!(
                !binding.token.is_empty(),
                "webhook token for {} is empty",
                binding.action.key()
            );
        }
        anyhow::ensure!(
            self.badge.connect_attempts > 0,
            "badge.connect-attempts must be at least 1"
        );
        Ok(())
    }

    /// Button bindings in priority order (A first).
    pub fn bindings(&self) -> Vec<ButtonBinding> {
        let webhook = &self.webhook;
        vec![
            ButtonBinding::new(ButtonId::A, Action::PlayRoar, &webhook.roar_trigger),
            ButtonBinding::new(
                ButtonId::B,
                Action::PlayThinkOfWhatYouDone,
                &webhook.think_of_what_you_done_trigger,
            ),
            ButtonBinding::new(ButtonId::C, Action::LightsOn, &webhook.lights_on_trigger),
            ButtonBinding::new(ButtonId::D, Action::LightsOff, &webhook.lights_off_trigger),
        ]
    }
}
