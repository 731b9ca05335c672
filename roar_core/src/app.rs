// ===============================================================================
// Badge main loop
// ===============================================================================
// Booting -> Connecting -> Ready | ConnectFailed
//
// Ready polls the buttons forever. ConnectFailed either halts on the wait
// image or retries the connect sequence, depending on `on-connect-failure`.
// ===============================================================================

use core::fmt::Debug;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;
use log::*;

use crate::display::{DisplayPresenter, Panel};
use crate::input::{ButtonId, InputPoller};
use crate::net::{HttpTransport, NetworkClient, PostOutcome, Radio};
use crate::secrets::{BadgeConfig, ConnectFailurePolicy, CooldownPolicy, Secrets, WiFiConfig};
use crate::webhook::{ButtonBinding, WebhookDispatcher};

/// Lifecycle of the badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Booting,
    Connecting,
    Ready,
    ConnectFailed,
}

/// What a single poll iteration did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEvent {
    /// Not ready, or no button pressed.
    Idle,
    /// A button was pressed and its webhook was called.
    Dispatched {
        button: ButtonId,
        outcome: PostOutcome,
        cooled_down: bool,
    },
}

/// Everything the badge needs, built once in `main`.
pub struct Badge<R, T, P, I, D> {
    network: NetworkClient<R, T>,
    dispatcher: WebhookDispatcher,
    presenter: DisplayPresenter<P>,
    buttons: InputPoller<I>,
    bindings: Vec<ButtonBinding>,
    wifi: WiFiConfig,
    config: BadgeConfig,
    delay: D,
    phase: Phase,
}

impl<R, T, P, I, D> Badge<R, T, P, I, D>
where
    R: Radio,
    T: HttpTransport,
    P: Panel,
    P::Error: Debug,
    I: InputPin,
    D: DelayNs,
{
    pub fn new(
        secrets: &Secrets,
        network: NetworkClient<R, T>,
        presenter: DisplayPresenter<P>,
        buttons: InputPoller<I>,
        delay: D,
    ) -> Self {
        Self {
            network,
            dispatcher: WebhookDispatcher::from_secrets(secrets),
            presenter,
            buttons,
            bindings: secrets.bindings(),
            wifi: secrets.wifi.clone(),
            config: secrets.badge.clone(),
            delay,
            phase: Phase::Booting,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn network(&self) -> &NetworkClient<R, T> {
        &self.network
    }

    pub fn presenter(&self) -> &DisplayPresenter<P> {
        &self.presenter
    }

    /// Shows the wait image and runs the connect sequence.
    pub fn start(&mut self) -> Phase {
        self.phase = Phase::Booting;
        let wait_image = self.config.wait_image.clone();
        self.show(&wait_image);
        self.connect()
    }

    /// Runs the connect sequence and shows the ready image on success.
    fn connect(&mut self) -> Phase {
        self.phase = Phase::Connecting;
        info!("Connecting to {}...", self.wifi.ssid);

        let connected = self.network.connect(
            &self.wifi.ssid,
            &self.wifi.password,
            self.config.connect_attempts,
            &mut self.delay,
        );

        if connected {
            let ready_image = self.config.ready_image.clone();
            self.show(&ready_image);
            info!("=== Badge ready ===");
            self.phase = Phase::Ready;
        } else {
            error!("Could not connect to {}", self.wifi.ssid);
            self.phase = Phase::ConnectFailed;
        }
        self.phase
    }

    /// Display failures are logged only, the buttons must keep working.
    fn show(&mut self, path: &str) {
        if let Err(e) = self.presenter.show(path, &mut self.delay) {
            error!("Failed to display {}: {}", path, e);
        }
    }

    /// One iteration of the button loop: dispatch at most one press, cool down,
    /// then wait for the next poll.
    pub fn poll_once(&mut self) -> PollEvent {
        if self.phase != Phase::Ready {
            return PollEvent::Idle;
        }

        let pressed = self
            .buttons
            .first_pressed(self.bindings.iter().map(|b| b.button));

        let event = match pressed.and_then(|id| self.bindings.iter().find(|b| b.button == id)) {
            None => PollEvent::Idle,
            Some(binding) => {
                info!("{} pressed", binding.button);
                let outcome = self
                    .dispatcher
                    .dispatch(&mut self.network, binding, &mut self.delay);

                if outcome.is_success() {
                    info!("Successfully sent POST request");
                } else {
                    error!("Failed to send POST request: {}", outcome);
                }

                let cooled_down = match self.config.cooldown {
                    CooldownPolicy::OnSuccess => outcome.is_success(),
                    CooldownPolicy::Always => true,
                };
                if cooled_down {
                    self.delay.delay_ms(self.config.cooldown_ms);
                }

                PollEvent::Dispatched {
                    button: binding.button,
                    outcome,
                    cooled_down,
                }
            }
        };

        self.delay.delay_ms(self.config.poll_interval_ms);
        event
    }

    /// Advances the state machine by one step.
    pub fn step(&mut self) {
        match self.phase {
            Phase::Booting => {
                self.start();
            }
            Phase::Connecting => {
                self.connect();
            }
            Phase::Ready => {
                self.poll_once();
            }
            Phase::ConnectFailed => match self.config.on_connect_failure {
                ConnectFailurePolicy::Halt => {
                    self.delay.delay_ms(self.config.reconnect_delay_ms);
                }
                ConnectFailurePolicy::Retry => {
                    warn!(
                        "Retrying connection in {} ms",
                        self.config.reconnect_delay_ms
                    );
                    self.delay.delay_ms(self.config.reconnect_delay_ms);
                    self.connect();
                }
            },
        }
    }

    pub fn run(&mut self) -> ! {
        if self.phase == Phase::Booting {
            self.start();
        }
        if self.phase == Phase::ConnectFailed
            && self.config.on_connect_failure == ConnectFailurePolicy::Halt
        {
            warn!("Halting: no network, buttons are disabled");
        }
        loop {
            self.step();
        }
    }
}
