//! WiFi association and the webhook HTTP session.

use core::fmt;
use core::time::Duration;

use embedded_hal::delay::DelayNs;
use log::*;

/// Attempts made by [`NetworkClient::connect`] unless configured otherwise.
pub const DEFAULT_CONNECT_ATTEMPTS: u32 = 5;

/// Station side of the WiFi radio.
pub trait Radio {
    /// Starts associating with an access point. May return before the link is up.
    fn associate(&mut self, ssid: &str, password: &str) -> anyhow::Result<()>;

    /// True while the radio is associated with an access point.
    fn is_associated(&self) -> bool;
}

/// A reusable HTTP session.
pub trait HttpTransport {
    /// Sends a POST without body or custom headers and returns the status code.
    fn post(&mut self, url: &str) -> anyhow::Result<u16>;

    /// Drops the session after a failed request so the next POST starts clean.
    fn reset(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Result of a webhook POST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostOutcome {
    /// The hub answered 200.
    Delivered,
    /// The hub answered with any other status.
    Rejected { status: u16 },
    /// No response, the transport failed.
    Failed { reason: String },
}

impl PostOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PostOutcome::Delivered)
    }

    /// HTTP status code, if a response arrived.
    pub fn status(&self) -> Option<u16> {
        match self {
            PostOutcome::Delivered => Some(200),
            PostOutcome::Rejected { status } => Some(*status),
            PostOutcome::Failed { .. } => None,
        }
    }
}

impl fmt::Display for PostOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostOutcome::Delivered => write!(f, "delivered"),
            PostOutcome::Rejected { status } => write!(f, "rejected with status {}", status),
            PostOutcome::Failed { reason } => write!(f, "failed: {}", reason),
        }
    }
}

/// Sleep after the check of `attempt` (0-based) failed: 10 s, 20 s, 30 s, ...
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(u64::from(attempt + 1) * 10)
}

/// `delay_ms` argument for `wait`, clamped to `u32::MAX`.
pub(crate) fn saturating_ms(wait: Duration) -> u32 {
    u32::try_from(wait.as_millis()).unwrap_or(u32::MAX)
}

/// Radio plus HTTP session. The session is reused for every POST until a transport error.
pub struct NetworkClient<R, T> {
    radio: R,
    transport: T,
}

impl<R: Radio, T: HttpTransport> NetworkClient<R, T> {
    pub fn new(radio: R, transport: T) -> Self {
        Self { radio, transport }
    }

    pub fn is_connected(&self) -> bool {
        self.radio.is_associated()
    }

    /// Requests association once, then checks the link up to `max_attempts` times,
    /// sleeping [`backoff_delay`] after every failed check.
    pub fn connect<D: DelayNs>(
        &mut self,
        ssid: &str,
        password: &str,
        max_attempts: u32,
        delay: &mut D,
    ) -> bool {
        if let Err(e) = self.radio.associate(ssid, password) {
            warn!("Association request for {} failed: {:?}", ssid, e);
        }

        for attempt in 0..max_attempts {
            if self.is_connected() {
                info!("Connected to {}", ssid);
                return true;
            }
            let wait = backoff_delay(attempt);
            debug!(
                "Not connected (attempt {}/{}), waiting {}s",
                attempt + 1,
                max_attempts,
                wait.as_secs()
            );
            delay.delay_ms(saturating_ms(wait));
        }

        warn!("Giving up on {} after {} attempts", ssid, max_attempts);
        false
    }

    /// Sends a POST. Transport faults are reported, never propagated, and reset the session.
    pub fn post(&mut self, url: &str) -> PostOutcome {
        match self.transport.post(url) {
            Ok(200) => PostOutcome::Delivered,
            Ok(status) => {
                warn!("Webhook answered with status {}", status);
                PostOutcome::Rejected { status }
            }
            Err(e) => {
                error!(
                    "POST failed: {:?} (associated: {})",
                    e,
                    self.radio.is_associated()
                );
                if let Err(reset) = self.transport.reset() {
                    error!("Failed to reset HTTP session: {:?}", reset);
                }
                PostOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}
