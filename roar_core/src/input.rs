//! Button input.
//!
//! All four buttons are wired active-low with the internal pull-up enabled,
//! so a pressed button reads low. The poller keeps no state between reads;
//! debounce comes from the fixed poll interval of the main loop.

use core::fmt;

use embedded_hal::digital::InputPin;
use log::*;

/// The physical buttons, declared in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonId {
    A,
    B,
    C,
    D,
}

impl ButtonId {
    /// All buttons, highest priority first.
    pub const ALL: [ButtonId; 4] = [ButtonId::A, ButtonId::B, ButtonId::C, ButtonId::D];

    /// 1-based number as printed next to the button.
    pub fn number(self) -> u8 {
        match self {
            ButtonId::A => 1,
            ButtonId::B => 2,
            ButtonId::C => 3,
            ButtonId::D => 4,
        }
    }
}

impl fmt::Display for ButtonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Button {}", self.number())
    }
}

/// Reads the instantaneous level of the badge buttons.
pub struct InputPoller<P> {
    buttons: Vec<(ButtonId, P)>,
}

impl<P: InputPin> Default for InputPoller<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: InputPin> InputPoller<P> {
    pub fn new() -> Self {
        Self {
            buttons: Vec::with_capacity(ButtonId::ALL.len()),
        }
    }

    /// Registers the pin of a button. A second pin for the same button replaces the first.
    pub fn with_button(mut self, id: ButtonId, pin: P) -> Self {
        self.buttons.retain(|(existing, _)| *existing != id);
        self.buttons.push((id, pin));
        self
    }

    /// True while the button's pin reads low.
    ///
    /// Unregistered buttons and pins that fail to read count as released.
    pub fn is_pressed(&mut self, id: ButtonId) -> bool {
        let Some((_, pin)) = self.buttons.iter_mut().find(|(b, _)| *b == id) else {
            return false;
        };
        match pin.is_low() {
            Ok(low) => low,
            Err(e) => {
                warn!("Failed to read {}: {:?}", id, e);
                false
            }
        }
    }

    /// The first pressed button of `order`, if any.
    pub fn first_pressed<I>(&mut self, order: I) -> Option<ButtonId>
    where
        I: IntoIterator<Item = ButtonId>,
    {
        order.into_iter().find(|id| self.is_pressed(*id))
    }
}
