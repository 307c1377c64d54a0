//! LED sweep pattern shown while advertising.

use crate::config::LED_COUNT;

/// Walks one lit LED back and forth across the row.  Each end LED is
/// lit twice in a row as the sweep turns around.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sweep {
    led: usize,
    forward: bool,
}

impl Default for Sweep {
    fn default() -> Self {
        Self::new()
    }
}

impl Sweep {
    pub const fn new() -> Self {
        Self {
            led: 0,
            forward: true,
        }
    }

    /// LED to light now.
    pub fn current(&self) -> usize {
        self.led
    }

    pub fn advance(&mut self) {
        match (self.forward, self.led) {
            (true, led) if led + 1 >= LED_COUNT => self.forward = false,
            (true, led) => self.led = led + 1,
            (false, 0) => self.forward = true,
            (false, led) => self.led = led - 1,
        }
    }
}
