//! Status indicator abstraction
//!
//! Platform code (a GPIO pin, an LED class device) implements
//! [`StatusIndicator`]; the blink loop only decides when to switch it.

use tracing::trace;

/// Something that can be switched on and off
#[cfg_attr(test, mockall::automock)]
pub trait StatusIndicator: Send {
    /// Switch the indicator
    fn set(&mut self, on: bool);
}

/// Indicator that only logs its transitions
#[derive(Debug, Default)]
pub struct LogIndicator {
    on: bool,
}

impl LogIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    pub fn is_on(&self) -> bool {
        self.on
    }
}

impl StatusIndicator for LogIndicator {
    fn set(&mut self, on: bool) {
        if self.on != on {
            trace!("Status indicator {}", if on { "on" } else { "off" });
        }
        self.on = on;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_indicator_tracks_state() {
        let mut indicator = LogIndicator::new();
        assert!(!indicator.is_on());

        indicator.set(true);
        assert!(indicator.is_on());

        indicator.set(false);
        assert!(!indicator.is_on());
    }
}
