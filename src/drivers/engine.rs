//! Engine-enable relay driver.
//!
//! A single active-high GPIO gates the vehicle's ignition-enable line
//! through a relay.  Power-on state is low (engine disabled).

use embedded_hal::digital::OutputPin;
use log::error;

pub struct EngineRelay<P> {
    pin: P,
    enabled: bool,
}

impl<P: OutputPin> EngineRelay<P> {
    /// Take the pin and drive it low.
    pub fn new(pin: P) -> Self {
        let mut relay = Self {
            pin,
            enabled: true,
        };
        relay.set(false);
        relay
    }

    /// Drive the relay.  Repeated writes of the same level are sent to the
    /// pin again so a glitched output recovers on the next tick.
    pub fn set(&mut self, enabled: bool) {
        let res = if enabled {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        match res {
            Ok(()) => self.enabled = enabled,
            Err(_) => error!(
                "Engine relay: GPIO write failed (wanted {})",
                if enabled { "on" } else { "off" }
            ),
        }
    }

    /// Last level successfully written.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}
