//! Status LED driver.
//!
//! One discrete LED on a GPIO.  In normal operation it toggles once per
//! control tick (a visible heartbeat proving the loop is alive); in
//! degraded mode it is held solidly on.

use embedded_hal::digital::OutputPin;
use log::warn;

pub struct StatusLed<P> {
    pin: P,
    lit: bool,
    degraded: bool,
    faulted: bool,
}

impl<P: OutputPin> StatusLed<P> {
    pub fn new(pin: P) -> Self {
        let mut led = Self {
            pin,
            lit: false,
            degraded: false,
            faulted: false,
        };
        led.write(false);
        led
    }

    /// Advance the heartbeat.  Ignored while degraded.
    pub fn toggle(&mut self) {
        if !self.degraded {
            self.write(!self.lit);
        }
    }

    pub fn set_degraded(&mut self, degraded: bool) {
        self.degraded = degraded;
        self.write(degraded);
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn off(&mut self) {
        self.write(false);
    }

    fn write(&mut self, on: bool) {
        let res = if on {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        match res {
            Ok(()) => {
                self.lit = on;
                self.faulted = false;
            }
            Err(_) if !self.faulted => {
                warn!("Status LED: GPIO write failed");
                self.faulted = true;
            }
            Err(_) => {}
        }
    }
}
